use std::borrow::Cow;

use parse_display::Display;

/// How a property reacts to a listener that panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[display(style = "snake_case")]
pub enum DispatchPolicy {
    /// The panic propagates out of the mutating call.
    /// Listeners after the panicking one are not notified.
    #[default]
    FailFast,

    /// Each listener runs under `catch_unwind`.
    /// A panic is logged and the remaining listeners are still notified.
    Isolate,
}

/// How bulk removals (`remove_all`, `retain_all`, `retain`) on a [`ListProperty`](crate::ListProperty) are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[display(style = "snake_case")]
pub enum RemovalGrouping {
    /// One event per removed element.
    #[default]
    PerElement,

    /// One event per maximal run of adjacent removed elements.
    ContiguousRuns,
}

/// Settings shared by every property type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyConfig {
    /// Name reported in log records.
    pub name: Option<Cow<'static, str>>,
    pub dispatch: DispatchPolicy,
    pub removal_grouping: RemovalGrouping,
}

impl PropertyConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn with_dispatch(mut self, dispatch: DispatchPolicy) -> Self {
        self.dispatch = dispatch;
        self
    }
    pub fn with_removal_grouping(mut self, removal_grouping: RemovalGrouping) -> Self {
        self.removal_grouping = removal_grouping;
        self
    }

    pub(crate) fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
