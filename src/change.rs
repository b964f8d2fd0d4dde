use std::{
    fmt::{self, Debug},
    hash::Hash,
};

use indexmap::{IndexMap, IndexSet};
use parse_display::Display;

use crate::{
    error::check_insert_index, ListProperty, MapProperty, PropertyError, Result, SetProperty,
};


/// Classification of a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(style = "snake_case")]
pub enum ChangeKind {
    Added,
    Replaced,
    Removed,
}

/// Common interface of the change events.
pub trait Change {
    fn kind(&self) -> ChangeKind;
}

fn classify(old_is_empty: bool, new_is_empty: bool) -> ChangeKind {
    match (old_is_empty, new_is_empty) {
        (true, _) => ChangeKind::Added,
        (false, true) => ChangeKind::Removed,
        (false, false) => ChangeKind::Replaced,
    }
}

/// One atomic change of a [`ListProperty`].
///
/// `old_values` were replaced by `new_values`, both starting at `start_index`.
pub struct ListChange<T: 'static> {
    source: ListProperty<T>,
    start_index: usize,
    old_values: Vec<T>,
    new_values: Vec<T>,
}

impl<T: 'static> ListChange<T> {
    /// Creates a change event. `None` stands for "no values on this side".
    pub fn new(
        source: &ListProperty<T>,
        start_index: usize,
        old_values: Option<Vec<T>>,
        new_values: Option<Vec<T>>,
    ) -> Self {
        Self {
            source: source.clone(),
            start_index,
            old_values: old_values.unwrap_or_default(),
            new_values: new_values.unwrap_or_default(),
        }
    }

    pub fn source(&self) -> &ListProperty<T> {
        &self.source
    }
    pub fn start_index(&self) -> usize {
        self.start_index
    }
    pub fn old_values(&self) -> &[T] {
        &self.old_values
    }
    pub fn new_values(&self) -> &[T] {
        &self.new_values
    }

    pub fn values_added(&self) -> bool {
        self.old_values.is_empty()
    }
    pub fn values_replaced(&self) -> bool {
        !self.old_values.is_empty() && !self.new_values.is_empty()
    }
    pub fn values_removed(&self) -> bool {
        self.new_values.is_empty()
    }

    /// Replays this change on `target`, which must be in the state the source had before the change.
    ///
    /// Fails without touching `target` if it does not hold `old_values` at `start_index`.
    pub fn apply_to(&self, target: &mut Vec<T>) -> Result<()>
    where
        T: Clone + PartialEq,
    {
        let start = self.start_index;
        let end = start
            .checked_add(self.old_values.len())
            .ok_or(PropertyError::IndexOutOfBounds {
                index: start,
                len: target.len(),
            })?;
        check_insert_index(end, target.len())?;
        if target[start..end] != self.old_values[..] {
            return Err(PropertyError::StaleTarget { index: start });
        }
        target.splice(start..end, self.new_values.iter().cloned());
        Ok(())
    }
}
impl<T: 'static> Change for ListChange<T> {
    fn kind(&self) -> ChangeKind {
        classify(self.old_values.is_empty(), self.new_values.is_empty())
    }
}
impl<T: Debug + 'static> Debug for ListChange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListChange")
            .field("source", &self.source.name())
            .field("start_index", &self.start_index)
            .field("old_values", &self.old_values)
            .field("new_values", &self.new_values)
            .finish()
    }
}
impl<T: PartialEq + 'static> PartialEq for ListChange<T> {
    fn eq(&self, other: &Self) -> bool {
        self.source.ptr_eq(&other.source)
            && self.start_index == other.start_index
            && self.old_values == other.old_values
            && self.new_values == other.new_values
    }
}

/// One atomic change of a [`SetProperty`].
///
/// A set has no notion of replacing a value in place, so at most one side is non-empty
/// for events emitted by [`SetProperty`].
pub struct SetChange<T: 'static> {
    source: SetProperty<T>,
    old_values: IndexSet<T>,
    new_values: IndexSet<T>,
}

impl<T: 'static> SetChange<T> {
    pub fn new(
        source: &SetProperty<T>,
        old_values: Option<IndexSet<T>>,
        new_values: Option<IndexSet<T>>,
    ) -> Self {
        Self {
            source: source.clone(),
            old_values: old_values.unwrap_or_default(),
            new_values: new_values.unwrap_or_default(),
        }
    }

    pub fn source(&self) -> &SetProperty<T> {
        &self.source
    }
    pub fn old_values(&self) -> &IndexSet<T> {
        &self.old_values
    }
    pub fn new_values(&self) -> &IndexSet<T> {
        &self.new_values
    }

    pub fn values_added(&self) -> bool {
        self.old_values.is_empty()
    }
    pub fn values_removed(&self) -> bool {
        self.new_values.is_empty()
    }

    pub fn apply_to(&self, target: &mut IndexSet<T>)
    where
        T: Hash + Eq + Clone,
    {
        for value in &self.old_values {
            target.shift_remove(value);
        }
        target.extend(self.new_values.iter().cloned());
    }
}
impl<T: 'static> Change for SetChange<T> {
    fn kind(&self) -> ChangeKind {
        if self.old_values.is_empty() {
            ChangeKind::Added
        } else {
            ChangeKind::Removed
        }
    }
}
impl<T: Debug + 'static> Debug for SetChange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetChange")
            .field("source", &self.source.name())
            .field("old_values", &self.old_values)
            .field("new_values", &self.new_values)
            .finish()
    }
}
impl<T: Hash + Eq + 'static> PartialEq for SetChange<T> {
    fn eq(&self, other: &Self) -> bool {
        self.source.ptr_eq(&other.source)
            && self.old_values == other.old_values
            && self.new_values == other.new_values
    }
}

/// One atomic change of a [`MapProperty`].
///
/// For a replacement, `old_values` and `new_values` hold the same keys.
pub struct MapChange<K: 'static, V: 'static> {
    source: MapProperty<K, V>,
    old_values: IndexMap<K, V>,
    new_values: IndexMap<K, V>,
}

impl<K: 'static, V: 'static> MapChange<K, V> {
    pub fn new(
        source: &MapProperty<K, V>,
        old_values: Option<IndexMap<K, V>>,
        new_values: Option<IndexMap<K, V>>,
    ) -> Self {
        Self {
            source: source.clone(),
            old_values: old_values.unwrap_or_default(),
            new_values: new_values.unwrap_or_default(),
        }
    }

    pub fn source(&self) -> &MapProperty<K, V> {
        &self.source
    }
    pub fn old_values(&self) -> &IndexMap<K, V> {
        &self.old_values
    }
    pub fn new_values(&self) -> &IndexMap<K, V> {
        &self.new_values
    }

    pub fn values_added(&self) -> bool {
        self.old_values.is_empty()
    }
    pub fn values_replaced(&self) -> bool {
        !self.old_values.is_empty() && !self.new_values.is_empty()
    }
    pub fn values_removed(&self) -> bool {
        self.new_values.is_empty()
    }

    pub fn apply_to(&self, target: &mut IndexMap<K, V>)
    where
        K: Hash + Eq + Clone,
        V: Clone,
    {
        for key in self.old_values.keys() {
            if !self.new_values.contains_key(key) {
                target.shift_remove(key);
            }
        }
        for (key, value) in &self.new_values {
            target.insert(key.clone(), value.clone());
        }
    }
}
impl<K: 'static, V: 'static> Change for MapChange<K, V> {
    fn kind(&self) -> ChangeKind {
        classify(self.old_values.is_empty(), self.new_values.is_empty())
    }
}
impl<K: Debug + 'static, V: Debug + 'static> Debug for MapChange<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapChange")
            .field("source", &self.source.name())
            .field("old_values", &self.old_values)
            .field("new_values", &self.new_values)
            .finish()
    }
}
impl<K: Hash + Eq + 'static, V: PartialEq + 'static> PartialEq for MapChange<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.source.ptr_eq(&other.source)
            && self.old_values == other.old_values
            && self.new_values == other.new_values
    }
}
