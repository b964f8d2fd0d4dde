use std::{
    cell::{Cell, Ref, RefCell},
    fmt::{self, Debug},
    mem::replace,
    rc::Rc,
};

use derive_ex::derive_ex;

use crate::{
    listeners::Listeners, Change, ChangeKind, ListenerKey, PropertyConfig, PropertyEq,
    Subscription,
};


/// An observable single value.
///
/// Writes that do not change the value under [`PropertyEq`] emit nothing.
///
/// While listeners of a `ValueProperty` are being notified, further writes to the same
/// property are applied without notifying. This keeps two properties bound to each other
/// from notifying each other forever.
#[derive_ex(Clone, bound())]
pub struct ValueProperty<T: 'static>(Rc<ValueNode<T>>);

struct ValueNode<T: 'static> {
    value: RefCell<T>,
    listeners: Listeners<ValueChange<T>>,
    config: PropertyConfig,
    notifying: Cell<bool>,
}

impl<T: 'static> ValueProperty<T> {
    pub fn new(value: T) -> Self {
        Self::with_config(value, PropertyConfig::default())
    }
    pub fn with_config(value: T, config: PropertyConfig) -> Self {
        Self(Rc::new(ValueNode {
            value: RefCell::new(value),
            listeners: Listeners::new(),
            config,
            notifying: Cell::new(false),
        }))
    }

    pub fn name(&self) -> Option<&str> {
        self.0.config.name.as_deref()
    }
    pub fn config(&self) -> &PropertyConfig {
        &self.0.config
    }
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn add_listener(&self, f: impl Fn(&ValueChange<T>) + 'static) -> ListenerKey {
        self.0.listeners.insert(Rc::new(f))
    }
    pub fn remove_listener(&self, key: ListenerKey) -> bool {
        self.0.listeners.remove(key)
    }
    pub fn subscribe(&self, f: impl Fn(&ValueChange<T>) + 'static) -> Subscription {
        let key = self.add_listener(f);
        Subscription::from_weak_fn(Rc::downgrade(&self.0), move |node| {
            node.listeners.remove(key);
        })
    }
    pub fn listener_count(&self) -> usize {
        self.0.listeners.len()
    }
    pub fn dispose(&self) {
        let listeners = self.0.listeners.clear();
        tracing::debug!(property = self.0.config.display_name(), listeners, "disposed");
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.value.borrow()
    }
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.value.borrow().clone()
    }
    /// Returns `true` while this property is notifying its listeners.
    pub fn is_notifying(&self) -> bool {
        self.0.notifying.get()
    }
}

impl<T: PropertyEq + Clone + 'static> ValueProperty<T> {
    /// Sets the value. Returns `false` if the value was equal to the current one.
    pub fn set(&self, value: T) -> bool {
        let old_value = {
            let mut current = self.0.value.borrow_mut();
            if current.property_eq(&value) {
                return false;
            }
            replace(&mut *current, value.clone())
        };
        self.notify(old_value, value);
        true
    }

    /// Sets the value and returns the previous one.
    pub fn replace(&self, value: T) -> T {
        let (old_value, changed) = {
            let mut current = self.0.value.borrow_mut();
            let changed = !current.property_eq(&value);
            (replace(&mut *current, value.clone()), changed)
        };
        if changed {
            self.notify(old_value.clone(), value);
        }
        old_value
    }

    /// Edits the value in place and notifies if it changed.
    pub fn modify(&self, f: impl FnOnce(&mut T)) -> bool {
        let (old_value, new_value) = {
            let mut current = self.0.value.borrow_mut();
            let old_value = current.clone();
            f(&mut *current);
            if current.property_eq(&old_value) {
                return false;
            }
            (old_value, current.clone())
        };
        self.notify(old_value, new_value);
        true
    }

    fn notify(&self, old_value: T, new_value: T) {
        if self.0.notifying.get() {
            tracing::trace!(
                property = self.0.config.display_name(),
                "nested write while notifying; notification inhibited"
            );
            return;
        }
        let _guard = NotifyingGuard::enter(&self.0.notifying);
        let change = ValueChange {
            source: self.clone(),
            old_value,
            new_value,
        };
        self.0.listeners.notify(&change, &self.0.config);
    }
}

struct NotifyingGuard<'a>(&'a Cell<bool>);

impl<'a> NotifyingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}
impl Drop for NotifyingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<T: Default + 'static> Default for ValueProperty<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
impl<T: Debug + 'static> Debug for ValueProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => Debug::fmt(&*value, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

/// A change of a [`ValueProperty`].
pub struct ValueChange<T: 'static> {
    source: ValueProperty<T>,
    old_value: T,
    new_value: T,
}

impl<T: 'static> ValueChange<T> {
    pub fn source(&self) -> &ValueProperty<T> {
        &self.source
    }
    pub fn old_value(&self) -> &T {
        &self.old_value
    }
    pub fn new_value(&self) -> &T {
        &self.new_value
    }
}
impl<T: 'static> Change for ValueChange<T> {
    fn kind(&self) -> ChangeKind {
        ChangeKind::Replaced
    }
}
impl<T: Debug + 'static> Debug for ValueChange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueChange")
            .field("source", &self.source.name())
            .field("old_value", &self.old_value)
            .field("new_value", &self.new_value)
            .finish()
    }
}
