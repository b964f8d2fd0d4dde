use std::{
    cell::{Ref, RefCell},
    fmt::{self, Debug},
    hash::Hash,
    mem::take,
    rc::Rc,
};

use derive_ex::{derive_ex, Ex};
use indexmap::{Equivalent, IndexSet};

use crate::{listeners::Listeners, ListenerKey, PropertyConfig, SetChange, Subscription};


/// An observable set.
///
/// Iteration order is insertion order. Each mutating call emits at most one [`SetChange`].
#[derive(Ex)]
#[derive_ex(Clone(bound()), Default)]
#[default(Self::new())]
pub struct SetProperty<T: 'static>(Rc<SetNode<T>>);

struct SetNode<T: 'static> {
    items: RefCell<IndexSet<T>>,
    listeners: Listeners<SetChange<T>>,
    config: PropertyConfig,
}

impl<T: 'static> SetProperty<T> {
    pub fn new() -> Self {
        Self::with_config(IndexSet::new(), PropertyConfig::default())
    }
    pub fn with_config(items: IndexSet<T>, config: PropertyConfig) -> Self {
        Self(Rc::new(SetNode {
            items: RefCell::new(items),
            listeners: Listeners::new(),
            config,
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

    pub fn add_listener(&self, f: impl Fn(&SetChange<T>) + 'static) -> ListenerKey {
        self.0.listeners.insert(Rc::new(f))
    }
    pub fn remove_listener(&self, key: ListenerKey) -> bool {
        self.0.listeners.remove(key)
    }
    pub fn subscribe(&self, f: impl Fn(&SetChange<T>) + 'static) -> Subscription {
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

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn borrow(&self) -> Ref<'_, IndexSet<T>> {
        self.0.items.borrow()
    }
    pub fn view(&self) -> SetView<T> {
        SetView(self.0.clone())
    }

    pub fn clear(&self) {
        let old_values = take(&mut *self.0.items.borrow_mut());
        if !old_values.is_empty() {
            self.notify(old_values, IndexSet::new());
        }
    }

    fn notify(&self, old_values: IndexSet<T>, new_values: IndexSet<T>) {
        let change = SetChange::new(self, Some(old_values), Some(new_values));
        self.0.listeners.notify(&change, &self.0.config);
    }
}

impl<T: Hash + Eq + 'static> SetProperty<T> {
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        self.0.items.borrow().contains(value)
    }
    pub fn contains_all<'a>(&self, values: impl IntoIterator<Item = &'a T>) -> bool {
        let items = self.0.items.borrow();
        values.into_iter().all(|v| items.contains(v))
    }
    pub fn to_set(&self) -> IndexSet<T>
    where
        T: Clone,
    {
        self.0.items.borrow().clone()
    }

    /// Inserts `value`. Returns `false` and emits nothing if it was already present.
    pub fn add(&self, value: T) -> bool
    where
        T: Clone,
    {
        if !self.0.items.borrow_mut().insert(value.clone()) {
            return false;
        }
        self.notify(IndexSet::new(), IndexSet::from([value]));
        true
    }

    /// Inserts every value not yet present, reported as a single change.
    pub fn add_all(&self, values: impl IntoIterator<Item = T>) -> bool
    where
        T: Clone,
    {
        let values: Vec<T> = values.into_iter().collect();
        let added: IndexSet<T> = {
            let mut items = self.0.items.borrow_mut();
            values
                .into_iter()
                .filter(|v| items.insert(v.clone()))
                .collect()
        };
        if added.is_empty() {
            return false;
        }
        self.notify(IndexSet::new(), added);
        true
    }

    pub fn remove<Q>(&self, value: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        let Some(old_value) = self.0.items.borrow_mut().shift_take(value) else {
            return false;
        };
        self.notify(IndexSet::from([old_value]), IndexSet::new());
        true
    }

    /// Removes every element contained in `values`, reported as a single change.
    pub fn remove_all<'a>(&self, values: impl IntoIterator<Item = &'a T>) -> bool {
        let values: Vec<&T> = values.into_iter().collect();
        let removed: IndexSet<T> = {
            let mut items = self.0.items.borrow_mut();
            values
                .into_iter()
                .filter_map(|v| items.shift_take(v))
                .collect()
        };
        self.notify_removed(removed)
    }

    /// Removes every element not contained in `values`, reported as a single change.
    pub fn retain_all<'a>(&self, values: impl IntoIterator<Item = &'a T>) -> bool {
        let keep: IndexSet<&T> = values.into_iter().collect();
        self.remove_where(|x| !keep.contains(x))
    }

    pub fn retain(&self, mut f: impl FnMut(&T) -> bool) -> bool {
        self.remove_where(|x| !f(x))
    }

    fn remove_where(&self, f: impl FnMut(&T) -> bool) -> bool {
        let marks: Vec<bool> = self.0.items.borrow().iter().map(f).collect();
        if !marks.contains(&true) {
            return false;
        }
        let removed = {
            let mut items = self.0.items.borrow_mut();
            let mut removed = IndexSet::new();
            let mut kept = IndexSet::with_capacity(items.len());
            for (value, remove) in take(&mut *items).into_iter().zip(marks) {
                if remove {
                    removed.insert(value);
                } else {
                    kept.insert(value);
                }
            }
            *items = kept;
            removed
        };
        self.notify_removed(removed)
    }

    fn notify_removed(&self, removed: IndexSet<T>) -> bool {
        if removed.is_empty() {
            return false;
        }
        self.notify(removed, IndexSet::new());
        true
    }
}

impl<T: Debug + 'static> Debug for SetProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.items.try_borrow() {
            Ok(items) => Debug::fmt(&*items, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
impl<T: Hash + Eq + 'static> From<IndexSet<T>> for SetProperty<T> {
    fn from(value: IndexSet<T>) -> Self {
        Self::with_config(value, PropertyConfig::default())
    }
}
impl<T: Hash + Eq + 'static> FromIterator<T> for SetProperty<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().collect::<IndexSet<T>>().into()
    }
}

/// Read-only view of a [`SetProperty`] that reflects every later mutation.
#[derive_ex(Clone, bound())]
pub struct SetView<T: 'static>(Rc<SetNode<T>>);

impl<T: 'static> SetView<T> {
    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn borrow(&self) -> Ref<'_, IndexSet<T>> {
        self.0.items.borrow()
    }
    pub fn is_view_of(&self, property: &SetProperty<T>) -> bool {
        Rc::ptr_eq(&self.0, &property.0)
    }
}
impl<T: Hash + Eq + 'static> SetView<T> {
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        self.0.items.borrow().contains(value)
    }
    pub fn to_set(&self) -> IndexSet<T>
    where
        T: Clone,
    {
        self.0.items.borrow().clone()
    }
}
impl<T: Debug + 'static> Debug for SetView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.items.try_borrow() {
            Ok(items) => Debug::fmt(&*items, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
