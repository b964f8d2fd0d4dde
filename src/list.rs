use std::{
    cell::{Cell, Ref, RefCell},
    fmt::{self, Debug},
    mem::{replace, take},
    rc::Rc,
};

use derive_ex::{derive_ex, Ex};

use crate::{
    error::{check_index, check_insert_index},
    listeners::Listeners,
    ListChange, ListenerKey, PropertyConfig, PropertyEq, RemovalGrouping, Result, Subscription,
};

#[cfg(test)]
mod tests;

/// An observable `Vec`.
///
/// Every mutation is reported to the listeners as one or more [`ListChange`]s.
/// Replaying the changes in order on a copy of the previous contents
/// (see [`ListChange::apply_to`]) reproduces the new contents.
///
/// `ListProperty` is a handle; clones share the same contents and listeners.
#[derive(Ex)]
#[derive_ex(Clone(bound()), Default)]
#[default(Self::new())]
pub struct ListProperty<T: 'static>(Rc<ListNode<T>>);

struct ListNode<T: 'static> {
    items: RefCell<Vec<T>>,
    listeners: Listeners<ListChange<T>>,
    config: PropertyConfig,
    // bumped before every dispatch
    revision: Cell<u64>,
}

impl<T: 'static> ListNode<T> {
    fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.items.borrow().iter().position(|x| x == value)
    }
    fn contains_all(&self, values: &[T]) -> bool
    where
        T: PartialEq,
    {
        let items = self.items.borrow();
        values.iter().all(|v| items.contains(v))
    }
}

impl<T: 'static> ListProperty<T> {
    pub fn new() -> Self {
        Self::with_config(Vec::new(), PropertyConfig::default())
    }
    pub fn with_config(items: Vec<T>, config: PropertyConfig) -> Self {
        Self(Rc::new(ListNode {
            items: RefCell::new(items),
            listeners: Listeners::new(),
            config,
            revision: Cell::new(0),
        }))
    }

    pub fn name(&self) -> Option<&str> {
        self.0.config.name.as_deref()
    }
    pub fn config(&self) -> &PropertyConfig {
        &self.0.config
    }
    /// Returns `true` if both handles refer to the same property.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn add_listener(&self, f: impl Fn(&ListChange<T>) + 'static) -> ListenerKey {
        self.0.listeners.insert(Rc::new(f))
    }
    /// Returns `false` if the listener was not registered.
    pub fn remove_listener(&self, key: ListenerKey) -> bool {
        self.0.listeners.remove(key)
    }
    /// Registers a listener that stays registered until the returned `Subscription` is dropped.
    pub fn subscribe(&self, f: impl Fn(&ListChange<T>) + 'static) -> Subscription {
        let key = self.add_listener(f);
        Subscription::from_weak_fn(Rc::downgrade(&self.0), move |node| {
            node.listeners.remove(key);
        })
    }
    pub fn listener_count(&self) -> usize {
        self.0.listeners.len()
    }
    /// Removes all listeners. The contents are kept.
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
    /// Borrows the current contents.
    ///
    /// Panics if a mutator is called while the borrow is alive.
    pub fn borrow(&self) -> Ref<'_, [T]> {
        Ref::map(self.0.items.borrow(), |items| items.as_slice())
    }
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.0.items.borrow().get(index).cloned()
    }
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.0.items.borrow().clone()
    }
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.0.index_of(value).is_some()
    }
    pub fn contains_all(&self, values: &[T]) -> bool
    where
        T: PartialEq,
    {
        self.0.contains_all(values)
    }
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.0.index_of(value)
    }

    /// Returns a read-only view that always shows the current contents.
    pub fn view(&self) -> ListView<T> {
        ListView(self.0.clone())
    }

    /// Removes the first element equal to `value`.
    pub fn remove(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        let Some(index) = self.0.index_of(value) else {
            return false;
        };
        let old_value = self.0.items.borrow_mut().remove(index);
        self.notify(index, vec![old_value], Vec::new());
        true
    }

    pub fn remove_at(&self, index: usize) -> Result<T>
    where
        T: Clone,
    {
        let old_value = {
            let mut items = self.0.items.borrow_mut();
            check_index(index, items.len())?;
            items.remove(index)
        };
        self.notify(index, vec![old_value.clone()], Vec::new());
        Ok(old_value)
    }

    /// Removes every element contained in `values`.
    ///
    /// The events are emitted in ascending order of position, grouped as configured by
    /// [`PropertyConfig::removal_grouping`]. Each event's `start_index` is a position in the
    /// list as it is when that event is dispatched, after the earlier events and any mutation
    /// made by listeners.
    pub fn remove_all(&self, values: &[T]) -> bool
    where
        T: PartialEq,
    {
        self.remove_where(|x| values.contains(x))
    }
    /// Removes every element not contained in `values`.
    pub fn retain_all(&self, values: &[T]) -> bool
    where
        T: PartialEq,
    {
        self.remove_where(|x| !values.contains(x))
    }
    /// Keeps only the elements for which `f` returns `true`.
    pub fn retain(&self, mut f: impl FnMut(&T) -> bool) -> bool {
        self.remove_where(|x| !f(x))
    }

    // Runs are located in the live store one at a time; listeners may mutate the list in between.
    fn remove_where(&self, mut f: impl FnMut(&T) -> bool) -> bool {
        let coalesce = self.0.config.removal_grouping == RemovalGrouping::ContiguousRuns;
        let mut index = 0;
        let mut removed = false;
        loop {
            let (start, end, next_is_kept) = {
                let items = self.0.items.borrow();
                let Some(offset) = items.get(index..).and_then(|rest| rest.iter().position(&mut f))
                else {
                    break;
                };
                let start = index + offset;
                let mut end = start + 1;
                let mut next_is_kept = false;
                if coalesce {
                    while end < items.len() {
                        if !f(&items[end]) {
                            next_is_kept = true;
                            break;
                        }
                        end += 1;
                    }
                }
                (start, end, next_is_kept)
            };
            let old_values: Vec<T> = self.0.items.borrow_mut().drain(start..end).collect();
            removed = true;
            let revision = self.0.revision.get();
            self.notify(start, old_values, Vec::new());
            index = if next_is_kept && self.0.revision.get() == revision + 1 {
                start + 1
            } else {
                start
            };
        }
        removed
    }

    pub fn clear(&self) {
        let old_values = take(&mut *self.0.items.borrow_mut());
        if !old_values.is_empty() {
            self.notify(0, old_values, Vec::new());
        }
    }

    fn notify(&self, start_index: usize, old_values: Vec<T>, new_values: Vec<T>) {
        self.0.revision.set(self.0.revision.get() + 1);
        let change = ListChange::new(self, start_index, Some(old_values), Some(new_values));
        self.0.listeners.notify(&change, &self.0.config);
    }
}

impl<T: Clone + 'static> ListProperty<T> {
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::with_config(items, PropertyConfig::default())
    }

    /// Appends `value`.
    pub fn add(&self, value: T) {
        let index = {
            let mut items = self.0.items.borrow_mut();
            items.push(value.clone());
            items.len() - 1
        };
        self.notify(index, Vec::new(), vec![value]);
    }

    pub fn insert(&self, index: usize, value: T) -> Result<()> {
        {
            let mut items = self.0.items.borrow_mut();
            check_insert_index(index, items.len())?;
            items.insert(index, value.clone());
        }
        self.notify(index, Vec::new(), vec![value]);
        Ok(())
    }

    /// Appends `values` as one block.
    pub fn add_all(&self, values: impl IntoIterator<Item = T>) {
        let values: Vec<T> = values.into_iter().collect();
        if values.is_empty() {
            return;
        }
        let index = {
            let mut items = self.0.items.borrow_mut();
            items.extend(values.iter().cloned());
            items.len() - values.len()
        };
        self.notify(index, Vec::new(), values);
    }

    /// Inserts `values` as one block starting at `index`.
    pub fn add_all_at(&self, index: usize, values: impl IntoIterator<Item = T>) -> Result<()> {
        self.insert_block(index, values.into_iter().collect())
    }

    fn insert_block(&self, index: usize, values: Vec<T>) -> Result<()> {
        {
            let mut items = self.0.items.borrow_mut();
            check_insert_index(index, items.len())?;
            if values.is_empty() {
                return Ok(());
            }
            items.splice(index..index, values.iter().cloned());
        }
        self.notify(index, Vec::new(), values);
        Ok(())
    }

    /// Replaces the element at `index` and returns the previous one.
    ///
    /// No event is emitted if the new value is equal to the old one under [`PropertyEq`].
    pub fn set(&self, index: usize, value: T) -> Result<T>
    where
        T: PropertyEq,
    {
        let (old_value, changed) = {
            let mut items = self.0.items.borrow_mut();
            check_index(index, items.len())?;
            let changed = !items[index].property_eq(&value);
            (replace(&mut items[index], value.clone()), changed)
        };
        if changed {
            self.notify(index, vec![old_value.clone()], vec![value]);
        }
        Ok(old_value)
    }
}

impl<T: Debug + 'static> Debug for ListProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.items.try_borrow() {
            Ok(items) => Debug::fmt(&*items, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
impl<T: Clone + 'static> From<Vec<T>> for ListProperty<T> {
    fn from(value: Vec<T>) -> Self {
        Self::from_vec(value)
    }
}
impl<T: Clone + 'static> FromIterator<T> for ListProperty<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

/// Read-only view of a [`ListProperty`].
///
/// The view shares the property's storage, so it reflects every later mutation.
/// It has no mutating methods.
#[derive_ex(Clone, bound())]
pub struct ListView<T: 'static>(Rc<ListNode<T>>);

impl<T: 'static> ListView<T> {
    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn borrow(&self) -> Ref<'_, [T]> {
        Ref::map(self.0.items.borrow(), |items| items.as_slice())
    }
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.0.items.borrow().get(index).cloned()
    }
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.0.items.borrow().clone()
    }
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.0.index_of(value).is_some()
    }
    pub fn contains_all(&self, values: &[T]) -> bool
    where
        T: PartialEq,
    {
        self.0.contains_all(values)
    }
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.0.index_of(value)
    }
    pub fn is_view_of(&self, property: &ListProperty<T>) -> bool {
        Rc::ptr_eq(&self.0, &property.0)
    }
}
impl<T: Debug + 'static> Debug for ListView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.items.try_borrow() {
            Ok(items) => Debug::fmt(&*items, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
