use std::{
    cell::{Ref, RefCell},
    fmt::{self, Debug},
    hash::Hash,
    mem::take,
    rc::Rc,
};

use derive_ex::{derive_ex, Ex};
use indexmap::{map::Entry, Equivalent, IndexMap};

use crate::{listeners::Listeners, ListenerKey, MapChange, PropertyConfig, PropertyEq, Subscription};


/// An observable map.
///
/// Iteration order is insertion order.
/// Values are compared with [`PropertyEq`], so writing an equal value emits nothing.
#[derive(Ex)]
#[derive_ex(Clone(bound()), Default)]
#[default(Self::new())]
pub struct MapProperty<K: 'static, V: 'static>(Rc<MapNode<K, V>>);

struct MapNode<K: 'static, V: 'static> {
    items: RefCell<IndexMap<K, V>>,
    listeners: Listeners<MapChange<K, V>>,
    config: PropertyConfig,
}

impl<K: 'static, V: 'static> MapProperty<K, V> {
    pub fn new() -> Self {
        Self::with_config(IndexMap::new(), PropertyConfig::default())
    }
    pub fn with_config(items: IndexMap<K, V>, config: PropertyConfig) -> Self {
        Self(Rc::new(MapNode {
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

    pub fn add_listener(&self, f: impl Fn(&MapChange<K, V>) + 'static) -> ListenerKey {
        self.0.listeners.insert(Rc::new(f))
    }
    pub fn remove_listener(&self, key: ListenerKey) -> bool {
        self.0.listeners.remove(key)
    }
    pub fn subscribe(&self, f: impl Fn(&MapChange<K, V>) + 'static) -> Subscription {
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
    pub fn borrow(&self) -> Ref<'_, IndexMap<K, V>> {
        self.0.items.borrow()
    }
    pub fn view(&self) -> MapView<K, V> {
        MapView(self.0.clone())
    }

    /// Removes every entry, reported as a single change.
    pub fn clear(&self) {
        let old_values = take(&mut *self.0.items.borrow_mut());
        if !old_values.is_empty() {
            self.notify(old_values, IndexMap::new());
        }
    }

    fn notify(&self, old_values: IndexMap<K, V>, new_values: IndexMap<K, V>) {
        let change = MapChange::new(self, Some(old_values), Some(new_values));
        self.0.listeners.notify(&change, &self.0.config);
    }
}

impl<K: Hash + Eq + 'static, V: 'static> MapProperty<K, V> {
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
        V: Clone,
    {
        self.0.items.borrow().get(key).cloned()
    }
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.0.items.borrow().contains_key(key)
    }
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.0.items.borrow().keys().cloned().collect()
    }
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.0.items.borrow().values().cloned().collect()
    }
    pub fn to_map(&self) -> IndexMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.0.items.borrow().clone()
    }

    /// Removes `key` and returns its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
        V: Clone,
    {
        let removed = self.0.items.borrow_mut().shift_remove_full(key);
        let Some((_, key, old_value)) = removed else {
            tracing::trace!(property = self.0.config.display_name(), "remove: key not present");
            return None;
        };
        self.notify(IndexMap::from([(key, old_value.clone())]), IndexMap::new());
        Some(old_value)
    }
}

impl<K, V> MapProperty<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: PropertyEq + Clone + 'static,
{
    /// Inserts or replaces the value of `key` and returns the previous value.
    ///
    /// Emits an added change for a new key, a replaced change for a different value,
    /// and nothing if the value is equal to the current one.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let mut batch = PutBatch::new();
        let old_value = batch.put(&mut self.0.items.borrow_mut(), key, value);
        self.notify_batch(batch);
        old_value
    }

    /// Puts every entry, then emits at most one added change and at most one replaced change.
    ///
    /// A key that occurs more than once takes its last value.
    pub fn put_all(&self, entries: impl IntoIterator<Item = (K, V)>) {
        let entries: Vec<(K, V)> = entries.into_iter().collect();
        let mut batch = PutBatch::new();
        {
            let mut items = self.0.items.borrow_mut();
            for (key, value) in entries {
                batch.put(&mut items, key, value);
            }
        }
        self.notify_batch(batch);
    }

    fn notify_batch(&self, batch: PutBatch<K, V>) {
        if !batch.added.is_empty() {
            self.notify(IndexMap::new(), batch.added);
        }
        if !batch.old_values.is_empty() {
            self.notify(batch.old_values, batch.new_values);
        }
    }
}

/// Accumulates the effect of a sequence of puts relative to the state before the first one.
struct PutBatch<K, V> {
    added: IndexMap<K, V>,
    old_values: IndexMap<K, V>,
    new_values: IndexMap<K, V>,
}

impl<K, V> PutBatch<K, V>
where
    K: Hash + Eq + Clone,
    V: PropertyEq + Clone,
{
    fn new() -> Self {
        Self {
            added: IndexMap::new(),
            old_values: IndexMap::new(),
            new_values: IndexMap::new(),
        }
    }

    fn put(&mut self, items: &mut IndexMap<K, V>, key: K, value: V) -> Option<V> {
        match items.entry(key) {
            Entry::Vacant(e) => {
                self.added.insert(e.key().clone(), value.clone());
                e.insert(value);
                None
            }
            Entry::Occupied(mut e) => {
                if e.get().property_eq(&value) {
                    return Some(e.get().clone());
                }
                let key = e.key();
                if let Some(added) = self.added.get_mut(key) {
                    *added = value.clone();
                } else {
                    let original = self
                        .old_values
                        .entry(key.clone())
                        .or_insert_with(|| e.get().clone());
                    if original.property_eq(&value) {
                        self.old_values.shift_remove(key);
                        self.new_values.shift_remove(key);
                    } else {
                        self.new_values.insert(key.clone(), value.clone());
                    }
                }
                Some(e.insert(value))
            }
        }
    }
}

impl<K: Debug + 'static, V: Debug + 'static> Debug for MapProperty<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.items.try_borrow() {
            Ok(items) => Debug::fmt(&*items, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
impl<K: Hash + Eq + 'static, V: 'static> From<IndexMap<K, V>> for MapProperty<K, V> {
    fn from(value: IndexMap<K, V>) -> Self {
        Self::with_config(value, PropertyConfig::default())
    }
}
impl<K: Hash + Eq + 'static, V: 'static> FromIterator<(K, V)> for MapProperty<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().collect::<IndexMap<K, V>>().into()
    }
}

/// Read-only view of a [`MapProperty`] that reflects every later mutation.
#[derive_ex(Clone, bound())]
pub struct MapView<K: 'static, V: 'static>(Rc<MapNode<K, V>>);

impl<K: 'static, V: 'static> MapView<K, V> {
    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn borrow(&self) -> Ref<'_, IndexMap<K, V>> {
        self.0.items.borrow()
    }
    pub fn is_view_of(&self, property: &MapProperty<K, V>) -> bool {
        Rc::ptr_eq(&self.0, &property.0)
    }
}
impl<K: Hash + Eq + 'static, V: 'static> MapView<K, V> {
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
        V: Clone,
    {
        self.0.items.borrow().get(key).cloned()
    }
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.0.items.borrow().contains_key(key)
    }
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.0.items.borrow().keys().cloned().collect()
    }
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.0.items.borrow().values().cloned().collect()
    }
}
impl<K: Debug + 'static, V: Debug + 'static> Debug for MapView<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.items.try_borrow() {
            Ok(items) => Debug::fmt(&*items, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
