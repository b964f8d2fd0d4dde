use std::{hash::Hash, rc::Rc};

use indexmap::{IndexMap, IndexSet};

use crate::{
    ListChange, ListProperty, MapChange, MapProperty, PropertyEq, SetChange, SetProperty,
    Subscription, ValueChange, ValueProperty,
};


/// A value that can be observed.
pub trait Property {
    type Value;
}

pub trait ReadableProperty: Property {
    /// Returns a snapshot of the current value.
    fn value(&self) -> Self::Value;

    /// Calls `f` with the new value after every change.
    ///
    /// `f` is called once per change event. A collection call that emits several events,
    /// such as `ListProperty::remove_all`, calls `f` once for each of them with the value
    /// as of that event, so a bound target may receive several intermediate values.
    ///
    /// The listener stays registered until the returned `Subscription` is dropped.
    fn on_value_change(&self, f: Rc<dyn Fn(&Self::Value)>) -> Subscription;
}

pub trait WritableProperty: Property {
    fn set_value(&self, value: Self::Value);
}

pub trait ReadableWritableProperty: ReadableProperty + WritableProperty {}

impl<P: ReadableProperty + WritableProperty + ?Sized> ReadableWritableProperty for P {}

impl<T: 'static> Property for ValueProperty<T> {
    type Value = T;
}
impl<T: Clone + 'static> ReadableProperty for ValueProperty<T> {
    fn value(&self) -> T {
        self.get()
    }
    fn on_value_change(&self, f: Rc<dyn Fn(&T)>) -> Subscription {
        self.subscribe(move |c: &ValueChange<T>| f(c.new_value()))
    }
}
impl<T: PropertyEq + Clone + 'static> WritableProperty for ValueProperty<T> {
    fn set_value(&self, value: T) {
        self.set(value);
    }
}

impl<T: 'static> Property for ListProperty<T> {
    type Value = Vec<T>;
}
impl<T: Clone + 'static> ReadableProperty for ListProperty<T> {
    fn value(&self) -> Vec<T> {
        self.to_vec()
    }
    fn on_value_change(&self, f: Rc<dyn Fn(&Vec<T>)>) -> Subscription {
        self.subscribe(move |c: &ListChange<T>| f(&c.source().to_vec()))
    }
}

impl<T: 'static> Property for SetProperty<T> {
    type Value = IndexSet<T>;
}
impl<T: Hash + Eq + Clone + 'static> ReadableProperty for SetProperty<T> {
    fn value(&self) -> IndexSet<T> {
        self.to_set()
    }
    fn on_value_change(&self, f: Rc<dyn Fn(&IndexSet<T>)>) -> Subscription {
        self.subscribe(move |c: &SetChange<T>| f(&c.source().to_set()))
    }
}

impl<K: 'static, V: 'static> Property for MapProperty<K, V> {
    type Value = IndexMap<K, V>;
}
impl<K: Hash + Eq + Clone + 'static, V: Clone + 'static> ReadableProperty for MapProperty<K, V> {
    fn value(&self) -> IndexMap<K, V> {
        self.to_map()
    }
    fn on_value_change(&self, f: Rc<dyn Fn(&IndexMap<K, V>)>) -> Subscription {
        self.subscribe(move |c: &MapChange<K, V>| f(&c.source().to_map()))
    }
}
