use std::rc::Rc;

use crate::{ReadableProperty, Subscription, WritableProperty};


/// Starts a one-way binding from `master`.
///
/// ```
/// use obsprop::{bind, ValueProperty};
///
/// let celsius = ValueProperty::new(20);
/// let fahrenheit = ValueProperty::new(0);
/// let _binding = bind(&celsius).map(|c| c * 9 / 5 + 32).to(&fahrenheit);
/// assert_eq!(fahrenheit.get(), 68);
///
/// celsius.set(100);
/// assert_eq!(fahrenheit.get(), 212);
/// ```
pub fn bind<M>(master: &M) -> Binder<'_, M, M::Value>
where
    M: ReadableProperty + ?Sized + 'static,
    M::Value: Clone + 'static,
{
    Binder {
        master,
        transform: Rc::new(|value: &M::Value| value.clone()),
    }
}

/// Builder returned by [`bind`].
#[must_use]
pub struct Binder<'a, M: ReadableProperty + ?Sized, U> {
    master: &'a M,
    transform: Rc<dyn Fn(&M::Value) -> U>,
}

impl<'a, M, U> Binder<'a, M, U>
where
    M: ReadableProperty + ?Sized + 'static,
    M::Value: 'static,
    U: 'static,
{
    /// Applies `f` to every value before it reaches the target.
    pub fn map<W: 'static>(self, f: impl Fn(U) -> W + 'static) -> Binder<'a, M, W> {
        let transform = self.transform;
        Binder {
            master: self.master,
            transform: Rc::new(move |value: &M::Value| f(transform(value))),
        }
    }

    /// Writes the current value to `slave`, then every later change of the master.
    pub fn to<S>(self, slave: &S) -> Binding
    where
        S: WritableProperty<Value = U> + Clone + 'static,
    {
        slave.set_value((self.transform)(&self.master.value()));
        let transform = self.transform;
        let slave = slave.clone();
        Binding(self.master.on_value_change(Rc::new(move |value: &M::Value| {
            slave.set_value(transform(value))
        })))
    }
}

/// A live binding created by [`Binder::to`].
///
/// Propagation stops when the binding is dropped or [`unbind`](Self::unbind) is called.
#[must_use]
pub struct Binding(Subscription);

impl Binding {
    pub fn is_bound(&self) -> bool {
        !self.0.is_empty()
    }
    pub fn unbind(self) {
        drop(self)
    }
    /// Keeps the binding alive for as long as the master exists.
    pub fn detach(self) {
        self.0.detach()
    }
}
