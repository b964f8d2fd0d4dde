use std::{
    any::Any,
    cell::{Cell, RefCell},
    fmt,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use crate::{Change, DispatchPolicy, PropertyConfig};


/// Identifies a listener registered on a property.
///
/// Keys are never reused by the property that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey(u64);

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type ListenerFn<E> = Rc<dyn Fn(&E)>;

/// Listeners of one property, in registration order.
pub(crate) struct Listeners<E: 'static> {
    entries: RefCell<Vec<(ListenerKey, ListenerFn<E>)>>,
    next_key: Cell<u64>,
}

impl<E: Change + 'static> Listeners<E> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_key: Cell::new(0),
        }
    }

    pub fn insert(&self, f: ListenerFn<E>) -> ListenerKey {
        let key = ListenerKey(self.next_key.get());
        self.next_key.set(key.0 + 1);
        self.entries.borrow_mut().push((key, f));
        key
    }

    pub fn remove(&self, key: ListenerKey) -> bool {
        let mut entries = self.entries.borrow_mut();
        if let Some(index) = entries.iter().position(|(k, _)| *k == key) {
            entries.remove(index);
            true
        } else {
            false
        }
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.entries.borrow_mut();
        let len = entries.len();
        entries.clear();
        len
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Calls every listener registered at the time of the call.
    ///
    /// Listeners added or removed while dispatching take effect from the next call.
    pub fn notify(&self, event: &E, config: &PropertyConfig) {
        let snapshot: Vec<_> = self
            .entries
            .borrow()
            .iter()
            .map(|(key, f)| (*key, f.clone()))
            .collect();
        if snapshot.is_empty() {
            return;
        }
        tracing::trace!(
            property = config.display_name(),
            kind = %event.kind(),
            listeners = snapshot.len(),
            "dispatching change"
        );
        for (key, f) in snapshot {
            match config.dispatch {
                DispatchPolicy::FailFast => f(event),
                DispatchPolicy::Isolate => {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(event))) {
                        tracing::error!(
                            property = config.display_name(),
                            listener = %key,
                            message = panic_message(&*payload),
                            "listener panicked"
                        );
                    }
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}
