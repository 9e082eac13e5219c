use alloc::{rc::Rc, sync::Arc};
use core::{
    cell::RefCell,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};
use parking_lot::RwLock;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by `subscribe`, used to remove the listener again.
///
/// Ids are unique across all channels, so an id never removes a listener
/// from a channel it was not registered on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

type LocalListener<I> = Rc<dyn Fn(&I)>;

/// A single-threaded notification channel.
///
/// Listeners are invoked synchronously, in registration order. The listener
/// list is snapshotted before each emission: listeners added or removed while
/// an emission is running take effect from the next one.
pub struct LocalEvent<I> {
    listeners: RefCell<Vec<(ListenerId, LocalListener<I>)>>,
}

impl<I> LocalEvent<I> {
    pub(crate) fn new() -> Self {
        LocalEvent {
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Registers a listener and returns the id that removes it.
    pub fn subscribe(&self, listener: impl Fn(&I) + 'static) -> ListenerId {
        let id = ListenerId::next();
        let listener: LocalListener<I> = Rc::new(listener);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered here.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Checks if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    pub(crate) fn emit(&self, payload: &I) {
        if self.is_empty() {
            return;
        }
        let snapshot: Vec<LocalListener<I>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(payload);
        }
    }
}

impl<I> fmt::Debug for LocalEvent<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEvent")
            .field("listeners", &self.len())
            .finish()
    }
}

type SharedListener<I> = Arc<dyn Fn(&I) + Send + Sync>;

/// A thread-safe notification channel.
///
/// Same delivery rules as [`LocalEvent`]. Listeners run on the thread that
/// triggered the notification, outside of any lock held by the channel.
pub struct Event<I> {
    listeners: RwLock<Vec<(ListenerId, SharedListener<I>)>>,
}

impl<I> Event<I> {
    pub(crate) fn new() -> Self {
        Event {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Registers a listener and returns the id that removes it.
    pub fn subscribe(&self, listener: impl Fn(&I) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId::next();
        let listener: SharedListener<I> = Arc::new(listener);
        self.listeners.write().push((id, listener));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered here.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Checks if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    pub(crate) fn emit(&self, payload: &I) {
        let snapshot: Vec<SharedListener<I>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(payload);
        }
    }
}

impl<I> fmt::Debug for Event<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("listeners", &self.len())
            .finish()
    }
}
