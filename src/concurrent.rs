use crate::{
    builder::Settings,
    stamp::{check_release, Slot, Stamp},
    Error, Event, PoolBuilder, PoolHost, PoolId, Template,
};
use alloc::{fmt, sync::Arc};
use core::ops::Deref;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// A struct representing a template-keyed object pool that can be shared
/// between threads.
///
/// Behaves like [`LocalPool`](crate::LocalPool). Every acquire, release and
/// prefill runs as one critical section, from the free-list lookup through the
/// host hooks to the last notification, so listeners observe instances in call
/// order across threads.
///
/// Host hooks and listeners run while that section is held. They may inspect
/// the pool (`available`, `owns`, ...) but must not call [`Pool::acquire`],
/// [`Pool::release`] or [`Pool::prefill`] on the same pool: doing so
/// deadlocks.
pub struct Pool<K: Template, H: PoolHost<K>> {
    id: PoolId,
    name: Option<String>,
    host: H,
    holding_area: H::HoldingArea,
    free_list_capacity: usize,
    sequence: Mutex<()>,
    free_lists: Mutex<HashMap<K, Vec<Instance<K, H::Object>>>>,
    on_created: Event<Instance<K, H::Object>>,
    on_acquired: Event<Instance<K, H::Object>>,
    on_released: Event<Instance<K, H::Object>>,
}

impl<K: Template, H: PoolHost<K>> Pool<K, H>
where
    H::HoldingArea: Default,
{
    /// Creates a new Pool with default settings and a default holding area.
    pub fn new(host: H) -> Self {
        Self::builder(host, H::HoldingArea::default()).build()
    }
}

impl<K: Template, H: PoolHost<K>> Pool<K, H> {
    /// Starts configuring a Pool that keeps available instances in
    /// `holding_area`.
    pub fn builder(host: H, holding_area: H::HoldingArea) -> PoolBuilder<K, H> {
        PoolBuilder::new(host, holding_area)
    }

    pub(crate) fn from_settings(settings: Settings<H, H::HoldingArea>) -> Self {
        Pool {
            id: PoolId::next(),
            name: settings.name,
            host: settings.host,
            holding_area: settings.holding_area,
            free_list_capacity: settings.free_list_capacity,
            sequence: Mutex::new(()),
            free_lists: Mutex::new(HashMap::new()),
            on_created: Event::new(),
            on_acquired: Event::new(),
            on_released: Event::new(),
        }
    }

    /// Wraps the pool with an atomic reference counter so it can be shared
    /// across threads.
    pub fn to_rc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Gets an instance of `template`.
    ///
    /// See [`LocalPool::acquire`](crate::LocalPool::acquire). Concurrent
    /// acquisitions are serialized, construction included.
    pub fn acquire(&self, template: &K) -> Result<Instance<K, H::Object>, H::Error> {
        if template.is_null() {
            return Err(Error::NullTemplate.into());
        }

        let _sequence = self.sequence.lock();
        let recycled = self.pop_available(template);
        let instance = match recycled {
            Some(instance) => {
                trace!(pool = %self.id, name = self.name.as_deref(), ?template, "reusing available instance");
                instance
            }
            None => self.create(template)?,
        };

        self.host.set_held(&instance);
        self.on_acquired.emit(&instance);
        Ok(instance)
    }

    /// Returns an instance to the pool.
    ///
    /// See [`LocalPool::release`](crate::LocalPool::release). The duplicate
    /// check and the push happen under the same lock, so of two threads
    /// releasing the same instance exactly one succeeds.
    pub fn release(&self, instance: &Instance<K, H::Object>) -> Result<(), Error> {
        let template = check_release(instance.stamp(), self.id).inspect_err(|error| {
            warn!(pool = %self.id, name = self.name.as_deref(), %error, "rejected release");
        })?;

        let _sequence = self.sequence.lock();
        {
            let mut free_lists = self.free_lists.lock();
            let free_list = free_lists
                .entry(template.clone())
                .or_insert_with(|| Vec::with_capacity(self.free_list_capacity));
            if free_list
                .iter()
                .any(|available| Instance::ptr_eq(available, instance))
            {
                drop(free_lists);
                warn!(pool = %self.id, name = self.name.as_deref(), ?template, error = %Error::DoubleRelease, "rejected release");
                return Err(Error::DoubleRelease);
            }
            free_list.push(instance.clone());
        }
        self.host.set_available(instance, &self.holding_area);

        trace!(pool = %self.id, name = self.name.as_deref(), ?template, "released instance");
        self.on_released.emit(instance);
        Ok(())
    }

    /// Constructs `count` instances of `template` up front and makes them
    /// available.
    ///
    /// See [`LocalPool::prefill`](crate::LocalPool::prefill).
    pub fn prefill(&self, template: &K, count: usize) -> Result<(), H::Error> {
        if template.is_null() {
            return Err(Error::NullTemplate.into());
        }

        let _sequence = self.sequence.lock();
        for _ in 0..count {
            let instance = self.create(template)?;
            self.host.set_available(&instance, &self.holding_area);
            self.free_lists
                .lock()
                .entry(template.clone())
                .or_insert_with(|| Vec::with_capacity(self.free_list_capacity))
                .push(instance);
        }
        debug!(pool = %self.id, name = self.name.as_deref(), ?template, count, "prefilled");
        Ok(())
    }

    fn pop_available(&self, template: &K) -> Option<Instance<K, H::Object>> {
        let mut free_lists = self.free_lists.lock();
        match free_lists.get_mut(template) {
            Some(free_list) => free_list.pop(),
            None => {
                free_lists.insert(
                    template.clone(),
                    Vec::with_capacity(self.free_list_capacity),
                );
                None
            }
        }
    }

    fn create(&self, template: &K) -> Result<Instance<K, H::Object>, H::Error> {
        let obj = self.host.construct(template, &self.holding_area)?;
        let instance = Instance::stamped(
            obj,
            Stamp {
                pool: self.id,
                template: template.clone(),
            },
        );
        debug!(pool = %self.id, name = self.name.as_deref(), ?template, "constructed new instance");
        self.on_created.emit(&instance);
        Ok(instance)
    }

    /// Notifications for every instance the host constructs for this pool.
    pub fn on_created(&self) -> &Event<Instance<K, H::Object>> {
        &self.on_created
    }

    /// Notifications for every instance handed out by [`Self::acquire`].
    pub fn on_acquired(&self) -> &Event<Instance<K, H::Object>> {
        &self.on_acquired
    }

    /// Notifications for every instance accepted by [`Self::release`].
    pub fn on_released(&self) -> &Event<Instance<K, H::Object>> {
        &self.on_released
    }

    /// The identity stamped on every instance this pool creates.
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// The label set through [`PoolBuilder::name`], if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Borrows the host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Borrows the holding area available instances are parked in.
    pub fn holding_area(&self) -> &H::HoldingArea {
        &self.holding_area
    }

    /// Checks if `instance` was created by this pool.
    pub fn owns(&self, instance: &Instance<K, H::Object>) -> bool {
        instance.pool_id() == Some(self.id)
    }

    /// Gets the number of instances of `template` ready to be recycled.
    pub fn available(&self, template: &K) -> usize {
        self.free_lists.lock().get(template).map_or(0, Vec::len)
    }

    /// Gets the number of instances ready to be recycled, across all
    /// templates.
    pub fn total_available(&self) -> usize {
        self.free_lists.lock().values().map(Vec::len).sum()
    }

    /// Checks if the pool has nothing to recycle for any template.
    pub fn is_empty(&self) -> bool {
        self.free_lists.lock().values().all(Vec::is_empty)
    }
}

impl<K: Template, H: PoolHost<K>> fmt::Debug for Pool<K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let templates = self.free_lists.lock().len();
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("templates", &templates)
            .field("available", &self.total_available())
            .finish()
    }
}

/// A shared handle to an object issued by a [`Pool`].
///
/// The thread-safe counterpart of [`LocalInstance`](crate::LocalInstance).
pub struct Instance<K, T> {
    slot: Arc<Slot<K, T>>,
}

impl<K, T> Instance<K, T> {
    /// Wraps an object the host created on its own. Pools refuse to take
    /// such instances back.
    pub fn unmanaged(obj: T) -> Self {
        Instance {
            slot: Arc::new(Slot { obj, stamp: None }),
        }
    }

    fn stamped(obj: T, stamp: Stamp<K>) -> Self {
        Instance {
            slot: Arc::new(Slot {
                obj,
                stamp: Some(stamp),
            }),
        }
    }

    fn stamp(&self) -> Option<&Stamp<K>> {
        self.slot.stamp.as_ref()
    }

    /// Checks if both handles refer to the same instance.
    #[inline(always)]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.slot, &other.slot)
    }

    /// Checks if the instance was created by a pool.
    pub fn is_pool_managed(&self) -> bool {
        self.slot.stamp.is_some()
    }

    /// The pool that created the instance.
    pub fn pool_id(&self) -> Option<PoolId> {
        self.stamp().map(|stamp| stamp.pool)
    }

    /// The template the instance was created from.
    pub fn template(&self) -> Option<&K> {
        self.stamp().map(|stamp| &stamp.template)
    }
}

impl<K, T> Clone for Instance<K, T> {
    fn clone(&self) -> Self {
        Instance {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<K, T> Deref for Instance<K, T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.slot.obj
    }
}

impl<K, T> AsRef<T> for Instance<K, T> {
    #[inline(always)]
    fn as_ref(&self) -> &T {
        self
    }
}

impl<K: fmt::Debug, T: fmt::Debug> fmt::Debug for Instance<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("obj", &self.slot.obj)
            .field("pool", &self.pool_id())
            .field("template", &self.template())
            .finish()
    }
}

impl<K, T> fmt::Pointer for Instance<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&Arc::as_ptr(&self.slot), f)
    }
}
