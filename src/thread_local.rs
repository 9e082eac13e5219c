use crate::{
    builder::Settings,
    stamp::{check_release, Slot, Stamp},
    Error, LocalEvent, LocalPoolBuilder, PoolHost, PoolId, Template,
};
use alloc::{fmt, rc::Rc};
use core::{cell::RefCell, ops::Deref};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// A struct representing a template-keyed object pool for the local thread,
/// it cannot be moved between threads.
///
/// Objects are constructed by a [`PoolHost`] the first time a template has
/// nothing available, and recycled afterwards: a released instance is the
/// first one handed out again for its template.
pub struct LocalPool<K: Template, H: PoolHost<K>> {
    id: PoolId,
    name: Option<String>,
    host: H,
    holding_area: H::HoldingArea,
    free_list_capacity: usize,
    free_lists: RefCell<HashMap<K, Vec<LocalInstance<K, H::Object>>>>,
    on_created: LocalEvent<LocalInstance<K, H::Object>>,
    on_acquired: LocalEvent<LocalInstance<K, H::Object>>,
    on_released: LocalEvent<LocalInstance<K, H::Object>>,
}

impl<K: Template, H: PoolHost<K>> LocalPool<K, H>
where
    H::HoldingArea: Default,
{
    /// Creates a new LocalPool with default settings and a default holding
    /// area.
    pub fn new(host: H) -> Self {
        Self::builder(host, H::HoldingArea::default()).build()
    }
}

impl<K: Template, H: PoolHost<K>> LocalPool<K, H> {
    /// Starts configuring a LocalPool that keeps available instances in
    /// `holding_area`.
    pub fn builder(host: H, holding_area: H::HoldingArea) -> LocalPoolBuilder<K, H> {
        LocalPoolBuilder::new(host, holding_area)
    }

    pub(crate) fn from_settings(settings: Settings<H, H::HoldingArea>) -> Self {
        LocalPool {
            id: PoolId::next(),
            name: settings.name,
            host: settings.host,
            holding_area: settings.holding_area,
            free_list_capacity: settings.free_list_capacity,
            free_lists: RefCell::new(HashMap::new()),
            on_created: LocalEvent::new(),
            on_acquired: LocalEvent::new(),
            on_released: LocalEvent::new(),
        }
    }

    /// Wraps the pool with a reference counter so it can be shared by
    /// several owners on the same thread.
    pub fn to_rc(self) -> Rc<Self> {
        Rc::new(self)
    }

    /// Gets an instance of `template`.
    ///
    /// The most recently released instance of `template` is reused if there
    /// is one. Otherwise a new one is constructed by the host and announced
    /// through [`Self::on_created`]. Either way the host is asked to make the
    /// instance usable and [`Self::on_acquired`] fires before it is returned.
    ///
    /// Fails with [`Error::NullTemplate`] before anything else happens if
    /// `template` is null. Construction errors are returned as the host
    /// produced them.
    pub fn acquire(&self, template: &K) -> Result<LocalInstance<K, H::Object>, H::Error> {
        if template.is_null() {
            return Err(Error::NullTemplate.into());
        }

        let instance = match self.pop_available(template) {
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
    /// The instance is pushed onto its template's free list, handed to the
    /// host to be parked in the holding area, and announced through
    /// [`Self::on_released`].
    ///
    /// The instance must have been acquired from this pool, its template
    /// must still be valid, and it must not be available already. A rejected
    /// release leaves the pool untouched.
    pub fn release(&self, instance: &LocalInstance<K, H::Object>) -> Result<(), Error> {
        let template = check_release(instance.stamp(), self.id).inspect_err(|error| {
            warn!(pool = %self.id, name = self.name.as_deref(), %error, "rejected release");
        })?;

        {
            let mut free_lists = self.free_lists.borrow_mut();
            let free_list = free_lists
                .entry(template.clone())
                .or_insert_with(|| Vec::with_capacity(self.free_list_capacity));
            if free_list
                .iter()
                .any(|available| LocalInstance::ptr_eq(available, instance))
            {
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
    /// Each new instance is announced through [`Self::on_created`]. On a
    /// construction error, the instances built so far stay available.
    pub fn prefill(&self, template: &K, count: usize) -> Result<(), H::Error> {
        if template.is_null() {
            return Err(Error::NullTemplate.into());
        }

        for _ in 0..count {
            let instance = self.create(template)?;
            self.host.set_available(&instance, &self.holding_area);
            self.free_lists
                .borrow_mut()
                .entry(template.clone())
                .or_insert_with(|| Vec::with_capacity(self.free_list_capacity))
                .push(instance);
        }
        debug!(pool = %self.id, name = self.name.as_deref(), ?template, count, "prefilled");
        Ok(())
    }

    fn pop_available(&self, template: &K) -> Option<LocalInstance<K, H::Object>> {
        let mut free_lists = self.free_lists.borrow_mut();
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

    fn create(&self, template: &K) -> Result<LocalInstance<K, H::Object>, H::Error> {
        let obj = self.host.construct(template, &self.holding_area)?;
        let instance = LocalInstance::stamped(
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
    pub fn on_created(&self) -> &LocalEvent<LocalInstance<K, H::Object>> {
        &self.on_created
    }

    /// Notifications for every instance handed out by [`Self::acquire`].
    pub fn on_acquired(&self) -> &LocalEvent<LocalInstance<K, H::Object>> {
        &self.on_acquired
    }

    /// Notifications for every instance accepted by [`Self::release`].
    pub fn on_released(&self) -> &LocalEvent<LocalInstance<K, H::Object>> {
        &self.on_released
    }

    /// The identity stamped on every instance this pool creates.
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// The label set through [`LocalPoolBuilder::name`], if any.
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
    pub fn owns(&self, instance: &LocalInstance<K, H::Object>) -> bool {
        instance.pool_id() == Some(self.id)
    }

    /// Gets the number of instances of `template` ready to be recycled.
    pub fn available(&self, template: &K) -> usize {
        self.free_lists
            .borrow()
            .get(template)
            .map_or(0, Vec::len)
    }

    /// Gets the number of instances ready to be recycled, across all
    /// templates.
    pub fn total_available(&self) -> usize {
        self.free_lists.borrow().values().map(Vec::len).sum()
    }

    /// Checks if the pool has nothing to recycle for any template.
    pub fn is_empty(&self) -> bool {
        self.free_lists.borrow().values().all(Vec::is_empty)
    }
}

impl<K: Template, H: PoolHost<K>> fmt::Debug for LocalPool<K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalPool")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("templates", &self.free_lists.borrow().len())
            .field("available", &self.total_available())
            .finish()
    }
}

/// A shared handle to an object issued by a [`LocalPool`].
///
/// Cloning the handle does not clone the object: all clones refer to the
/// same instance, and the pool tells instances apart by handle identity.
/// Objects that need to change while held should use interior mutability.
pub struct LocalInstance<K, T> {
    slot: Rc<Slot<K, T>>,
}

impl<K, T> LocalInstance<K, T> {
    /// Wraps an object the host created on its own. Pools refuse to take
    /// such instances back.
    pub fn unmanaged(obj: T) -> Self {
        LocalInstance {
            slot: Rc::new(Slot { obj, stamp: None }),
        }
    }

    fn stamped(obj: T, stamp: Stamp<K>) -> Self {
        LocalInstance {
            slot: Rc::new(Slot {
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
        Rc::ptr_eq(&this.slot, &other.slot)
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

impl<K, T> Clone for LocalInstance<K, T> {
    fn clone(&self) -> Self {
        LocalInstance {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<K, T> Deref for LocalInstance<K, T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.slot.obj
    }
}

impl<K, T> AsRef<T> for LocalInstance<K, T> {
    #[inline(always)]
    fn as_ref(&self) -> &T {
        self
    }
}

impl<K: fmt::Debug, T: fmt::Debug> fmt::Debug for LocalInstance<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalInstance")
            .field("obj", &self.slot.obj)
            .field("pool", &self.pool_id())
            .field("template", &self.template())
            .finish()
    }
}

impl<K, T> fmt::Pointer for LocalInstance<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&Rc::as_ptr(&self.slot), f)
    }
}
