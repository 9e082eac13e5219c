use crate::{LocalPool, Pool, PoolHost, Template};
use core::{fmt, marker::PhantomData};

/// Settings shared by both pool flavours.
pub(crate) struct Settings<H, A> {
    pub(crate) host: H,
    pub(crate) holding_area: A,
    pub(crate) name: Option<String>,
    pub(crate) free_list_capacity: usize,
}

impl<H, A> Settings<H, A> {
    fn new(host: H, holding_area: A) -> Self {
        Settings {
            host,
            holding_area,
            name: None,
            free_list_capacity: 0,
        }
    }

    fn debug_fields(&self, f: &mut fmt::DebugStruct<'_, '_>) {
        f.field("name", &self.name)
            .field("free_list_capacity", &self.free_list_capacity);
    }
}

/// Builder for creating a [`LocalPool`].
///
/// You only need this builder to name the pool or tune its free lists. The
/// default configuration used by [`LocalPool::new`] is sufficient otherwise.
///
/// ```
/// use keyed_pool::{host_fn, LocalPool};
///
/// let pool = LocalPool::<&str, _>::builder(host_fn(|name: &&str| name.len()), ())
///     .name("projectiles")
///     .free_list_capacity(64)
///     .build();
/// assert_eq!(*pool.acquire(&"bullet").unwrap(), 6);
/// ```
#[must_use]
pub struct LocalPoolBuilder<K: Template, H: PoolHost<K>> {
    settings: Settings<H, H::HoldingArea>,
    _template: PhantomData<K>,
}

impl<K: Template, H: PoolHost<K>> LocalPoolBuilder<K, H> {
    pub(crate) fn new(host: H, holding_area: H::HoldingArea) -> Self {
        LocalPoolBuilder {
            settings: Settings::new(host, holding_area),
            _template: PhantomData,
        }
    }

    /// Sets a label that is attached to every log event of the pool.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = Some(name.into());
        self
    }

    /// Sets the initial capacity of each per-template free list.
    ///
    /// Free lists grow as needed; this only avoids reallocation for templates
    /// that cycle many instances.
    pub fn free_list_capacity(mut self, capacity: usize) -> Self {
        self.settings.free_list_capacity = capacity;
        self
    }

    /// Builds the pool with the specified configuration.
    #[must_use]
    pub fn build(self) -> LocalPool<K, H> {
        LocalPool::from_settings(self.settings)
    }
}

impl<K: Template, H: PoolHost<K>> fmt::Debug for LocalPoolBuilder<K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("LocalPoolBuilder");
        s.field("template_type", &core::any::type_name::<K>());
        self.settings.debug_fields(&mut s);
        s.finish()
    }
}

/// Builder for creating a [`Pool`].
///
/// Same options as [`LocalPoolBuilder`].
#[must_use]
pub struct PoolBuilder<K: Template, H: PoolHost<K>> {
    settings: Settings<H, H::HoldingArea>,
    _template: PhantomData<K>,
}

impl<K: Template, H: PoolHost<K>> PoolBuilder<K, H> {
    pub(crate) fn new(host: H, holding_area: H::HoldingArea) -> Self {
        PoolBuilder {
            settings: Settings::new(host, holding_area),
            _template: PhantomData,
        }
    }

    /// Sets a label that is attached to every log event of the pool.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = Some(name.into());
        self
    }

    /// Sets the initial capacity of each per-template free list.
    pub fn free_list_capacity(mut self, capacity: usize) -> Self {
        self.settings.free_list_capacity = capacity;
        self
    }

    /// Builds the pool with the specified configuration.
    #[must_use]
    pub fn build(self) -> Pool<K, H> {
        Pool::from_settings(self.settings)
    }
}

impl<K: Template, H: PoolHost<K>> fmt::Debug for PoolBuilder<K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PoolBuilder");
        s.field("template_type", &core::any::type_name::<K>());
        self.settings.debug_fields(&mut s);
        s.finish()
    }
}
