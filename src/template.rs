use core::{any::TypeId, fmt, hash::Hash};
use alloc::{rc::Rc, sync::Arc};

/// Identity of the kind of object a pool produces.
///
/// Templates key the free lists, so they must be comparable and hashable.
/// The pool clones a template once per free list and once per issued instance,
/// which means cheap clones (ids, interned strings, `Arc`s) work best.
///
/// A template may report itself as null. Null templates are rejected by
/// acquisition, and instances whose template has become null since they were
/// issued are rejected on release.
pub trait Template: Eq + Hash + Clone + fmt::Debug {
    /// Returns `true` if this template does not identify anything.
    ///
    /// By default, templates are never null.
    #[inline(always)]
    fn is_null(&self) -> bool {
        false
    }
}

impl Template for String {
    #[inline(always)]
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

impl Template for &'static str {
    #[inline(always)]
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

impl Template for Arc<str> {
    #[inline(always)]
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

impl Template for Rc<str> {
    #[inline(always)]
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Template> Template for Option<T> {
    #[inline(always)]
    fn is_null(&self) -> bool {
        self.as_ref().map_or(true, Template::is_null)
    }
}

macro_rules! never_null {
    ($($ty:ty),*) => {
        $(impl Template for $ty {})*
    };
}

never_null!(u8, u16, u32, u64, u128, usize, char, TypeId);
