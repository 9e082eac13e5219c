use crate::Error;
use core::{fmt, marker::PhantomData};

/// A trait defining the collaborator a pool relies on to build and toggle
/// objects.
///
/// The pool only does bookkeeping: it decides when an object is constructed,
/// handed out or taken back. How objects are built, activated, parented or
/// hidden is up to the host.
pub trait PoolHost<K> {
    /// The objects produced from templates.
    type Object;

    /// Host-side location where available objects are kept until they are
    /// reacquired. Created once, when the pool is built.
    type HoldingArea;

    /// Error returned by [`Self::construct`].
    ///
    /// Pool argument errors are converted into this type, so acquisition
    /// returns construction errors untouched next to the pool's own errors.
    /// Hosts whose construction cannot fail can use [`Error`] directly.
    type Error: From<Error>;

    /// Creates a new object from `template`.
    fn construct(
        &self,
        template: &K,
        holding_area: &Self::HoldingArea,
    ) -> Result<Self::Object, Self::Error>;

    /// Restores the active or usable state of an object that is about to be
    /// handed to a caller.
    ///
    /// By default, this method does nothing.
    #[inline(always)]
    fn set_held(&self, _obj: &Self::Object) {}

    /// Moves an object that was just released under the holding area and
    /// deactivates it.
    ///
    /// By default, this method does nothing.
    #[inline(always)]
    fn set_available(&self, _obj: &Self::Object, _holding_area: &Self::HoldingArea) {}
}

/// A [`PoolHost`] built from a closure, for objects that need no activation
/// handling and cannot fail to construct.
///
/// Created with [`host_fn`].
pub struct FnHost<F, T> {
    construct: F,
    _obj: PhantomData<fn() -> T>,
}

/// Creates a [`PoolHost`] that constructs objects by calling `construct` with
/// the template.
pub fn host_fn<K, T, F>(construct: F) -> FnHost<F, T>
where
    F: Fn(&K) -> T,
{
    FnHost {
        construct,
        _obj: PhantomData,
    }
}

impl<K, T, F> PoolHost<K> for FnHost<F, T>
where
    F: Fn(&K) -> T,
{
    type Object = T;
    type HoldingArea = ();
    type Error = Error;

    #[inline(always)]
    fn construct(&self, template: &K, _holding_area: &()) -> Result<T, Error> {
        Ok((self.construct)(template))
    }
}

impl<F, T> fmt::Debug for FnHost<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHost")
            .field("object_type", &core::any::type_name::<T>())
            .finish()
    }
}
