use thiserror::Error;

/// Caller input violations reported by [`LocalPool`](crate::LocalPool) and
/// [`Pool`](crate::Pool).
///
/// Every variant reflects a logic bug in the calling code rather than a
/// transient condition, so none of them are worth retrying.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// `acquire` or `prefill` was called with a null template.
    #[error("trying to acquire from a null template")]
    NullTemplate,

    /// The released instance was never issued by any pool.
    #[error("trying to release an object not created by a pool")]
    NotPoolManaged,

    /// The released instance was issued by a different pool.
    #[error("trying to release an object created by another pool")]
    WrongPool,

    /// The template the released instance was created from is null.
    #[error("trying to release an object created from a null template")]
    NoSourceTemplate,

    /// The released instance is already available in its free list.
    #[error("trying to release the same object twice")]
    DoubleRelease,
}

impl Error {
    /// Always `false`: retrying the same call fails the same way.
    #[inline(always)]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Copy, std::error::Error);

    #[test]
    fn messages_name_the_violation() {
        assert_eq!(
            Error::DoubleRelease.to_string(),
            "trying to release the same object twice"
        );
        assert_eq!(
            Error::WrongPool.to_string(),
            "trying to release an object created by another pool"
        );
    }

    #[test]
    fn nothing_is_retryable() {
        for error in [
            Error::NullTemplate,
            Error::NotPoolManaged,
            Error::WrongPool,
            Error::NoSourceTemplate,
            Error::DoubleRelease,
        ] {
            assert!(!error.is_retryable());
        }
    }
}
