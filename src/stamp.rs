use crate::{Error, Template};
use core::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a pool.
///
/// Every instance a pool issues is stamped with the pool's id, which is how a
/// pool recognizes instances that belong to somebody else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u64);

impl PoolId {
    pub(crate) fn next() -> Self {
        PoolId(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// Metadata attached to an instance when a pool creates it. Never changes
/// afterwards.
#[derive(Clone, Debug)]
pub(crate) struct Stamp<K> {
    pub(crate) pool: PoolId,
    pub(crate) template: K,
}

/// Storage behind an instance handle.
pub(crate) struct Slot<K, T> {
    pub(crate) obj: T,
    pub(crate) stamp: Option<Stamp<K>>,
}

/// Runs the ownership checks a release performs before touching any free
/// list, returning the template whose free list receives the instance.
pub(crate) fn check_release<K: Template>(
    stamp: Option<&Stamp<K>>,
    pool: PoolId,
) -> Result<&K, Error> {
    let stamp = stamp.ok_or(Error::NotPoolManaged)?;
    if stamp.pool != pool {
        return Err(Error::WrongPool);
    }
    if stamp.template.is_null() {
        return Err(Error::NoSourceTemplate);
    }
    Ok(&stamp.template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = PoolId::next();
        let b = PoolId::next();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("pool#"));
    }

    #[test]
    fn checks_run_in_order() {
        let here = PoolId::next();
        let there = PoolId::next();

        assert_eq!(check_release::<&str>(None, here), Err(Error::NotPoolManaged));

        // A foreign stamp wins over a null template.
        let foreign = Stamp { pool: there, template: "" };
        assert_eq!(check_release(Some(&foreign), here), Err(Error::WrongPool));

        let orphan = Stamp { pool: here, template: "" };
        assert_eq!(check_release(Some(&orphan), here), Err(Error::NoSourceTemplate));

        let valid = Stamp { pool: here, template: "crate" };
        assert_eq!(check_release(Some(&valid), here), Ok(&"crate"));
    }
}
