//! Optimistic update with snapshot-and-revert.
//!
//! Capture the current value, write the optimistic one, then either confirm
//! (drop the snapshot) or revert (restore it) once the remote call settles.
//! Callers refetch authoritative state after settling either way.

use std::future::Future;

/// Snapshot of a value taken before an optimistic write.
#[derive(Debug)]
#[must_use = "an optimistic update must be confirmed or reverted"]
pub struct Optimistic<T> {
    snapshot: T,
}

impl<T> Optimistic<T> {
    /// Replace `slot` with `value`, keeping the previous value for revert.
    pub fn apply(slot: &mut T, value: T) -> Self {
        let snapshot = std::mem::replace(slot, value);
        Self { snapshot }
    }

    /// The remote write succeeded; forget the snapshot.
    pub fn confirm(self) {}

    /// The remote write failed; put the snapshot back.
    pub fn revert(self, slot: &mut T) {
        *slot = self.snapshot;
    }

    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }
}

/// Apply `value` to `slot`, run `commit`, and restore the old value on error.
pub async fn optimistic_update<T, E, F, Fut>(slot: &mut T, value: T, commit: F) -> Result<(), E>
where
    T: Clone,
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let pending = Optimistic::apply(slot, value.clone());
    match commit(value).await {
        Ok(()) => {
            pending.confirm();
            Ok(())
        }
        Err(e) => {
            pending.revert(slot);
            Err(e)
        }
    }
}
