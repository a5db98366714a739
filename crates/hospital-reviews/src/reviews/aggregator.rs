use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, LockResult, Mutex, MutexGuard};

use tracing::debug;

use super::domain::{HospitalAggregate, HospitalId};
use super::rating::AggregateRating;
use super::repository::{RepositoryError, ReviewStore};

/// Per-key serialization so read-then-write recomputations on one key never interleave.
#[derive(Debug)]
pub(crate) struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Copy,
{
    /// Run `f` while holding the lock for `key`. The slot is evicted once no other
    /// caller holds or waits on it.
    pub(crate) fn with<T>(&self, key: K, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = recover(self.slots.lock());
            slots.entry(key).or_default().clone()
        };
        let result = {
            let _guard = recover(slot.lock());
            f()
        };

        let mut slots = recover(self.slots.lock());
        // Clones are only taken under `slots`, so two references means the map and us.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(&key);
        }
        result
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        recover(self.slots.lock()).len()
    }
}

fn recover<'a, T>(result: LockResult<MutexGuard<'a, T>>) -> MutexGuard<'a, T> {
    result.unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Recomputes a hospital's mean rating and review count from its review rows.
#[derive(Debug, Default)]
pub struct RatingAggregator {
    locks: KeyedLocks<HospitalId>,
}

impl RatingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recompute<S>(
        &self,
        store: &S,
        hospital: HospitalId,
    ) -> Result<HospitalAggregate, RepositoryError>
    where
        S: ReviewStore + ?Sized,
    {
        self.locks.with(hospital, || {
            let reviews = store.reviews_for_hospital(hospital)?;
            let aggregate = HospitalAggregate {
                rating: AggregateRating::mean_of(reviews.iter().map(|review| review.rating)),
                review_count: reviews.len() as u32,
            };
            store.save_hospital_aggregate(hospital, aggregate)?;
            debug!(
                hospital_id = %hospital,
                review_count = aggregate.review_count,
                rating = ?aggregate.rating.map(AggregateRating::value),
                "hospital aggregate recomputed"
            );
            Ok(aggregate)
        })
    }
}
