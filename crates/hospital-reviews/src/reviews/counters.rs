use super::aggregator::KeyedLocks;
use super::domain::{ReviewCounters, ReviewId};
use super::repository::{RepositoryError, ReviewStore};

/// Keeps the per-review counters equal to their source rows.
///
/// Reaction and comment recounts both rewrite the counter triple, so they share one
/// lock per review.
#[derive(Debug, Default)]
pub struct CounterMaterializer {
    locks: KeyedLocks<ReviewId>,
}

impl CounterMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn serialized<T>(&self, review: ReviewId, f: impl FnOnce() -> T) -> T {
        self.locks.with(review, f)
    }

    /// Recount likes and dislikes for a review.
    pub fn refresh_reactions<S>(
        &self,
        store: &S,
        review: ReviewId,
    ) -> Result<ReviewCounters, RepositoryError>
    where
        S: ReviewStore + ?Sized,
    {
        self.serialized(review, || recount_reactions(store, review))
    }

    /// Recount comments for a review.
    pub fn refresh_comments<S>(
        &self,
        store: &S,
        review: ReviewId,
    ) -> Result<ReviewCounters, RepositoryError>
    where
        S: ReviewStore + ?Sized,
    {
        self.serialized(review, || recount_comments(store, review))
    }
}

/// Caller must hold the review's counter lock.
pub(crate) fn recount_reactions<S>(
    store: &S,
    review: ReviewId,
) -> Result<ReviewCounters, RepositoryError>
where
    S: ReviewStore + ?Sized,
{
    let current = current_counters(store, review)?;
    let rows = store.reactions_for_review(review)?;
    let like_count = rows.iter().filter(|row| row.is_like).count() as u32;
    let counters = ReviewCounters {
        like_count,
        dislike_count: rows.len() as u32 - like_count,
        ..current
    };
    store.save_review_counters(review, counters)?;
    Ok(counters)
}

/// Caller must hold the review's counter lock.
pub(crate) fn recount_comments<S>(
    store: &S,
    review: ReviewId,
) -> Result<ReviewCounters, RepositoryError>
where
    S: ReviewStore + ?Sized,
{
    let current = current_counters(store, review)?;
    let counters = ReviewCounters {
        comment_count: store.comments_for_review(review)?.len() as u32,
        ..current
    };
    store.save_review_counters(review, counters)?;
    Ok(counters)
}

fn current_counters<S>(store: &S, review: ReviewId) -> Result<ReviewCounters, RepositoryError>
where
    S: ReviewStore + ?Sized,
{
    store
        .fetch_review(review)?
        .map(|review| review.counters)
        .ok_or(RepositoryError::NotFound)
}
