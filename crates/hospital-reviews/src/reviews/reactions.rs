use serde::{Deserialize, Serialize};

use super::domain::{ReviewId, ReviewLike, UserId};
use super::repository::{RepositoryError, ReviewStore};

/// A reaction value submitted by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub const fn from_is_like(is_like: bool) -> Self {
        if is_like {
            Reaction::Like
        } else {
            Reaction::Dislike
        }
    }

    pub const fn is_like(self) -> bool {
        matches!(self, Reaction::Like)
    }
}

/// Reaction state of one (review, user) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReactionState {
    #[default]
    None,
    Liked,
    Disliked,
}

/// Row operation needed to move between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTransition {
    Create(Reaction),
    Remove,
    Switch(Reaction),
}

impl ReactionState {
    pub fn from_row(row: Option<&ReviewLike>) -> Self {
        match row {
            None => ReactionState::None,
            Some(row) if row.is_like => ReactionState::Liked,
            Some(_) => ReactionState::Disliked,
        }
    }

    pub const fn reaction(self) -> Option<Reaction> {
        match self {
            ReactionState::None => None,
            ReactionState::Liked => Some(Reaction::Like),
            ReactionState::Disliked => Some(Reaction::Dislike),
        }
    }

    /// Submitting the current reaction again clears it; anything else sets it.
    pub fn apply(self, submitted: Reaction) -> (ReactionTransition, ReactionState) {
        let target = match submitted {
            Reaction::Like => ReactionState::Liked,
            Reaction::Dislike => ReactionState::Disliked,
        };

        match self {
            ReactionState::None => (ReactionTransition::Create(submitted), target),
            current if current == target => (ReactionTransition::Remove, ReactionState::None),
            _ => (ReactionTransition::Switch(submitted), target),
        }
    }
}

/// Counters and caller state after a reaction toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionOutcome {
    pub review_id: ReviewId,
    pub like_count: u32,
    pub dislike_count: u32,
    pub reaction: Option<Reaction>,
    pub cleared: bool,
}

/// Perform the row operation for a submitted reaction and return the transition taken.
///
/// Counters are not touched; the caller recounts while still holding the review's
/// counter lock.
pub(crate) fn apply_reaction<S>(
    store: &S,
    review: ReviewId,
    user: UserId,
    submitted: Reaction,
) -> Result<(ReactionTransition, ReactionState), RepositoryError>
where
    S: ReviewStore + ?Sized,
{
    let existing = store.fetch_reaction(review, user)?;
    let (transition, next) = ReactionState::from_row(existing.as_ref()).apply(submitted);

    match (transition, existing) {
        (ReactionTransition::Create(reaction), _) => {
            store.insert_reaction(review, user, reaction.is_like())?;
        }
        (ReactionTransition::Remove, Some(row)) => store.delete_reaction(row.id)?,
        (ReactionTransition::Switch(reaction), Some(row)) => {
            store.set_reaction(row.id, reaction.is_like())?
        }
        (_, None) => return Err(RepositoryError::NotFound),
    }

    Ok((transition, next))
}
