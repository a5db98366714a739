mod classifier;

pub use classifier::{ContentClassifier, KeywordClassifier};

use std::sync::Arc;

use super::domain::{Review, UserId};
use super::rating::{Rating, MIN_RATING};

/// Minimum content length, in characters, for a review to be trusted automatically.
pub const MIN_VERIFIED_CONTENT_CHARS: usize = 30;

/// Fields the verification predicate looks at.
#[derive(Debug, Clone, Copy)]
pub struct VerificationCandidate<'a> {
    pub author: Option<UserId>,
    pub title: Option<&'a str>,
    pub content: &'a str,
    pub rating: Rating,
}

impl<'a> From<&'a Review> for VerificationCandidate<'a> {
    fn from(review: &'a Review) -> Self {
        Self {
            author: review.user_id,
            title: review.title.as_deref(),
            content: &review.content,
            rating: review.rating,
        }
    }
}

/// The individual checks, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationCheck {
    AuthenticatedAuthor,
    ContentLength,
    MinimumRating,
    CleanText,
}

/// Pure auto-verification predicate.
#[derive(Clone)]
pub struct VerificationPolicy {
    classifier: Arc<dyn ContentClassifier>,
}

impl VerificationPolicy {
    pub fn new(classifier: Arc<dyn ContentClassifier>) -> Self {
        Self { classifier }
    }

    pub fn should_auto_verify(&self, candidate: &VerificationCandidate<'_>) -> bool {
        self.first_failure(candidate).is_none()
    }

    /// The first check the candidate fails, if any.
    pub fn first_failure(&self, candidate: &VerificationCandidate<'_>) -> Option<VerificationCheck> {
        if candidate.author.is_none() {
            return Some(VerificationCheck::AuthenticatedAuthor);
        }

        if candidate.content.chars().count() < MIN_VERIFIED_CONTENT_CHARS {
            return Some(VerificationCheck::ContentLength);
        }

        if candidate.rating.value() < MIN_RATING {
            return Some(VerificationCheck::MinimumRating);
        }

        let mut text = candidate.content.to_lowercase();
        if let Some(title) = candidate.title {
            text.push('\n');
            text.push_str(&title.to_lowercase());
        }
        if self.classifier.is_inappropriate(&text) {
            return Some(VerificationCheck::CleanText);
        }

        None
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self::new(Arc::new(KeywordClassifier::default()))
    }
}

impl std::fmt::Debug for VerificationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationPolicy").finish_non_exhaustive()
    }
}
