//! Hospital reviews: submission, verification, reactions, comments, images, moderation,
//! and the derived hospital rating.
//!
//! Derived values (hospital rating and review count, per-review like/dislike/comment
//! counters) are recomputed from their source rows after every mutation that affects them
//! and are never accepted from clients.

pub mod aggregator;
pub mod counters;
pub mod domain;
pub mod input;
pub mod memory;
pub mod moderation;
pub mod quality;
pub mod rating;
pub mod reactions;
pub mod repository;
pub mod router;
pub mod service;
pub mod verification;

#[cfg(test)]
mod tests;

pub use aggregator::RatingAggregator;
pub use counters::CounterMaterializer;
pub use domain::{
    Actor, CommentId, Hospital, HospitalAggregate, HospitalId, ImageId, ReactionId, ReportId,
    ReportReason, ReportStatus, Review, ReviewComment, ReviewCounters, ReviewId, ReviewImage,
    ReviewLike, ReviewReport, UserId,
};
pub use input::ValidationError;
pub use memory::InMemoryReviewStore;
pub use moderation::{ReportTransition, StatusTally};
pub use quality::{QualityEngine, QualityOutcome, QualitySignals};
pub use rating::{AggregateRating, Rating, RatingError};
pub use reactions::{Reaction, ReactionOutcome};
pub use repository::{ReportFilter, RepositoryError, ReviewStore};
pub use router::review_router;
pub use service::{
    Pagination, QualityEntry, ReportListing, Resource, ReverificationSummary, ReviewPage,
    ReviewService, ReviewServiceError,
};
pub use verification::{ContentClassifier, KeywordClassifier, VerificationPolicy};
