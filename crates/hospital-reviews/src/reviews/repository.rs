use super::domain::{
    CommentId, Hospital, HospitalAggregate, HospitalId, ImageId, NewComment, NewImage, NewReport,
    NewReview, ReactionId, ReportId, ReportStatus, Review, ReviewComment, ReviewCounters,
    ReviewId, ReviewImage, ReviewLike, ReviewReport, UserId,
};

/// Filter applied to the admin report listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub review_id: Option<ReviewId>,
}

impl ReportFilter {
    pub fn matches(&self, report: &ReviewReport) -> bool {
        self.status.map_or(true, |status| report.status == status)
            && self
                .review_id
                .map_or(true, |review_id| report.review_id == review_id)
    }
}

/// Storage abstraction for reviews and their dependent rows.
///
/// Every method is a single atomic read or write. Multi-step recomputation is
/// orchestrated by the service. Derived fields are written only through
/// [`ReviewStore::save_hospital_aggregate`] and [`ReviewStore::save_review_counters`],
/// and the verification flag only through [`ReviewStore::save_review_verification`].
pub trait ReviewStore: Send + Sync {
    fn fetch_hospital(&self, id: HospitalId) -> Result<Option<Hospital>, RepositoryError>;
    fn save_hospital_aggregate(
        &self,
        id: HospitalId,
        aggregate: HospitalAggregate,
    ) -> Result<(), RepositoryError>;

    fn insert_review(&self, review: NewReview) -> Result<Review, RepositoryError>;
    fn fetch_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError>;
    /// Persist the editable fields of a review. Counters and the verification flag on
    /// `review` are ignored.
    fn update_review(&self, review: &Review) -> Result<(), RepositoryError>;
    fn save_review_verification(
        &self,
        id: ReviewId,
        is_verified: bool,
    ) -> Result<(), RepositoryError>;
    fn save_review_counters(
        &self,
        id: ReviewId,
        counters: ReviewCounters,
    ) -> Result<(), RepositoryError>;
    /// Remove a review together with its likes, comments, images, and reports.
    fn delete_review(&self, id: ReviewId) -> Result<(), RepositoryError>;
    fn reviews_for_hospital(&self, hospital: HospitalId) -> Result<Vec<Review>, RepositoryError>;
    fn all_reviews(&self) -> Result<Vec<Review>, RepositoryError>;

    fn fetch_reaction(
        &self,
        review: ReviewId,
        user: UserId,
    ) -> Result<Option<ReviewLike>, RepositoryError>;
    /// Fails with [`RepositoryError::Conflict`] when the user already reacted.
    fn insert_reaction(
        &self,
        review: ReviewId,
        user: UserId,
        is_like: bool,
    ) -> Result<ReviewLike, RepositoryError>;
    fn set_reaction(&self, id: ReactionId, is_like: bool) -> Result<(), RepositoryError>;
    fn delete_reaction(&self, id: ReactionId) -> Result<(), RepositoryError>;
    fn reactions_for_review(&self, review: ReviewId) -> Result<Vec<ReviewLike>, RepositoryError>;

    fn insert_comment(&self, comment: NewComment) -> Result<ReviewComment, RepositoryError>;
    fn fetch_comment(&self, id: CommentId) -> Result<Option<ReviewComment>, RepositoryError>;
    fn update_comment(&self, comment: &ReviewComment) -> Result<(), RepositoryError>;
    fn delete_comment(&self, id: CommentId) -> Result<(), RepositoryError>;
    fn comments_for_review(&self, review: ReviewId)
        -> Result<Vec<ReviewComment>, RepositoryError>;

    fn insert_image(&self, image: NewImage) -> Result<ReviewImage, RepositoryError>;
    fn fetch_image(&self, id: ImageId) -> Result<Option<ReviewImage>, RepositoryError>;
    fn delete_image(&self, id: ImageId) -> Result<(), RepositoryError>;
    fn images_for_review(&self, review: ReviewId) -> Result<Vec<ReviewImage>, RepositoryError>;

    fn insert_report(&self, report: NewReport) -> Result<ReviewReport, RepositoryError>;
    fn fetch_report(&self, id: ReportId) -> Result<Option<ReviewReport>, RepositoryError>;
    fn update_report(&self, report: &ReviewReport) -> Result<(), RepositoryError>;
    fn delete_report(&self, id: ReportId) -> Result<(), RepositoryError>;
    fn list_reports(&self, filter: ReportFilter) -> Result<Vec<ReviewReport>, RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
