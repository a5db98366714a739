use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::aggregator::RatingAggregator;
use super::counters::{recount_reactions, CounterMaterializer};
use super::domain::{
    Actor, CommentId, Hospital, HospitalAggregate, HospitalId, ImageId, NewComment, NewImage,
    NewReport, NewReview, ReportId, Review, ReviewComment, ReviewId, ReviewImage, ReviewReport,
    UserId,
};
use super::input::{
    CommentDraft, CommentPatch, ImageDraft, ListReviewsQuery, QualityQuery, ReportDraft,
    ReviewDraft, ReviewPatch, ReviewSort, ValidationError,
};
use super::moderation::{ReportTransition, StatusTally};
use super::quality::{QualityEngine, QualityOutcome, QualitySignals, MAX_QUALITY_SCORE};
use super::reactions::{apply_reaction, Reaction, ReactionOutcome, ReactionState, ReactionTransition};
use super::repository::{RepositoryError, ReportFilter, ReviewStore};
use super::verification::{VerificationCandidate, VerificationPolicy};
use crate::config::ReviewsConfig;

/// Service composing the store with the verification, quality, aggregation, and
/// counter engines.
pub struct ReviewService<S> {
    store: Arc<S>,
    verification: VerificationPolicy,
    quality: QualityEngine,
    aggregator: RatingAggregator,
    counters: CounterMaterializer,
    limits: ReviewsConfig,
}

impl<S> ReviewService<S>
where
    S: ReviewStore + 'static,
{
    pub fn new(store: Arc<S>, limits: ReviewsConfig) -> Self {
        Self::with_policy(store, VerificationPolicy::default(), limits)
    }

    pub fn with_policy(store: Arc<S>, verification: VerificationPolicy, limits: ReviewsConfig) -> Self {
        Self {
            store,
            verification,
            quality: QualityEngine,
            aggregator: RatingAggregator::new(),
            counters: CounterMaterializer::new(),
            limits,
        }
    }

    pub fn hospital(&self, hospital_id: HospitalId) -> Result<Hospital, ReviewServiceError> {
        self.store
            .fetch_hospital(hospital_id)?
            .ok_or_else(|| ReviewServiceError::not_found(Resource::Hospital, hospital_id.0))
    }

    /// Persist a new review, verify it, and refresh the hospital aggregate.
    pub fn create_review(
        &self,
        actor: Actor,
        hospital_id: HospitalId,
        draft: ReviewDraft,
    ) -> Result<Review, ReviewServiceError> {
        if let Some(claimed) = draft.claimed_user {
            match actor.user_id() {
                None => return Err(ReviewServiceError::Unauthenticated),
                Some(caller) if caller != claimed => return Err(ReviewServiceError::Forbidden),
                Some(_) => {}
            }
        }
        self.hospital(hospital_id)?;

        let user_id = actor.user_id();
        let candidate = VerificationCandidate {
            author: user_id,
            title: draft.title.as_deref(),
            content: &draft.content,
            rating: draft.rating,
        };
        let is_verified = self.verification.should_auto_verify(&candidate);

        let review = self.store.insert_review(NewReview {
            hospital_id,
            user_id,
            author_name: draft.author_name,
            email: draft.email,
            rating: draft.rating,
            title: draft.title,
            content: draft.content,
            language: draft.language,
            is_verified,
            created_at: Utc::now(),
        })?;

        info!(
            hospital_id = %hospital_id,
            review_id = %review.id,
            rating = review.rating.value(),
            verified = review.is_verified,
            "review created"
        );

        self.refresh_hospital(hospital_id);
        Ok(review)
    }

    pub fn list_reviews(
        &self,
        hospital_id: HospitalId,
        query: ListReviewsQuery,
    ) -> Result<ReviewPage, ReviewServiceError> {
        self.hospital(hospital_id)?;

        let page = query.page.unwrap_or(1);
        if page == 0 {
            return Err(ValidationError::new("page", "must be at least 1").into());
        }
        let limit = match query.limit {
            Some(0) => return Err(ValidationError::new("limit", "must be at least 1").into()),
            Some(limit) => limit.min(self.limits.max_page_limit),
            None => self.limits.default_page_limit,
        };

        let mut reviews = self.store.reviews_for_hospital(hospital_id)?;
        sort_reviews(&mut reviews, query.sort_by.unwrap_or_default());

        let total_count = reviews.len() as u64;
        let pagination = Pagination::new(page, limit, total_count);
        let start = (u64::from(page - 1) * u64::from(limit)).min(total_count) as usize;
        let reviews = reviews
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect();

        Ok(ReviewPage {
            reviews,
            pagination,
        })
    }

    pub fn get_review(
        &self,
        hospital_id: HospitalId,
        review_id: ReviewId,
    ) -> Result<Review, ReviewServiceError> {
        let review = self.review(review_id)?;
        if review.hospital_id != hospital_id {
            return Err(ReviewServiceError::not_found(Resource::Review, review_id.0));
        }
        Ok(review)
    }

    /// Apply a partial edit. The hospital aggregate is refreshed only when the rating moved.
    pub fn update_review(
        &self,
        actor: Actor,
        hospital_id: HospitalId,
        review_id: ReviewId,
        patch: ReviewPatch,
    ) -> Result<Review, ReviewServiceError> {
        let mut review = self.get_review(hospital_id, review_id)?;
        authorize(actor, review.user_id)?;

        let previous_rating = review.rating;
        if let Some(rating) = patch.rating {
            review.rating = rating;
        }
        if let Some(title) = patch.title {
            review.title = title;
        }
        if let Some(content) = patch.content {
            review.content = content;
        }
        if let Some(language) = patch.language {
            review.language = language;
        }
        review.updated_at = Utc::now();

        self.store.update_review(&review)?;
        info!(hospital_id = %hospital_id, review_id = %review_id, "review updated");

        if review.rating != previous_rating {
            self.refresh_hospital(hospital_id);
        }

        self.review(review_id)
    }

    /// Delete a review with its dependent rows and refresh the hospital aggregate.
    pub fn delete_review(
        &self,
        actor: Actor,
        hospital_id: HospitalId,
        review_id: ReviewId,
    ) -> Result<(), ReviewServiceError> {
        let review = self.get_review(hospital_id, review_id)?;
        authorize(actor, review.user_id)?;

        self.store.delete_review(review_id)?;
        info!(hospital_id = %hospital_id, review_id = %review_id, "review deleted");

        self.refresh_hospital(hospital_id);
        Ok(())
    }

    /// Toggle the caller's reaction on a review.
    pub fn react(
        &self,
        actor: Actor,
        review_id: ReviewId,
        reaction: Reaction,
    ) -> Result<ReactionOutcome, ReviewServiceError> {
        let user = actor.user_id().ok_or(ReviewServiceError::Unauthenticated)?;
        self.review(review_id)?;

        self.counters.serialized(review_id, || -> Result<_, ReviewServiceError> {
            let (transition, next) = apply_reaction(self.store.as_ref(), review_id, user, reaction)
                .map_err(|err| match err {
                    RepositoryError::NotFound => {
                        ReviewServiceError::not_found(Resource::Review, review_id.0)
                    }
                    other => other.into(),
                })?;

            let counters = match recount_reactions(self.store.as_ref(), review_id) {
                Ok(counters) => counters,
                Err(err) => {
                    warn!(review_id = %review_id, error = %err, "reaction counters left stale");
                    self.review(review_id)?.counters
                }
            };

            Ok(ReactionOutcome {
                review_id,
                like_count: counters.like_count,
                dislike_count: counters.dislike_count,
                reaction: next.reaction(),
                cleared: transition == ReactionTransition::Remove,
            })
        })
    }

    /// The caller's current reaction, `None` when they have not reacted.
    pub fn reaction_state(
        &self,
        actor: Actor,
        review_id: ReviewId,
    ) -> Result<Option<Reaction>, ReviewServiceError> {
        let user = actor.user_id().ok_or(ReviewServiceError::Unauthenticated)?;
        self.review(review_id)?;
        let row = self.store.fetch_reaction(review_id, user)?;
        Ok(ReactionState::from_row(row.as_ref()).reaction())
    }

    pub fn add_comment(
        &self,
        actor: Actor,
        review_id: ReviewId,
        draft: CommentDraft,
    ) -> Result<ReviewComment, ReviewServiceError> {
        self.review(review_id)?;

        let comment = self.store.insert_comment(NewComment {
            review_id,
            user_id: actor.user_id(),
            author_name: draft.author_name,
            content: draft.content,
            is_hospital_reply: draft.is_hospital_reply,
            created_at: Utc::now(),
        })?;
        info!(review_id = %review_id, comment_id = %comment.id, "comment added");

        self.refresh_comments(review_id);
        Ok(comment)
    }

    /// Comments of a review, oldest first.
    pub fn list_comments(&self, review_id: ReviewId) -> Result<Vec<ReviewComment>, ReviewServiceError> {
        self.review(review_id)?;
        let mut comments = self.store.comments_for_review(review_id)?;
        comments.sort_by_key(|comment| (comment.created_at, comment.id));
        Ok(comments)
    }

    pub fn update_comment(
        &self,
        actor: Actor,
        review_id: ReviewId,
        comment_id: CommentId,
        patch: CommentPatch,
    ) -> Result<ReviewComment, ReviewServiceError> {
        let mut comment = self.comment(review_id, comment_id)?;
        authorize(actor, comment.user_id)?;

        if let Some(author_name) = patch.author_name {
            comment.author_name = author_name;
        }
        if let Some(content) = patch.content {
            comment.content = content;
        }
        comment.updated_at = Utc::now();

        self.store.update_comment(&comment)?;
        Ok(comment)
    }

    pub fn delete_comment(
        &self,
        actor: Actor,
        review_id: ReviewId,
        comment_id: CommentId,
    ) -> Result<(), ReviewServiceError> {
        let comment = self.comment(review_id, comment_id)?;
        authorize(actor, comment.user_id)?;

        self.store.delete_comment(comment_id)?;
        info!(review_id = %review_id, comment_id = %comment_id, "comment deleted");

        self.refresh_comments(review_id);
        Ok(())
    }

    /// Attach an image. Without an explicit order it goes after the current last image.
    pub fn add_image(
        &self,
        actor: Actor,
        review_id: ReviewId,
        draft: ImageDraft,
    ) -> Result<ReviewImage, ReviewServiceError> {
        let review = self.review(review_id)?;
        authorize(actor, review.user_id)?;

        let order = match draft.order {
            Some(order) => order,
            None => self
                .store
                .images_for_review(review_id)?
                .iter()
                .map(|image| image.order)
                .max()
                .map_or(0, |max| max.saturating_add(1)),
        };

        let image = self.store.insert_image(NewImage {
            review_id,
            image_url: draft.image_url,
            caption: draft.caption,
            order,
            created_at: Utc::now(),
        })?;
        Ok(image)
    }

    /// Images of a review by ascending display order.
    pub fn list_images(&self, review_id: ReviewId) -> Result<Vec<ReviewImage>, ReviewServiceError> {
        self.review(review_id)?;
        let mut images = self.store.images_for_review(review_id)?;
        images.sort_by_key(|image| (image.order, image.id));
        Ok(images)
    }

    pub fn delete_image(
        &self,
        actor: Actor,
        review_id: ReviewId,
        image_id: ImageId,
    ) -> Result<(), ReviewServiceError> {
        let review = self.review(review_id)?;
        let image = self
            .store
            .fetch_image(image_id)?
            .filter(|image| image.review_id == review_id)
            .ok_or_else(|| ReviewServiceError::not_found(Resource::Image, image_id.0))?;
        authorize(actor, review.user_id)?;

        self.store.delete_image(image.id)?;
        Ok(())
    }

    /// File a report. Reports always start pending and are never deduplicated.
    pub fn file_report(
        &self,
        review_id: ReviewId,
        draft: ReportDraft,
    ) -> Result<ReviewReport, ReviewServiceError> {
        self.review(review_id)?;

        let report = self.store.insert_report(NewReport {
            review_id,
            reason: draft.reason,
            description: draft.description,
            reporter_name: draft.reporter_name,
            reporter_email: draft.reporter_email,
            created_at: Utc::now(),
        })?;
        info!(
            review_id = %review_id,
            report_id = %report.id,
            reason = report.reason.label(),
            "review reported"
        );
        Ok(report)
    }

    /// Admin listing, newest first.
    pub fn list_reports(
        &self,
        actor: Actor,
        filter: ReportFilter,
    ) -> Result<ReportListing, ReviewServiceError> {
        require_admin(actor)?;
        let mut reports = self.store.list_reports(filter)?;
        reports.sort_by_key(|report| Reverse((report.created_at, report.id)));
        let tally = StatusTally::from_reports(&reports);
        Ok(ReportListing { reports, tally })
    }

    pub fn get_report(&self, actor: Actor, report_id: ReportId) -> Result<ReviewReport, ReviewServiceError> {
        require_admin(actor)?;
        self.report(report_id)
    }

    pub fn transition_report(
        &self,
        actor: Actor,
        report_id: ReportId,
        transition: ReportTransition,
    ) -> Result<ReviewReport, ReviewServiceError> {
        let admin = require_admin(actor)?;
        let report = self.report(report_id)?;
        let from = report.status;

        let updated = transition.apply(report, admin, Utc::now());
        self.store.update_report(&updated)?;
        info!(
            report_id = %report_id,
            from = from.label(),
            to = updated.status.label(),
            admin = %admin,
            "report transitioned"
        );
        Ok(updated)
    }

    /// Remove a report permanently. The reported review is left as is.
    pub fn delete_report(&self, actor: Actor, report_id: ReportId) -> Result<(), ReviewServiceError> {
        require_admin(actor)?;
        self.report(report_id)?;
        self.store.delete_report(report_id)?;
        info!(report_id = %report_id, "report deleted");
        Ok(())
    }

    /// Reviews annotated with their quality score, best first.
    pub fn quality_listing(
        &self,
        actor: Actor,
        query: QualityQuery,
    ) -> Result<Vec<QualityEntry>, ReviewServiceError> {
        require_admin(actor)?;

        let min_score = query.min_score.unwrap_or(0);
        if min_score > MAX_QUALITY_SCORE {
            return Err(ValidationError::new("minScore", "must be between 0 and 100").into());
        }
        let limit = match query.limit {
            Some(0) => return Err(ValidationError::new("limit", "must be at least 1").into()),
            Some(limit) => limit.min(self.limits.max_page_limit as usize),
            None => self.limits.quality_limit,
        };

        let mut entries = Vec::new();
        for review in self.store.all_reviews()? {
            let signals = QualitySignals {
                image_count: self.store.images_for_review(review.id)?.len() as u32,
                like_count: review.counters.like_count,
                comment_count: review.counters.comment_count,
            };
            let quality = self.quality.score(&review, signals);
            if quality.total_score >= min_score {
                entries.push(QualityEntry { review, quality });
            }
        }

        entries.sort_by_key(|entry| {
            Reverse((entry.quality.total_score, entry.review.created_at, entry.review.id))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    /// Re-run the verification predicate on every review, writing only changed flags.
    pub fn reverify_all(&self, actor: Actor) -> Result<ReverificationSummary, ReviewServiceError> {
        require_admin(actor)?;

        let mut summary = ReverificationSummary::default();
        for review in self.store.all_reviews()? {
            summary.examined += 1;
            if self.reverify(&review)? {
                summary.changed += 1;
            }
        }
        info!(examined = summary.examined, changed = summary.changed, "re-verification finished");
        Ok(summary)
    }

    /// Explicit admin override of the verification flag.
    pub fn set_verification(
        &self,
        actor: Actor,
        review_id: ReviewId,
        is_verified: bool,
    ) -> Result<Review, ReviewServiceError> {
        require_admin(actor)?;
        let mut review = self.review(review_id)?;
        if review.is_verified != is_verified {
            self.store.save_review_verification(review_id, is_verified)?;
            review.is_verified = is_verified;
            info!(review_id = %review_id, verified = is_verified, "verification overridden");
        }
        Ok(review)
    }

    /// Explicit re-aggregation pass; failures are returned rather than logged.
    pub fn reaggregate(
        &self,
        actor: Actor,
        hospital_id: HospitalId,
    ) -> Result<HospitalAggregate, ReviewServiceError> {
        require_admin(actor)?;
        self.hospital(hospital_id)?;
        Ok(self.aggregator.recompute(self.store.as_ref(), hospital_id)?)
    }

    fn reverify(&self, review: &Review) -> Result<bool, ReviewServiceError> {
        let verified = self
            .verification
            .should_auto_verify(&VerificationCandidate::from(review));
        if verified == review.is_verified {
            return Ok(false);
        }
        self.store.save_review_verification(review.id, verified)?;
        Ok(true)
    }

    fn refresh_hospital(&self, hospital_id: HospitalId) {
        if let Err(err) = self.aggregator.recompute(self.store.as_ref(), hospital_id) {
            warn!(hospital_id = %hospital_id, error = %err, "hospital aggregate left stale");
        }
    }

    fn refresh_comments(&self, review_id: ReviewId) {
        if let Err(err) = self.counters.refresh_comments(self.store.as_ref(), review_id) {
            warn!(review_id = %review_id, error = %err, "comment count left stale");
        }
    }

    fn review(&self, review_id: ReviewId) -> Result<Review, ReviewServiceError> {
        self.store
            .fetch_review(review_id)?
            .ok_or_else(|| ReviewServiceError::not_found(Resource::Review, review_id.0))
    }

    fn comment(
        &self,
        review_id: ReviewId,
        comment_id: CommentId,
    ) -> Result<ReviewComment, ReviewServiceError> {
        self.review(review_id)?;
        self.store
            .fetch_comment(comment_id)?
            .filter(|comment| comment.review_id == review_id)
            .ok_or_else(|| ReviewServiceError::not_found(Resource::Comment, comment_id.0))
    }

    fn report(&self, report_id: ReportId) -> Result<ReviewReport, ReviewServiceError> {
        self.store
            .fetch_report(report_id)?
            .ok_or_else(|| ReviewServiceError::not_found(Resource::Report, report_id.0))
    }
}

fn authorize(actor: Actor, owner: Option<UserId>) -> Result<(), ReviewServiceError> {
    if actor.may_modify(owner) {
        Ok(())
    } else if actor == Actor::Anonymous {
        Err(ReviewServiceError::Unauthenticated)
    } else {
        Err(ReviewServiceError::Forbidden)
    }
}

fn require_admin(actor: Actor) -> Result<UserId, ReviewServiceError> {
    match actor {
        Actor::Admin(id) => Ok(id),
        Actor::User(_) => Err(ReviewServiceError::Forbidden),
        Actor::Anonymous => Err(ReviewServiceError::Unauthenticated),
    }
}

fn sort_reviews(reviews: &mut [Review], sort: ReviewSort) {
    match sort {
        ReviewSort::Latest => reviews.sort_by_key(|r| Reverse((r.created_at, r.id))),
        ReviewSort::Oldest => reviews.sort_by_key(|r| (r.created_at, r.id)),
        ReviewSort::RatingHigh => {
            reviews.sort_by_key(|r| (Reverse(r.rating), Reverse((r.created_at, r.id))))
        }
        ReviewSort::RatingLow => {
            reviews.sort_by_key(|r| (r.rating, Reverse((r.created_at, r.id))))
        }
    }
}

/// Paging metadata returned with every review listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(u64::from(limit));
        Self {
            page,
            limit,
            total_count,
            total_pages,
            has_next_page: u64::from(page) < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportListing {
    pub reports: Vec<ReviewReport>,
    pub tally: StatusTally,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityEntry {
    pub review: Review,
    pub quality: QualityOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReverificationSummary {
    pub examined: usize,
    pub changed: usize,
}

/// Entities addressed by the review endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Hospital,
    Review,
    Comment,
    Image,
    Report,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Resource::Hospital => "hospital",
            Resource::Review => "review",
            Resource::Comment => "comment",
            Resource::Image => "image",
            Resource::Report => "report",
        };
        f.write_str(label)
    }
}

/// Error raised by the review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: u64 },
    #[error("authentication required")]
    Unauthenticated,
    #[error("only the owner or an admin may do this")]
    Forbidden,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ReviewServiceError {
    pub fn not_found(resource: Resource, id: u64) -> Self {
        Self::NotFound { resource, id }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ReviewServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ReviewServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ReviewServiceError::Forbidden => StatusCode::FORBIDDEN,
            ReviewServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
