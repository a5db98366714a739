use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::config::ReviewsConfig;
use crate::reviews::domain::{
    Actor, CommentId, Hospital, HospitalAggregate, HospitalId, ImageId, NewComment, NewImage,
    NewReport, NewReview, ReactionId, ReportId, Review, ReviewComment, ReviewCounters, ReviewId,
    ReviewImage, ReviewLike, ReviewReport, UserId,
};
use crate::reviews::input::ReviewDraft;
use crate::reviews::rating::Rating;
use crate::reviews::repository::{ReportFilter, RepositoryError, ReviewStore};
use crate::reviews::{review_router, InMemoryReviewStore, ReviewService};

pub(super) const CLEAN_CONTENT: &str = "Nurses were attentive and kind.";

pub(super) fn user(id: u64) -> Actor {
    Actor::User(UserId(id))
}

pub(super) fn admin() -> Actor {
    Actor::Admin(UserId(900))
}

pub(super) fn rating(value: f64) -> Rating {
    Rating::from_client(value).expect("valid rating")
}

pub(super) fn draft(value: f64, content: &str) -> ReviewDraft {
    ReviewDraft {
        author_name: "Jordan".to_string(),
        email: None,
        rating: rating(value),
        title: Some("Evening visit".to_string()),
        content: content.to_string(),
        language: Some("en".to_string()),
        claimed_user: None,
    }
}

pub(super) fn build_service() -> (
    ReviewService<InMemoryReviewStore>,
    Arc<InMemoryReviewStore>,
    Hospital,
) {
    let store = Arc::new(InMemoryReviewStore::new());
    let hospital = store.insert_hospital("Riverside General Hospital");
    let service = ReviewService::new(store.clone(), ReviewsConfig::default());
    (service, store, hospital)
}

/// Create a review as `author` and return it.
pub(super) fn seed_review(
    service: &ReviewService<InMemoryReviewStore>,
    hospital: HospitalId,
    author: Actor,
    value: f64,
) -> Review {
    service
        .create_review(author, hospital, draft(value, CLEAN_CONTENT))
        .expect("review created")
}

pub(super) fn router_with_service(service: ReviewService<InMemoryReviewStore>) -> axum::Router {
    review_router(Arc::new(service))
}

pub(super) fn json_request(
    method: Method,
    uri: &str,
    caller: Option<(u64, &str)>,
    body: Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some((id, role)) = caller {
        builder = builder
            .header("x-user-id", id.to_string())
            .header("x-user-role", role);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request builds")
}

pub(super) fn empty_request(method: Method, uri: &str, caller: Option<(u64, &str)>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = caller {
        builder = builder
            .header("x-user-id", id.to_string())
            .header("x-user-role", role);
    }
    builder.body(Body::empty()).expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// In-memory store with switchable faults.
///
/// `stale_aggregates` fails every hospital aggregate write. `reviews_vanish_on_react`
/// deletes the review right before a reaction row is inserted, the way a concurrent
/// delete would.
#[derive(Default, Clone)]
pub(super) struct FaultyStore {
    pub(super) inner: InMemoryReviewStore,
    pub(super) stale_aggregates: bool,
    pub(super) reviews_vanish_on_react: bool,
}

impl ReviewStore for FaultyStore {
    fn fetch_hospital(&self, id: HospitalId) -> Result<Option<Hospital>, RepositoryError> {
        self.inner.fetch_hospital(id)
    }

    fn save_hospital_aggregate(
        &self,
        id: HospitalId,
        aggregate: HospitalAggregate,
    ) -> Result<(), RepositoryError> {
        if self.stale_aggregates {
            return Err(RepositoryError::Unavailable("hospital table locked".to_string()));
        }
        self.inner.save_hospital_aggregate(id, aggregate)
    }

    fn insert_review(&self, review: NewReview) -> Result<Review, RepositoryError> {
        self.inner.insert_review(review)
    }

    fn fetch_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.inner.fetch_review(id)
    }

    fn update_review(&self, review: &Review) -> Result<(), RepositoryError> {
        self.inner.update_review(review)
    }

    fn save_review_verification(
        &self,
        id: ReviewId,
        is_verified: bool,
    ) -> Result<(), RepositoryError> {
        self.inner.save_review_verification(id, is_verified)
    }

    fn save_review_counters(
        &self,
        id: ReviewId,
        counters: ReviewCounters,
    ) -> Result<(), RepositoryError> {
        self.inner.save_review_counters(id, counters)
    }

    fn delete_review(&self, id: ReviewId) -> Result<(), RepositoryError> {
        self.inner.delete_review(id)
    }

    fn reviews_for_hospital(&self, hospital: HospitalId) -> Result<Vec<Review>, RepositoryError> {
        self.inner.reviews_for_hospital(hospital)
    }

    fn all_reviews(&self) -> Result<Vec<Review>, RepositoryError> {
        self.inner.all_reviews()
    }

    fn fetch_reaction(
        &self,
        review: ReviewId,
        user: UserId,
    ) -> Result<Option<ReviewLike>, RepositoryError> {
        self.inner.fetch_reaction(review, user)
    }

    fn insert_reaction(
        &self,
        review: ReviewId,
        user: UserId,
        is_like: bool,
    ) -> Result<ReviewLike, RepositoryError> {
        if self.reviews_vanish_on_react {
            self.inner.delete_review(review)?;
        }
        self.inner.insert_reaction(review, user, is_like)
    }

    fn set_reaction(&self, id: ReactionId, is_like: bool) -> Result<(), RepositoryError> {
        self.inner.set_reaction(id, is_like)
    }

    fn delete_reaction(&self, id: ReactionId) -> Result<(), RepositoryError> {
        self.inner.delete_reaction(id)
    }

    fn reactions_for_review(&self, review: ReviewId) -> Result<Vec<ReviewLike>, RepositoryError> {
        self.inner.reactions_for_review(review)
    }

    fn insert_comment(&self, comment: NewComment) -> Result<ReviewComment, RepositoryError> {
        self.inner.insert_comment(comment)
    }

    fn fetch_comment(&self, id: CommentId) -> Result<Option<ReviewComment>, RepositoryError> {
        self.inner.fetch_comment(id)
    }

    fn update_comment(&self, comment: &ReviewComment) -> Result<(), RepositoryError> {
        self.inner.update_comment(comment)
    }

    fn delete_comment(&self, id: CommentId) -> Result<(), RepositoryError> {
        self.inner.delete_comment(id)
    }

    fn comments_for_review(
        &self,
        review: ReviewId,
    ) -> Result<Vec<ReviewComment>, RepositoryError> {
        self.inner.comments_for_review(review)
    }

    fn insert_image(&self, image: NewImage) -> Result<ReviewImage, RepositoryError> {
        self.inner.insert_image(image)
    }

    fn fetch_image(&self, id: ImageId) -> Result<Option<ReviewImage>, RepositoryError> {
        self.inner.fetch_image(id)
    }

    fn delete_image(&self, id: ImageId) -> Result<(), RepositoryError> {
        self.inner.delete_image(id)
    }

    fn images_for_review(&self, review: ReviewId) -> Result<Vec<ReviewImage>, RepositoryError> {
        self.inner.images_for_review(review)
    }

    fn insert_report(&self, report: NewReport) -> Result<ReviewReport, RepositoryError> {
        self.inner.insert_report(report)
    }

    fn fetch_report(&self, id: ReportId) -> Result<Option<ReviewReport>, RepositoryError> {
        self.inner.fetch_report(id)
    }

    fn update_report(&self, report: &ReviewReport) -> Result<(), RepositoryError> {
        self.inner.update_report(report)
    }

    fn delete_report(&self, id: ReportId) -> Result<(), RepositoryError> {
        self.inner.delete_report(id)
    }

    fn list_reports(&self, filter: ReportFilter) -> Result<Vec<ReviewReport>, RepositoryError> {
        self.inner.list_reports(filter)
    }
}
