use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use super::domain::{Actor, CommentId, HospitalId, ImageId, ReportId, ReviewId, UserId};
use super::input::{
    CreateCommentRequest, CreateImageRequest, CreateReportRequest, CreateReviewRequest,
    ListReviewsQuery, QualityQuery, ReactionRequest, ReportListQuery, TransitionReportRequest,
    UpdateCommentRequest, UpdateReviewRequest, ValidationError, VerificationRequest,
};
use super::reactions::Reaction;
use super::repository::{ReportFilter, ReviewStore};
use super::service::{ReviewService, ReviewServiceError};

/// Header carrying the caller id resolved by the authentication gateway.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the caller role; only `admin` grants elevated access.
pub const USER_ROLE_HEADER: &str = "x-user-role";

type Shared<S> = State<Arc<ReviewService<S>>>;

/// Router builder exposing the public review endpoints and the admin moderation surface.
pub fn review_router<S>(service: Arc<ReviewService<S>>) -> Router
where
    S: ReviewStore + 'static,
{
    Router::new()
        .route("/api/v1/hospitals/:hospital_id", get(hospital_handler::<S>))
        .route(
            "/api/v1/hospitals/:hospital_id/reviews",
            get(list_reviews_handler::<S>).post(create_review_handler::<S>),
        )
        .route(
            "/api/v1/hospitals/:hospital_id/reviews/:review_id",
            get(get_review_handler::<S>)
                .patch(update_review_handler::<S>)
                .delete(delete_review_handler::<S>),
        )
        .route(
            "/api/v1/reviews/:review_id/reaction",
            get(reaction_state_handler::<S>).post(react_handler::<S>),
        )
        .route(
            "/api/v1/reviews/:review_id/comments",
            get(list_comments_handler::<S>).post(add_comment_handler::<S>),
        )
        .route(
            "/api/v1/reviews/:review_id/comments/:comment_id",
            patch(update_comment_handler::<S>).delete(delete_comment_handler::<S>),
        )
        .route(
            "/api/v1/reviews/:review_id/images",
            get(list_images_handler::<S>).post(add_image_handler::<S>),
        )
        .route(
            "/api/v1/reviews/:review_id/images/:image_id",
            delete(delete_image_handler::<S>),
        )
        .route(
            "/api/v1/reviews/:review_id/reports",
            post(file_report_handler::<S>),
        )
        .route("/api/v1/admin/reports", get(list_reports_handler::<S>))
        .route(
            "/api/v1/admin/reports/:report_id",
            get(get_report_handler::<S>)
                .patch(transition_report_handler::<S>)
                .delete(delete_report_handler::<S>),
        )
        .route(
            "/api/v1/admin/reviews/quality",
            get(quality_handler::<S>),
        )
        .route(
            "/api/v1/admin/reviews/reverify",
            post(reverify_handler::<S>),
        )
        .route(
            "/api/v1/admin/reviews/:review_id/verification",
            put(verification_handler::<S>),
        )
        .route(
            "/api/v1/admin/hospitals/:hospital_id/reaggregate",
            post(reaggregate_handler::<S>),
        )
        .with_state(service)
}

/// Resolve the caller from the gateway headers. Absent headers mean an anonymous caller.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ReviewServiceError> {
    let Some(raw) = headers.get(USER_ID_HEADER) else {
        return Ok(Actor::Anonymous);
    };
    let user = raw
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(UserId)
        .ok_or(ReviewServiceError::Unauthenticated)?;

    let is_admin = headers
        .get(USER_ROLE_HEADER)
        .and_then(|role| role.to_str().ok())
        .map(|role| role.trim().eq_ignore_ascii_case("admin"))
        .unwrap_or(false);

    Ok(if is_admin {
        Actor::Admin(user)
    } else {
        Actor::User(user)
    })
}

pub(crate) fn error_response(error: ReviewServiceError) -> Response {
    let status = error.status_code();
    let payload = match &error {
        ReviewServiceError::Validation(ValidationError { field, message }) => json!({
            "error": error.to_string(),
            "field": field,
            "message": message,
        }),
        ReviewServiceError::Repository(_) => {
            tracing::error!(error = %error, "review store failure");
            json!({ "error": "review store unavailable" })
        }
        _ => json!({ "error": error.to_string() }),
    };
    (status, Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, ReviewServiceError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

fn no_content(result: Result<(), ReviewServiceError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ReviewServiceError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ValidationError::new("body", rejection.body_text()).into())
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ReviewServiceError> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| ValidationError::new("query", rejection.body_text()).into())
}

fn path<T>(ids: Result<Path<T>, PathRejection>) -> Result<T, ReviewServiceError> {
    ids.map(|Path(value)| value)
        .map_err(|rejection| ValidationError::new("path", rejection.body_text()).into())
}

pub(crate) async fn hospital_handler<S>(
    State(service): Shared<S>,
    hospital_id: Result<Path<u64>, PathRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(hospital_id).and_then(|id| service.hospital(HospitalId(id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn create_review_handler<S>(
    State(service): Shared<S>,
    hospital_id: Result<Path<u64>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(hospital_id).and_then(|hospital_id| {
        let actor = actor_from_headers(&headers)?;
        let draft = body(payload)?.validate()?;
        service.create_review(actor, HospitalId(hospital_id), draft)
    });
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn list_reviews_handler<S>(
    State(service): Shared<S>,
    hospital_id: Result<Path<u64>, PathRejection>,
    params: Result<Query<ListReviewsQuery>, QueryRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(hospital_id).and_then(|hospital_id| {
        service.list_reviews(HospitalId(hospital_id), query(params)?)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn get_review_handler<S>(
    State(service): Shared<S>,
    ids: Result<Path<(u64, u64)>, PathRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(ids).and_then(|(hospital_id, review_id)| {
        service.get_review(HospitalId(hospital_id), ReviewId(review_id))
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn update_review_handler<S>(
    State(service): Shared<S>,
    ids: Result<Path<(u64, u64)>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<UpdateReviewRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(ids).and_then(|(hospital_id, review_id)| {
        let actor = actor_from_headers(&headers)?;
        let patch = body(payload)?.validate()?;
        service.update_review(actor, HospitalId(hospital_id), ReviewId(review_id), patch)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn delete_review_handler<S>(
    State(service): Shared<S>,
    ids: Result<Path<(u64, u64)>, PathRejection>,
    headers: HeaderMap,
) -> Response
where
    S: ReviewStore + 'static,
{
    no_content(path(ids).and_then(|(hospital_id, review_id)| {
        let actor = actor_from_headers(&headers)?;
        service.delete_review(actor, HospitalId(hospital_id), ReviewId(review_id))
    }))
}

pub(crate) async fn react_handler<S>(
    State(service): Shared<S>,
    review_id: Result<Path<u64>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<ReactionRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(review_id).and_then(|review_id| {
        let actor = actor_from_headers(&headers)?;
        let request = body(payload)?;
        service.react(
            actor,
            ReviewId(review_id),
            Reaction::from_is_like(request.is_like),
        )
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn reaction_state_handler<S>(
    State(service): Shared<S>,
    review_id: Result<Path<u64>, PathRejection>,
    headers: HeaderMap,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(review_id).and_then(|review_id| {
        let actor = actor_from_headers(&headers)?;
        let reaction = service.reaction_state(actor, ReviewId(review_id))?;
        Ok(json!({ "reviewId": review_id, "reaction": reaction }))
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn add_comment_handler<S>(
    State(service): Shared<S>,
    review_id: Result<Path<u64>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(review_id).and_then(|review_id| {
        let actor = actor_from_headers(&headers)?;
        let draft = body(payload)?.validate()?;
        service.add_comment(actor, ReviewId(review_id), draft)
    });
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn list_comments_handler<S>(
    State(service): Shared<S>,
    review_id: Result<Path<u64>, PathRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(review_id).and_then(|id| service.list_comments(ReviewId(id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn update_comment_handler<S>(
    State(service): Shared<S>,
    ids: Result<Path<(u64, u64)>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<UpdateCommentRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(ids).and_then(|(review_id, comment_id)| {
        let actor = actor_from_headers(&headers)?;
        let patch = body(payload)?.validate()?;
        service.update_comment(actor, ReviewId(review_id), CommentId(comment_id), patch)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn delete_comment_handler<S>(
    State(service): Shared<S>,
    ids: Result<Path<(u64, u64)>, PathRejection>,
    headers: HeaderMap,
) -> Response
where
    S: ReviewStore + 'static,
{
    no_content(path(ids).and_then(|(review_id, comment_id)| {
        let actor = actor_from_headers(&headers)?;
        service.delete_comment(actor, ReviewId(review_id), CommentId(comment_id))
    }))
}

pub(crate) async fn add_image_handler<S>(
    State(service): Shared<S>,
    review_id: Result<Path<u64>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<CreateImageRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(review_id).and_then(|review_id| {
        let actor = actor_from_headers(&headers)?;
        let draft = body(payload)?.validate()?;
        service.add_image(actor, ReviewId(review_id), draft)
    });
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn list_images_handler<S>(
    State(service): Shared<S>,
    review_id: Result<Path<u64>, PathRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(review_id).and_then(|id| service.list_images(ReviewId(id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn delete_image_handler<S>(
    State(service): Shared<S>,
    ids: Result<Path<(u64, u64)>, PathRejection>,
    headers: HeaderMap,
) -> Response
where
    S: ReviewStore + 'static,
{
    no_content(path(ids).and_then(|(review_id, image_id)| {
        let actor = actor_from_headers(&headers)?;
        service.delete_image(actor, ReviewId(review_id), ImageId(image_id))
    }))
}

pub(crate) async fn file_report_handler<S>(
    State(service): Shared<S>,
    review_id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<CreateReportRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(review_id).and_then(|review_id| {
        let draft = body(payload)?.validate()?;
        service.file_report(ReviewId(review_id), draft)
    });
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn list_reports_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    params: Result<Query<ReportListQuery>, QueryRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = actor_from_headers(&headers).and_then(|actor| {
        let params = query(params)?;
        let filter = ReportFilter {
            status: params.status,
            review_id: params.review_id,
        };
        service.list_reports(actor, filter)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn get_report_handler<S>(
    State(service): Shared<S>,
    report_id: Result<Path<u64>, PathRejection>,
    headers: HeaderMap,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(report_id).and_then(|report_id| {
        let actor = actor_from_headers(&headers)?;
        service.get_report(actor, ReportId(report_id))
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn transition_report_handler<S>(
    State(service): Shared<S>,
    report_id: Result<Path<u64>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<TransitionReportRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(report_id).and_then(|report_id| {
        let actor = actor_from_headers(&headers)?;
        let transition = body(payload)?.validate()?;
        service.transition_report(actor, ReportId(report_id), transition)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn delete_report_handler<S>(
    State(service): Shared<S>,
    report_id: Result<Path<u64>, PathRejection>,
    headers: HeaderMap,
) -> Response
where
    S: ReviewStore + 'static,
{
    no_content(path(report_id).and_then(|report_id| {
        let actor = actor_from_headers(&headers)?;
        service.delete_report(actor, ReportId(report_id))
    }))
}

pub(crate) async fn quality_handler<S>(
    State(service): Shared<S>,
    headers: HeaderMap,
    params: Result<Query<QualityQuery>, QueryRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = actor_from_headers(&headers)
        .and_then(|actor| service.quality_listing(actor, query(params)?));
    respond(StatusCode::OK, result)
}

pub(crate) async fn reverify_handler<S>(State(service): Shared<S>, headers: HeaderMap) -> Response
where
    S: ReviewStore + 'static,
{
    let result = actor_from_headers(&headers).and_then(|actor| service.reverify_all(actor));
    respond(StatusCode::OK, result)
}

pub(crate) async fn verification_handler<S>(
    State(service): Shared<S>,
    review_id: Result<Path<u64>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<VerificationRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(review_id).and_then(|review_id| {
        let actor = actor_from_headers(&headers)?;
        let request = body(payload)?;
        service.set_verification(actor, ReviewId(review_id), request.is_verified)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn reaggregate_handler<S>(
    State(service): Shared<S>,
    hospital_id: Result<Path<u64>, PathRejection>,
    headers: HeaderMap,
) -> Response
where
    S: ReviewStore + 'static,
{
    let result = path(hospital_id).and_then(|hospital_id| {
        let actor = actor_from_headers(&headers)?;
        service.reaggregate(actor, HospitalId(hospital_id))
    });
    respond(StatusCode::OK, result)
}
