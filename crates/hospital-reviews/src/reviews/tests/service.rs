use super::common::*;
use std::sync::Arc;

use crate::config::ReviewsConfig;
use crate::reviews::domain::{Actor, ReportReason, ReportStatus, UserId};
use crate::reviews::input::{
    CommentDraft, CommentPatch, ImageDraft, ListReviewsQuery, ReportDraft, ReviewPatch,
    ReviewSort,
};
use crate::reviews::moderation::ReportTransition;
use crate::reviews::reactions::Reaction;
use crate::reviews::repository::{ReportFilter, ReviewStore};
use crate::reviews::{Resource, ReviewService, ReviewServiceError};

fn comment() -> CommentDraft {
    CommentDraft {
        author_name: "Avery".to_string(),
        content: "Thanks for sharing this.".to_string(),
        is_hospital_reply: false,
    }
}

fn image(order: Option<i32>) -> ImageDraft {
    ImageDraft {
        image_url: "https://cdn.example.org/lobby.jpg".to_string(),
        caption: Some("Lobby".to_string()),
        order,
    }
}

fn report(reason: ReportReason) -> ReportDraft {
    ReportDraft {
        reason,
        description: Some("Looks like an advert".to_string()),
        reporter_name: None,
        reporter_email: None,
    }
}

#[test]
fn hospital_aggregate_tracks_reviews() {
    let (service, _, hospital) = build_service();
    assert_eq!(hospital.rating, None);
    assert_eq!(hospital.review_count, 0);

    seed_review(&service, hospital.id, user(1), 4.5);
    let after_first = service.hospital(hospital.id).expect("hospital");
    assert_eq!(after_first.rating.map(|r| r.value()), Some(4.5));
    assert_eq!(after_first.review_count, 1);

    seed_review(&service, hospital.id, user(2), 3.0);
    let after_second = service.hospital(hospital.id).expect("hospital");
    assert_eq!(after_second.rating.map(|r| r.value()), Some(3.8));
    assert_eq!(after_second.review_count, 2);
}

#[test]
fn deleting_the_last_review_clears_the_rating() {
    let (service, store, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 2.0);
    service
        .react(user(2), review.id, Reaction::Like)
        .expect("like");
    service
        .add_comment(user(2), review.id, comment())
        .expect("comment");
    service
        .file_report(review.id, report(ReportReason::Spam))
        .expect("report");

    service
        .delete_review(user(1), hospital.id, review.id)
        .expect("owner deletes");

    let hospital = service.hospital(hospital.id).expect("hospital");
    assert_eq!(hospital.rating, None);
    assert_eq!(hospital.review_count, 0);
    assert!(store.reactions_for_review(review.id).expect("rows").is_empty());
    assert!(store.comments_for_review(review.id).expect("rows").is_empty());
    assert!(store
        .list_reports(ReportFilter::default())
        .expect("rows")
        .is_empty());
}

#[test]
fn rating_edit_triggers_reaggregation() {
    let (service, _, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 5.0);

    let updated = service
        .update_review(
            user(1),
            hospital.id,
            review.id,
            ReviewPatch {
                rating: Some(rating(1.0)),
                ..Default::default()
            },
        )
        .expect("owner edits");
    assert_eq!(updated.rating.value(), 1.0);

    let hospital = service.hospital(hospital.id).expect("hospital");
    assert_eq!(hospital.rating.map(|r| r.value()), Some(1.0));
}

#[test]
fn unchanged_snapped_rating_skips_reaggregation() {
    let (service, store, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 4.0);
    store
        .save_hospital_aggregate(hospital.id, crate::reviews::HospitalAggregate::EMPTY)
        .expect("manual overwrite");

    service
        .update_review(
            user(1),
            hospital.id,
            review.id,
            ReviewPatch {
                rating: Some(rating(4.2)),
                content: Some("Second visit went just as smoothly.".to_string()),
                ..Default::default()
            },
        )
        .expect("owner edits");
    let untouched = service.hospital(hospital.id).expect("hospital");
    assert_eq!(untouched.rating, None);
    assert_eq!(untouched.review_count, 0);

    service
        .update_review(
            user(1),
            hospital.id,
            review.id,
            ReviewPatch {
                rating: Some(rating(3.0)),
                ..Default::default()
            },
        )
        .expect("owner edits");
    let refreshed = service.hospital(hospital.id).expect("hospital");
    assert_eq!(refreshed.rating.map(|r| r.value()), Some(3.0));
    assert_eq!(refreshed.review_count, 1);
}

#[test]
fn edits_keep_an_admin_verification_override() {
    let (service, _, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 4.0);
    assert!(review.is_verified);

    service
        .set_verification(admin(), review.id, false)
        .expect("override");
    let edited = service
        .update_review(
            user(1),
            hospital.id,
            review.id,
            ReviewPatch {
                title: Some(Some("Follow-up".to_string())),
                ..Default::default()
            },
        )
        .expect("owner edits");

    assert!(!edited.is_verified);
    assert_eq!(edited.title.as_deref(), Some("Follow-up"));
}

#[test]
fn claimed_user_must_match_caller() {
    let (service, _, hospital) = build_service();
    let mut claimed = draft(4.0, CLEAN_CONTENT);
    claimed.claimed_user = Some(UserId(7));

    let err = service
        .create_review(user(8), hospital.id, claimed.clone())
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Forbidden));

    let err = service
        .create_review(Actor::Anonymous, hospital.id, claimed.clone())
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Unauthenticated));

    let review = service
        .create_review(user(7), hospital.id, claimed)
        .expect("matching caller");
    assert_eq!(review.user_id, Some(UserId(7)));
}

#[test]
fn unknown_hospital_is_not_found() {
    let (service, _, _) = build_service();
    let err = service
        .create_review(user(1), crate::reviews::HospitalId(404), draft(4.0, CLEAN_CONTENT))
        .unwrap_err();
    assert!(matches!(
        err,
        ReviewServiceError::NotFound {
            resource: Resource::Hospital,
            id: 404
        }
    ));
}

#[test]
fn only_owner_or_admin_may_modify() {
    let (service, _, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 4.0);

    let err = service
        .update_review(user(2), hospital.id, review.id, ReviewPatch::default())
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Forbidden));
    assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);

    let err = service
        .delete_review(Actor::Anonymous, hospital.id, review.id)
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Unauthenticated));

    service
        .delete_review(admin(), hospital.id, review.id)
        .expect("admin deletes");
}

#[test]
fn anonymous_reviews_can_only_be_changed_by_admins() {
    let (service, _, hospital) = build_service();
    let review = seed_review(&service, hospital.id, Actor::Anonymous, 4.0);

    let err = service
        .update_review(user(1), hospital.id, review.id, ReviewPatch::default())
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Forbidden));

    service
        .update_review(
            admin(),
            hospital.id,
            review.id,
            ReviewPatch {
                title: Some(None),
                ..Default::default()
            },
        )
        .expect("admin edits");
}

#[test]
fn listing_pages_and_sorts() {
    let (service, _, hospital) = build_service();
    for (author, value) in [(1, 3.0), (2, 5.0), (3, 1.5), (4, 4.0), (5, 2.5)] {
        seed_review(&service, hospital.id, user(author), value);
    }

    let page = service
        .list_reviews(
            hospital.id,
            ListReviewsQuery {
                sort_by: Some(ReviewSort::RatingHigh),
                page: Some(2),
                limit: Some(2),
            },
        )
        .expect("page");
    let ratings: Vec<f64> = page.reviews.iter().map(|r| r.rating.value()).collect();
    assert_eq!(ratings, vec![3.0, 2.5]);
    assert_eq!(page.pagination.total_count, 5);
    assert_eq!(page.pagination.total_pages, 3);
    assert!(page.pagination.has_next_page);
    assert!(page.pagination.has_prev_page);

    let oldest = service
        .list_reviews(
            hospital.id,
            ListReviewsQuery {
                sort_by: Some(ReviewSort::Oldest),
                page: None,
                limit: Some(500),
            },
        )
        .expect("page");
    assert_eq!(oldest.pagination.limit, ReviewsConfig::default().max_page_limit);
    assert_eq!(oldest.reviews.first().map(|r| r.rating.value()), Some(3.0));

    let err = service
        .list_reviews(
            hospital.id,
            ListReviewsQuery {
                page: Some(0),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Validation(_)));
}

#[test]
fn reaction_toggle_walks_like_dislike_none() {
    let (service, store, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 4.0);

    let liked = service
        .react(user(2), review.id, Reaction::Like)
        .expect("like");
    assert_eq!((liked.like_count, liked.dislike_count), (1, 0));
    assert_eq!(liked.reaction, Some(Reaction::Like));

    let switched = service
        .react(user(2), review.id, Reaction::Dislike)
        .expect("dislike");
    assert_eq!((switched.like_count, switched.dislike_count), (0, 1));

    let cleared = service
        .react(user(2), review.id, Reaction::Dislike)
        .expect("dislike again");
    assert_eq!((cleared.like_count, cleared.dislike_count), (0, 0));
    assert!(cleared.cleared);
    assert_eq!(
        service.reaction_state(user(2), review.id).expect("state"),
        None
    );
    assert!(store.reactions_for_review(review.id).expect("rows").is_empty());

    let err = service
        .react(Actor::Anonymous, review.id, Reaction::Like)
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Unauthenticated));
}

#[test]
fn reacting_to_a_review_deleted_mid_request_is_not_found() {
    let store = Arc::new(FaultyStore {
        reviews_vanish_on_react: true,
        ..Default::default()
    });
    let hospital = store.inner.insert_hospital("St. Mary Medical Center");
    let service = ReviewService::new(store.clone(), ReviewsConfig::default());
    let review = service
        .create_review(user(1), hospital.id, draft(4.0, CLEAN_CONTENT))
        .expect("review");

    let err = service
        .react(user(2), review.id, Reaction::Like)
        .unwrap_err();
    assert!(matches!(
        err,
        ReviewServiceError::NotFound {
            resource: Resource::Review,
            ..
        }
    ));
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
}

#[test]
fn counters_match_rows_after_concurrent_reactions() {
    let (service, store, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 4.0);
    let service = Arc::new(service);
    let review_id = review.id;

    let handles: Vec<_> = (10..26)
        .map(|voter| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                let reaction = if voter % 2 == 0 {
                    Reaction::Like
                } else {
                    Reaction::Dislike
                };
                service.react(user(voter), review_id, reaction).expect("react");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    let stored = store.fetch_review(review_id).expect("fetch").expect("present");
    assert_eq!(stored.counters.like_count, 8);
    assert_eq!(stored.counters.dislike_count, 8);
}

#[test]
fn comment_count_follows_rows() {
    let (service, _, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 4.0);

    let first = service
        .add_comment(user(2), review.id, comment())
        .expect("comment");
    service
        .add_comment(Actor::Anonymous, review.id, comment())
        .expect("comment");
    let stored = service.get_review(hospital.id, review.id).expect("review");
    assert_eq!(stored.counters.comment_count, 2);

    let err = service
        .delete_comment(user(3), review.id, first.id)
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Forbidden));

    service
        .delete_comment(user(2), review.id, first.id)
        .expect("author deletes");
    let stored = service.get_review(hospital.id, review.id).expect("review");
    assert_eq!(stored.counters.comment_count, 1);
    assert_eq!(service.list_comments(review.id).expect("list").len(), 1);
}

#[test]
fn comment_edits_are_owner_or_admin_only() {
    let (service, store, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 4.0);
    let posted = service
        .add_comment(user(2), review.id, comment())
        .expect("comment");

    let err = service
        .update_comment(
            user(3),
            review.id,
            posted.id,
            CommentPatch {
                content: Some("Hijacked".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Forbidden));

    let edited = service
        .update_comment(
            user(2),
            review.id,
            posted.id,
            CommentPatch {
                content: Some("Thanks, this helped a lot.".to_string()),
                ..Default::default()
            },
        )
        .expect("author edits");
    assert_eq!(edited.content, "Thanks, this helped a lot.");
    assert_eq!(edited.author_name, "Avery");

    service
        .update_comment(
            admin(),
            review.id,
            posted.id,
            CommentPatch {
                author_name: Some("Moderated".to_string()),
                ..Default::default()
            },
        )
        .expect("admin edits");
    let stored = store
        .fetch_comment(posted.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.author_name, "Moderated");
    assert_eq!(stored.content, "Thanks, this helped a lot.");

    let counted = service.get_review(hospital.id, review.id).expect("review");
    assert_eq!(counted.counters.comment_count, 1);
}

#[test]
fn image_deletion_checks_ownership_and_parent_review() {
    let (service, store, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 4.0);
    let other = seed_review(&service, hospital.id, user(2), 3.0);
    let lobby = service
        .add_image(user(1), review.id, image(None))
        .expect("image");
    let ward = service
        .add_image(user(1), review.id, image(None))
        .expect("image");
    let foreign = service
        .add_image(user(2), other.id, image(None))
        .expect("image");

    let err = service
        .delete_image(user(1), review.id, foreign.id)
        .unwrap_err();
    assert!(matches!(
        err,
        ReviewServiceError::NotFound {
            resource: Resource::Image,
            ..
        }
    ));

    let err = service
        .delete_image(user(2), review.id, lobby.id)
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Forbidden));

    let err = service
        .delete_image(Actor::Anonymous, review.id, lobby.id)
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Unauthenticated));

    service
        .delete_image(user(1), review.id, lobby.id)
        .expect("owner deletes");
    assert!(store.fetch_image(lobby.id).expect("fetch").is_none());

    service
        .delete_image(admin(), review.id, ward.id)
        .expect("admin deletes");
    assert!(service.list_images(review.id).expect("list").is_empty());
    assert_eq!(service.list_images(other.id).expect("list").len(), 1);
}

#[test]
fn images_append_after_the_current_last_order() {
    let (service, _, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 4.0);

    let first = service
        .add_image(user(1), review.id, image(None))
        .expect("image");
    assert_eq!(first.order, 0);
    service
        .add_image(user(1), review.id, image(Some(7)))
        .expect("image");
    let third = service
        .add_image(admin(), review.id, image(None))
        .expect("image");
    assert_eq!(third.order, 8);

    let orders: Vec<i32> = service
        .list_images(review.id)
        .expect("list")
        .iter()
        .map(|image| image.order)
        .collect();
    assert_eq!(orders, vec![0, 7, 8]);

    let err = service
        .add_image(user(2), review.id, image(None))
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Forbidden));
}

#[test]
fn report_lifecycle_is_admin_driven() {
    let (service, store, hospital) = build_service();
    let review = seed_review(&service, hospital.id, user(1), 4.0);

    let first = service
        .file_report(review.id, report(ReportReason::Spam))
        .expect("report");
    let second = service
        .file_report(review.id, report(ReportReason::Spam))
        .expect("duplicate report allowed");
    assert_eq!(first.status, ReportStatus::Pending);
    assert_ne!(first.id, second.id);

    let err = service
        .list_reports(user(1), ReportFilter::default())
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Forbidden));

    let resolved = service
        .transition_report(
            admin(),
            first.id,
            ReportTransition::to(ReportStatus::Resolved).with_note("advert removed upstream"),
        )
        .expect("transition");
    assert_eq!(resolved.status, ReportStatus::Resolved);
    assert_eq!(resolved.handled_by, Some(UserId(900)));

    let reopened = service
        .transition_report(admin(), first.id, ReportTransition::to(ReportStatus::Pending))
        .expect("back to pending");
    assert_eq!(reopened.admin_note.as_deref(), Some("advert removed upstream"));

    let listing = service
        .list_reports(
            admin(),
            ReportFilter {
                status: Some(ReportStatus::Pending),
                review_id: Some(review.id),
            },
        )
        .expect("listing");
    assert_eq!(listing.reports.len(), 2);
    assert_eq!(listing.reports[0].id, second.id);
    assert_eq!(listing.tally.pending, 2);

    service
        .delete_report(admin(), second.id)
        .expect("delete report");
    assert!(store.fetch_report(second.id).expect("fetch").is_none());
    let untouched = service.get_review(hospital.id, review.id).expect("review");
    assert_eq!(untouched, review);
}

#[test]
fn failed_aggregate_write_keeps_the_review() {
    let store = Arc::new(FaultyStore {
        stale_aggregates: true,
        ..Default::default()
    });
    let hospital = store.inner.insert_hospital("St. Mary Medical Center");
    let service = ReviewService::new(store.clone(), ReviewsConfig::default());

    let review = service
        .create_review(user(1), hospital.id, draft(4.0, CLEAN_CONTENT))
        .expect("primary write succeeds");
    assert!(store.fetch_review(review.id).expect("fetch").is_some());

    let stale = store.fetch_hospital(hospital.id).expect("fetch").expect("present");
    assert_eq!(stale.review_count, 0);

    let err = service.reaggregate(admin(), hospital.id).unwrap_err();
    assert!(matches!(err, ReviewServiceError::Repository(_)));
}

#[test]
fn reaggregate_repairs_drift() {
    let (service, store, hospital) = build_service();
    seed_review(&service, hospital.id, user(1), 4.0);
    store
        .save_hospital_aggregate(hospital.id, crate::reviews::HospitalAggregate::EMPTY)
        .expect("manual overwrite");

    let aggregate = service.reaggregate(admin(), hospital.id).expect("reaggregate");
    assert_eq!(aggregate.review_count, 1);
    assert_eq!(aggregate.rating.map(|r| r.value()), Some(4.0));
}
