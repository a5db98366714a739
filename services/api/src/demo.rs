use clap::Args;
use hospital_reviews::config::ReviewsConfig;
use hospital_reviews::error::AppError;
use hospital_reviews::reviews::input::{CreateReportRequest, CreateReviewRequest, ReviewDraft};
use hospital_reviews::reviews::{
    Actor, Hospital, HospitalId, InMemoryReviewStore, Reaction, ReportFilter, ReportReason,
    ReportStatus, ReportTransition, ReviewId, ReviewService, ReviewServiceError, UserId,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Name of the hospital the demo reviews are written against.
    #[arg(long, default_value = "Riverside General Hospital")]
    pub(crate) hospital: String,
    /// Skip the report moderation portion of the demo.
    #[arg(long)]
    pub(crate) skip_moderation: bool,
}

const DEMO_ADMIN: Actor = Actor::Admin(UserId(1));
const CLEAN_REVIEW: &str = "Staff explained every step clearly.";

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryReviewStore::new());
    let hospital = store.insert_hospital(args.hospital.as_str());
    let service = ReviewService::new(store, ReviewsConfig::default());

    println!("Hospital review demo");
    println!("Hospital: {} (id {})", hospital.name, hospital.id);

    println!("\nRating aggregation");
    print_aggregate(&service.hospital(hospital.id)?);
    for (author, rating) in [(Actor::User(UserId(10)), 4.5), (Actor::Anonymous, 3.0)] {
        let review = service.create_review(author, hospital.id, demo_draft(rating)?)?;
        println!("  + review {} rated {}", review.id, review.rating);
        print_aggregate(&service.hospital(hospital.id)?);
    }

    println!("\nAuto-verification");
    let signed_in = service.create_review(Actor::User(UserId(11)), hospital.id, demo_draft(4.0)?)?;
    let anonymous = service.create_review(Actor::Anonymous, hospital.id, demo_draft(4.0)?)?;
    println!(
        "  signed-in author, {} characters: verified = {}",
        signed_in.content.chars().count(),
        signed_in.is_verified
    );
    println!(
        "  anonymous author, same content: verified = {}",
        anonymous.is_verified
    );

    println!("\nReactions");
    let reader = Actor::User(UserId(12));
    for reaction in [Reaction::Like, Reaction::Dislike, Reaction::Dislike] {
        let outcome = service.react(reader, signed_in.id, reaction)?;
        let state = match outcome.reaction {
            Some(Reaction::Like) => "like",
            Some(Reaction::Dislike) => "dislike",
            None => "none",
        };
        println!(
            "  {:?}: likes {} / dislikes {} (state {})",
            reaction, outcome.like_count, outcome.dislike_count, state
        );
    }

    if !args.skip_moderation {
        run_moderation(&service, hospital.id, anonymous.id)?;
    }

    Ok(())
}

fn run_moderation(
    service: &ReviewService<InMemoryReviewStore>,
    hospital: HospitalId,
    review_id: ReviewId,
) -> Result<(), AppError> {
    println!("\nModeration");
    let request = CreateReportRequest {
        reason: Some(ReportReason::Spam),
        description: Some("Reads like an advert".to_string()),
        ..Default::default()
    };
    let draft = request.validate().map_err(ReviewServiceError::from)?;
    let report = service.file_report(review_id, draft)?;
    println!("  report {} filed as {}", report.id, report.status.label());

    let resolved = service.transition_report(
        DEMO_ADMIN,
        report.id,
        ReportTransition::to(ReportStatus::Dismissed).with_note("content checked, kept"),
    )?;
    println!(
        "  report {} moved to {} ({})",
        resolved.id,
        resolved.status.label(),
        resolved.admin_note.as_deref().unwrap_or("no note")
    );

    let listing = service.list_reports(DEMO_ADMIN, ReportFilter::default())?;
    println!(
        "  tally: pending {}, reviewed {}, resolved {}, dismissed {}",
        listing.tally.pending,
        listing.tally.reviewed,
        listing.tally.resolved,
        listing.tally.dismissed
    );

    let summary = service.reverify_all(DEMO_ADMIN)?;
    println!(
        "  re-verification examined {} review(s), changed {}",
        summary.examined, summary.changed
    );
    print_aggregate(&service.hospital(hospital)?);
    Ok(())
}

fn demo_draft(rating: f64) -> Result<ReviewDraft, AppError> {
    let request = CreateReviewRequest {
        name: Some("Demo Reviewer".to_string()),
        rating: Some(rating),
        content: Some(CLEAN_REVIEW.to_string()),
        ..Default::default()
    };
    request
        .validate()
        .map_err(|err| AppError::Review(ReviewServiceError::from(err)))
}

fn print_aggregate(hospital: &Hospital) {
    match hospital.rating {
        Some(rating) => println!(
            "  aggregate: rating {} from {} review(s)",
            rating, hospital.review_count
        ),
        None => println!("  aggregate: no rating yet ({} reviews)", hospital.review_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_end_to_end() {
        run_demo(DemoArgs {
            hospital: "Demo Clinic".to_string(),
            skip_moderation: false,
        })
        .expect("demo completes");
    }

    #[test]
    fn demo_drafts_validate() {
        let draft = demo_draft(3.3).expect("valid");
        assert_eq!(draft.rating.value(), 3.5);
        assert_eq!(draft.content.chars().count(), 35);
    }
}
