use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rating::{AggregateRating, Rating};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identifier!(
    /// Identifier for a listed hospital.
    HospitalId
);
identifier!(
    /// Identifier for a review.
    ReviewId
);
identifier!(
    /// Identifier issued by the external authentication service.
    UserId
);
identifier!(ReactionId);
identifier!(CommentId);
identifier!(ImageId);
identifier!(ReportId);

/// Hospital row as seen by the review engine; only the aggregate fields are owned here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: HospitalId,
    pub name: String,
    pub rating: Option<AggregateRating>,
    pub review_count: u32,
}

/// Aggregate fields written back by the rating aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalAggregate {
    pub rating: Option<AggregateRating>,
    pub review_count: u32,
}

impl HospitalAggregate {
    pub const EMPTY: HospitalAggregate = HospitalAggregate {
        rating: None,
        review_count: 0,
    };
}

/// Counters derived from the reaction and comment rows of a review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCounters {
    pub like_count: u32,
    pub dislike_count: u32,
    pub comment_count: u32,
}

/// Persisted review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub hospital_id: HospitalId,
    pub user_id: Option<UserId>,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub rating: Rating,
    pub title: Option<String>,
    pub content: String,
    pub language: Option<String>,
    pub is_verified: bool,
    #[serde(flatten)]
    pub counters: ReviewCounters,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review fields accepted by the store on insert; counters always start at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub hospital_id: HospitalId,
    pub user_id: Option<UserId>,
    pub author_name: String,
    pub email: Option<String>,
    pub rating: Rating,
    pub title: Option<String>,
    pub content: String,
    pub language: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// A single user's reaction row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLike {
    pub id: ReactionId,
    pub review_id: ReviewId,
    pub user_id: UserId,
    pub is_like: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewComment {
    pub id: CommentId,
    pub review_id: ReviewId,
    pub user_id: Option<UserId>,
    pub author_name: String,
    pub content: String,
    pub is_hospital_reply: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub review_id: ReviewId,
    pub user_id: Option<UserId>,
    pub author_name: String,
    pub content: String,
    pub is_hospital_reply: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewImage {
    pub id: ImageId,
    pub review_id: ReviewId,
    pub image_url: String,
    pub caption: Option<String>,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub review_id: ReviewId,
    pub image_url: String,
    pub caption: Option<String>,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

/// Reasons a reader may flag a review for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Inappropriate,
    False,
    Harassment,
    Other,
}

impl ReportReason {
    pub const fn label(self) -> &'static str {
        match self {
            ReportReason::Spam => "spam",
            ReportReason::Inappropriate => "inappropriate",
            ReportReason::False => "false",
            ReportReason::Harassment => "harassment",
            ReportReason::Other => "other",
        }
    }
}

/// Moderation status of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 4] = [
        ReportStatus::Pending,
        ReportStatus::Reviewed,
        ReportStatus::Resolved,
        ReportStatus::Dismissed,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReport {
    pub id: ReportId,
    pub review_id: ReviewId,
    pub reason: ReportReason,
    pub description: Option<String>,
    pub reporter_name: Option<String>,
    pub reporter_email: Option<String>,
    pub status: ReportStatus,
    pub admin_note: Option<String>,
    pub handled_by: Option<UserId>,
    pub handled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub review_id: ReviewId,
    pub reason: ReportReason,
    pub description: Option<String>,
    pub reporter_name: Option<String>,
    pub reporter_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller identity handed over by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(UserId),
    Admin(UserId),
}

impl Actor {
    pub fn user_id(self) -> Option<UserId> {
        match self {
            Actor::Anonymous => None,
            Actor::User(id) | Actor::Admin(id) => Some(id),
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Actor::Admin(_))
    }

    /// Owner-or-admin check used by every mutation on an owned resource.
    pub fn may_modify(self, owner: Option<UserId>) -> bool {
        match self {
            Actor::Admin(_) => true,
            Actor::User(id) => owner == Some(id),
            Actor::Anonymous => false,
        }
    }
}
