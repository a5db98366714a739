//! Strict request schemas and the validation step in front of the policy engines.
//!
//! Bodies reject unknown fields and wrong types at deserialization. Required fields are
//! modelled as `Option` so a missing value yields a field-specific [`ValidationError`]
//! instead of a generic decode failure.

use serde::Deserialize;

use super::domain::{ReportReason, ReportStatus, ReviewId, UserId};
use super::moderation::ReportTransition;
use super::rating::Rating;

const MAX_NAME_CHARS: usize = 100;
const MAX_TITLE_CHARS: usize = 200;
const MAX_CONTENT_CHARS: usize = 5_000;
const MAX_CAPTION_CHARS: usize = 500;
const MAX_NOTE_CHARS: usize = 2_000;
const MAX_URL_CHARS: usize = 2_048;

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn required(field: &'static str) -> Self {
        Self::new(field, "is required")
    }
}

fn required_text(
    field: &'static str,
    value: Option<String>,
    max_chars: usize,
) -> Result<String, ValidationError> {
    optional_text(field, value, max_chars)?.ok_or_else(|| ValidationError::required(field))
}

fn optional_text(
    field: &'static str,
    value: Option<String>,
    max_chars: usize,
) -> Result<Option<String>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max_chars} characters"),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

fn optional_email(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>, ValidationError> {
    let email = optional_text(field, value, MAX_NAME_CHARS * 2)?;
    match email {
        Some(email) if !email.contains('@') => {
            Err(ValidationError::new(field, "must be an e-mail address"))
        }
        other => Ok(other),
    }
}

fn rating(value: f64) -> Result<Rating, ValidationError> {
    Rating::from_client(value).map_err(|err| ValidationError::new("rating", err.to_string()))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateReviewRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub rating: Option<f64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub language: Option<String>,
    pub user_id: Option<UserId>,
}

/// Validated review submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub author_name: String,
    pub email: Option<String>,
    pub rating: Rating,
    pub title: Option<String>,
    pub content: String,
    pub language: Option<String>,
    pub claimed_user: Option<UserId>,
}

impl CreateReviewRequest {
    pub fn validate(self) -> Result<ReviewDraft, ValidationError> {
        let author_name = required_text("name", self.name, MAX_NAME_CHARS)?;
        let rating = rating(self.rating.ok_or_else(|| ValidationError::required("rating"))?)?;
        let content = required_text("content", self.content, MAX_CONTENT_CHARS)?;

        Ok(ReviewDraft {
            author_name,
            email: optional_email("email", self.email)?,
            rating,
            title: optional_text("title", self.title, MAX_TITLE_CHARS)?,
            content,
            language: optional_text("language", self.language, 16)?,
            claimed_user: self.user_id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateReviewRequest {
    pub rating: Option<f64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub language: Option<String>,
}

/// Validated partial review update. `title`/`language` of `Some(None)` clear the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPatch {
    pub rating: Option<Rating>,
    pub title: Option<Option<String>>,
    pub content: Option<String>,
    pub language: Option<Option<String>>,
}

impl UpdateReviewRequest {
    pub fn validate(self) -> Result<ReviewPatch, ValidationError> {
        let content = match self.content {
            Some(content) => Some(required_text("content", Some(content), MAX_CONTENT_CHARS)?),
            None => None,
        };

        Ok(ReviewPatch {
            rating: self.rating.map(rating).transpose()?,
            title: match self.title {
                Some(title) => Some(optional_text("title", Some(title), MAX_TITLE_CHARS)?),
                None => None,
            },
            content,
            language: match self.language {
                Some(language) => Some(optional_text("language", Some(language), 16)?),
                None => None,
            },
        })
    }
}

/// Sort orders offered by the review listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewSort {
    #[default]
    Latest,
    Oldest,
    RatingHigh,
    RatingLow,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListReviewsQuery {
    pub sort_by: Option<ReviewSort>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReactionRequest {
    pub is_like: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub author_name: Option<String>,
    pub content: Option<String>,
    pub is_hospital_reply: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub author_name: String,
    pub content: String,
    pub is_hospital_reply: bool,
}

impl CreateCommentRequest {
    pub fn validate(self) -> Result<CommentDraft, ValidationError> {
        Ok(CommentDraft {
            author_name: required_text("authorName", self.author_name, MAX_NAME_CHARS)?,
            content: required_text("content", self.content, MAX_CONTENT_CHARS)?,
            is_hospital_reply: self.is_hospital_reply.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub author_name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentPatch {
    pub author_name: Option<String>,
    pub content: Option<String>,
}

impl UpdateCommentRequest {
    pub fn validate(self) -> Result<CommentPatch, ValidationError> {
        let author_name = match self.author_name {
            Some(name) => Some(required_text("authorName", Some(name), MAX_NAME_CHARS)?),
            None => None,
        };
        let content = match self.content {
            Some(content) => Some(required_text("content", Some(content), MAX_CONTENT_CHARS)?),
            None => None,
        };
        Ok(CommentPatch {
            author_name,
            content,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateImageRequest {
    pub image_url: Option<String>,
    pub caption: Option<String>,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDraft {
    pub image_url: String,
    pub caption: Option<String>,
    pub order: Option<i32>,
}

impl CreateImageRequest {
    pub fn validate(self) -> Result<ImageDraft, ValidationError> {
        Ok(ImageDraft {
            image_url: required_text("imageUrl", self.image_url, MAX_URL_CHARS)?,
            caption: optional_text("caption", self.caption, MAX_CAPTION_CHARS)?,
            order: self.order,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateReportRequest {
    pub reason: Option<ReportReason>,
    pub description: Option<String>,
    pub reporter_name: Option<String>,
    pub reporter_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDraft {
    pub reason: ReportReason,
    pub description: Option<String>,
    pub reporter_name: Option<String>,
    pub reporter_email: Option<String>,
}

impl CreateReportRequest {
    pub fn validate(self) -> Result<ReportDraft, ValidationError> {
        Ok(ReportDraft {
            reason: self.reason.ok_or_else(|| ValidationError::required("reason"))?,
            description: optional_text("description", self.description, MAX_CONTENT_CHARS)?,
            reporter_name: optional_text("reporterName", self.reporter_name, MAX_NAME_CHARS)?,
            reporter_email: optional_email("reporterEmail", self.reporter_email)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransitionReportRequest {
    pub status: Option<ReportStatus>,
    pub admin_note: Option<String>,
}

impl TransitionReportRequest {
    pub fn validate(self) -> Result<ReportTransition, ValidationError> {
        Ok(ReportTransition {
            status: self.status.ok_or_else(|| ValidationError::required("status"))?,
            admin_note: optional_text("adminNote", self.admin_note, MAX_NOTE_CHARS)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportListQuery {
    pub status: Option<ReportStatus>,
    pub review_id: Option<ReviewId>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QualityQuery {
    pub min_score: Option<u8>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerificationRequest {
    pub is_verified: bool,
}
