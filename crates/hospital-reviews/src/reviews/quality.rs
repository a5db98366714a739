use serde::{Deserialize, Serialize};

use super::domain::{Review, ReviewId};

/// Highest score the rubric can produce.
pub const MAX_QUALITY_SCORE: u8 = 100;

/// Signals counted from rows related to the review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySignals {
    pub image_count: u32,
    pub like_count: u32,
    pub comment_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFactor {
    ContentLength,
    Title,
    Authorship,
    Images,
    Likes,
    Comments,
}

/// Discrete contribution to a quality score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityComponent {
    pub factor: QualityFactor,
    pub score: u8,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityOutcome {
    pub review_id: ReviewId,
    pub total_score: u8,
    pub components: Vec<QualityComponent>,
}

/// Stateless scorer for admin review triage. Scores are never persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityEngine;

impl QualityEngine {
    pub fn score(&self, review: &Review, signals: QualitySignals) -> QualityOutcome {
        let content_chars = review.content.chars().count();
        let has_title = review
            .title
            .as_deref()
            .map(|title| !title.trim().is_empty())
            .unwrap_or(false);

        let components = vec![
            QualityComponent {
                factor: QualityFactor::ContentLength,
                score: content_length_points(content_chars),
                notes: format!("{content_chars} characters of content"),
            },
            QualityComponent {
                factor: QualityFactor::Title,
                score: if has_title { 10 } else { 0 },
                notes: if has_title {
                    "title present".to_string()
                } else {
                    "no title".to_string()
                },
            },
            QualityComponent {
                factor: QualityFactor::Authorship,
                score: if review.user_id.is_some() { 20 } else { 0 },
                notes: if review.user_id.is_some() {
                    "written by a signed-in user".to_string()
                } else {
                    "anonymous author".to_string()
                },
            },
            QualityComponent {
                factor: QualityFactor::Images,
                score: image_points(signals.image_count),
                notes: format!("{} image(s)", signals.image_count),
            },
            QualityComponent {
                factor: QualityFactor::Likes,
                score: like_points(signals.like_count),
                notes: format!("{} like(s)", signals.like_count),
            },
            QualityComponent {
                factor: QualityFactor::Comments,
                score: comment_points(signals.comment_count),
                notes: format!("{} comment(s)", signals.comment_count),
            },
        ];

        let total: u32 = components.iter().map(|c| u32::from(c.score)).sum();
        let total_score = total.min(u32::from(MAX_QUALITY_SCORE)) as u8;

        QualityOutcome {
            review_id: review.id,
            total_score,
            components,
        }
    }
}

fn content_length_points(chars: usize) -> u8 {
    match chars {
        n if n >= 30 => 20,
        n if n >= 15 => 10,
        _ => 0,
    }
}

fn image_points(count: u32) -> u8 {
    match count {
        n if n >= 3 => 15,
        n if n >= 1 => 10,
        _ => 0,
    }
}

fn like_points(count: u32) -> u8 {
    match count {
        n if n >= 10 => 20,
        n if n >= 5 => 15,
        n if n >= 1 => 10,
        _ => 0,
    }
}

fn comment_points(count: u32) -> u8 {
    match count {
        n if n >= 5 => 15,
        n if n >= 1 => 10,
        _ => 0,
    }
}
