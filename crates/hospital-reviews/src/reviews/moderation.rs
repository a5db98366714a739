//! Report moderation lifecycle.
//!
//! Reports move between `pending`, `reviewed`, `resolved`, and `dismissed` only through
//! an explicit admin transition. Every state is reachable from every other state. The
//! workflow records evidence only; hiding or deleting the reported review is a separate
//! admin action on the review itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ReportStatus, ReviewReport, UserId};

/// Admin decision applied to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTransition {
    pub status: ReportStatus,
    /// Replaces the stored note when present; an absent note keeps the previous one.
    pub admin_note: Option<String>,
}

impl ReportTransition {
    pub fn to(status: ReportStatus) -> Self {
        Self {
            status,
            admin_note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.admin_note = Some(note.into());
        self
    }

    pub(crate) fn apply(
        self,
        mut report: ReviewReport,
        admin: UserId,
        now: DateTime<Utc>,
    ) -> ReviewReport {
        report.status = self.status;
        if let Some(note) = self.admin_note {
            report.admin_note = Some(note);
        }
        report.handled_by = Some(admin);
        report.handled_at = Some(now);
        report.updated_at = now;
        report
    }
}

/// Count of reports per status, used by the admin listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTally {
    pub pending: usize,
    pub reviewed: usize,
    pub resolved: usize,
    pub dismissed: usize,
}

impl StatusTally {
    pub fn from_reports<'a, I>(reports: I) -> Self
    where
        I: IntoIterator<Item = &'a ReviewReport>,
    {
        reports
            .into_iter()
            .fold(Self::default(), |mut tally, report| {
                match report.status {
                    ReportStatus::Pending => tally.pending += 1,
                    ReportStatus::Reviewed => tally.reviewed += 1,
                    ReportStatus::Resolved => tally.resolved += 1,
                    ReportStatus::Dismissed => tally.dismissed += 1,
                }
                tally
            })
    }
}
