use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    CommentId, Hospital, HospitalAggregate, HospitalId, ImageId, NewComment, NewImage, NewReport,
    NewReview, ReactionId, ReportId, Review, ReviewComment, ReviewCounters, ReviewId, ReviewImage,
    ReviewLike, ReviewReport, UserId,
};
use super::repository::{RepositoryError, ReportFilter, ReviewStore};

#[derive(Debug, Default)]
struct Tables {
    next_id: u64,
    hospitals: BTreeMap<HospitalId, Hospital>,
    reviews: BTreeMap<ReviewId, Review>,
    reactions: BTreeMap<ReactionId, ReviewLike>,
    comments: BTreeMap<CommentId, ReviewComment>,
    images: BTreeMap<ImageId, ReviewImage>,
    reports: BTreeMap<ReportId, ReviewReport>,
}

impl Tables {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store backing the service binary, the demo, and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReviewStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hospital with an empty aggregate. Listing CRUD lives outside this crate.
    pub fn insert_hospital(&self, name: impl Into<String>) -> Hospital {
        let mut tables = self.lock();
        let id = HospitalId(tables.allocate());
        let hospital = Hospital {
            id,
            name: name.into(),
            rating: None,
            review_count: 0,
        };
        tables.hospitals.insert(id, hospital.clone());
        hospital
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReviewStore for InMemoryReviewStore {
    fn fetch_hospital(&self, id: HospitalId) -> Result<Option<Hospital>, RepositoryError> {
        Ok(self.lock().hospitals.get(&id).cloned())
    }

    fn save_hospital_aggregate(
        &self,
        id: HospitalId,
        aggregate: HospitalAggregate,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        let hospital = tables
            .hospitals
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        hospital.rating = aggregate.rating;
        hospital.review_count = aggregate.review_count;
        Ok(())
    }

    fn insert_review(&self, review: NewReview) -> Result<Review, RepositoryError> {
        let mut tables = self.lock();
        if !tables.hospitals.contains_key(&review.hospital_id) {
            return Err(RepositoryError::NotFound);
        }
        let id = ReviewId(tables.allocate());
        let stored = Review {
            id,
            hospital_id: review.hospital_id,
            user_id: review.user_id,
            author_name: review.author_name,
            email: review.email,
            rating: review.rating,
            title: review.title,
            content: review.content,
            language: review.language,
            is_verified: review.is_verified,
            counters: ReviewCounters::default(),
            created_at: review.created_at,
            updated_at: review.created_at,
        };
        tables.reviews.insert(id, stored.clone());
        Ok(stored)
    }

    fn fetch_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(self.lock().reviews.get(&id).cloned())
    }

    fn update_review(&self, review: &Review) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        let stored = tables
            .reviews
            .get_mut(&review.id)
            .ok_or(RepositoryError::NotFound)?;
        let counters = stored.counters;
        let is_verified = stored.is_verified;
        *stored = review.clone();
        stored.counters = counters;
        stored.is_verified = is_verified;
        Ok(())
    }

    fn save_review_verification(
        &self,
        id: ReviewId,
        is_verified: bool,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        let stored = tables
            .reviews
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        stored.is_verified = is_verified;
        Ok(())
    }

    fn save_review_counters(
        &self,
        id: ReviewId,
        counters: ReviewCounters,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        let stored = tables
            .reviews
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        stored.counters = counters;
        Ok(())
    }

    fn delete_review(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if tables.reviews.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        tables.reactions.retain(|_, row| row.review_id != id);
        tables.comments.retain(|_, row| row.review_id != id);
        tables.images.retain(|_, row| row.review_id != id);
        tables.reports.retain(|_, row| row.review_id != id);
        Ok(())
    }

    fn reviews_for_hospital(&self, hospital: HospitalId) -> Result<Vec<Review>, RepositoryError> {
        Ok(self
            .lock()
            .reviews
            .values()
            .filter(|review| review.hospital_id == hospital)
            .cloned()
            .collect())
    }

    fn all_reviews(&self) -> Result<Vec<Review>, RepositoryError> {
        Ok(self.lock().reviews.values().cloned().collect())
    }

    fn fetch_reaction(
        &self,
        review: ReviewId,
        user: UserId,
    ) -> Result<Option<ReviewLike>, RepositoryError> {
        Ok(self
            .lock()
            .reactions
            .values()
            .find(|row| row.review_id == review && row.user_id == user)
            .cloned())
    }

    fn insert_reaction(
        &self,
        review: ReviewId,
        user: UserId,
        is_like: bool,
    ) -> Result<ReviewLike, RepositoryError> {
        let mut tables = self.lock();
        if !tables.reviews.contains_key(&review) {
            return Err(RepositoryError::NotFound);
        }
        if tables
            .reactions
            .values()
            .any(|row| row.review_id == review && row.user_id == user)
        {
            return Err(RepositoryError::Conflict);
        }
        let id = ReactionId(tables.allocate());
        let row = ReviewLike {
            id,
            review_id: review,
            user_id: user,
            is_like,
        };
        tables.reactions.insert(id, row.clone());
        Ok(row)
    }

    fn set_reaction(&self, id: ReactionId, is_like: bool) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        let row = tables
            .reactions
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        row.is_like = is_like;
        Ok(())
    }

    fn delete_reaction(&self, id: ReactionId) -> Result<(), RepositoryError> {
        self.lock()
            .reactions
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn reactions_for_review(&self, review: ReviewId) -> Result<Vec<ReviewLike>, RepositoryError> {
        Ok(self
            .lock()
            .reactions
            .values()
            .filter(|row| row.review_id == review)
            .cloned()
            .collect())
    }

    fn insert_comment(&self, comment: NewComment) -> Result<ReviewComment, RepositoryError> {
        let mut tables = self.lock();
        if !tables.reviews.contains_key(&comment.review_id) {
            return Err(RepositoryError::NotFound);
        }
        let id = CommentId(tables.allocate());
        let row = ReviewComment {
            id,
            review_id: comment.review_id,
            user_id: comment.user_id,
            author_name: comment.author_name,
            content: comment.content,
            is_hospital_reply: comment.is_hospital_reply,
            created_at: comment.created_at,
            updated_at: comment.created_at,
        };
        tables.comments.insert(id, row.clone());
        Ok(row)
    }

    fn fetch_comment(&self, id: CommentId) -> Result<Option<ReviewComment>, RepositoryError> {
        Ok(self.lock().comments.get(&id).cloned())
    }

    fn update_comment(&self, comment: &ReviewComment) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        let stored = tables
            .comments
            .get_mut(&comment.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = comment.clone();
        Ok(())
    }

    fn delete_comment(&self, id: CommentId) -> Result<(), RepositoryError> {
        self.lock()
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn comments_for_review(
        &self,
        review: ReviewId,
    ) -> Result<Vec<ReviewComment>, RepositoryError> {
        Ok(self
            .lock()
            .comments
            .values()
            .filter(|row| row.review_id == review)
            .cloned()
            .collect())
    }

    fn insert_image(&self, image: NewImage) -> Result<ReviewImage, RepositoryError> {
        let mut tables = self.lock();
        if !tables.reviews.contains_key(&image.review_id) {
            return Err(RepositoryError::NotFound);
        }
        let id = ImageId(tables.allocate());
        let row = ReviewImage {
            id,
            review_id: image.review_id,
            image_url: image.image_url,
            caption: image.caption,
            order: image.order,
            created_at: image.created_at,
        };
        tables.images.insert(id, row.clone());
        Ok(row)
    }

    fn fetch_image(&self, id: ImageId) -> Result<Option<ReviewImage>, RepositoryError> {
        Ok(self.lock().images.get(&id).cloned())
    }

    fn delete_image(&self, id: ImageId) -> Result<(), RepositoryError> {
        self.lock()
            .images
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn images_for_review(&self, review: ReviewId) -> Result<Vec<ReviewImage>, RepositoryError> {
        Ok(self
            .lock()
            .images
            .values()
            .filter(|row| row.review_id == review)
            .cloned()
            .collect())
    }

    fn insert_report(&self, report: NewReport) -> Result<ReviewReport, RepositoryError> {
        let mut tables = self.lock();
        if !tables.reviews.contains_key(&report.review_id) {
            return Err(RepositoryError::NotFound);
        }
        let id = ReportId(tables.allocate());
        let row = ReviewReport {
            id,
            review_id: report.review_id,
            reason: report.reason,
            description: report.description,
            reporter_name: report.reporter_name,
            reporter_email: report.reporter_email,
            status: Default::default(),
            admin_note: None,
            handled_by: None,
            handled_at: None,
            created_at: report.created_at,
            updated_at: report.created_at,
        };
        tables.reports.insert(id, row.clone());
        Ok(row)
    }

    fn fetch_report(&self, id: ReportId) -> Result<Option<ReviewReport>, RepositoryError> {
        Ok(self.lock().reports.get(&id).cloned())
    }

    fn update_report(&self, report: &ReviewReport) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        let stored = tables
            .reports
            .get_mut(&report.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = report.clone();
        Ok(())
    }

    fn delete_report(&self, id: ReportId) -> Result<(), RepositoryError> {
        self.lock()
            .reports
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn list_reports(&self, filter: ReportFilter) -> Result<Vec<ReviewReport>, RepositoryError> {
        Ok(self
            .lock()
            .reports
            .values()
            .filter(|report| filter.matches(report))
            .cloned()
            .collect())
    }
}
