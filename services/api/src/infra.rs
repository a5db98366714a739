use hospital_reviews::config::AppConfig;
use hospital_reviews::reviews::{Hospital, InMemoryReviewStore, ReviewService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Register the configured hospitals so the directory has something to review.
pub(crate) fn seed_hospitals<'a, I>(store: &InMemoryReviewStore, names: I) -> Vec<Hospital>
where
    I: IntoIterator<Item = &'a String>,
{
    names
        .into_iter()
        .map(|name| {
            let hospital = store.insert_hospital(name.as_str());
            debug!(hospital_id = %hospital.id, name = %hospital.name, "hospital seeded");
            hospital
        })
        .collect()
}

pub(crate) fn build_review_service(
    config: &AppConfig,
) -> (Arc<ReviewService<InMemoryReviewStore>>, Vec<Hospital>) {
    let store = Arc::new(InMemoryReviewStore::new());
    let hospitals = seed_hospitals(&store, &config.seed_hospitals);
    let service = Arc::new(ReviewService::new(store, config.reviews));
    (service, hospitals)
}
