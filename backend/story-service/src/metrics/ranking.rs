use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

lazy_static! {
    /// Ranking requests by mode (most_liked, trending, feed, recent).
    pub static ref RANKING_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "story_ranking_request_total",
        "Total ranking requests segmented by mode",
        &["mode"]
    )
    .expect("failed to register story_ranking_request_total");

    pub static ref RANKING_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "story_ranking_request_duration_seconds",
        "Ranking request duration segmented by mode",
        &["mode"]
    )
    .expect("failed to register story_ranking_request_duration_seconds");

    /// Candidates loaded and scored per request.
    pub static ref RANKING_CANDIDATE_COUNT: HistogramVec = register_histogram_vec!(
        "story_ranking_candidate_count",
        "Number of ranking candidates evaluated segmented by mode",
        &["mode"],
        vec![0.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .expect("failed to register story_ranking_candidate_count");

    /// Comments and reactions by outcome (ok, rejected).
    pub static ref INTERACTION_TOTAL: IntCounterVec = register_int_counter_vec!(
        "story_interaction_total",
        "Story interactions segmented by kind and outcome",
        &["kind", "outcome"]
    )
    .expect("failed to register story_interaction_total");

    pub static ref PREFERENCE_UPDATE_FAILURES: IntCounter = register_int_counter!(
        "story_preference_update_failures_total",
        "Preference increments that failed after a successful interaction"
    )
    .expect("failed to register story_preference_update_failures_total");
}
