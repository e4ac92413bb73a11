//! Prometheus metrics for atelier-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// Metric names as constants for consistency
const ADVISORY_SCORES_TOTAL: &str = "atelier_advisory_scores_total";
const SCORING_DURATION: &str = "atelier_scoring_duration_seconds";
const SAVES_TOTAL: &str = "atelier_saves_total";
const LIKES_TOTAL: &str = "atelier_likes_total";
const VALIDATION_FAILURES_TOTAL: &str = "atelier_validation_failures_total";
const LIVE_SESSIONS_ACTIVE: &str = "atelier_live_sessions_active";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record an advisory scoring call.
///
/// # Arguments
///
/// * `movement` - Movement the snapshot was scored against
/// * `duration_secs` - Scoring duration in seconds
pub fn record_advisory_score(movement: &str, duration_secs: f64) {
    counter!(
        ADVISORY_SCORES_TOTAL,
        "movement" => movement.to_string()
    )
    .increment(1);
    histogram!(
        SCORING_DURATION,
        "movement" => movement.to_string()
    )
    .record(duration_secs);
}

/// Record a save attempt.
///
/// # Arguments
///
/// * `movement` - Movement of the saved artwork
/// * `outcome` - "ok", "rejected", or "failed"
pub fn record_save(movement: &str, outcome: &str) {
    counter!(
        SAVES_TOTAL,
        "movement" => movement.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a like on an artwork.
pub fn record_like() {
    counter!(LIKES_TOTAL).increment(1);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Type of validation that failed (user_id, title, etc.)
pub fn record_validation_failure(validation_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "type" => validation_type.to_string()
    )
    .increment(1);
}

/// Increment active live scoring sessions.
pub fn inc_live_sessions() {
    gauge!(LIVE_SESSIONS_ACTIVE).increment(1.0);
}

/// Decrement active live scoring sessions.
pub fn dec_live_sessions() {
    gauge!(LIVE_SESSIONS_ACTIVE).decrement(1.0);
}
