//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vgen_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vgen_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vgen_http_requests_in_flight";

    // Upload metrics
    pub const IMAGES_UPLOADED_TOTAL: &str = "vgen_images_uploaded_total";

    // Generation metrics
    pub const GENERATIONS_STARTED_TOTAL: &str = "vgen_generations_started_total";
    pub const GENERATIONS_COMPLETED_TOTAL: &str = "vgen_generations_completed_total";
    pub const GENERATIONS_FAILED_TOTAL: &str = "vgen_generations_failed_total";
    pub const CLIPS_GENERATED_TOTAL: &str = "vgen_clips_generated_total";
    pub const CLIPS_FAILED_TOTAL: &str = "vgen_clips_failed_total";

    // Processing metrics
    pub const MERGE_DURATION_SECONDS: &str = "vgen_merge_duration_seconds";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record saved upload images.
pub fn record_images_uploaded(count: usize) {
    counter!(names::IMAGES_UPLOADED_TOTAL).increment(count as u64);
}

/// Record a generation accepted for background processing.
pub fn record_generation_started(provider: &str) {
    let labels = [("provider", provider.to_string())];
    counter!(names::GENERATIONS_STARTED_TOTAL, &labels).increment(1);
}

/// Record a generation whose final video was published.
pub fn record_generation_completed(provider: &str) {
    let labels = [("provider", provider.to_string())];
    counter!(names::GENERATIONS_COMPLETED_TOTAL, &labels).increment(1);
}

/// Record a failed generation; `stage` is `generate` or `merge`.
pub fn record_generation_failed(provider: &str, stage: &str) {
    let labels = [
        ("provider", provider.to_string()),
        ("stage", stage.to_string()),
    ];
    counter!(names::GENERATIONS_FAILED_TOTAL, &labels).increment(1);
}

/// Record the outcome of one batch of clip generations.
pub fn record_clips(provider: &str, generated: usize, failed: usize) {
    let labels = [("provider", provider.to_string())];
    counter!(names::CLIPS_GENERATED_TOTAL, &labels).increment(generated as u64);
    counter!(names::CLIPS_FAILED_TOTAL, &labels).increment(failed as u64);
}

/// Record FFmpeg merge duration.
pub fn record_merge_duration(clip_count: usize, duration_secs: f64) {
    let labels = [("clips", clip_count.to_string())];
    histogram!(names::MERGE_DURATION_SECONDS, &labels).record(duration_secs);
}

fn video_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^/video/[^/]+").expect("valid regex"))
}

/// Sanitize path for metrics labels (collapse video ids).
fn sanitize_path(path: &str) -> String {
    video_path_pattern().replace(path, "/video/:id").to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
