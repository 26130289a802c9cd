//! Performance Monitoring Middleware
//!
//! Request timing and per-route counters

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Synthesis calls are slow by nature; only flag the outliers
const SLOW_REQUEST_MS: f64 = 30_000.0;

/// Server metrics
#[derive(Debug, Default, Clone)]
pub struct ServerMetrics {
    /// Total requests
    pub total_requests: u64,
    /// Successful requests
    pub successful_requests: u64,
    /// Failed requests
    pub failed_requests: u64,
    /// Total processing time (ms)
    pub total_processing_time_ms: f64,
    /// Requests by route template
    pub requests_by_endpoint: HashMap<String, u64>,
    /// Processing time by route template (ms)
    pub time_by_endpoint: HashMap<String, f64>,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request
    pub fn record_request(&mut self, endpoint: &str, status: StatusCode, duration_ms: f64) {
        self.total_requests += 1;

        if status.is_success() {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }

        self.total_processing_time_ms += duration_ms;

        *self.requests_by_endpoint.entry(endpoint.to_string()).or_insert(0) += 1;
        *self.time_by_endpoint.entry(endpoint.to_string()).or_insert(0.0) += duration_ms;
    }

    pub fn avg_processing_time(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.total_processing_time_ms / self.total_requests as f64
    }

    pub fn avg_time_by_endpoint(&self, endpoint: &str) -> f64 {
        let count = self.requests_by_endpoint.get(endpoint).copied().unwrap_or(0);
        let time = self.time_by_endpoint.get(endpoint).copied().unwrap_or(0.0);

        if count == 0 {
            return 0.0;
        }
        time / count as f64
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_requests: self.total_requests,
            successful_requests: self.successful_requests,
            failed_requests: self.failed_requests,
            avg_processing_time_ms: self.avg_processing_time(),
            success_rate: if self.total_requests > 0 {
                self.successful_requests as f64 / self.total_requests as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}

/// Metrics summary
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub avg_processing_time_ms: f64,
    pub success_rate: f64,
}

/// Shared metrics plus the access log switch
pub struct MetricsState {
    metrics: RwLock<ServerMetrics>,
    access_log: bool,
}

impl MetricsState {
    pub fn new(access_log: bool) -> Self {
        Self {
            metrics: RwLock::new(ServerMetrics::new()),
            access_log,
        }
    }

    pub async fn get_metrics(&self) -> ServerMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn record_request(&self, endpoint: &str, status: StatusCode, duration_ms: f64) {
        let mut metrics = self.metrics.write().await;
        metrics.record_request(endpoint, status, duration_ms);
    }
}

impl Default for MetricsState {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Performance monitoring middleware
///
/// Keys metrics on the matched route template so `/voices/custom/:name`
/// counts as one endpoint whatever the name.
pub async fn performance_monitor(
    State(metrics): State<Arc<MetricsState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let path = req.uri().path().to_string();
    let method = req.method().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    let status = response.status();

    metrics.record_request(&endpoint, status, duration_ms).await;

    if duration_ms > SLOW_REQUEST_MS {
        warn!(
            "Slow request: {} {} took {:.2}ms (status: {})",
            method, path, duration_ms, status
        );
    } else if metrics.access_log {
        info!(
            "Request: {} {} took {:.2}ms (status: {})",
            method, path, duration_ms, status
        );
    } else {
        debug!("Request: {} {} ({})", method, path, status);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_summarize() {
        let mut metrics = ServerMetrics::new();
        metrics.record_request("/preset", StatusCode::OK, 100.0);
        metrics.record_request("/preset", StatusCode::BAD_REQUEST, 50.0);
        metrics.record_request("/voices", StatusCode::OK, 10.0);

        let summary = metrics.summary();
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.failed_requests, 1);
        assert!((metrics.avg_time_by_endpoint("/preset") - 75.0).abs() < 1e-9);
        assert_eq!(metrics.avg_time_by_endpoint("/missing"), 0.0);
        assert!((summary.success_rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_metrics_state_shared() {
        let state = MetricsState::default();
        state.record_request("/health", StatusCode::OK, 1.0).await;
        assert_eq!(state.get_metrics().await.summary().total_requests, 1);
        assert_eq!(state.get_metrics().await.requests_by_endpoint["/health"], 1);
    }
}
