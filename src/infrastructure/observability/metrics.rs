use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MetricsConfig;
use crate::domain::tier::Tier;

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("valid uuid pattern")
});

#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the global recorder; `None` when disabled or already installed
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("sayitright_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized at /metrics");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", normalize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success,
    Invalid,
    Denied,
    ProviderError,
    Failed,
}

impl GenerationOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Invalid => "invalid",
            Self::Denied => "denied",
            Self::ProviderError => "provider_error",
            Self::Failed => "failed",
        }
    }
}

pub fn record_generation(tier: Tier, outcome: GenerationOutcome) {
    counter!(
        "email_generations_total",
        "tier" => tier.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_llm_request(model: &str, success: bool, duration: Duration, tokens: u64) {
    let labels = [
        ("model", model.to_string()),
        ("status", if success { "success" } else { "error" }.to_string()),
    ];

    counter!("llm_requests_total", &labels).increment(1);
    histogram!("llm_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if tokens > 0 {
        counter!("llm_tokens_total", &labels).increment(tokens);
    }
}

pub fn record_credit_charge(reason: &str, amount: i64) {
    counter!("credit_charges_total", "reason" => reason.to_string()).increment(1);
    counter!("credits_charged_total", "reason" => reason.to_string())
        .increment(amount.max(0) as u64);
}

/// Collapse resource ids so label cardinality stays bounded
fn normalize_path(path: &str) -> String {
    UUID_SEGMENT.replace_all(path, "{id}").into_owned()
}
