//! Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_credit_charge, record_generation,
    record_http_request, record_llm_request, GenerationOutcome, PrometheusMetrics,
};
