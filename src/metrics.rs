// Metrics and observability module
// This file handles collection of routing decisions, relay submissions
// and lifecycle event counts
//
// Numan Thabit 2025 Nov

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

pub static ROUTING_DECISIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "stx_routing_decisions_total",
        "publish decisions by submission path",
        &["path"]
    )
    .unwrap()
});

pub static RELAY_SUBMISSIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "stx_relay_submissions_total",
        "relay submissions by outcome",
        &["outcome"]
    )
    .unwrap()
});

pub static RELAY_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "stx_relay_latency_seconds",
        "latency for relay API calls",
        &["method"]
    )
    .unwrap()
});

pub static LIFECYCLE_EVENTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "stx_lifecycle_events_total",
        "transaction lifecycle events dispatched to handlers",
        &["event"]
    )
    .unwrap()
});
