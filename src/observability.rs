//! Tracing setup and in-process conversion counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `default_directive`.
pub fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    conversions_succeeded: AtomicU64,
    conversions_failed: AtomicU64,
    client_rejections: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversion_succeeded(&self) {
        self.conversions_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "conversions_succeeded", "Metric incremented");
    }

    pub fn conversion_failed(&self) {
        self.conversions_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "conversions_failed", "Metric incremented");
    }

    pub fn client_rejected(&self) {
        self.client_rejections.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "client_rejections", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            conversions_succeeded: self.conversions_succeeded.load(Ordering::Relaxed),
            conversions_failed: self.conversions_failed.load(Ordering::Relaxed),
            client_rejections: self.client_rejections.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub conversions_succeeded: u64,
    pub conversions_failed: u64,
    pub client_rejections: u64,
}
