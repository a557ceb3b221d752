/*!
 * Structured Tracing
 * Subscriber setup and per-worker spans using the tracing crate
 */

use std::time::Instant;
use tracing::{debug, info, span, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Environment variable switching the subscriber to JSON output
pub const TRACE_JSON_ENV: &str = "HANDOFF_TRACE_JSON";

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - HANDOFF_TRACE_JSON: Enable JSON output (default: false)
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(TRACE_JSON_ENV)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
    installed
}

/// Span covering one producer or consumer thread's lifetime
///
/// Counts the items the worker handled and reports the total with the
/// elapsed time when dropped.
pub struct WorkerSpan {
    span: tracing::Span,
    start: Instant,
    role: &'static str,
    worker: usize,
    items: u64,
}

impl WorkerSpan {
    pub fn new(role: &'static str, worker: usize) -> Self {
        let span = span!(
            Level::DEBUG,
            "worker",
            role = role,
            worker = worker,
            items = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
            role,
            worker,
            items: 0,
        }
    }

    /// Record one handled item
    #[inline]
    pub fn record_item(&mut self) {
        self.items += 1;
    }

    pub fn items(&self) -> u64 {
        self.items
    }

    /// Enter the span context for the current thread
    ///
    /// The guard owns a handle to the span, so the worker can keep recording
    /// items while it is held.
    pub fn entered(&self) -> tracing::span::EnteredSpan {
        self.span.clone().entered()
    }
}

impl Drop for WorkerSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("items", self.items);
        self.span.record("duration_us", duration.as_micros() as u64);

        let _entered = self.span.enter();
        debug!(
            role = self.role,
            worker = self.worker,
            items = self.items,
            duration_us = duration.as_micros() as u64,
            "worker finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_test_tracing() {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new("debug"))
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init();
    }

    #[test]
    fn test_worker_span_counts_items() {
        init_test_tracing();

        let mut span = WorkerSpan::new("consumer", 0);
        {
            let _entered = span.entered();
            span.record_item();
            span.record_item();
        }
        assert_eq!(span.items(), 2);
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_test_tracing();
        assert!(!init_tracing());
    }
}
