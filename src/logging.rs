//! `tracing` subscriber setup for the `corpus_report` binary.
//!
//! The library only emits events; installing a subscriber is left to binaries.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "corpus_metrics=info";

fn use_json_format() -> bool {
    std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Install the global subscriber, writing to stderr.
///
/// Filter comes from `RUST_LOG` (default `corpus_metrics=info`); output is JSON
/// when `RUST_LOG_FORMAT=json`. Later calls are no-ops.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false);

    if use_json_format() {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}
