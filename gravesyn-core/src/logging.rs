//! Structured logging using **tracing**.
//!
//! The library only emits events; installing a subscriber is left to the
//! binary. The JSON subscriber gives machine-readable output on stderr so
//! stdout stays clean for reports.

/// Initializes the global tracing subscriber.
///
/// Call once at the start of the process.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=gravesyn_core=debug`)
pub fn init_structured_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
