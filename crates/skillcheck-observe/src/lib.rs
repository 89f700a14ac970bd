//! Observability setup for skill-check binaries.
//!
//! Structured logging through `tracing-subscriber`, with optional
//! OpenTelemetry span export.

pub mod tracing_setup;
