//! Observability for the doppel workspace.
//!
//! Structured logging via `tracing` with an optional OpenTelemetry span
//! export bridge for local trace inspection.

pub mod tracing_setup;
