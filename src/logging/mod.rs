//! Structured logging with run context.
//!
//! Provides logging macros and utilities that include the run id and the
//! document being processed in every log message for easy correlation.

pub mod structured;

pub use structured::*;
