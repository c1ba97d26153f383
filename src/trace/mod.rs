//! Provenance tracking.
//!
//! Every value read from a legacy document is wrapped together with the
//! document name and the structured path it was found at, so any finding can
//! point the administrator at its exact origin.

pub mod source;
pub mod traceable;

pub use source::*;
pub use traceable::*;
