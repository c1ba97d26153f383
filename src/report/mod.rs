//! Migration reporting.
//!
//! Collects categorized findings keyed by source location and renders the
//! report the administrator reads before trusting the output.

pub mod finding;
pub mod render;
pub mod reporter;

pub use finding::*;
pub use reporter::*;
