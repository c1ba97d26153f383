//! Document loading.
//!
//! Parses the legacy inputs into `serde_json::Value` trees:
//! - `document` - JSON/YAML parsing with failure degradation
//! - `flatten` - dotted-key flattening for settings files
//! - `values` - lenient scalar conversions

pub mod document;
pub mod flatten;
pub mod values;

pub use document::*;
pub use flatten::*;
pub use values::*;
