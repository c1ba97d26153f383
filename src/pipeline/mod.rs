//! Migration pipeline.
//!
//! - `inputs` - the legacy documents of one run
//! - `context` - run identity and the read-only IR view
//! - `orchestrator` - reading, sub-migrator registry and result

pub mod context;
pub mod inputs;
pub mod orchestrator;

pub use context::*;
pub use inputs::*;
pub use orchestrator::*;
