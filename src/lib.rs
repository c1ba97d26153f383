//! xpack-migrate - X-Pack security configuration to Search Guard
//!
//! This crate reads an exported X-Pack security setup (`elasticsearch.yml`,
//! `kibana.yml`, `role.json`, `user.json`, `role_mapping.json`) and produces
//! the equivalent Search Guard configuration files together with a report of
//! everything that could not be carried over. The implementation prioritizes:
//!
//! 1. **Honest reporting** - Every untranslated setting ends up in the report
//! 2. **Logging** - Every decision point logged with run and document context
//! 3. **Provenance** - Every value remembers where in which document it came from
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Run orchestration, inputs and the migration context
//! - `loader` - JSON/YAML parsing and settings flattening
//! - `readers` - Legacy documents into the intermediate representation
//! - `ir` - Typed realms, users, roles and role mappings
//! - `migrate` - Sub-migrators producing Search Guard records
//! - `target` - Search Guard configuration records
//! - `report` - Findings and report rendering
//! - `trace` - Source paths and traceable values
//! - `logging` - Structured logging with run context

pub mod config;
pub mod error;
pub mod ir;
pub mod loader;
pub mod logging;
pub mod migrate;
pub mod pipeline;
pub mod readers;
pub mod report;
pub mod target;
pub mod trace;

pub use config::MigrationOptions;
pub use error::{MigrationError, Result};
pub use pipeline::{run_migration, MigrationInputs, MigrationResult, Migrator, RenderedReport};
pub use report::MigrationReporter;
pub use target::{NamedConfig, TargetConfig};

/// Initialize the logger. Safe to call more than once.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}
