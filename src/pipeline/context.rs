//! Run and migration context.
//!
//! `RunContext` identifies one migration run for logging and the report.
//! `MigrationContext` is the read-only view of the IR handed to every
//! sub-migrator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ir::{
    ElasticsearchSettings, ExcludedEntity, IntermediateRepresentation, KibanaSettings, Role, RoleMapping, User,
};
use crate::logging::structured::LogContext;

/// Identity of one migration run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        let run_id = format!("run-{}", &Uuid::new_v4().to_string()[..8]);
        Self {
            run_id,
            generated_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.run_id)
    }

    /// Log context for work on a single input document.
    pub fn document_context(&self, document: &str) -> LogContext {
        self.log_context().with_document(document)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// What sub-migrators see of the IR.
///
/// Every accessor returns `None` when the corresponding input document was
/// not supplied.
#[derive(Debug)]
pub struct MigrationContext {
    ir: IntermediateRepresentation,
    log: LogContext,
}

impl MigrationContext {
    pub fn new(ir: IntermediateRepresentation, log: LogContext) -> Self {
        Self { ir, log }
    }

    pub fn elasticsearch(&self) -> Option<&ElasticsearchSettings> {
        self.ir.elasticsearch.as_ref()
    }

    pub fn kibana(&self) -> Option<&KibanaSettings> {
        self.ir.kibana.as_ref()
    }

    pub fn users(&self) -> Option<&[User]> {
        self.ir.users.as_deref()
    }

    pub fn roles(&self) -> Option<&[Role]> {
        self.ir.roles.as_deref()
    }

    pub fn role_mappings(&self) -> Option<&[RoleMapping]> {
        self.ir.role_mappings.as_deref()
    }

    /// Entities that were read but left out because they are disabled.
    pub fn excluded(&self) -> &[ExcludedEntity] {
        &self.ir.excluded
    }

    pub fn log_context(&self) -> &LogContext {
        &self.log
    }
}
