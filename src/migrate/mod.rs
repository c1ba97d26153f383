//! Sub-migrators.
//!
//! Each sub-migrator translates one concern from the IR into Search Guard
//! records and reports what it could not translate:
//! - `auth` - backend authentication domains (`sg_authc.yml`)
//! - `frontend_auth` - login methods (`sg_frontend_authc.yml`)
//! - `role_mappings` - identities per role (`sg_roles_mapping.yml`)
//! - `users` - internal users (`sg_internal_users.yml`)
//! - `roles` - role definitions (`sg_roles.yml`)

pub mod auth;
pub mod frontend_auth;
pub mod role_mappings;
pub mod roles;
pub mod users;

pub use auth::AuthMigrator;
pub use frontend_auth::FrontendAuthMigrator;
pub use role_mappings::RoleMappingsMigrator;
pub use roles::RolesMigrator;
pub use users::UsersMigrator;

use crate::pipeline::context::MigrationContext;
use crate::report::MigrationReporter;
use crate::target::TargetConfig;

/// One independent translation step.
///
/// Implementations read the context, never mutate it, and report every
/// setting they cannot carry over.
pub trait SubMigrator: Send + Sync {
    fn name(&self) -> &'static str;

    fn migrate(&self, context: &MigrationContext, reporter: &MigrationReporter) -> Vec<TargetConfig>;
}
