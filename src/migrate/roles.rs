//! Roles to `sg_roles.yml`.
//!
//! Privilege names go through fixed lookup tables. A name without a table
//! entry is dropped and reported; it is never guessed.

use crate::ir::{FieldSecurity, IndexPrivileges, Role};
use crate::logging::structured::LogContext;
use crate::pipeline::context::MigrationContext;
use crate::report::MigrationReporter;
use crate::target::{IndexPermission, SgRole, SgRoles, TargetConfig};
use crate::trace::Traceable;

use super::SubMigrator;

pub struct RolesMigrator;

impl SubMigrator for RolesMigrator {
    fn name(&self) -> &'static str {
        "roles"
    }

    fn migrate(&self, context: &MigrationContext, reporter: &MigrationReporter) -> Vec<TargetConfig> {
        let ctx = context.log_context().with_document("sg_roles.yml");
        let Some(roles) = context.roles() else {
            crate::log_info!(ctx, "ROLES_SKIPPED", reason = "no_input");
            return Vec::new();
        };

        let mut config = SgRoles::default();
        for role in roles {
            config.roles.insert(role.name.clone(), migrate_role(role, reporter, &ctx));
            reporter.migrated(&role.source);
        }

        crate::log_info!(ctx, "ROLES_MIGRATED", roles = config.roles.len());
        if config.roles.is_empty() {
            return Vec::new();
        }
        vec![config.into()]
    }
}

/// Search Guard action group for an X-Pack cluster privilege.
fn cluster_action(privilege: &str) -> Option<&'static str> {
    match privilege {
        "all" => Some("SGS_CLUSTER_ALL"),
        "create_snapshot" => Some("SGS_MANAGE_SNAPSHOTS"),
        "manage_index_templates" => Some("SGS_CLUSTER_MANAGE_INDEX_TEMPLATES"),
        "manage_ingest_pipelines" => Some("SGS_CLUSTER_MANAGE_PIPELINES"),
        "monitor" => Some("SGS_CLUSTER_MONITOR"),
        _ => None,
    }
}

/// Search Guard action group for an X-Pack index privilege.
fn index_action(privilege: &str) -> Option<&'static str> {
    match privilege {
        "all" => Some("SGS_INDEX_ALL"),
        "create_index" | "create" => Some("SGS_CREATE_INDEX"),
        "delete" => Some("SGS_DELETE"),
        "index" | "write" => Some("SGS_WRITE"),
        "manage" => Some("SGS_MANAGE"),
        "monitor" => Some("SGS_INDICES_MONITOR"),
        "read" => Some("SGS_READ"),
        _ => None,
    }
}

fn migrate_role(role: &Role, reporter: &MigrationReporter, ctx: &LogContext) -> SgRole {
    for application in &role.applications {
        reporter.inconvertible(
            &application.source,
            "Application privileges have no equivalent in Search Guard roles",
        );
    }
    for remote in &role.remote_indices {
        reporter.inconvertible(
            &remote.index.source,
            "Remote index privileges have no equivalent in Search Guard roles",
        );
    }
    for remote in &role.remote_cluster {
        reporter.inconvertible(
            &remote.source,
            "Remote cluster privileges have no equivalent in Search Guard roles",
        );
    }
    if !role.run_as.is_empty() {
        reporter.inconvertible(
            &role.source.attribute("run_as"),
            "run_as cannot be migrated; configure impersonation in sg_config.yml instead",
        );
    }

    let cluster_permissions = translate(&role.cluster, cluster_action, "cluster", reporter);
    let index_permissions: Vec<IndexPermission> = role
        .indices
        .iter()
        .filter_map(|block| migrate_index_block(block, reporter))
        .collect();

    crate::log_debug!(
        ctx,
        "ROLE_MIGRATED",
        name = role.name,
        cluster_permissions = cluster_permissions.len(),
        index_permissions = index_permissions.len(),
    );

    SgRole {
        description: role.description.get().cloned(),
        cluster_permissions,
        index_permissions,
    }
}

/// Translate privilege names, keeping the first occurrence of each action.
/// Names containing `:` are action patterns and pass through unchanged.
fn translate(
    privileges: &[Traceable<String>],
    table: fn(&str) -> Option<&'static str>,
    level: &str,
    reporter: &MigrationReporter,
) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();
    for privilege in privileges {
        let name = privilege.get();
        let action = if name.contains(':') {
            name.as_str()
        } else if let Some(action) = table(name) {
            action
        } else {
            reporter.manual_action(
                privilege,
                format!(
                    "The {} privilege '{}' has no known Search Guard equivalent and was removed; add a matching action group manually",
                    level, name
                ),
            );
            continue;
        };
        if !actions.iter().any(|existing| existing == action) {
            actions.push(action.to_string());
        }
    }
    actions
}

fn migrate_index_block(block: &IndexPrivileges, reporter: &MigrationReporter) -> Option<IndexPermission> {
    if block.allow_restricted_indices.get() == Some(&true) {
        reporter.inconvertible(
            &block.allow_restricted_indices,
            "Search Guard has no equivalent of allow_restricted_indices; restricted indices are not covered by the migrated role",
        );
    }

    let allowed_actions = translate(&block.privileges, index_action, "index", reporter);
    if allowed_actions.is_empty() {
        reporter.problem(
            &block.source,
            "No privilege of this index block could be migrated; the block was dropped",
        );
        return None;
    }

    Some(IndexPermission {
        index_patterns: block.names.iter().map(|name| name.get().clone()).collect(),
        allowed_actions,
        fls: block
            .field_security
            .as_ref()
            .map(|fs| field_security(fs, reporter))
            .unwrap_or_default(),
        dls: block.query.get().cloned(),
    })
}

/// Search Guard FLS is either a list of included fields or a list of
/// `~`-prefixed excluded fields, never both.
fn field_security(fs: &FieldSecurity, reporter: &MigrationReporter) -> Vec<String> {
    let grant: Vec<String> = fs.grant.iter().map(|field| field.get().clone()).collect();
    let except: Vec<String> = fs.except.iter().map(|field| format!("~{}", field.get())).collect();

    if grant.is_empty() || (grant == ["*"] && !except.is_empty()) {
        return except;
    }
    if !except.is_empty() {
        reporter.problem(
            &fs.source,
            "Field level security that both grants and excludes fields cannot be expressed in Search Guard; \
             only the granted fields were migrated",
        );
    }
    grant
}
