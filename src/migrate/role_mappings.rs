//! Role mappings: rule trees to `sg_roles_mapping.yml` identity buckets.

use crate::ir::{FieldRule, RoleGrant, RoleMapping, Rule, RuleKind};
use crate::loader::values::{json_type_name, value_to_scalar_string};
use crate::logging::structured::LogContext;
use crate::pipeline::context::MigrationContext;
use crate::report::MigrationReporter;
use crate::target::{Identities, SgRolesMapping, TargetConfig};

use super::SubMigrator;

pub struct RoleMappingsMigrator;

impl SubMigrator for RoleMappingsMigrator {
    fn name(&self) -> &'static str {
        "role_mappings"
    }

    fn migrate(&self, context: &MigrationContext, reporter: &MigrationReporter) -> Vec<TargetConfig> {
        let ctx = context.log_context().with_document("sg_roles_mapping.yml");
        let Some(mappings) = context.role_mappings() else {
            crate::log_info!(ctx, "ROLE_MAPPINGS_SKIPPED", reason = "no_input");
            return Vec::new();
        };

        let mut config = SgRolesMapping::default();
        for mapping in mappings {
            migrate_mapping(mapping, &mut config, reporter, &ctx);
        }

        crate::log_info!(
            ctx,
            "ROLE_MAPPINGS_MIGRATED",
            mappings = mappings.len(),
            roles = config.mappings.len(),
        );
        if config.is_empty() {
            return Vec::new();
        }
        vec![config.into()]
    }
}

fn migrate_mapping(mapping: &RoleMapping, config: &mut SgRolesMapping, reporter: &MigrationReporter, ctx: &LogContext) {
    if !mapping.run_as.is_empty() {
        reporter.inconvertible(
            &mapping.source.attribute("run_as"),
            "Search Guard role mappings cannot grant run_as; grant impersonation through sg_roles.yml instead",
        );
    }

    let roles = match &mapping.grant {
        RoleGrant::Roles(roles) => roles,
        RoleGrant::Templates(_) => {
            reporter.inconvertible(
                &mapping.source.attribute("role_templates"),
                "Role templates cannot be migrated; Search Guard role mappings do not support templating",
            );
            return;
        }
    };

    // Unparseable rules were already reported by the reader.
    let Some(rules) = &mapping.rules else {
        return;
    };

    let mut identities = Identities::default();
    if let Err(unsupported) = collect(rules, &mut identities, reporter) {
        crate::log_warn!(
            ctx,
            "ROLE_MAPPING_UNSUPPORTED",
            name = mapping.name,
            rule = unsupported.kind.name(),
        );
        reporter.critical(
            &unsupported.source,
            format!(
                "'{}' rules cannot be expressed in Search Guard role mappings; the role mapping was not migrated",
                unsupported.kind.name()
            ),
        );
        return;
    }

    if identities.is_empty() {
        reporter.problem(
            &mapping.source,
            "The rules of this role mapping match no identity Search Guard can express; the role mapping was not migrated",
        );
        return;
    }

    for role in roles {
        config.grant(role.get(), identities.clone());
    }
    crate::log_debug!(ctx, "ROLE_MAPPING_MIGRATED", name = mapping.name, roles = roles.len());
    reporter.migrated(&mapping.source);
}

/// Flatten a rule tree into identity buckets. `any` is a union; `all` and
/// `except` have no equivalent and abort the whole mapping.
fn collect<'r>(rule: &'r Rule, identities: &mut Identities, reporter: &MigrationReporter) -> Result<(), &'r Rule> {
    match &rule.kind {
        RuleKind::Any(children) => {
            for child in children {
                collect(child, identities, reporter)?;
            }
            Ok(())
        }
        RuleKind::All(_) | RuleKind::Except(_) => Err(rule),
        RuleKind::Field(field) => {
            add_field(field, identities, reporter);
            Ok(())
        }
    }
}

fn add_field(field: &FieldRule, identities: &mut Identities, reporter: &MigrationReporter) {
    let bucket = match field.field.get().as_str() {
        "username" | "dn" => &mut identities.users,
        "groups" => &mut identities.backend_roles,
        "host" => &mut identities.hosts,
        "remote_ip" => &mut identities.ips,
        "realm.name" => {
            reporter.problem(
                &field.field,
                "Search Guard role mappings cannot be restricted to a realm; the condition was ignored",
            );
            return;
        }
        other => {
            reporter.problem(
                &field.field,
                format!("The field '{}' cannot be used in Search Guard role mappings; the condition was ignored", other),
            );
            return;
        }
    };

    for value in &field.values {
        match value_to_scalar_string(value.get()) {
            Some(value) => bucket.push(value),
            None => reporter.invalid_type(value, "string", json_type_name(value.get())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::fixtures::Fixture;
    use crate::report::Category;
    use crate::target::NamedConfig;
    use serde_json::{json, Value};

    fn migrate(mappings: Value) -> (Vec<TargetConfig>, MigrationReporter) {
        let context = Fixture {
            role_mappings: Some(mappings),
            ..Default::default()
        }
        .context();
        let reporter = MigrationReporter::search_guard();
        let configs = RoleMappingsMigrator.migrate(&context, &reporter);
        (configs, reporter)
    }

    #[test]
    fn test_any_rule_is_flattened() {
        let (configs, reporter) = migrate(json!({
            "m1": {
                "roles": ["R"],
                "rules": {"any": [
                    {"field": {"username": ["u1", "u2"]}},
                    {"field": {"groups": ["g1"]}}
                ]}
            }
        }));

        assert_eq!(configs[0].file_name(), "sg_roles_mapping.yml");
        assert_eq!(
            configs[0].to_value().unwrap(),
            json!({"R": {"users": ["u1", "u2"], "backend_roles": ["g1"]}})
        );
        assert_eq!(reporter.total_findings(), 0);
        assert_eq!(reporter.migrated_count(), 1);
    }

    #[test]
    fn test_mappings_for_same_role_are_merged() {
        let (configs, _) = migrate(json!({
            "by_user": {"roles": ["R"], "rules": {"field": {"username": "u1"}}},
            "by_group": {"roles": ["R", "S"], "rules": {"field": {"groups": "g1"}}},
            "by_host": {"roles": ["S"], "rules": {"any": [
                {"field": {"host": "10.0.0.1"}},
                {"field": {"remote_ip": "10.0.0.0/8"}},
                {"field": {"dn": "cn=u2,dc=example,dc=com"}}
            ]}}
        }));

        assert_eq!(
            configs[0].to_value().unwrap(),
            json!({
                "R": {"users": ["u1"], "backend_roles": ["g1"]},
                "S": {
                    "users": ["cn=u2,dc=example,dc=com"],
                    "backend_roles": ["g1"],
                    "hosts": ["10.0.0.1"],
                    "ips": ["10.0.0.0/8"]
                }
            })
        );
    }

    #[test]
    fn test_all_at_top_level_is_critical() {
        let (configs, reporter) = migrate(json!({
            "strict": {
                "roles": ["R"],
                "rules": {"all": [
                    {"field": {"username": "u1"}},
                    {"field": {"groups": "g1"}}
                ]}
            }
        }));

        assert!(configs.is_empty());
        let critical = reporter.findings(Category::Critical);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].source.path_string(), "strict.rules");
        assert_eq!(reporter.total_findings(), 1);
        assert!(!reporter.has_fatal_problems());
    }

    #[test]
    fn test_nested_except_drops_mapping() {
        let (configs, reporter) = migrate(json!({
            "m": {
                "roles": ["R"],
                "rules": {"any": [
                    {"field": {"username": "u1"}},
                    {"except": {"field": {"username": "u2"}}}
                ]}
            }
        }));
        assert!(configs.is_empty());
        assert_eq!(reporter.findings(Category::Critical)[0].source.path_string(), "m.rules.any[1]");
    }

    #[test]
    fn test_templates_run_as_and_unsupported_fields() {
        let (configs, reporter) = migrate(json!({
            "templated": {
                "role_templates": [{"template": {"source": "{{username}}"}}],
                "rules": {"field": {"username": "*"}}
            },
            "realm_only": {
                "roles": ["R"],
                "rules": {"field": {"realm.name": "ldap1"}}
            },
            "mixed": {
                "roles": ["R"],
                "run_as": ["other"],
                "rules": {"any": [
                    {"field": {"metadata.level": 3}},
                    {"field": {"username": [7, "u1"]}}
                ]}
            }
        }));

        assert_eq!(configs[0].to_value().unwrap(), json!({"R": {"users": ["7", "u1"]}}));
        assert_eq!(reporter.findings(Category::Inconvertible).len(), 2);
        // realm.name, the empty realm_only mapping, metadata.level
        assert_eq!(reporter.findings(Category::Problem).len(), 3);
    }
}
