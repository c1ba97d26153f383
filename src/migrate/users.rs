//! Native users to `sg_internal_users.yml`.

use indexmap::IndexMap;

use crate::ir::{EntityKind, User};
use crate::loader::flatten_attributes;
use crate::pipeline::context::MigrationContext;
use crate::report::MigrationReporter;
use crate::target::{InternalUser, SgInternalUsers, TargetConfig};
use crate::trace::OptTraceable;

use super::SubMigrator;

pub struct UsersMigrator;

impl SubMigrator for UsersMigrator {
    fn name(&self) -> &'static str {
        "users"
    }

    fn migrate(&self, context: &MigrationContext, reporter: &MigrationReporter) -> Vec<TargetConfig> {
        let ctx = context.log_context().with_document("sg_internal_users.yml");
        let Some(users) = context.users() else {
            crate::log_info!(ctx, "USERS_SKIPPED", reason = "no_input");
            return Vec::new();
        };

        let mut config = SgInternalUsers::default();
        for user in users {
            config.users.insert(user.name.clone(), migrate_user(user, reporter));
            reporter.migrated(&user.source);
        }

        let excluded = context
            .excluded()
            .iter()
            .filter(|entity| entity.kind == EntityKind::User)
            .count();
        crate::log_info!(ctx, "USERS_MIGRATED", users = config.users.len(), excluded = excluded);

        // The notice is owed whenever user.json listed any user at all.
        if !config.users.is_empty() || excluded > 0 {
            reporter.generic(
                "Password hashes are not part of the X-Pack user export. All migrated users have an empty hash and \
                 their passwords must be set in sg_internal_users.yml before the configuration is applied.",
            );
        }
        if config.users.is_empty() {
            return Vec::new();
        }
        vec![config.into()]
    }
}

fn migrate_user(user: &User, reporter: &MigrationReporter) -> InternalUser {
    let mut attributes: IndexMap<String, String> = user
        .metadata
        .get()
        .map(|metadata| flatten_attributes(metadata).into_iter().collect())
        .unwrap_or_default();

    for (key, field) in [
        ("full_name", &user.full_name),
        ("email", &user.email),
        ("profile_uid", &user.profile_uid),
    ] {
        set_attribute(&mut attributes, key, field, reporter);
    }

    InternalUser {
        hash: String::new(),
        backend_roles: user.roles.iter().map(|role| role.get().clone()).collect(),
        attributes,
    }
}

fn set_attribute(
    attributes: &mut IndexMap<String, String>,
    key: &str,
    field: &OptTraceable<String>,
    reporter: &MigrationReporter,
) {
    let Some(value) = field.get() else {
        return;
    };
    if let Some(previous) = attributes.insert(key.to_string(), value.clone()) {
        reporter.problem(
            field,
            format!(
                "The metadata attribute '{}' is overwritten by the user's '{}' field; the metadata value '{}' was dropped",
                key, key, previous
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::fixtures::Fixture;
    use crate::report::Category;
    use crate::target::NamedConfig;
    use serde_json::{json, Value};

    fn migrate(users: Value) -> (Vec<TargetConfig>, MigrationReporter) {
        let context = Fixture {
            users: Some(users),
            ..Default::default()
        }
        .context();
        let reporter = MigrationReporter::search_guard();
        let configs = UsersMigrator.migrate(&context, &reporter);
        (configs, reporter)
    }

    #[test]
    fn test_user_attributes_are_flattened() {
        let (configs, reporter) = migrate(json!({
            "jdoe": {
                "username": "jdoe",
                "roles": ["admin", "viewer"],
                "enabled": true,
                "full_name": "Jane Doe",
                "email": "jdoe@example.com",
                "metadata": {"team": {"name": "ops", "size": 4}, "intern": false}
            }
        }));

        assert_eq!(configs[0].file_name(), "sg_internal_users.yml");
        assert_eq!(
            configs[0].to_value().unwrap(),
            json!({
                "jdoe": {
                    "hash": "",
                    "backend_roles": ["admin", "viewer"],
                    "attributes": {
                        "team.name": "ops",
                        "team.size": "4",
                        "intern": "false",
                        "full_name": "Jane Doe",
                        "email": "jdoe@example.com"
                    }
                }
            })
        );
        assert_eq!(reporter.total_findings(), 0);
        assert_eq!(reporter.generic_messages().len(), 1);
        assert_eq!(reporter.migrated_count(), 1);
    }

    #[test]
    fn test_named_field_wins_over_metadata() {
        let (configs, reporter) = migrate(json!({
            "a": {"roles": [], "enabled": true, "email": "a@example.com", "metadata": {"email": "old@example.com"}}
        }));

        let value = configs[0].to_value().unwrap();
        assert_eq!(value["a"]["attributes"]["email"], "a@example.com");
        let problems = reporter.findings(Category::Problem);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].source.path_string(), "a.email");
    }

    #[test]
    fn test_disabled_users_and_single_password_notice() {
        let (configs, reporter) = migrate(json!({
            "a": {"roles": ["r"], "enabled": true},
            "b": {"roles": ["r"], "enabled": true},
            "c": {"roles": ["r"], "enabled": false}
        }));

        let value = configs[0].to_value().unwrap();
        assert_eq!(value.as_object().unwrap().len(), 2);
        assert!(value.get("c").is_none());
        assert_eq!(reporter.generic_messages().len(), 1);
    }

    #[test]
    fn test_all_users_disabled_still_gets_password_notice() {
        let (configs, reporter) = migrate(json!({
            "a": {"roles": ["r"], "enabled": false},
            "b": {"roles": ["r"], "enabled": false}
        }));
        assert!(configs.is_empty());
        assert_eq!(reporter.generic_messages().len(), 1);
    }

    #[test]
    fn test_empty_user_document_no_output_no_notice() {
        let (configs, reporter) = migrate(json!({}));
        assert!(configs.is_empty());
        assert!(reporter.generic_messages().is_empty());
        assert_eq!(reporter.total_findings(), 0);
    }
}
