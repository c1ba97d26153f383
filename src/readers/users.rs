//! `user.json` reader.
//!
//! Must run after the roles reader: role references are checked against the
//! roles already in the IR.

use serde_json::{Map, Value};

use crate::ir::{IntermediateRepresentation, User};
use crate::loader::LoadedDocument;
use crate::logging::structured::LogContext;
use crate::report::MigrationReporter;
use crate::trace::{OptTraceable, SourcePath, Traceable};

use super::common::{read_bool, read_object, read_optional_string, read_string, read_string_list};

/// Read `user.json` into the IR.
pub fn read_users(
    doc: &LoadedDocument,
    ir: &mut IntermediateRepresentation,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) {
    ir.users.get_or_insert_with(Vec::new);

    let Some(root) = &doc.root else {
        crate::log_info!(ctx, "USERS_READ", users = 0);
        return;
    };
    let Some(entries) = read_object(root, &doc.source, reporter) else {
        return;
    };

    for (key, value) in entries {
        let source = doc.source.attribute(key);
        let Some(object) = read_object(value, &source, reporter) else {
            continue;
        };
        if let Some(user) = read_user(key, object, source, ir, reporter, ctx) {
            ir.add_user(user, ctx);
        }
    }

    crate::log_info!(ctx, "USERS_READ", users = ir.users.as_ref().map(Vec::len).unwrap_or(0));
}

fn read_user(
    key: &str,
    object: &Map<String, Value>,
    source: SourcePath,
    ir: &IntermediateRepresentation,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) -> Option<User> {
    // An inconsistent username is checked first so a dropped user yields a
    // single finding.
    if let Some(Value::String(username)) = object.get("username") {
        if username != key {
            crate::log_warn!(ctx, "USER_NAME_MISMATCH", key = key, username = username);
            reporter.problem(
                &source,
                format!(
                    "The key of the user does not match the username attribute. Key: '{}' username: '{}'. The user was not migrated.",
                    key, username
                ),
            );
            return None;
        }
    }

    let mut user = User::new(key, source.clone());
    let mut saw_roles = false;
    let mut saw_enabled = false;

    for (attribute, value) in object {
        let at = source.attribute(attribute);
        match attribute.as_str() {
            "username" => {
                read_string(value, &at, reporter);
            }
            "roles" => {
                saw_roles = true;
                user.roles = read_string_list(value, &at, reporter)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|role| known_role(role, ir, reporter))
                    .collect();
            }
            "enabled" => {
                saw_enabled = true;
                if let Some(enabled) = read_bool(value, &at, reporter) {
                    user.enabled = enabled.into();
                }
            }
            "metadata" => {
                if let Some(metadata) = read_object(value, &at, reporter) {
                    user.metadata = OptTraceable::present(metadata.clone(), at);
                }
            }
            "full_name" => user.full_name = read_optional_string(value, &at, reporter),
            "email" => user.email = read_optional_string(value, &at, reporter),
            "profile_uid" => user.profile_uid = read_optional_string(value, &at, reporter),
            _ => reporter.unknown_key(&at),
        }
    }

    if !saw_roles {
        reporter.missing_parameter(&source, "roles");
    }
    if !saw_enabled {
        reporter.missing_parameter(&source, "enabled");
    }

    Some(user)
}

/// Keep a role reference only if the roles document defines it. Without a
/// roles document there is nothing to check against.
fn known_role(role: &Traceable<String>, ir: &IntermediateRepresentation, reporter: &MigrationReporter) -> bool {
    if ir.roles.is_none() || ir.has_role(role.get()) {
        return true;
    }
    reporter.problem(
        role,
        format!(
            "The role '{}' does not exist in the role.json file and was removed from the user",
            role.get()
        ),
    );
    false
}
