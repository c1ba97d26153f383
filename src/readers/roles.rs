//! `role.json` reader.

use serde_json::{Map, Value};

use crate::ir::{
    ApplicationPrivileges, FieldSecurity, IndexPrivileges, IntermediateRepresentation,
    RemoteClusterPrivileges, RemoteIndexPrivileges, Role,
};
use crate::loader::LoadedDocument;
use crate::logging::structured::LogContext;
use crate::report::MigrationReporter;
use crate::trace::{OptTraceable, SourcePath, Traceable};

use super::common::{read_bool, read_list, read_object, read_optional_string, read_string, read_string_list};

/// Read `role.json` into the IR.
///
/// The document is an object keyed by role name. Malformed roles and blocks
/// are reported and skipped; the rest of the document is still read.
pub fn read_roles(
    doc: &LoadedDocument,
    ir: &mut IntermediateRepresentation,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) {
    ir.roles.get_or_insert_with(Vec::new);

    let Some(root) = &doc.root else {
        crate::log_info!(ctx, "ROLES_READ", roles = 0);
        return;
    };
    let Some(entries) = read_object(root, &doc.source, reporter) else {
        return;
    };

    for (name, value) in entries {
        let source = doc.source.attribute(name);
        if let Some(object) = read_object(value, &source, reporter) {
            let role = read_role(name, object, source, reporter);
            crate::log_debug!(
                ctx,
                "ROLE_READ",
                name = role.name,
                cluster = role.cluster.len(),
                indices = role.indices.len(),
            );
            ir.add_role(role);
        }
    }

    crate::log_info!(ctx, "ROLES_READ", roles = ir.roles.as_ref().map(Vec::len).unwrap_or(0));
}

fn read_role(name: &str, object: &Map<String, Value>, source: SourcePath, reporter: &MigrationReporter) -> Role {
    let mut role = Role::new(name, source.clone());

    for (key, value) in object {
        let at = source.attribute(key);
        match key.as_str() {
            "cluster" => role.cluster = read_string_list(value, &at, reporter).unwrap_or_default(),
            "run_as" => role.run_as = read_string_list(value, &at, reporter).unwrap_or_default(),
            "description" => role.description = read_optional_string(value, &at, reporter),
            "indices" => {
                role.indices = read_blocks(value, &at, reporter, |v, s, r| {
                    read_index_block(v, s, false, r).map(|(_, index)| index)
                });
            }
            "remote_indices" => {
                role.remote_indices = read_blocks(value, &at, reporter, |v, s, r| {
                    let (clusters, index) = read_index_block(v, s, true, r)?;
                    Some(RemoteIndexPrivileges {
                        clusters: clusters?,
                        index,
                    })
                });
            }
            "applications" => role.applications = read_blocks(value, &at, reporter, read_application),
            "remote_cluster" => {
                role.remote_cluster = read_blocks(value, &at, reporter, read_remote_cluster)
            }
            "metadata" | "transient_metadata" => {
                if !is_empty_object(value) {
                    reporter.ignored_key(&at, "role metadata has no equivalent in Search Guard");
                }
            }
            "global" => reporter.manual_action(
                &Traceable::new(value.clone(), at),
                "There is no equivalent to the key 'global' in Search Guard",
            ),
            _ => reporter.unknown_key(&at),
        }
    }

    role
}

fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty()) || value.is_null()
}

/// Read a list of objects, dropping the elements `read_one` rejects.
fn read_blocks<T>(
    value: &Value,
    source: &SourcePath,
    reporter: &MigrationReporter,
    read_one: impl Fn(&Map<String, Value>, &SourcePath, &MigrationReporter) -> Option<T>,
) -> Vec<T> {
    let Some(items) = read_list(value, source, reporter) else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let at = source.entry(i);
            read_object(item, &at, reporter).and_then(|object| read_one(object, &at, reporter))
        })
        .collect()
}

/// Read an index block. Returns the `clusters` list separately; it is only
/// meaningful for remote blocks, where it is required.
fn read_index_block(
    object: &Map<String, Value>,
    source: &SourcePath,
    remote: bool,
    reporter: &MigrationReporter,
) -> Option<(Option<Vec<Traceable<String>>>, IndexPrivileges)> {
    let mut clusters = None;
    let mut names = None;
    let mut privileges = None;
    let mut field_security = None;
    let mut query = OptTraceable::absent(source.attribute("query"));
    let mut allow_restricted_indices = OptTraceable::absent(source.attribute("allow_restricted_indices"));

    for (key, value) in object {
        let at = source.attribute(key);
        match key.as_str() {
            "clusters" if remote => clusters = Some(read_string_list(value, &at, reporter)),
            "clusters" => reporter.problem(
                &at,
                "'clusters' is a remote-index property and is ignored in a local index block",
            ),
            "names" => names = Some(read_string_list(value, &at, reporter)),
            "privileges" => privileges = Some(read_string_list(value, &at, reporter)),
            "field_security" => {
                field_security = read_object(value, &at, reporter).map(|fs| read_field_security(fs, &at, reporter))
            }
            "query" => query = read_query(value, &at, reporter),
            "allow_restricted_indices" => {
                if let Some(flag) = read_bool(value, &at, reporter) {
                    allow_restricted_indices = flag.into();
                }
            }
            _ => reporter.unknown_key(&at),
        }
    }

    let names = required(names, source, "names", reporter)?;
    let privileges = required(privileges, source, "privileges", reporter)?;
    let clusters = if remote {
        Some(required(clusters, source, "clusters", reporter)?)
    } else {
        None
    };

    Some((
        clusters,
        IndexPrivileges {
            source: source.clone(),
            names,
            privileges,
            field_security,
            query,
            allow_restricted_indices,
        },
    ))
}

/// Queries may be given as a JSON string or as an inline object.
fn read_query(value: &Value, source: &SourcePath, reporter: &MigrationReporter) -> OptTraceable<String> {
    match value {
        Value::Object(_) => OptTraceable::present(value.to_string(), source.clone()),
        other => read_optional_string(other, source, reporter),
    }
}

fn read_field_security(object: &Map<String, Value>, source: &SourcePath, reporter: &MigrationReporter) -> FieldSecurity {
    let mut grant = Vec::new();
    let mut except = Vec::new();
    for (key, value) in object {
        let at = source.attribute(key);
        match key.as_str() {
            "grant" => grant = read_string_list(value, &at, reporter).unwrap_or_default(),
            "except" => except = read_string_list(value, &at, reporter).unwrap_or_default(),
            _ => reporter.unknown_key(&at),
        }
    }
    FieldSecurity {
        source: source.clone(),
        grant,
        except,
    }
}

fn read_application(
    object: &Map<String, Value>,
    source: &SourcePath,
    reporter: &MigrationReporter,
) -> Option<ApplicationPrivileges> {
    let mut application = None;
    let mut privileges = None;
    let mut resources = None;
    for (key, value) in object {
        let at = source.attribute(key);
        match key.as_str() {
            "application" => application = Some(read_string(value, &at, reporter)),
            "privileges" => privileges = Some(read_string_list(value, &at, reporter)),
            "resources" => resources = Some(read_string_list(value, &at, reporter)),
            _ => reporter.unknown_key(&at),
        }
    }

    Some(ApplicationPrivileges {
        source: source.clone(),
        application: required(application, source, "application", reporter)?,
        privileges: required(privileges, source, "privileges", reporter)?,
        resources: required(resources, source, "resources", reporter)?,
    })
}

fn read_remote_cluster(
    object: &Map<String, Value>,
    source: &SourcePath,
    reporter: &MigrationReporter,
) -> Option<RemoteClusterPrivileges> {
    let mut clusters = None;
    let mut privileges = None;
    for (key, value) in object {
        let at = source.attribute(key);
        match key.as_str() {
            "clusters" => clusters = Some(read_string_list(value, &at, reporter)),
            "privileges" => privileges = Some(read_string_list(value, &at, reporter)),
            _ => reporter.unknown_key(&at),
        }
    }

    Some(RemoteClusterPrivileges {
        source: source.clone(),
        clusters: required(clusters, source, "clusters", reporter)?,
        privileges: required(privileges, source, "privileges", reporter)?,
    })
}

/// A required key of a block. The outer `None` means the key was absent; an
/// inner `None` means its value was unusable and has already been reported.
fn required<T>(field: Option<Option<T>>, source: &SourcePath, name: &str, reporter: &MigrationReporter) -> Option<T> {
    match field {
        Some(value) => value,
        None => {
            reporter.missing_parameter(source, name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Category;
    use serde_json::json;

    fn read(root: Value) -> (IntermediateRepresentation, MigrationReporter) {
        let reporter = MigrationReporter::search_guard();
        let mut ir = IntermediateRepresentation::new();
        let doc = LoadedDocument {
            source: SourcePath::document("role.json"),
            root: Some(root),
        };
        read_roles(&doc, &mut ir, &reporter, &LogContext::new("run-test"));
        (ir, reporter)
    }

    fn strings(list: &[Traceable<String>]) -> Vec<&str> {
        list.iter().map(|t| t.get().as_str()).collect()
    }

    #[test]
    fn test_admin_role() {
        let (ir, reporter) = read(json!({
            "admin": {"cluster": ["monitor"], "indices": [{"names": ["logs-*"], "privileges": ["read"]}]}
        }));
        let roles = ir.roles.as_ref().unwrap();
        assert_eq!(roles.len(), 1);
        let admin = &roles[0];
        assert_eq!(admin.name, "admin");
        assert_eq!(strings(&admin.cluster), vec!["monitor"]);
        assert_eq!(admin.indices.len(), 1);
        assert_eq!(strings(&admin.indices[0].names), vec!["logs-*"]);
        assert_eq!(strings(&admin.indices[0].privileges), vec!["read"]);
        assert_eq!(reporter.total_findings(), 0);
    }

    #[test]
    fn test_unknown_key_does_not_affect_siblings() {
        let (ir, reporter) = read(json!({
            "ops": {"cluster": "monitor", "colour": "red", "run_as": ["jdoe"]}
        }));
        let ops = &ir.roles.as_ref().unwrap()[0];
        assert_eq!(strings(&ops.cluster), vec!["monitor"]);
        assert_eq!(strings(&ops.run_as), vec!["jdoe"]);

        let unknown = reporter.findings(Category::UnknownKey);
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].source.full_path_string(), "role.json: ops.colour");
    }

    #[test]
    fn test_index_block_missing_privileges_is_dropped() {
        let (ir, reporter) = read(json!({
            "r": {"indices": [{"names": "a"}, {"names": ["b"], "privileges": ["write"]}]}
        }));
        let role = &ir.roles.as_ref().unwrap()[0];
        assert_eq!(role.indices.len(), 1);
        assert_eq!(strings(&role.indices[0].names), vec!["b"]);

        let missing = reporter.findings(Category::MissingParameter);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].source.path_string(), "r.indices[0]");
    }

    #[test]
    fn test_index_block_with_malformed_names_reports_only_type() {
        let (ir, reporter) = read(json!({
            "r": {
                "indices": [{"names": 42, "privileges": ["read"]}, {"names": ["b"], "privileges": ["read"]}],
                "remote_cluster": [{"clusters": {"eu": true}, "privileges": ["monitor_enrich"]}]
            }
        }));
        let role = &ir.roles.as_ref().unwrap()[0];
        assert_eq!(role.indices.len(), 1);
        assert_eq!(strings(&role.indices[0].names), vec!["b"]);
        assert!(role.remote_cluster.is_empty());

        let invalid = reporter.findings(Category::InvalidType);
        assert_eq!(invalid.len(), 2);
        assert_eq!(invalid[0].source.path_string(), "r.indices[0].names");
        assert_eq!(invalid[1].source.path_string(), "r.remote_cluster[0].clusters");
        assert!(reporter.findings(Category::MissingParameter).is_empty());
    }

    #[test]
    fn test_field_security_and_query() {
        let (ir, _) = read(json!({
            "r": {"indices": [{
                "names": ["hr-*"],
                "privileges": ["read"],
                "field_security": {"grant": ["*"], "except": ["salary"]},
                "query": {"term": {"dept": "hr"}},
                "allow_restricted_indices": false
            }]}
        }));
        let block = &ir.roles.as_ref().unwrap()[0].indices[0];
        let fls = block.field_security.as_ref().unwrap();
        assert_eq!(strings(&fls.grant), vec!["*"]);
        assert_eq!(strings(&fls.except), vec!["salary"]);
        assert_eq!(block.query.get().map(String::as_str), Some("{\"term\":{\"dept\":\"hr\"}}"));
        assert_eq!(block.allow_restricted_indices.get(), Some(&false));
    }

    #[test]
    fn test_remote_and_application_blocks() {
        let (ir, reporter) = read(json!({
            "r": {
                "remote_indices": [{"clusters": ["eu"], "names": ["x"], "privileges": ["read"]}, {"names": ["y"], "privileges": ["read"]}],
                "remote_cluster": [{"clusters": ["eu"], "privileges": ["monitor_enrich"]}],
                "applications": [{"application": "kibana-.kibana", "privileges": ["all"], "resources": ["*"]}],
                "metadata": {"version": 1},
                "global": {"application": {"manage": {"applications": ["*"]}}}
            }
        }));
        let role = &ir.roles.as_ref().unwrap()[0];
        assert_eq!(role.remote_indices.len(), 1);
        assert_eq!(role.remote_cluster.len(), 1);
        assert_eq!(role.applications.len(), 1);

        assert_eq!(reporter.findings(Category::MissingParameter).len(), 1);
        assert_eq!(reporter.findings(Category::IgnoredKey).len(), 1);
        assert_eq!(reporter.findings(Category::ManualAction).len(), 1);
    }

    #[test]
    fn test_non_object_role() {
        let (ir, reporter) = read(json!({"bad": ["x"], "good": {}}));
        assert_eq!(ir.roles.as_ref().unwrap().len(), 1);
        assert_eq!(reporter.findings(Category::InvalidType).len(), 1);
    }

    #[test]
    fn test_absent_document() {
        let reporter = MigrationReporter::search_guard();
        let mut ir = IntermediateRepresentation::new();
        read_roles(
            &LoadedDocument::empty("role.json"),
            &mut ir,
            &reporter,
            &LogContext::new("run-test"),
        );
        assert_eq!(ir.roles.as_ref().map(Vec::len), Some(0));
        assert_eq!(reporter.total_findings(), 0);
    }
}
