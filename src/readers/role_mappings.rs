//! `role_mapping.json` reader.

use serde_json::{Map, Value};

use crate::ir::{
    FieldRule, IntermediateRepresentation, RoleGrant, RoleMapping, RoleTemplate, Rule, RuleKind, TemplateFormat,
};
use crate::loader::LoadedDocument;
use crate::logging::structured::LogContext;
use crate::report::MigrationReporter;
use crate::trace::{OptTraceable, SourcePath, Traceable};

use super::common::{read_bool, read_list, read_object, read_string, read_string_list};

/// Read `role_mapping.json` into the IR.
pub fn read_role_mappings(
    doc: &LoadedDocument,
    ir: &mut IntermediateRepresentation,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) {
    ir.role_mappings.get_or_insert_with(Vec::new);

    let Some(root) = &doc.root else {
        crate::log_info!(ctx, "ROLE_MAPPINGS_READ", mappings = 0);
        return;
    };
    let Some(entries) = read_object(root, &doc.source, reporter) else {
        return;
    };

    for (name, value) in entries {
        let source = doc.source.attribute(name);
        let Some(object) = read_object(value, &source, reporter) else {
            continue;
        };
        if let Some(mapping) = read_mapping(name, object, source, reporter, ctx) {
            ir.add_role_mapping(mapping, ctx);
        }
    }

    crate::log_info!(
        ctx,
        "ROLE_MAPPINGS_READ",
        mappings = ir.role_mappings.as_ref().map(Vec::len).unwrap_or(0),
    );
}

fn read_mapping(
    name: &str,
    object: &Map<String, Value>,
    source: SourcePath,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) -> Option<RoleMapping> {
    let mut enabled = OptTraceable::absent(source.attribute("enabled"));
    let mut roles: Option<Vec<Traceable<String>>> = None;
    let mut templates: Option<Vec<RoleTemplate>> = None;
    let mut rules: Option<(SourcePath, Option<Rule>)> = None;
    let mut run_as = Vec::new();

    for (key, value) in object {
        let at = source.attribute(key);
        match key.as_str() {
            "enabled" => {
                if let Some(flag) = read_bool(value, &at, reporter) {
                    enabled = flag.into();
                }
            }
            "roles" => roles = Some(read_string_list(value, &at, reporter).unwrap_or_default()),
            "role_templates" => templates = Some(read_templates(value, &at, reporter)),
            "rules" => {
                let rule = read_rule(value, &at, reporter);
                rules = Some((at, rule));
            }
            "run_as" => run_as = read_string_list(value, &at, reporter).unwrap_or_default(),
            "metadata" => {
                if matches!(value, Value::Object(map) if !map.is_empty()) {
                    reporter.ignored_key(&at, "role mapping metadata has no equivalent in Search Guard");
                }
            }
            _ => reporter.unknown_key(&at),
        }
    }

    let grant = match (roles, templates) {
        (Some(roles), Some(_)) => {
            reporter.problem(
                &source,
                "Role mapping defines both 'roles' and 'role_templates'; only 'roles' is used",
            );
            RoleGrant::Roles(roles)
        }
        (Some(roles), None) => RoleGrant::Roles(roles),
        (None, Some(templates)) => RoleGrant::Templates(templates),
        (None, None) => {
            reporter.missing_parameter(&source, "roles");
            return None;
        }
    };

    let Some((rules_source, rules)) = rules else {
        reporter.missing_parameter(&source, "rules");
        return None;
    };

    let enabled_flag = enabled.get_or(true);
    if rules.is_none() && enabled_flag {
        crate::log_warn!(ctx, "ROLE_MAPPING_RULES_UNPARSEABLE", name = name);
        reporter.fatal(
            &rules_source,
            "The rules of this role mapping could not be parsed; no identities can be derived from them",
        );
    }

    Some(RoleMapping {
        name: name.to_string(),
        source,
        enabled,
        grant,
        rules,
        run_as,
    })
}

fn read_templates(value: &Value, source: &SourcePath, reporter: &MigrationReporter) -> Vec<RoleTemplate> {
    let Some(items) = read_list(value, source, reporter) else {
        return Vec::new();
    };

    let mut templates = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let at = source.entry(i);
        let Some(object) = read_object(item, &at, reporter) else {
            continue;
        };

        let mut format = TemplateFormat::String;
        let mut template = None;
        for (key, value) in object {
            let key_source = at.attribute(key);
            match key.as_str() {
                "format" => match read_string(value, &key_source, reporter) {
                    Some(f) if f.get() == "string" => format = TemplateFormat::String,
                    Some(f) if f.get() == "json" => format = TemplateFormat::Json,
                    Some(f) => reporter.problem(
                        &f,
                        format!("Unknown template format '{}'; expected 'string' or 'json'", f.get()),
                    ),
                    None => {}
                },
                "template" => template = Some(Traceable::new(value.clone(), key_source)),
                _ => reporter.unknown_key(&key_source),
            }
        }

        match template {
            Some(template) => templates.push(RoleTemplate {
                source: at,
                format,
                template,
            }),
            None => reporter.missing_parameter(&at, "template"),
        }
    }
    templates
}

/// Parse one node of a rule tree. `None` means the node is unusable; the
/// reason has already been reported.
fn read_rule(value: &Value, source: &SourcePath, reporter: &MigrationReporter) -> Option<Rule> {
    let object = read_object(value, source, reporter)?;

    let mut entries = object.iter();
    let (key, inner) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            reporter.problem(
                source,
                format!(
                    "A rule must contain exactly one of 'any', 'all', 'except' or 'field', but {} keys were found",
                    object.len()
                ),
            );
            return None;
        }
    };

    let at = source.attribute(key);
    let kind = match key.as_str() {
        "any" => RuleKind::Any(read_rule_list(inner, &at, reporter)?),
        "all" => RuleKind::All(read_rule_list(inner, &at, reporter)?),
        "except" => RuleKind::Except(Box::new(read_rule(inner, &at, reporter)?)),
        "field" => RuleKind::Field(read_field_rule(inner, &at, reporter)?),
        _ => {
            reporter.unknown_key(&at);
            return None;
        }
    };

    Some(Rule {
        source: source.clone(),
        kind,
    })
}

/// Children of `any`/`all`. Broken children are dropped; the node survives.
fn read_rule_list(value: &Value, source: &SourcePath, reporter: &MigrationReporter) -> Option<Vec<Rule>> {
    let items = read_list(value, source, reporter)?;
    Some(
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| read_rule(item, &source.entry(i), reporter))
            .collect(),
    )
}

fn read_field_rule(value: &Value, source: &SourcePath, reporter: &MigrationReporter) -> Option<FieldRule> {
    let object = read_object(value, source, reporter)?;
    if object.len() != 1 {
        reporter.problem(
            source,
            format!("A field rule must contain exactly one field, but {} were found", object.len()),
        );
        return None;
    }

    let (field, values) = object.iter().next()?;
    let at = source.attribute(field);
    let values = match values {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| Traceable::new(item.clone(), at.entry(i)))
            .collect(),
        scalar => vec![Traceable::new(scalar.clone(), at.clone())],
    };

    Some(FieldRule {
        field: Traceable::new(field.clone(), at),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::EntityKind;
    use crate::report::Category;
    use serde_json::json;

    fn read(root: Value) -> (IntermediateRepresentation, MigrationReporter) {
        let reporter = MigrationReporter::search_guard();
        let mut ir = IntermediateRepresentation::new();
        let doc = LoadedDocument {
            source: SourcePath::document("role_mapping.json"),
            root: Some(root),
        };
        read_role_mappings(&doc, &mut ir, &reporter, &LogContext::new("run-test"));
        (ir, reporter)
    }

    #[test]
    fn test_rule_tree() {
        let (ir, reporter) = read(json!({
            "admins": {
                "enabled": true,
                "roles": ["superuser"],
                "rules": {"any": [
                    {"field": {"username": ["u1", "u2"]}},
                    {"field": {"groups": "cn=admins,dc=example,dc=com"}}
                ]},
                "metadata": {}
            }
        }));
        assert_eq!(reporter.total_findings(), 0);

        let mapping = &ir.role_mappings.as_ref().unwrap()[0];
        assert!(matches!(&mapping.grant, RoleGrant::Roles(roles) if roles.len() == 1));

        let rules = mapping.rules.as_ref().unwrap();
        assert_eq!(rules.source.path_string(), "admins.rules");
        let RuleKind::Any(children) = &rules.kind else {
            panic!("expected any");
        };
        assert_eq!(children.len(), 2);
        let RuleKind::Field(users) = &children[0].kind else {
            panic!("expected field");
        };
        assert_eq!(users.field.get(), "username");
        assert_eq!(users.values.len(), 2);
        assert_eq!(users.values[1].source().path_string(), "admins.rules.any[0].field.username[1]");

        let RuleKind::Field(groups) = &children[1].kind else {
            panic!("expected field");
        };
        assert_eq!(groups.values.len(), 1);
    }

    #[test]
    fn test_roles_and_templates() {
        let (ir, reporter) = read(json!({
            "both": {
                "roles": ["a"],
                "role_templates": [{"template": {"source": "{{username}}"}}],
                "rules": {"field": {"username": "*"}}
            },
            "templated": {
                "role_templates": [{"format": "json", "template": "[\"x\"]"}, {"format": "string"}],
                "rules": {"field": {"username": "*"}}
            },
            "neither": {"rules": {"field": {"username": "*"}}}
        }));

        let mappings = ir.role_mappings.as_ref().unwrap();
        assert_eq!(mappings.len(), 2);
        assert!(matches!(mappings[0].grant, RoleGrant::Roles(_)));
        let RoleGrant::Templates(templates) = &mappings[1].grant else {
            panic!("expected templates");
        };
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].format, TemplateFormat::Json);

        assert_eq!(reporter.findings(Category::Problem).len(), 1);
        let missing = reporter.findings(Category::MissingParameter);
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].source.path_string(), "templated.role_templates[1]");
        assert_eq!(missing[1].messages, vec!["Missing required parameter 'roles'".to_string()]);
    }

    #[test]
    fn test_unparseable_rules_are_fatal() {
        let (ir, reporter) = read(json!({
            "broken": {
                "roles": ["a"],
                "rules": {"any": [], "all": []}
            }
        }));
        assert!(reporter.has_fatal_problems());
        assert!(ir.role_mappings.as_ref().unwrap()[0].rules.is_none());
    }

    #[test]
    fn test_disabled_mapping_with_bad_rules_is_not_fatal() {
        let (ir, reporter) = read(json!({
            "off": {
                "enabled": false,
                "roles": ["a"],
                "rules": {"field": {"username": "u", "groups": "g"}}
            }
        }));
        assert!(!reporter.has_fatal_problems());
        assert_eq!(reporter.findings(Category::Problem).len(), 1);
        assert_eq!(ir.excluded_of(EntityKind::RoleMapping).count(), 1);
    }

    #[test]
    fn test_broken_child_is_dropped() {
        let (ir, reporter) = read(json!({
            "partial": {
                "roles": ["a"],
                "rules": {"any": [{"field": {"username": "u"}}, {"nope": 1}]}
            }
        }));
        let rules = ir.role_mappings.as_ref().unwrap()[0].rules.clone().unwrap();
        assert!(matches!(rules.kind, RuleKind::Any(ref children) if children.len() == 1));
        assert_eq!(reporter.findings(Category::UnknownKey).len(), 1);
        assert!(!reporter.has_fatal_problems());
    }

    #[test]
    fn test_missing_rules() {
        let (ir, reporter) = read(json!({"norules": {"roles": ["a"]}}));
        assert!(ir.role_mappings.as_ref().unwrap().is_empty());
        assert_eq!(
            reporter.findings(Category::MissingParameter)[0].messages[0],
            "Missing required parameter 'rules'"
        );
    }
}
