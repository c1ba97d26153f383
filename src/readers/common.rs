//! Shared value readers.
//!
//! The strict helpers are for the JSON documents, where a wrong type is a
//! finding. The `setting_*` helpers accept the string-encoded scalars YAML
//! settings files commonly contain.

use serde_json::{Map, Value};

use crate::loader::values::{json_type_name, value_to_bool, value_to_int, value_to_scalar_string};
use crate::report::MigrationReporter;
use crate::trace::{OptTraceable, SourcePath, Traceable};

pub fn read_string(value: &Value, source: &SourcePath, reporter: &MigrationReporter) -> Option<Traceable<String>> {
    match value {
        Value::String(s) => Some(Traceable::new(s.clone(), source.clone())),
        other => {
            reporter.invalid_type(source, "string", json_type_name(other));
            None
        }
    }
}

/// Like `read_string`, but `null` means "not set" and is not reported.
pub fn read_optional_string(value: &Value, source: &SourcePath, reporter: &MigrationReporter) -> OptTraceable<String> {
    match value {
        Value::Null => OptTraceable::absent(source.clone()),
        other => match read_string(other, source, reporter) {
            Some(s) => s.into(),
            None => OptTraceable::absent(source.clone()),
        },
    }
}

pub fn read_bool(value: &Value, source: &SourcePath, reporter: &MigrationReporter) -> Option<Traceable<bool>> {
    match value {
        Value::Bool(b) => Some(Traceable::new(*b, source.clone())),
        other => {
            reporter.invalid_type(source, "boolean", json_type_name(other));
            None
        }
    }
}

pub fn read_object<'v>(
    value: &'v Value,
    source: &SourcePath,
    reporter: &MigrationReporter,
) -> Option<&'v Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        other => {
            reporter.invalid_type(source, "object", json_type_name(other));
            None
        }
    }
}

pub fn read_list<'v>(value: &'v Value, source: &SourcePath, reporter: &MigrationReporter) -> Option<&'v [Value]> {
    match value {
        Value::Array(items) => Some(items),
        other => {
            reporter.invalid_type(source, "list", json_type_name(other));
            None
        }
    }
}

/// Read a list of strings. A bare string is read as a one-element list.
///
/// Non-string elements are reported and skipped; the rest of the list is kept.
pub fn read_string_list(
    value: &Value,
    source: &SourcePath,
    reporter: &MigrationReporter,
) -> Option<Vec<Traceable<String>>> {
    match value {
        Value::String(s) => Some(vec![Traceable::new(s.clone(), source.clone())]),
        Value::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| read_string(item, &source.entry(i), reporter))
                .collect(),
        ),
        other => {
            reporter.invalid_type(source, "list of strings", json_type_name(other));
            None
        }
    }
}

pub fn setting_string(value: &Traceable<Value>, reporter: &MigrationReporter) -> Option<String> {
    let converted = value_to_scalar_string(value.get());
    if converted.is_none() {
        reporter.invalid_type(value.source(), "string", json_type_name(value.get()));
    }
    converted
}

pub fn setting_bool(value: &Traceable<Value>, reporter: &MigrationReporter) -> Option<bool> {
    let converted = value_to_bool(value.get());
    if converted.is_none() {
        reporter.invalid_type(value.source(), "boolean", json_type_name(value.get()));
    }
    converted
}

pub fn setting_int(value: &Traceable<Value>, reporter: &MigrationReporter) -> Option<i64> {
    let converted = value_to_int(value.get());
    if converted.is_none() {
        reporter.invalid_type(value.source(), "integer", json_type_name(value.get()));
    }
    converted
}

/// A setting that may be one string or a list of strings.
pub fn setting_string_list(value: &Traceable<Value>, reporter: &MigrationReporter) -> Option<Vec<String>> {
    match value.get() {
        Value::Array(items) => {
            let strings: Option<Vec<String>> = items.iter().map(value_to_scalar_string).collect();
            if strings.is_none() {
                reporter.invalid_type(value.source(), "list of strings", "list");
            }
            strings
        }
        other => match value_to_scalar_string(other) {
            Some(s) => Some(vec![s]),
            None => {
                reporter.invalid_type(value.source(), "list of strings", json_type_name(other));
                None
            }
        },
    }
}

/// Store a converted setting, keeping the setting's source.
pub fn assign<T>(target: &mut OptTraceable<T>, converted: Option<T>, value: &Traceable<Value>) {
    if let Some(converted) = converted {
        target.set(converted, value.source().clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Category;
    use serde_json::json;

    fn source() -> SourcePath {
        SourcePath::document("role.json").attribute("admin").attribute("cluster")
    }

    #[test]
    fn test_scalar_string_becomes_list() {
        let reporter = MigrationReporter::search_guard();
        let list = read_string_list(&json!("monitor"), &source(), &reporter).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].get(), "monitor");
        assert_eq!(reporter.total_findings(), 0);
    }

    #[test]
    fn test_bad_list_element_is_skipped() {
        let reporter = MigrationReporter::search_guard();
        let list = read_string_list(&json!(["all", 3, "monitor"]), &source(), &reporter).unwrap();
        assert_eq!(list.iter().map(|t| t.get().as_str()).collect::<Vec<_>>(), vec!["all", "monitor"]);
        assert_eq!(list[1].source().path_string(), "admin.cluster[2]");

        let invalid = reporter.findings(Category::InvalidType);
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].source.path_string(), "admin.cluster[1]");
    }

    #[test]
    fn test_wrong_type_list() {
        let reporter = MigrationReporter::search_guard();
        assert!(read_string_list(&json!({"a": 1}), &source(), &reporter).is_none());
        assert_eq!(reporter.findings(Category::InvalidType).len(), 1);
    }

    #[test]
    fn test_optional_string_null() {
        let reporter = MigrationReporter::search_guard();
        let value = read_optional_string(&Value::Null, &source(), &reporter);
        assert!(!value.is_present());
        assert_eq!(reporter.total_findings(), 0);
    }

    #[test]
    fn test_lenient_settings() {
        let reporter = MigrationReporter::search_guard();
        let doc = SourcePath::document("elasticsearch.yml");
        assert_eq!(setting_bool(&Traceable::new(json!("false"), doc.clone()), &reporter), Some(false));
        assert_eq!(setting_int(&Traceable::new(json!("2"), doc.clone()), &reporter), Some(2));
        assert_eq!(
            setting_string_list(&Traceable::new(json!("ldap://a:389"), doc.clone()), &reporter),
            Some(vec!["ldap://a:389".to_string()])
        );
        assert_eq!(reporter.total_findings(), 0);

        assert_eq!(setting_int(&Traceable::new(json!("two"), doc.attribute("order")), &reporter), None);
        assert_eq!(reporter.findings(Category::InvalidType).len(), 1);
    }
}
