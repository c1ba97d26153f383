//! Settings flattening.
//!
//! Turns a nested settings tree into dotted keys such as
//! `xpack.security.authc.realms.ldap.ldap1.url`, so readers can route by
//! prefix. Lists are leaves; only objects are descended into.

use serde_json::{Map, Value};

use crate::trace::{SourcePath, Traceable};

/// One flattened setting.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatSetting {
    pub key: String,
    pub value: Traceable<Value>,
}

/// Flatten a settings document.
///
/// Keys written in dotted form (`a.b: 1`) and nested form (`a: {b: 1}`)
/// produce the same flat key. The source path of every entry is split into
/// one segment per key component. A non-object root yields nothing.
pub fn flatten_settings(root: &Value, document: &SourcePath) -> Vec<FlatSetting> {
    let mut out = Vec::new();
    if let Value::Object(map) = root {
        flatten_into(map, "", document, &mut out);
    }
    out
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, source: &SourcePath, out: &mut Vec<FlatSetting>) {
    for (key, value) in map {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let child_source = source.attributes(key);

        match value {
            Value::Object(child) if !child.is_empty() => {
                flatten_into(child, &full_key, &child_source, out);
            }
            _ => out.push(FlatSetting {
                key: full_key,
                value: Traceable::new(value.clone(), child_source),
            }),
        }
    }
}

/// Flatten an arbitrary object into dotted string attributes.
///
/// Used for free-form metadata. Scalars become strings, lists become their
/// JSON text, nulls are skipped.
pub fn flatten_attributes(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_attributes_into(map, "", &mut out);
    out
}

fn flatten_attributes_into(map: &Map<String, Value>, prefix: &str, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(child) => flatten_attributes_into(child, &full_key, out),
            Value::Null => {}
            other => out.push((full_key, super::values::value_to_string(other))),
        }
    }
}
