//! `sg_roles.yml`: role definitions.

use indexmap::IndexMap;
use serde::Serialize;

use super::NamedConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SgRoles {
    pub roles: IndexMap<String, SgRole>,
}

impl NamedConfig for SgRoles {
    fn file_name(&self) -> &'static str {
        "sg_roles.yml"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SgRole {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cluster_permissions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub index_permissions: Vec<IndexPermission>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexPermission {
    pub index_patterns: Vec<String>,
    pub allowed_actions: Vec<String>,
    /// Field-level security: included fields, or excluded ones prefixed with `~`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fls: Vec<String>,
    /// Document-level security query, as JSON text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dls: Option<String>,
}
