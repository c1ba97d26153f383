//! `sg_roles_mapping.yml`: which identities receive a role.

use indexmap::IndexMap;
use serde::Serialize;

use super::NamedConfig;

/// Role name to identities, in the order roles were first granted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SgRolesMapping {
    pub mappings: IndexMap<String, Identities>,
}

impl SgRolesMapping {
    /// Add identities to a role. Identities granted by several mappings are
    /// concatenated, not replaced.
    pub fn grant(&mut self, role: &str, identities: Identities) {
        self.mappings.entry(role.to_string()).or_default().extend(identities);
    }

    pub fn get(&self, role: &str) -> Option<&Identities> {
        self.mappings.get(role)
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl NamedConfig for SgRolesMapping {
    fn file_name(&self) -> &'static str {
        "sg_roles_mapping.yml"
    }
}

/// Identity buckets of one role. Empty buckets are not written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identities {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub backend_roles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<String>,
}

impl Identities {
    pub fn extend(&mut self, other: Identities) {
        self.users.extend(other.users);
        self.backend_roles.extend(other.backend_roles);
        self.hosts.extend(other.hosts);
        self.ips.extend(other.ips);
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.backend_roles.is_empty() && self.hosts.is_empty() && self.ips.is_empty()
    }
}
