//! Roles from `role.json`.

use crate::trace::{OptTraceable, SourcePath, Traceable};

#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub name: String,
    pub source: SourcePath,
    pub cluster: Vec<Traceable<String>>,
    pub indices: Vec<IndexPrivileges>,
    pub applications: Vec<ApplicationPrivileges>,
    pub remote_indices: Vec<RemoteIndexPrivileges>,
    pub remote_cluster: Vec<RemoteClusterPrivileges>,
    pub run_as: Vec<Traceable<String>>,
    pub description: OptTraceable<String>,
}

impl Role {
    pub fn new(name: &str, source: SourcePath) -> Self {
        Self {
            name: name.to_string(),
            cluster: Vec::new(),
            indices: Vec::new(),
            applications: Vec::new(),
            remote_indices: Vec::new(),
            remote_cluster: Vec::new(),
            run_as: Vec::new(),
            description: OptTraceable::absent(source.attribute("description")),
            source,
        }
    }
}

/// One entry of a role's `indices` list.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPrivileges {
    pub source: SourcePath,
    pub names: Vec<Traceable<String>>,
    pub privileges: Vec<Traceable<String>>,
    pub field_security: Option<FieldSecurity>,
    pub query: OptTraceable<String>,
    pub allow_restricted_indices: OptTraceable<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSecurity {
    pub source: SourcePath,
    pub grant: Vec<Traceable<String>>,
    pub except: Vec<Traceable<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationPrivileges {
    pub source: SourcePath,
    pub application: Traceable<String>,
    pub privileges: Vec<Traceable<String>>,
    pub resources: Vec<Traceable<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteIndexPrivileges {
    pub clusters: Vec<Traceable<String>>,
    pub index: IndexPrivileges,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteClusterPrivileges {
    pub source: SourcePath,
    pub clusters: Vec<Traceable<String>>,
    pub privileges: Vec<Traceable<String>>,
}
