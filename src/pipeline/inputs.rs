//! The legacy documents handed to a migration run.

use std::path::Path;

use crate::loader::{DocumentFormat, InputDocument};

pub const ELASTICSEARCH_YML: &str = "elasticsearch.yml";
pub const KIBANA_YML: &str = "kibana.yml";
pub const ROLE_JSON: &str = "role.json";
pub const USER_JSON: &str = "user.json";
pub const ROLE_MAPPING_JSON: &str = "role_mapping.json";

/// Every input is optional. Only a missing `elasticsearch.yml` fails the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationInputs {
    pub elasticsearch: Option<InputDocument>,
    pub kibana: Option<InputDocument>,
    pub roles: Option<InputDocument>,
    pub users: Option<InputDocument>,
    pub role_mappings: Option<InputDocument>,
}

impl MigrationInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up the well-known file names from an export directory. Files
    /// that do not exist are left absent.
    pub fn from_directory(dir: &Path) -> Self {
        let read = |name: &str| {
            let path = dir.join(name);
            path.exists().then(|| InputDocument::read(name, &path))
        };
        Self {
            elasticsearch: read(ELASTICSEARCH_YML),
            kibana: read(KIBANA_YML),
            roles: read(ROLE_JSON),
            users: read(USER_JSON),
            role_mappings: read(ROLE_MAPPING_JSON),
        }
    }

    pub fn with_elasticsearch(mut self, text: impl Into<String>) -> Self {
        self.elasticsearch = Some(InputDocument::from_text(ELASTICSEARCH_YML, text));
        self
    }

    pub fn with_kibana(mut self, text: impl Into<String>) -> Self {
        self.kibana = Some(InputDocument::from_text(KIBANA_YML, text));
        self
    }

    pub fn with_roles(mut self, text: impl Into<String>) -> Self {
        self.roles = Some(InputDocument::from_text(ROLE_JSON, text));
        self
    }

    pub fn with_users(mut self, text: impl Into<String>) -> Self {
        self.users = Some(InputDocument::from_text(USER_JSON, text));
        self
    }

    pub fn with_role_mappings(mut self, text: impl Into<String>) -> Self {
        self.role_mappings = Some(InputDocument::from_text(ROLE_MAPPING_JSON, text));
        self
    }

    /// The supplied documents in reading order, with their syntax.
    ///
    /// Roles come before users so user role references can be checked.
    pub(crate) fn documents(&self) -> [(Option<&InputDocument>, DocumentFormat); 5] {
        [
            (self.elasticsearch.as_ref(), DocumentFormat::Yaml),
            (self.kibana.as_ref(), DocumentFormat::Yaml),
            (self.roles.as_ref(), DocumentFormat::Json),
            (self.users.as_ref(), DocumentFormat::Json),
            (self.role_mappings.as_ref(), DocumentFormat::Json),
        ]
    }
}
