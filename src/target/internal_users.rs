//! `sg_internal_users.yml`: users of the internal user database.

use indexmap::IndexMap;
use serde::Serialize;

use super::NamedConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SgInternalUsers {
    pub users: IndexMap<String, InternalUser>,
}

impl NamedConfig for SgInternalUsers {
    fn file_name(&self) -> &'static str {
        "sg_internal_users.yml"
    }
}

/// Password hashes cannot be carried over, so `hash` is always written empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InternalUser {
    pub hash: String,
    pub backend_roles: Vec<String>,
    pub attributes: IndexMap<String, String>,
}
