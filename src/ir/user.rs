//! Native users from `user.json`.

use serde_json::{Map, Value};

use crate::trace::{OptTraceable, SourcePath, Traceable};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The key the user is stored under.
    pub name: String,
    pub source: SourcePath,
    pub enabled: OptTraceable<bool>,
    pub roles: Vec<Traceable<String>>,
    pub metadata: OptTraceable<Map<String, Value>>,
    pub full_name: OptTraceable<String>,
    pub email: OptTraceable<String>,
    pub profile_uid: OptTraceable<String>,
}

impl User {
    pub fn new(name: &str, source: SourcePath) -> Self {
        Self {
            name: name.to_string(),
            enabled: OptTraceable::absent(source.attribute("enabled")),
            roles: Vec::new(),
            metadata: OptTraceable::absent(source.attribute("metadata")),
            full_name: OptTraceable::absent(source.attribute("full_name")),
            email: OptTraceable::absent(source.attribute("email")),
            profile_uid: OptTraceable::absent(source.attribute("profile_uid")),
            source,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get_or(true)
    }
}
