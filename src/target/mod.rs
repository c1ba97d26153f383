//! Search Guard configuration records.
//!
//! Each record serializes to one configuration file. Records are built by
//! the sub-migrators and are not modified afterwards.

pub mod authc;
pub mod frontend_authc;
pub mod internal_users;
pub mod roles;
pub mod roles_mapping;

pub use authc::*;
pub use frontend_authc::*;
pub use internal_users::*;
pub use roles::*;
pub use roles_mapping::*;

use serde::Serialize;
use serde_json::Value;

use crate::error::{MigrationError, Result};

/// A record that is written to a named configuration file.
pub trait NamedConfig: Serialize {
    fn file_name(&self) -> &'static str;

    fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|source| MigrationError::Encode {
            file_name: self.file_name().to_string(),
            source,
        })
    }

    fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|source| MigrationError::Serialize {
            file_name: self.file_name().to_string(),
            source,
        })
    }
}

/// Any of the records a sub-migrator can produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TargetConfig {
    Authc(SgAuthc),
    FrontendAuthc(SgFrontendAuthc),
    RolesMapping(SgRolesMapping),
    InternalUsers(SgInternalUsers),
    Roles(SgRoles),
}

impl NamedConfig for TargetConfig {
    fn file_name(&self) -> &'static str {
        match self {
            TargetConfig::Authc(config) => config.file_name(),
            TargetConfig::FrontendAuthc(config) => config.file_name(),
            TargetConfig::RolesMapping(config) => config.file_name(),
            TargetConfig::InternalUsers(config) => config.file_name(),
            TargetConfig::Roles(config) => config.file_name(),
        }
    }
}

impl From<SgAuthc> for TargetConfig {
    fn from(config: SgAuthc) -> Self {
        TargetConfig::Authc(config)
    }
}

impl From<SgFrontendAuthc> for TargetConfig {
    fn from(config: SgFrontendAuthc) -> Self {
        TargetConfig::FrontendAuthc(config)
    }
}

impl From<SgRolesMapping> for TargetConfig {
    fn from(config: SgRolesMapping) -> Self {
        TargetConfig::RolesMapping(config)
    }
}

impl From<SgInternalUsers> for TargetConfig {
    fn from(config: SgInternalUsers) -> Self {
        TargetConfig::InternalUsers(config)
    }
}

impl From<SgRoles> for TargetConfig {
    fn from(config: SgRoles) -> Self {
        TargetConfig::Roles(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_untagged_target_serializes_inner_record() {
        let config = TargetConfig::from(SgAuthc {
            auth_domains: vec![AuthDomain::InternalUsers],
        });
        assert_eq!(config.file_name(), "sg_authc.yml");
        assert_eq!(
            config.to_value().unwrap(),
            json!({"auth_domains": [{"type": "basic/internal_users_db"}]})
        );
        assert_eq!(
            config.to_yaml().unwrap(),
            "auth_domains:\n- type: basic/internal_users_db\n"
        );
    }
}
