//! `sg_frontend_authc.yml`: login methods offered by the dashboards plugin.

use serde::Serialize;

use super::NamedConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SgFrontendAuthc {
    pub default: FrontendConfig,
}

impl SgFrontendAuthc {
    pub fn new(auth_domains: Vec<FrontendAuthDomain>) -> Self {
        Self {
            default: FrontendConfig { auth_domains },
        }
    }

    pub fn auth_domains(&self) -> &[FrontendAuthDomain] {
        &self.default.auth_domains
    }
}

impl NamedConfig for SgFrontendAuthc {
    fn file_name(&self) -> &'static str {
        "sg_frontend_authc.yml"
    }
}

/// The `default` config section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontendConfig {
    pub auth_domains: Vec<FrontendAuthDomain>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FrontendAuthDomain {
    Basic,
    Saml(SamlDomain),
    Oidc(OidcDomain),
}

impl FrontendAuthDomain {
    pub fn id(&self) -> Option<&str> {
        match self {
            FrontendAuthDomain::Basic => None,
            FrontendAuthDomain::Saml(domain) => Some(&domain.id),
            FrontendAuthDomain::Oidc(domain) => Some(&domain.id),
        }
    }

    pub fn is_auto_select(&self) -> bool {
        match self {
            FrontendAuthDomain::Basic => false,
            FrontendAuthDomain::Saml(domain) => domain.auto_select,
            FrontendAuthDomain::Oidc(domain) => domain.auto_select,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamlDomain {
    pub label: String,
    pub id: String,
    pub auto_select: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kibana_url: Option<String>,
    pub saml: SamlSettings,
    #[serde(skip_serializing_if = "UserMapping::is_empty")]
    pub user_mapping: UserMapping,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamlSettings {
    pub idp: SamlIdp,
    pub sp: SamlSp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamlIdp {
    pub metadata_url: String,
    pub entity_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamlSp {
    pub entity_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OidcDomain {
    pub label: String,
    pub id: String,
    pub auto_select: bool,
    pub oidc: OidcSettings,
    #[serde(skip_serializing_if = "UserMapping::is_empty")]
    pub user_mapping: UserMapping,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OidcSettings {
    pub client_id: String,
    pub client_secret: String,
    pub idp: OidcIdp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OidcIdp {
    pub openid_configuration_url: String,
}

/// Where user name and roles are taken from in the authentication response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<MappingSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<MappingSource>,
}

impl UserMapping {
    pub fn is_empty(&self) -> bool {
        self.user_name.is_none() && self.roles.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingSource {
    pub from: String,
}

impl MappingSource {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frontend_shape() {
        let config = SgFrontendAuthc::new(vec![
            FrontendAuthDomain::Basic,
            FrontendAuthDomain::Saml(SamlDomain {
                label: "SAML Login".to_string(),
                id: "saml1".to_string(),
                auto_select: false,
                kibana_url: Some("https://kibana.example.com/".to_string()),
                saml: SamlSettings {
                    idp: SamlIdp {
                        metadata_url: "https://idp.example.com/metadata".to_string(),
                        entity_id: "https://idp.example.com".to_string(),
                    },
                    sp: SamlSp {
                        entity_id: "https://kibana.example.com".to_string(),
                    },
                },
                user_mapping: UserMapping {
                    user_name: Some(MappingSource::new("saml_response.attributes.uid")),
                    roles: None,
                },
            }),
        ]);

        assert_eq!(config.file_name(), "sg_frontend_authc.yml");
        assert_eq!(
            config.to_value().unwrap(),
            json!({
                "default": {
                    "auth_domains": [
                        {"type": "basic"},
                        {
                            "type": "saml",
                            "label": "SAML Login",
                            "id": "saml1",
                            "auto_select": false,
                            "kibana_url": "https://kibana.example.com/",
                            "saml": {
                                "idp": {
                                    "metadata_url": "https://idp.example.com/metadata",
                                    "entity_id": "https://idp.example.com"
                                },
                                "sp": {"entity_id": "https://kibana.example.com"}
                            },
                            "user_mapping": {"user_name": {"from": "saml_response.attributes.uid"}}
                        }
                    ]
                }
            })
        );
    }
}
