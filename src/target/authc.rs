//! `sg_authc.yml`: backend authentication domains.

use serde::Serialize;

use super::NamedConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SgAuthc {
    pub auth_domains: Vec<AuthDomain>,
}

impl NamedConfig for SgAuthc {
    fn file_name(&self) -> &'static str {
        "sg_authc.yml"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum AuthDomain {
    #[serde(rename = "basic/internal_users_db")]
    InternalUsers,
    #[serde(rename = "basic/ldap")]
    Ldap { ldap: LdapDomain },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LdapDomain {
    pub idp: LdapIdp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_search: Option<UserSearch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_search: Option<GroupSearch>,
}

/// Connection settings for the directory server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LdapIdp {
    pub hosts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_dn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_strategy: Option<ConnectionStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_pool: Option<ConnectionPool>,
}

/// X-Pack `load_balance.type`: `round_robin` and `failover`. The `dns_*`
/// variants have no equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStrategy {
    RoundRobin,
    Failover,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionPool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Sub,
    One,
}

impl SearchScope {
    pub const ALL: [SearchScope; 2] = [SearchScope::Sub, SearchScope::One];

    pub fn as_str(&self) -> &str {
        match self {
            SearchScope::Sub => "SUB",
            SearchScope::One => "ONE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchFilter {
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<SearchScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<SearchFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSearch {
    pub base_dn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<SearchScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<SearchFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<Recursive>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recursive {
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ldap_domain_shape() {
        let config = SgAuthc {
            auth_domains: vec![AuthDomain::Ldap {
                ldap: LdapDomain {
                    idp: LdapIdp {
                        hosts: vec!["ldaps://ldap.example.com:636".to_string()],
                        bind_dn: Some("cn=admin,dc=example,dc=com".to_string()),
                        password: None,
                        connection_strategy: Some(ConnectionStrategy::RoundRobin),
                        connection_pool: Some(ConnectionPool {
                            min_size: Some(2),
                            max_size: None,
                        }),
                    },
                    user_search: Some(UserSearch {
                        base_dn: Some("ou=people,dc=example,dc=com".to_string()),
                        scope: Some(SearchScope::One),
                        filter: Some(SearchFilter {
                            raw: "(uid=${user.name})".to_string(),
                        }),
                    }),
                    group_search: None,
                },
            }],
        };

        assert_eq!(
            config.to_value().unwrap(),
            json!({
                "auth_domains": [{
                    "type": "basic/ldap",
                    "ldap": {
                        "idp": {
                            "hosts": ["ldaps://ldap.example.com:636"],
                            "bind_dn": "cn=admin,dc=example,dc=com",
                            "connection_strategy": "roundrobin",
                            "connection_pool": {"min_size": 2}
                        },
                        "user_search": {
                            "base_dn": "ou=people,dc=example,dc=com",
                            "scope": "one",
                            "filter": {"raw": "(uid=${user.name})"}
                        }
                    }
                }]
            })
        );
    }
}
