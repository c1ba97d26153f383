//! Elasticsearch security settings and authentication realms.

use serde_json::Value;

use crate::trace::{OptTraceable, SourcePath, Traceable};

/// Security-relevant content of `elasticsearch.yml`.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticsearchSettings {
    pub source: SourcePath,
    pub security_enabled: OptTraceable<bool>,
    /// Enabled realms, in document order.
    pub realms: Vec<Realm>,
    pub tls: Vec<TlsSetting>,
}

impl ElasticsearchSettings {
    pub fn new(source: SourcePath) -> Self {
        Self {
            security_enabled: OptTraceable::absent(source.attributes("xpack.security.enabled")),
            source,
            realms: Vec::new(),
            tls: Vec::new(),
        }
    }

    pub fn realm(&self, name: &str) -> Option<&Realm> {
        self.realms.iter().find(|realm| realm.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsLayer {
    Transport,
    Http,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TlsSetting {
    pub layer: TlsLayer,
    pub key: String,
    pub value: Traceable<Value>,
}

/// A named authentication realm.
#[derive(Debug, Clone, PartialEq)]
pub struct Realm {
    pub name: String,
    pub source: SourcePath,
    pub order: OptTraceable<i64>,
    pub enabled: OptTraceable<bool>,
    pub kind: RealmKind,
}

impl Realm {
    pub fn new(realm_type: &str, name: &str, source: SourcePath) -> Self {
        let kind = RealmKind::for_type(realm_type, &source);
        Self {
            name: name.to_string(),
            order: OptTraceable::absent(source.attribute("order")),
            enabled: OptTraceable::absent(source.attribute("enabled")),
            source,
            kind,
        }
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get_or(true)
    }

    /// Sort key: declared order, with unordered realms last.
    pub fn sort_order(&self) -> i64 {
        self.order.get().copied().unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RealmKind {
    Native,
    File,
    Ldap(LdapRealm),
    ActiveDirectory(LdapRealm),
    Saml(SamlRealm),
    Oidc(OidcRealm),
    /// pki, kerberos, jwt and unrecognized types, kept raw.
    Other {
        realm_type: String,
        attributes: Vec<(String, Traceable<Value>)>,
    },
}

impl RealmKind {
    fn for_type(realm_type: &str, source: &SourcePath) -> Self {
        match realm_type {
            "native" => RealmKind::Native,
            "file" => RealmKind::File,
            "ldap" => RealmKind::Ldap(LdapRealm::new(source)),
            "active_directory" => RealmKind::ActiveDirectory(LdapRealm::new(source)),
            "saml" => RealmKind::Saml(SamlRealm::new(source)),
            "oidc" => RealmKind::Oidc(OidcRealm::new(source)),
            other => RealmKind::Other {
                realm_type: other.to_string(),
                attributes: Vec::new(),
            },
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            RealmKind::Native => "native",
            RealmKind::File => "file",
            RealmKind::Ldap(_) => "ldap",
            RealmKind::ActiveDirectory(_) => "active_directory",
            RealmKind::Saml(_) => "saml",
            RealmKind::Oidc(_) => "oidc",
            RealmKind::Other { realm_type, .. } => realm_type,
        }
    }
}

/// Settings shared by `ldap` and `active_directory` realms.
#[derive(Debug, Clone, PartialEq)]
pub struct LdapRealm {
    /// Active Directory only.
    pub domain_name: OptTraceable<String>,
    pub urls: OptTraceable<Vec<String>>,
    pub bind_dn: OptTraceable<String>,
    pub bind_password: OptTraceable<String>,
    pub secure_bind_password: OptTraceable<String>,
    pub user_dn_templates: OptTraceable<Vec<String>>,
    pub user_search: UserSearch,
    pub pool: PoolSettings,
    pub group_search: GroupSearch,
    pub load_balance_type: OptTraceable<String>,
    pub unmapped_groups_as_roles: OptTraceable<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserSearch {
    pub base_dn: OptTraceable<String>,
    pub filter: OptTraceable<String>,
    pub scope: OptTraceable<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    pub enabled: OptTraceable<bool>,
    pub size: OptTraceable<i64>,
    pub initial_size: OptTraceable<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSearch {
    pub base_dn: OptTraceable<String>,
    pub scope: OptTraceable<String>,
    pub filter: OptTraceable<String>,
}

impl LdapRealm {
    pub fn new(realm: &SourcePath) -> Self {
        let at = |key: &str| realm.attributes(key);
        Self {
            domain_name: OptTraceable::absent(at("domain_name")),
            urls: OptTraceable::absent(at("url")),
            bind_dn: OptTraceable::absent(at("bind_dn")),
            bind_password: OptTraceable::absent(at("bind_password")),
            secure_bind_password: OptTraceable::absent(at("secure_bind_password")),
            user_dn_templates: OptTraceable::absent(at("user_dn_templates")),
            user_search: UserSearch {
                base_dn: OptTraceable::absent(at("user_search.base_dn")),
                filter: OptTraceable::absent(at("user_search.filter")),
                scope: OptTraceable::absent(at("user_search.scope")),
            },
            pool: PoolSettings {
                enabled: OptTraceable::absent(at("user_search.pool.enabled")),
                size: OptTraceable::absent(at("user_search.pool.size")),
                initial_size: OptTraceable::absent(at("user_search.pool.initial_size")),
            },
            group_search: GroupSearch {
                base_dn: OptTraceable::absent(at("group_search.base_dn")),
                scope: OptTraceable::absent(at("group_search.scope")),
                filter: OptTraceable::absent(at("group_search.filter")),
            },
            load_balance_type: OptTraceable::absent(at("load_balance.type")),
            unmapped_groups_as_roles: OptTraceable::absent(at("unmapped_groups_as_roles")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamlRealm {
    pub idp_metadata_path: OptTraceable<String>,
    pub idp_entity_id: OptTraceable<String>,
    pub sp_entity_id: OptTraceable<String>,
    pub sp_acs: OptTraceable<String>,
    pub sp_logout: OptTraceable<String>,
    pub principal_attribute: OptTraceable<String>,
    pub groups_attribute: OptTraceable<String>,
    pub name_attribute: OptTraceable<String>,
    pub mail_attribute: OptTraceable<String>,
}

impl SamlRealm {
    pub fn new(realm: &SourcePath) -> Self {
        let at = |key: &str| OptTraceable::absent(realm.attributes(key));
        Self {
            idp_metadata_path: at("idp.metadata.path"),
            idp_entity_id: at("idp.entity_id"),
            sp_entity_id: at("sp.entity_id"),
            sp_acs: at("sp.acs"),
            sp_logout: at("sp.logout"),
            principal_attribute: at("attributes.principal"),
            groups_attribute: at("attributes.groups"),
            name_attribute: at("attributes.name"),
            mail_attribute: at("attributes.mail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OidcRealm {
    pub rp_client_id: OptTraceable<String>,
    pub rp_client_secret: OptTraceable<String>,
    pub rp_redirect_uri: OptTraceable<String>,
    pub op_issuer: OptTraceable<String>,
    pub claims_principal: OptTraceable<String>,
    pub claims_groups: OptTraceable<String>,
}

impl OidcRealm {
    pub fn new(realm: &SourcePath) -> Self {
        let at = |key: &str| OptTraceable::absent(realm.attributes(key));
        Self {
            rp_client_id: at("rp.client_id"),
            rp_client_secret: at("rp.client_secret"),
            rp_redirect_uri: at("rp.redirect_uri"),
            op_issuer: at("op.issuer"),
            claims_principal: at("claims.principal"),
            claims_groups: at("claims.groups"),
        }
    }
}
