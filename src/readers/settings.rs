//! `elasticsearch.yml` reader.
//!
//! The settings tree is flattened to dotted keys and routed by prefix. The
//! prefix list is ordered: the TLS prefixes must be tried before the general
//! `xpack.security.` prefix.

use serde_json::Value;

use crate::ir::{
    ElasticsearchSettings, IntermediateRepresentation, LdapRealm, OidcRealm, Realm, RealmKind,
    SamlRealm, TlsLayer, TlsSetting,
};
use crate::loader::{flatten_settings, FlatSetting, LoadedDocument};
use crate::logging::structured::LogContext;
use crate::report::MigrationReporter;
use crate::trace::{SourcePath, Traceable};

use super::common::{assign, setting_bool, setting_int, setting_string, setting_string_list};

/// Namespaces that are recognized but have nothing to do with security.
const IGNORED_NAMESPACES: &[&str] = &[
    "cluster",
    "node",
    "bootstrap",
    "network",
    "discovery",
    "action",
    "path",
    "http",
    "transport",
    "indices",
    "gateway",
    "thread_pool",
    "processors",
    "plugins",
    "repositories",
    "monitoring",
    "xpack.ml",
    "xpack.monitoring",
    "xpack.enrich",
    "xpack.watcher",
    "xpack.license",
    "xpack.ilm",
    "xpack.slm",
    "xpack.data_frame",
    "logger",
    "log4j",
    "logging",
    "ingest",
    "script",
    "search",
    "snapshot",
    "xpack.snapshot",
    "cache",
    "memory",
    "xpack.fleet",
    "xpack.transform",
    "xpack.rollup",
    "xpack.sql",
    "xpack.searchable_snapshots",
    "xpack.voting_only",
    "xpack.ccr",
    "reindex",
    "rest",
];

const KNOWN_REALM_TYPES: &[&str] = &[
    "native",
    "file",
    "ldap",
    "active_directory",
    "saml",
    "oidc",
    "pki",
    "kerberos",
    "jwt",
];

/// Whether `key` lies in one of the ignored namespaces.
pub fn is_ignored_namespace(key: &str) -> bool {
    IGNORED_NAMESPACES.iter().any(|ns| {
        key == *ns || (key.starts_with(ns) && key.as_bytes().get(ns.len()) == Some(&b'.'))
    })
}

/// Read `elasticsearch.yml` into the IR.
///
/// # Arguments
/// * `doc` - the loaded settings document
/// * `ir` - receives the settings and the enabled realms
/// * `reporter` - sink for unknown, ignored and malformed settings
/// * `ctx` - logging context
pub fn read_elasticsearch_settings(
    doc: &LoadedDocument,
    ir: &mut IntermediateRepresentation,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) {
    let mut settings = ElasticsearchSettings::new(doc.source.clone());
    let flat = match &doc.root {
        Some(root) => flatten_settings(root, &doc.source),
        None => Vec::new(),
    };

    if let Some(root) = &doc.root {
        if !root.is_object() {
            reporter.invalid_type(&doc.source, "object", crate::loader::json_type_name(root));
        }
    }

    let mut realms: Vec<Realm> = Vec::new();
    for setting in &flat {
        route_setting(setting, &mut settings, &mut realms, reporter, ctx);
    }

    for realm in realms {
        if !realm.order.is_present() {
            reporter.missing_parameter(&realm.source, "order");
        }
        crate::log_debug!(
            ctx,
            "REALM_READ",
            kind = realm.type_name(),
            name = realm.name,
            order = realm.order.get(),
            enabled = realm.is_enabled(),
        );
        ir.add_realm(&mut settings, realm, ctx);
    }

    crate::log_info!(
        ctx,
        "SETTINGS_READ",
        keys = flat.len(),
        realms = settings.realms.len(),
        tls = settings.tls.len(),
    );
    ir.elasticsearch = Some(settings);
}

fn route_setting(
    setting: &FlatSetting,
    settings: &mut ElasticsearchSettings,
    realms: &mut Vec<Realm>,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) {
    let key = setting.key.as_str();
    let value = &setting.value;

    if let Some(rest) = key.strip_prefix("xpack.security.transport.ssl.") {
        record_tls(TlsLayer::Transport, rest, value, settings, reporter);
    } else if let Some(rest) = key.strip_prefix("xpack.security.http.ssl.") {
        record_tls(TlsLayer::Http, rest, value, settings, reporter);
    } else if let Some(rest) = key.strip_prefix("xpack.security.authc.") {
        read_authc_setting(rest, value, realms, reporter, ctx);
    } else if let Some(rest) = key.strip_prefix("xpack.security.") {
        read_security_setting(rest, value, settings, reporter);
    } else if is_ignored_namespace(key) {
        reporter.ignored_key(value, "not part of the security configuration");
    } else {
        crate::log_debug!(ctx, "SETTING_UNKNOWN", key = key);
        reporter.unknown_key(value);
    }
}

fn record_tls(
    layer: TlsLayer,
    key: &str,
    value: &Traceable<Value>,
    settings: &mut ElasticsearchSettings,
    reporter: &MigrationReporter,
) {
    reporter.manual_action(
        value,
        "TLS settings are not part of the migrated files and must be configured for Search Guard by hand",
    );
    settings.tls.push(TlsSetting {
        layer,
        key: key.to_string(),
        value: value.clone(),
    });
}

fn read_security_setting(
    key: &str,
    value: &Traceable<Value>,
    settings: &mut ElasticsearchSettings,
    reporter: &MigrationReporter,
) {
    if key == "enabled" {
        assign(&mut settings.security_enabled, setting_bool(value, reporter), value);
    } else if key.starts_with("audit.") {
        reporter.manual_action(value, "Audit logging must be configured for Search Guard by hand");
    } else if key.starts_with("fips_mode.") {
        reporter.ignored_key(value, "FIPS mode is a JVM-level setting");
    } else {
        reporter.unknown_key(value);
    }
}

fn read_authc_setting(
    key: &str,
    value: &Traceable<Value>,
    realms: &mut Vec<Realm>,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) {
    if let Some(rest) = key.strip_prefix("realms.") {
        let mut parts = rest.splitn(3, '.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(realm_type), Some(name), Some(attribute)) => {
                let realm = realm_entry(realms, realm_type, name, value.source(), reporter, ctx);
                apply_realm_attribute(realm, attribute, value, reporter);
            }
            _ => reporter.unknown_key(value),
        }
    } else if key.starts_with("anonymous.") {
        reporter.manual_action(value, "Anonymous access must be configured in sg_authc.yml by hand");
    } else if ["token.", "api_key.", "password_hashing."]
        .iter()
        .any(|prefix| key.starts_with(prefix))
    {
        reporter.ignored_key(value, "handled differently by the target security plugin");
    } else {
        reporter.unknown_key(value);
    }
}

/// Find or create the realm a setting belongs to.
fn realm_entry<'r>(
    realms: &'r mut Vec<Realm>,
    realm_type: &str,
    name: &str,
    setting_source: &SourcePath,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) -> &'r mut Realm {
    let position = realms
        .iter()
        .position(|r| r.name == name && r.type_name() == realm_type);

    let index = match position {
        Some(index) => index,
        None => {
            let realm_source = realm_root(setting_source, realm_type, name);
            if !KNOWN_REALM_TYPES.contains(&realm_type) {
                crate::log_warn!(ctx, "REALM_TYPE_UNKNOWN", kind = realm_type, name = name);
                reporter.problem(&realm_source, format!("Unknown realm type '{}'", realm_type));
            }
            realms.push(Realm::new(realm_type, name, realm_source));
            realms.len() - 1
        }
    };
    &mut realms[index]
}

/// Cut a setting path back to `...realms.<type>.<name>`.
fn realm_root(setting_source: &SourcePath, realm_type: &str, name: &str) -> SourcePath {
    let mut root = match setting_source.document_name() {
        Some(document) => SourcePath::document(document),
        None => SourcePath::none(),
    };
    root = root.attributes("xpack.security.authc.realms");
    root.attribute(realm_type).attribute(name)
}

fn apply_realm_attribute(realm: &mut Realm, attribute: &str, value: &Traceable<Value>, reporter: &MigrationReporter) {
    match attribute {
        "order" => {
            assign(&mut realm.order, setting_int(value, reporter), value);
            return;
        }
        "enabled" => {
            assign(&mut realm.enabled, setting_bool(value, reporter), value);
            return;
        }
        _ => {}
    }

    let recognized = match &mut realm.kind {
        RealmKind::Native | RealmKind::File => false,
        RealmKind::Ldap(ldap) => apply_ldap_attribute(ldap, attribute, value, false, reporter),
        RealmKind::ActiveDirectory(ldap) => apply_ldap_attribute(ldap, attribute, value, true, reporter),
        RealmKind::Saml(saml) => apply_saml_attribute(saml, attribute, value, reporter),
        RealmKind::Oidc(oidc) => apply_oidc_attribute(oidc, attribute, value, reporter),
        RealmKind::Other { attributes, .. } => {
            attributes.push((attribute.to_string(), value.clone()));
            true
        }
    };

    if !recognized {
        reporter.unknown_key(value);
    }
}

fn apply_ldap_attribute(
    ldap: &mut LdapRealm,
    attribute: &str,
    value: &Traceable<Value>,
    active_directory: bool,
    reporter: &MigrationReporter,
) -> bool {
    match attribute {
        "domain_name" if active_directory => {
            assign(&mut ldap.domain_name, setting_string(value, reporter), value)
        }
        "url" => assign(&mut ldap.urls, setting_string_list(value, reporter), value),
        "bind_dn" => assign(&mut ldap.bind_dn, setting_string(value, reporter), value),
        "bind_password" => assign(&mut ldap.bind_password, setting_string(value, reporter), value),
        "secure_bind_password" => {
            assign(&mut ldap.secure_bind_password, setting_string(value, reporter), value)
        }
        "user_dn_templates" => {
            assign(&mut ldap.user_dn_templates, setting_string_list(value, reporter), value)
        }
        "user_search.base_dn" => {
            assign(&mut ldap.user_search.base_dn, setting_string(value, reporter), value)
        }
        "user_search.filter" => {
            assign(&mut ldap.user_search.filter, setting_string(value, reporter), value)
        }
        "user_search.scope" => {
            assign(&mut ldap.user_search.scope, setting_string(value, reporter), value)
        }
        "user_search.pool.enabled" => {
            assign(&mut ldap.pool.enabled, setting_bool(value, reporter), value)
        }
        "user_search.pool.size" => assign(&mut ldap.pool.size, setting_int(value, reporter), value),
        "user_search.pool.initial_size" => {
            assign(&mut ldap.pool.initial_size, setting_int(value, reporter), value)
        }
        "group_search.base_dn" => {
            assign(&mut ldap.group_search.base_dn, setting_string(value, reporter), value)
        }
        "group_search.scope" => {
            assign(&mut ldap.group_search.scope, setting_string(value, reporter), value)
        }
        "group_search.filter" => {
            assign(&mut ldap.group_search.filter, setting_string(value, reporter), value)
        }
        "load_balance.type" => {
            assign(&mut ldap.load_balance_type, setting_string(value, reporter), value)
        }
        "unmapped_groups_as_roles" => {
            assign(&mut ldap.unmapped_groups_as_roles, setting_bool(value, reporter), value)
        }
        _ => return false,
    }
    true
}

fn apply_saml_attribute(
    saml: &mut SamlRealm,
    attribute: &str,
    value: &Traceable<Value>,
    reporter: &MigrationReporter,
) -> bool {
    let target = match attribute {
        "idp.metadata.path" => &mut saml.idp_metadata_path,
        "idp.entity_id" => &mut saml.idp_entity_id,
        "sp.entity_id" => &mut saml.sp_entity_id,
        "sp.acs" => &mut saml.sp_acs,
        "sp.logout" => &mut saml.sp_logout,
        "attributes.principal" => &mut saml.principal_attribute,
        "attributes.groups" => &mut saml.groups_attribute,
        "attributes.name" => &mut saml.name_attribute,
        "attributes.mail" => &mut saml.mail_attribute,
        _ => return false,
    };
    assign(target, setting_string(value, reporter), value);
    true
}

fn apply_oidc_attribute(
    oidc: &mut OidcRealm,
    attribute: &str,
    value: &Traceable<Value>,
    reporter: &MigrationReporter,
) -> bool {
    let target = match attribute {
        "rp.client_id" => &mut oidc.rp_client_id,
        "rp.client_secret" => &mut oidc.rp_client_secret,
        "rp.redirect_uri" => &mut oidc.rp_redirect_uri,
        "op.issuer" => &mut oidc.op_issuer,
        "claims.principal" => &mut oidc.claims_principal,
        "claims.groups" => &mut oidc.claims_groups,
        _ => return false,
    };
    assign(target, setting_string(value, reporter), value);
    true
}
