//! Frontend authentication: Kibana providers (or, failing that, realms) to
//! `sg_frontend_authc.yml` login methods.

use crate::ir::{EntityKind, KibanaProvider, OidcRealm, ProviderKind, Realm, RealmKind, SamlRealm};
use crate::logging::structured::LogContext;
use crate::pipeline::context::MigrationContext;
use crate::report::MigrationReporter;
use crate::target::{
    FrontendAuthDomain, MappingSource, OidcDomain, OidcIdp, OidcSettings, SamlDomain, SamlIdp, SamlSettings, SamlSp,
    SgFrontendAuthc, TargetConfig, UserMapping,
};
use crate::trace::OptTraceable;

use super::SubMigrator;

const SAML_LABEL: &str = "SAML Login";
const OIDC_LABEL: &str = "OIDC Login";
const MISSING_SAML_VALUE: &str = "SAML realm missing value - using empty string";
const MISSING_OIDC_VALUE: &str = "OIDC realm missing value - using empty string";

pub struct FrontendAuthMigrator;

impl SubMigrator for FrontendAuthMigrator {
    fn name(&self) -> &'static str {
        "frontend_auth"
    }

    fn migrate(&self, context: &MigrationContext, reporter: &MigrationReporter) -> Vec<TargetConfig> {
        let ctx = context.log_context().with_document("sg_frontend_authc.yml");

        let providers = context.kibana().map(|kibana| kibana.providers.as_slice()).unwrap_or_default();
        let domains = if !providers.is_empty() {
            let selector_enabled = context
                .kibana()
                .map(|kibana| kibana.selector_enabled.get_or(false))
                .unwrap_or(false);
            from_providers(context, providers, selector_enabled, reporter, &ctx)
        } else if let Some(elasticsearch) = context.elasticsearch() {
            crate::log_info!(ctx, "FRONTEND_FALLBACK", source = "realms");
            from_realms(&elasticsearch.realms, reporter, &ctx)
        } else {
            crate::log_info!(ctx, "FRONTEND_SKIPPED", reason = "no_input");
            Vec::new()
        };

        crate::log_info!(ctx, "FRONTEND_MIGRATED", auth_domains = domains.len());
        if domains.is_empty() {
            return Vec::new();
        }
        vec![SgFrontendAuthc::new(domains).into()]
    }
}

fn push_basic(domains: &mut Vec<FrontendAuthDomain>) {
    if !domains.contains(&FrontendAuthDomain::Basic) {
        domains.push(FrontendAuthDomain::Basic);
    }
}

/// A single provider is selected automatically when the login selector is off.
fn from_providers(
    context: &MigrationContext,
    providers: &[KibanaProvider],
    selector_enabled: bool,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) -> Vec<FrontendAuthDomain> {
    let auto_select = !selector_enabled && providers.len() == 1;

    let mut sorted: Vec<&KibanaProvider> = providers.iter().collect();
    sorted.sort_by_key(|provider| provider.order.get().copied().unwrap_or(i64::MAX));

    let mut domains = Vec::new();
    for provider in sorted {
        crate::log_debug!(ctx, "PROVIDER_MIGRATE", name = provider.name, kind = provider.kind.type_name());
        match &provider.kind {
            ProviderKind::Basic | ProviderKind::Token => {
                push_basic(&mut domains);
                reporter.migrated(&provider.source);
            }
            ProviderKind::Saml { realm } => {
                let Some(realm) = resolve_realm(context, provider, realm, "saml", reporter, ctx) else {
                    continue;
                };
                if let RealmKind::Saml(saml) = &realm.kind {
                    let label = provider.description.get().cloned().unwrap_or_else(|| SAML_LABEL.to_string());
                    domains.push(FrontendAuthDomain::Saml(migrate_saml(
                        saml,
                        &provider.name,
                        label,
                        auto_select,
                        reporter,
                    )));
                    reporter.migrated(&provider.source);
                }
            }
            ProviderKind::Oidc { realm } => {
                let Some(realm) = resolve_realm(context, provider, realm, "oidc", reporter, ctx) else {
                    continue;
                };
                if let RealmKind::Oidc(oidc) = &realm.kind {
                    let label = provider.description.get().cloned().unwrap_or_else(|| OIDC_LABEL.to_string());
                    domains.push(FrontendAuthDomain::Oidc(migrate_oidc(
                        oidc,
                        &provider.name,
                        label,
                        auto_select,
                        reporter,
                    )));
                    reporter.migrated(&provider.source);
                }
            }
            ProviderKind::Anonymous => reporter.manual_action(
                &provider.source,
                "Anonymous access must be configured for Search Guard manually",
            ),
            ProviderKind::Other(provider_type) => reporter.inconvertible(
                provider_type,
                format!("Authentication provider type '{}' has no Search Guard equivalent", provider_type.get()),
            ),
        }
    }
    domains
}

/// Find the realm a SAML or OIDC provider points to. Every way this can fail
/// is reported against the provider.
fn resolve_realm<'c>(
    context: &'c MigrationContext,
    provider: &KibanaProvider,
    realm_name: &OptTraceable<String>,
    expected_type: &str,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) -> Option<&'c Realm> {
    let Some(name) = realm_name.get() else {
        reporter.problem(
            &provider.source,
            "The provider does not name a realm and was not migrated",
        );
        return None;
    };

    let realm = context.elasticsearch().and_then(|elasticsearch| elasticsearch.realm(name));
    let message = match realm {
        Some(realm) if realm.type_name() == expected_type => return Some(realm),
        Some(realm) => format!(
            "The realm '{}' is of type '{}' but a '{}' realm is required; the provider was not migrated",
            name,
            realm.type_name(),
            expected_type
        ),
        None if context
            .excluded()
            .iter()
            .any(|excluded| excluded.kind == EntityKind::Realm && &excluded.name == name) =>
        {
            format!("The realm '{}' is disabled; the provider was not migrated", name)
        }
        None => format!(
            "The realm '{}' does not exist in elasticsearch.yml; the provider was not migrated",
            name
        ),
    };

    crate::log_warn!(ctx, "PROVIDER_SKIPPED", name = provider.name, realm = name);
    reporter.problem(realm_name, message);
    None
}

/// Without Kibana providers every realm that can log in interactively
/// becomes a login method.
fn from_realms(realms: &[Realm], reporter: &MigrationReporter, ctx: &LogContext) -> Vec<FrontendAuthDomain> {
    let mut sorted: Vec<&Realm> = realms.iter().collect();
    sorted.sort_by_key(|realm| realm.sort_order());

    let mut domains = Vec::new();
    for realm in sorted {
        match &realm.kind {
            RealmKind::Native | RealmKind::File | RealmKind::Ldap(_) | RealmKind::ActiveDirectory(_) => {
                push_basic(&mut domains)
            }
            RealmKind::Saml(saml) => {
                let domain = migrate_saml(saml, &realm.name, SAML_LABEL.to_string(), false, reporter);
                domains.push(FrontendAuthDomain::Saml(domain));
                reporter.migrated(&realm.source);
            }
            RealmKind::Oidc(oidc) => {
                let domain = migrate_oidc(oidc, &realm.name, OIDC_LABEL.to_string(), false, reporter);
                domains.push(FrontendAuthDomain::Oidc(domain));
                reporter.migrated(&realm.source);
            }
            RealmKind::Other { realm_type, .. } => {
                crate::log_debug!(ctx, "REALM_NO_LOGIN", name = realm.name, kind = realm_type);
            }
        }
    }

    if let [single] = domains.as_mut_slice() {
        set_auto_select(single);
    }
    domains
}

fn set_auto_select(domain: &mut FrontendAuthDomain) {
    match domain {
        FrontendAuthDomain::Basic => {}
        FrontendAuthDomain::Saml(saml) => saml.auto_select = true,
        FrontendAuthDomain::Oidc(oidc) => oidc.auto_select = true,
    }
}

fn required(value: &OptTraceable<String>, message: &str, reporter: &MigrationReporter) -> String {
    match value.get() {
        Some(value) => value.clone(),
        None => {
            reporter.problem(value, message);
            String::new()
        }
    }
}

fn migrate_saml(
    saml: &SamlRealm,
    id: &str,
    label: String,
    auto_select: bool,
    reporter: &MigrationReporter,
) -> SamlDomain {
    let metadata_url = required(&saml.idp_metadata_path, MISSING_SAML_VALUE, reporter);
    let idp_entity_id = required(&saml.idp_entity_id, MISSING_SAML_VALUE, reporter);
    let sp_entity_id = required(&saml.sp_entity_id, MISSING_SAML_VALUE, reporter);

    SamlDomain {
        label,
        id: id.to_string(),
        auto_select,
        kibana_url: saml.sp_acs.get().map(|acs| kibana_url_from_acs(acs)),
        saml: SamlSettings {
            idp: SamlIdp {
                metadata_url,
                entity_id: idp_entity_id,
            },
            sp: SamlSp {
                entity_id: sp_entity_id,
            },
        },
        user_mapping: UserMapping {
            user_name: saml.principal_attribute.get().map(|attribute| saml_attribute(attribute)),
            roles: saml.groups_attribute.get().map(|attribute| saml_attribute(attribute)),
        },
    }
}

/// `nameid` refers to the subject of the assertion, anything else to an
/// attribute statement.
fn saml_attribute(attribute: &str) -> MappingSource {
    if attribute == "nameid" || attribute.starts_with("nameid:") {
        MappingSource::new("saml_response.subject")
    } else {
        MappingSource::new(format!("saml_response.attributes.{}", attribute))
    }
}

fn migrate_oidc(
    oidc: &OidcRealm,
    id: &str,
    label: String,
    auto_select: bool,
    reporter: &MigrationReporter,
) -> OidcDomain {
    let client_id = required(&oidc.rp_client_id, MISSING_OIDC_VALUE, reporter);
    let client_secret = required(&oidc.rp_client_secret, MISSING_OIDC_VALUE, reporter);
    let issuer = required(&oidc.op_issuer, MISSING_OIDC_VALUE, reporter);

    OidcDomain {
        label,
        id: id.to_string(),
        auto_select,
        oidc: OidcSettings {
            client_id,
            client_secret,
            idp: OidcIdp {
                openid_configuration_url: openid_configuration_url(&issuer),
            },
        },
        user_mapping: UserMapping {
            user_name: oidc
                .claims_principal
                .get()
                .map(|claim| MappingSource::new(format!("oidc_id_token.{}", claim))),
            roles: oidc
                .claims_groups
                .get()
                .map(|claim| MappingSource::new(format!("oidc_id_token.{}", claim))),
        },
    }
}

fn openid_configuration_url(issuer: &str) -> String {
    format!("{}/.well-known/openid-configuration", issuer.trim_end_matches('/'))
}

/// Base URL of Kibana, derived from the SAML assertion consumer service URL.
///
/// `https://kibana.example.com:5601/api/security/saml/callback` becomes
/// `https://kibana.example.com:5601/`. Default ports are dropped. Anything
/// that does not look like a URL is returned unchanged.
pub fn kibana_url_from_acs(acs: &str) -> String {
    let Some((scheme, rest)) = acs.split_once("://") else {
        return acs.to_string();
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    if authority.is_empty() {
        return acs.to_string();
    }
    let authority = match authority.rsplit_once(':') {
        Some((host, "80")) | Some((host, "443")) => host,
        _ => authority,
    };
    format!("{}://{}/", scheme, authority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::fixtures::{self, Fixture};
    use crate::report::Category;
    use serde_json::{json, Value};

    fn saml_realm() -> Value {
        json!({
            "order": 2,
            "idp.metadata.path": "https://idp.example.com/metadata.xml",
            "idp.entity_id": "https://idp.example.com",
            "sp.entity_id": "https://kibana.example.com",
            "sp.acs": "https://kibana.example.com:443/api/security/saml/callback",
            "attributes.principal": "nameid:persistent",
            "attributes.groups": "groups"
        })
    }

    fn run(context: MigrationContext) -> (Vec<FrontendAuthDomain>, MigrationReporter) {
        let reporter = MigrationReporter::search_guard();
        let configs = FrontendAuthMigrator.migrate(&context, &reporter);
        let domains = match configs.as_slice() {
            [] => Vec::new(),
            [TargetConfig::FrontendAuthc(config)] => config.auth_domains().to_vec(),
            other => panic!("unexpected output {:?}", other),
        };
        (domains, reporter)
    }

    #[test]
    fn test_single_saml_provider_is_auto_selected() {
        let (domains, reporter) = run(Fixture {
            elasticsearch: Some(json!({"xpack.security.authc.realms.saml.saml1": saml_realm()})),
            kibana: Some(json!({
                "xpack.security.authc.selector.enabled": false,
                "xpack.security.authc.providers.saml.sso": {"order": 0, "realm": "saml1"}
            })),
            ..Default::default()
        }
        .context());

        assert_eq!(domains.len(), 1);
        let FrontendAuthDomain::Saml(saml) = &domains[0] else {
            panic!("expected saml domain");
        };
        assert!(saml.auto_select);
        assert_eq!(saml.id, "sso");
        assert_eq!(saml.label, "SAML Login");
        assert_eq!(saml.kibana_url.as_deref(), Some("https://kibana.example.com/"));
        assert_eq!(saml.saml.idp.metadata_url, "https://idp.example.com/metadata.xml");
        assert_eq!(
            saml.user_mapping.user_name,
            Some(MappingSource::new("saml_response.subject"))
        );
        assert_eq!(
            saml.user_mapping.roles,
            Some(MappingSource::new("saml_response.attributes.groups"))
        );
        assert_eq!(reporter.total_findings(), 0);
    }

    #[test]
    fn test_multiple_providers_are_not_auto_selected() {
        let (domains, _) = run(Fixture {
            elasticsearch: Some(json!({"xpack.security.authc.realms.saml.saml1": saml_realm()})),
            kibana: Some(json!({
                "xpack.security.authc.providers": {
                    "saml.sso": {"order": 1, "realm": "saml1", "description": "Company SSO"},
                    "basic.basic1": {"order": 0},
                    "token.token1": {"order": 2}
                }
            })),
            ..Default::default()
        }
        .context());

        assert_eq!(domains.len(), 2);
        assert_eq!(domains[0], FrontendAuthDomain::Basic);
        assert!(!domains[1].is_auto_select());
        assert_eq!(domains[1].id(), Some("sso"));
    }

    #[test]
    fn test_unresolvable_realms_are_reported() {
        let (domains, reporter) = run(Fixture {
            elasticsearch: Some(json!({
                "xpack.security.authc.realms": {
                    "native.native1": {"order": 0},
                    "saml.off": {"order": 1, "enabled": false}
                }
            })),
            kibana: Some(json!({
                "xpack.security.authc.providers": {
                    "saml.missing": {"order": 0, "realm": "nope"},
                    "saml.wrong": {"order": 1, "realm": "native1"},
                    "saml.disabled": {"order": 2, "realm": "off"},
                    "oidc.norealm": {"order": 3}
                }
            })),
            ..Default::default()
        }
        .context());

        assert!(domains.is_empty());
        let problems = reporter.findings(Category::Problem);
        assert_eq!(problems.len(), 4);
        assert!(problems[0].messages[0].contains("does not exist"));
        assert!(problems[1].messages[0].contains("of type 'native'"));
        assert!(problems[2].messages[0].contains("is disabled"));
        assert!(problems[3].messages[0].contains("does not name a realm"));
    }

    #[test]
    fn test_realm_fallback() {
        let (domains, reporter) = run(fixtures::settings(json!({
            "xpack.security.authc.realms": {
                "native.native1": {"order": 0},
                "ldap.ldap1": {"order": 1, "url": "ldap://ldap:389"},
                "oidc.oidc1": {
                    "order": 2,
                    "rp.client_id": "kibana",
                    "op.issuer": "https://op.example.com/",
                    "claims.principal": "sub"
                }
            }
        })));

        assert_eq!(domains.len(), 2);
        assert_eq!(domains[0], FrontendAuthDomain::Basic);
        let FrontendAuthDomain::Oidc(oidc) = &domains[1] else {
            panic!("expected oidc domain");
        };
        assert_eq!(oidc.label, "OIDC Login");
        assert_eq!(
            oidc.oidc.idp.openid_configuration_url,
            "https://op.example.com/.well-known/openid-configuration"
        );
        assert_eq!(oidc.oidc.client_secret, "");
        assert_eq!(
            oidc.user_mapping.user_name,
            Some(MappingSource::new("oidc_id_token.sub"))
        );

        let problems = reporter.findings(Category::Problem);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].messages[0], "OIDC realm missing value - using empty string");
    }

    #[test]
    fn test_single_saml_realm_fallback_with_missing_values() {
        let (domains, reporter) = run(fixtures::settings(json!({
            "xpack.security.authc.realms.saml.saml1.order": 0
        })));
        assert_eq!(domains.len(), 1);
        assert!(domains[0].is_auto_select());
        assert_eq!(reporter.findings(Category::Problem).len(), 3);
    }

    #[test]
    fn test_kibana_url() {
        assert_eq!(
            kibana_url_from_acs("https://kibana.example.com:5601/api/security/saml/callback"),
            "https://kibana.example.com:5601/"
        );
        assert_eq!(kibana_url_from_acs("http://kibana:80/x"), "http://kibana/");
        assert_eq!(kibana_url_from_acs("not a url"), "not a url");
    }
}
