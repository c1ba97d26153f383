//! Backend authentication: realms to `sg_authc.yml` auth domains.

use lazy_static::lazy_static;
use regex::{NoExpand, Regex};

use crate::ir::{LdapRealm, Realm, RealmKind};
use crate::pipeline::context::MigrationContext;
use crate::report::MigrationReporter;
use crate::target::{
    AuthDomain, ConnectionPool, ConnectionStrategy, GroupSearch, LdapDomain, LdapIdp, Recursive, SearchFilter,
    SearchScope, SgAuthc, TargetConfig, UserSearch,
};
use crate::trace::OptTraceable;

use super::SubMigrator;

lazy_static! {
    /// The user name placeholder of X-Pack search filters, `{0}` or `{{0}}`.
    static ref USER_NAME_PLACEHOLDER: Regex = Regex::new(r"\{\{0\}\}|\{0\}").unwrap();
}

const AD_USER_FILTER: &str = "(&(objectClass=user)(sAMAccountName=${user.name}))";
const LDAP_USER_FILTER: &str = "(uid=${user.name})";

pub struct AuthMigrator;

impl SubMigrator for AuthMigrator {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn migrate(&self, context: &MigrationContext, reporter: &MigrationReporter) -> Vec<TargetConfig> {
        let ctx = context.log_context().with_document("sg_authc.yml");
        let Some(elasticsearch) = context.elasticsearch() else {
            crate::log_info!(ctx, "AUTH_SKIPPED", reason = "no_settings");
            return Vec::new();
        };

        let mut realms: Vec<&Realm> = elasticsearch.realms.iter().collect();
        realms.sort_by_key(|realm| realm.sort_order());

        let mut auth_domains = Vec::new();
        for realm in realms {
            crate::log_debug!(ctx, "REALM_MIGRATE", name = realm.name, kind = realm.type_name());
            match &realm.kind {
                RealmKind::Native | RealmKind::File => {
                    auth_domains.push(AuthDomain::InternalUsers);
                    reporter.migrated(&realm.source);
                }
                RealmKind::Ldap(ldap) => {
                    auth_domains.push(migrate_ldap(realm, ldap, false, reporter));
                    reporter.migrated(&realm.source);
                }
                RealmKind::ActiveDirectory(ldap) => {
                    auth_domains.push(migrate_ldap(realm, ldap, true, reporter));
                    reporter.migrated(&realm.source);
                }
                RealmKind::Saml(_) | RealmKind::Oidc(_) => {
                    crate::log_debug!(ctx, "REALM_DEFERRED", name = realm.name, to = "frontend_auth");
                }
                RealmKind::Other { realm_type, .. } => {
                    reporter.manual_action(
                        &realm.source,
                        format!(
                            "Realms of type '{}' cannot be migrated automatically; configure an equivalent auth domain in sg_authc.yml",
                            realm_type
                        ),
                    );
                }
            }
        }

        crate::log_info!(ctx, "AUTH_MIGRATED", auth_domains = auth_domains.len());
        if auth_domains.is_empty() {
            return Vec::new();
        }
        vec![SgAuthc { auth_domains }.into()]
    }
}

fn migrate_ldap(realm: &Realm, ldap: &LdapRealm, active_directory: bool, reporter: &MigrationReporter) -> AuthDomain {
    if ldap.pool.enabled.get() == Some(&false) {
        reporter.inconvertible(&ldap.pool.enabled, "Connection pool cannot be disabled in Search Guard");
    }
    if ldap.user_dn_templates.is_present() {
        reporter.inconvertible(
            &ldap.user_dn_templates,
            "User DN templates are not supported by Search Guard; configure user_search instead",
        );
    }
    if ldap.unmapped_groups_as_roles.get() == Some(&true) {
        reporter.problem(
            &ldap.unmapped_groups_as_roles,
            "Search Guard does not use unmapped groups as roles; add role mappings for these groups",
        );
    }

    let domain_dn = if active_directory {
        match ldap.domain_name.get() {
            Some(domain) => Some(domain_to_dn(domain)),
            None => {
                reporter.missing_parameter(&realm.source, "domain_name");
                None
            }
        }
    } else {
        None
    };

    let hosts = match (ldap.urls.get(), ldap.domain_name.get()) {
        (Some(urls), _) => urls.clone(),
        (None, Some(domain)) if active_directory => {
            let url = format!("ldap://{}:389", domain);
            reporter.default_applied(&ldap.urls, "url", &url);
            vec![url]
        }
        _ => {
            if !active_directory {
                reporter.missing_parameter(&realm.source, "url");
            }
            Vec::new()
        }
    };

    let pool = if ldap.pool.initial_size.is_present() || ldap.pool.size.is_present() {
        Some(ConnectionPool {
            min_size: ldap.pool.initial_size.get().copied(),
            max_size: ldap.pool.size.get().copied(),
        })
    } else {
        None
    };

    let idp = LdapIdp {
        hosts,
        bind_dn: ldap.bind_dn.get().cloned(),
        password: bind_password(ldap, reporter),
        connection_strategy: connection_strategy(&ldap.load_balance_type, reporter),
        connection_pool: pool,
    };

    let user_search = migrate_user_search(ldap, domain_dn.as_deref(), active_directory, reporter);
    let group_search = migrate_group_search(ldap, domain_dn.as_deref(), active_directory, reporter);

    AuthDomain::Ldap {
        ldap: LdapDomain {
            idp,
            user_search,
            group_search,
        },
    }
}

fn migrate_user_search(
    ldap: &LdapRealm,
    domain_dn: Option<&str>,
    active_directory: bool,
    reporter: &MigrationReporter,
) -> Option<UserSearch> {
    let search = &ldap.user_search;
    let base_dn = match (search.base_dn.get(), domain_dn) {
        (Some(base_dn), _) => base_dn.clone(),
        (None, Some(domain_dn)) => {
            reporter.default_applied(&search.base_dn, "user_search.base_dn", domain_dn);
            domain_dn.to_string()
        }
        // Without a base DN the realm runs in template mode.
        (None, None) => return None,
    };

    let filter = match search.filter.get() {
        Some(filter) => rewrite_user_filter(filter),
        None => {
            let default = if active_directory { AD_USER_FILTER } else { LDAP_USER_FILTER };
            reporter.default_applied(&search.filter, "user_search.filter", default);
            default.to_string()
        }
    };

    Some(UserSearch {
        base_dn: Some(base_dn),
        scope: migrate_scope(&search.scope, reporter),
        filter: Some(SearchFilter { raw: filter }),
    })
}

fn migrate_group_search(
    ldap: &LdapRealm,
    domain_dn: Option<&str>,
    active_directory: bool,
    reporter: &MigrationReporter,
) -> Option<GroupSearch> {
    let search = &ldap.group_search;
    let base_dn = match (search.base_dn.get(), domain_dn) {
        (Some(base_dn), _) => base_dn.clone(),
        (None, Some(domain_dn)) => {
            reporter.default_applied(&search.base_dn, "group_search.base_dn", domain_dn);
            domain_dn.to_string()
        }
        (None, None) => {
            reporter.manual_action(
                &search.base_dn,
                "No group search base DN is set; X-Pack falls back to the user's group attribute, configure group_search in sg_authc.yml manually",
            );
            return None;
        }
    };

    Some(GroupSearch {
        base_dn,
        scope: migrate_scope(&search.scope, reporter),
        filter: search.filter.get().map(|filter| SearchFilter {
            raw: rewrite_group_filter(filter),
        }),
        // Active Directory resolves nested groups on its own.
        recursive: active_directory.then_some(Recursive { enabled: true }),
    })
}

/// Pick the bind password. The secure setting wins when both are set.
fn bind_password(ldap: &LdapRealm, reporter: &MigrationReporter) -> Option<String> {
    let plain = non_blank(&ldap.bind_password);
    let secure = non_blank(&ldap.secure_bind_password);
    match (plain, secure) {
        (Some(_), Some(secure)) => {
            // Cite the path only; the value is a secret.
            reporter.problem(
                ldap.bind_password.source(),
                "Both bind_password and secure_bind_password are set; using secure_bind_password",
            );
            Some(secure)
        }
        (plain, secure) => secure.or(plain),
    }
}

fn non_blank(value: &OptTraceable<String>) -> Option<String> {
    value.get().filter(|s| !s.trim().is_empty()).cloned()
}

fn connection_strategy(
    load_balance: &OptTraceable<String>,
    reporter: &MigrationReporter,
) -> Option<ConnectionStrategy> {
    match load_balance.get().map(String::as_str) {
        None => None,
        Some("failover") => Some(ConnectionStrategy::Failover),
        Some("round_robin") => Some(ConnectionStrategy::RoundRobin),
        Some("dns_failover") | Some("dns_round_robin") => {
            reporter.inconvertible(
                load_balance,
                "DNS based load balancing is not supported by Search Guard; list the hosts explicitly",
            );
            None
        }
        Some(other) => {
            reporter.problem(load_balance, format!("Unknown load balancing type '{}'", other));
            None
        }
    }
}

fn migrate_scope(scope: &OptTraceable<String>, reporter: &MigrationReporter) -> Option<SearchScope> {
    match scope.get().map(String::as_str) {
        None => None,
        Some("sub_tree") => Some(SearchScope::Sub),
        Some("one_level") => Some(SearchScope::One),
        Some("base") => {
            let available: Vec<&str> = SearchScope::ALL.iter().map(SearchScope::as_str).collect();
            reporter.inconvertible(
                scope,
                format!(
                    "These other migratable search scopes DO exist in Search Guard: {}. The search scope was omitted from the output because of this.",
                    available.join(", ")
                ),
            );
            None
        }
        Some(other) => {
            reporter.problem(scope, format!("Unknown search scope '{}'", other));
            None
        }
    }
}

/// `{0}` in a user search filter is the user name.
pub fn rewrite_user_filter(filter: &str) -> String {
    USER_NAME_PLACEHOLDER.replace_all(filter, NoExpand("${user.name}")).into_owned()
}

/// `{0}` in a group search filter is the DN of the user entry.
pub fn rewrite_group_filter(filter: &str) -> String {
    USER_NAME_PLACEHOLDER.replace_all(filter, NoExpand("${dn}")).into_owned()
}

/// `example.com` becomes `DC=example,DC=com`.
fn domain_to_dn(domain: &str) -> String {
    domain
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| format!("DC={}", part))
        .collect::<Vec<_>>()
        .join(",")
}
