//! `kibana.yml` reader.
//!
//! Only the authentication providers and the login selector flag are
//! interpreted; the rest of the file is reported as ignored.

use serde_json::Value;

use crate::ir::{EntityKind, IntermediateRepresentation, KibanaProvider, KibanaSettings, ProviderKind};
use crate::loader::{flatten_settings, LoadedDocument};
use crate::logging::structured::LogContext;
use crate::report::MigrationReporter;
use crate::trace::{OptTraceable, SourcePath, Traceable};

use super::common::{assign, setting_bool, setting_int, setting_string};

const PROVIDERS_PREFIX: &str = "xpack.security.authc.providers.";

/// Presentation and session settings of a provider that have no effect on
/// which authentication domains exist.
const PRESENTATION_ATTRIBUTES: &[&str] = &[
    "hint",
    "icon",
    "showInSelector",
    "origin",
    "accessAgreement.message",
    "maxRedirectURLSize",
    "useRelayStateDeepLink",
];

const IGNORED_SECURITY_PREFIXES: &[&str] = &[
    "enabled",
    "encryptionKey",
    "cookieName",
    "secureCookies",
    "sameSiteCookies",
    "loginAssistanceMessage",
    "loginHelp",
    "session.",
    "audit.",
    "authc.http.",
];

/// Read `kibana.yml` into the IR.
pub fn read_kibana_settings(
    doc: &LoadedDocument,
    ir: &mut IntermediateRepresentation,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) {
    let mut settings = KibanaSettings::new(doc.source.clone());
    let flat = match &doc.root {
        Some(root) => flatten_settings(root, &doc.source),
        None => Vec::new(),
    };

    let mut providers: Vec<KibanaProvider> = Vec::new();
    for setting in &flat {
        let key = setting.key.as_str();
        let value = &setting.value;

        if key == "xpack.security.authc.selector.enabled" {
            assign(&mut settings.selector_enabled, setting_bool(value, reporter), value);
        } else if let Some(rest) = key.strip_prefix(PROVIDERS_PREFIX) {
            let mut parts = rest.splitn(3, '.');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(provider_type), Some(name), Some(attribute)) => {
                    let provider = provider_entry(&mut providers, provider_type, name, value.source());
                    apply_provider_attribute(provider, attribute, value, reporter);
                }
                _ => reporter.unknown_key(value),
            }
        } else if let Some(rest) = key.strip_prefix("xpack.security.") {
            if IGNORED_SECURITY_PREFIXES
                .iter()
                .any(|prefix| rest == prefix.trim_end_matches('.') || rest.starts_with(prefix))
            {
                reporter.ignored_key(value, "Kibana session and cookie settings are not migrated");
            } else {
                reporter.unknown_key(value);
            }
        } else {
            reporter.ignored_key(value, "not related to authentication");
        }
    }

    for provider in providers {
        if let ProviderKind::Saml { realm } | ProviderKind::Oidc { realm } = &provider.kind {
            if !realm.is_present() {
                reporter.missing_parameter(&provider.source, "realm");
            }
        }
        if !provider.order.is_present() {
            reporter.missing_parameter(&provider.source, "order");
        }

        if provider.is_enabled() {
            settings.providers.push(provider);
        } else {
            ir.exclude(EntityKind::Provider, &provider.name, &provider.source, ctx);
        }
    }

    crate::log_info!(ctx, "KIBANA_SETTINGS_READ", keys = flat.len(), providers = settings.providers.len());
    ir.kibana = Some(settings);
}

fn provider_entry<'p>(
    providers: &'p mut Vec<KibanaProvider>,
    provider_type: &str,
    name: &str,
    setting_source: &SourcePath,
) -> &'p mut KibanaProvider {
    let position = providers
        .iter()
        .position(|p| p.name == name && p.kind.type_name() == provider_type);

    let index = match position {
        Some(index) => index,
        None => {
            let root = match setting_source.document_name() {
                Some(document) => SourcePath::document(document),
                None => SourcePath::none(),
            };
            let source = root
                .attributes("xpack.security.authc.providers")
                .attribute(provider_type)
                .attribute(name);
            let realm = OptTraceable::absent(source.attribute("realm"));
            let kind = match provider_type {
                "basic" => ProviderKind::Basic,
                "token" => ProviderKind::Token,
                "saml" => ProviderKind::Saml { realm },
                "oidc" => ProviderKind::Oidc { realm },
                "anonymous" => ProviderKind::Anonymous,
                other => ProviderKind::Other(Traceable::new(other.to_string(), source.clone())),
            };
            providers.push(KibanaProvider {
                name: name.to_string(),
                order: OptTraceable::absent(source.attribute("order")),
                enabled: OptTraceable::absent(source.attribute("enabled")),
                description: OptTraceable::absent(source.attribute("description")),
                source,
                kind,
            });
            providers.len() - 1
        }
    };
    &mut providers[index]
}

fn apply_provider_attribute(
    provider: &mut KibanaProvider,
    attribute: &str,
    value: &Traceable<Value>,
    reporter: &MigrationReporter,
) {
    match (attribute, &mut provider.kind) {
        ("order", _) => assign(&mut provider.order, setting_int(value, reporter), value),
        ("enabled", _) => assign(&mut provider.enabled, setting_bool(value, reporter), value),
        ("description", _) => assign(&mut provider.description, setting_string(value, reporter), value),
        ("realm", ProviderKind::Saml { realm }) | ("realm", ProviderKind::Oidc { realm }) => {
            assign(realm, setting_string(value, reporter), value)
        }
        (attribute, ProviderKind::Anonymous) if attribute.starts_with("credentials.") => {
            reporter.ignored_key(value, "anonymous credentials are not migrated");
        }
        (attribute, _)
            if PRESENTATION_ATTRIBUTES.contains(&attribute) || attribute.starts_with("session.") =>
        {
            reporter.ignored_key(value, "login selector presentation is not migrated");
        }
        _ => reporter.unknown_key(value),
    }
}
