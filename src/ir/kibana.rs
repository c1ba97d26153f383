//! Kibana authentication providers.

use crate::trace::{OptTraceable, SourcePath, Traceable};

/// Security-relevant content of `kibana.yml`.
#[derive(Debug, Clone, PartialEq)]
pub struct KibanaSettings {
    pub source: SourcePath,
    pub selector_enabled: OptTraceable<bool>,
    /// Enabled providers, in document order.
    pub providers: Vec<KibanaProvider>,
}

impl KibanaSettings {
    pub fn new(source: SourcePath) -> Self {
        Self {
            selector_enabled: OptTraceable::absent(
                source.attributes("xpack.security.authc.selector.enabled"),
            ),
            source,
            providers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KibanaProvider {
    pub name: String,
    pub source: SourcePath,
    pub order: OptTraceable<i64>,
    pub enabled: OptTraceable<bool>,
    pub description: OptTraceable<String>,
    pub kind: ProviderKind,
}

impl KibanaProvider {
    pub fn is_enabled(&self) -> bool {
        self.enabled.get_or(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderKind {
    Basic,
    Token,
    Saml { realm: OptTraceable<String> },
    Oidc { realm: OptTraceable<String> },
    Anonymous,
    Other(Traceable<String>),
}

impl ProviderKind {
    pub fn type_name(&self) -> &str {
        match self {
            ProviderKind::Basic => "basic",
            ProviderKind::Token => "token",
            ProviderKind::Saml { .. } => "saml",
            ProviderKind::Oidc { .. } => "oidc",
            ProviderKind::Anonymous => "anonymous",
            ProviderKind::Other(provider_type) => provider_type.get(),
        }
    }
}
