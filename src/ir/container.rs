//! The IR container.
//!
//! Each document slot is `None` when that input was not supplied, and
//! `Some` (possibly empty) once its reader has run. Disabled entities are
//! moved to `excluded` instead of the live set.

use crate::logging::structured::LogContext;
use crate::trace::SourcePath;

use super::kibana::KibanaSettings;
use super::realm::{ElasticsearchSettings, Realm};
use super::role::Role;
use super::role_mapping::RoleMapping;
use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Realm,
    Provider,
    User,
    RoleMapping,
}

impl EntityKind {
    pub fn as_str(&self) -> &str {
        match self {
            EntityKind::Realm => "realm",
            EntityKind::Provider => "provider",
            EntityKind::User => "user",
            EntityKind::RoleMapping => "role_mapping",
        }
    }
}

/// An entity that was read but left out of the live set.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedEntity {
    pub kind: EntityKind,
    pub name: String,
    pub source: SourcePath,
}

#[derive(Debug, Clone, Default)]
pub struct IntermediateRepresentation {
    pub elasticsearch: Option<ElasticsearchSettings>,
    pub kibana: Option<KibanaSettings>,
    pub users: Option<Vec<User>>,
    pub roles: Option<Vec<Role>>,
    pub role_mappings: Option<Vec<RoleMapping>>,
    pub excluded: Vec<ExcludedEntity>,
}

impl IntermediateRepresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(&mut self, kind: EntityKind, name: &str, source: &SourcePath, ctx: &LogContext) {
        crate::log_info!(ctx, "ENTITY_EXCLUDED", kind = kind.as_str(), name = name, reason = "disabled");
        self.excluded.push(ExcludedEntity {
            kind,
            name: name.to_string(),
            source: source.clone(),
        });
    }

    /// Add a realm to the settings, or exclude it when disabled.
    pub fn add_realm(&mut self, settings: &mut ElasticsearchSettings, realm: Realm, ctx: &LogContext) {
        if realm.is_enabled() {
            settings.realms.push(realm);
        } else {
            self.exclude(EntityKind::Realm, &realm.name, &realm.source, ctx);
        }
    }

    pub fn add_user(&mut self, user: User, ctx: &LogContext) {
        if !user.is_enabled() {
            self.exclude(EntityKind::User, &user.name, &user.source, ctx);
            return;
        }
        self.users.get_or_insert_with(Vec::new).push(user);
    }

    pub fn add_role(&mut self, role: Role) {
        let roles = self.roles.get_or_insert_with(Vec::new);
        match roles.iter_mut().find(|existing| existing.name == role.name) {
            Some(existing) => *existing = role,
            None => roles.push(role),
        }
    }

    pub fn add_role_mapping(&mut self, mapping: RoleMapping, ctx: &LogContext) {
        if !mapping.is_enabled() {
            self.exclude(EntityKind::RoleMapping, &mapping.name, &mapping.source, ctx);
            return;
        }
        self.role_mappings.get_or_insert_with(Vec::new).push(mapping);
    }

    /// Whether the roles document was read and defines `name`.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles
            .as_ref()
            .map(|roles| roles.iter().any(|role| role.name == name))
            .unwrap_or(false)
    }

    pub fn excluded_of(&self, kind: EntityKind) -> impl Iterator<Item = &ExcludedEntity> {
        self.excluded.iter().filter(move |e| e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::OptTraceable;

    fn ctx() -> LogContext {
        LogContext::new("run-test")
    }

    #[test]
    fn test_disabled_user_is_excluded() {
        let mut ir = IntermediateRepresentation::new();
        let source = SourcePath::document("user.json").attribute("old");
        let mut user = User::new("old", source.clone());
        user.enabled = OptTraceable::present(false, source.attribute("enabled"));
        ir.add_user(user, &ctx());

        assert!(ir.users.is_none());
        let excluded: Vec<_> = ir.excluded_of(EntityKind::User).collect();
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].name, "old");
    }

    #[test]
    fn test_has_role() {
        let mut ir = IntermediateRepresentation::new();
        assert!(!ir.has_role("admin"));
        ir.add_role(Role::new("admin", SourcePath::document("role.json").attribute("admin")));
        assert!(ir.has_role("admin"));
        ir.add_role(Role::new("admin", SourcePath::document("role.json").attribute("admin")));
        assert_eq!(ir.roles.as_ref().map(Vec::len), Some(1));
    }
}
