//! Role mappings from `role_mapping.json`.

use serde_json::Value;

use crate::trace::{OptTraceable, SourcePath, Traceable};

#[derive(Debug, Clone, PartialEq)]
pub struct RoleMapping {
    pub name: String,
    pub source: SourcePath,
    pub enabled: OptTraceable<bool>,
    pub grant: RoleGrant,
    /// `None` when the mapping has no usable rule tree.
    pub rules: Option<Rule>,
    pub run_as: Vec<Traceable<String>>,
}

impl RoleMapping {
    pub fn is_enabled(&self) -> bool {
        self.enabled.get_or(true)
    }
}

/// What a mapping grants: exactly one of explicit roles or templates.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleGrant {
    Roles(Vec<Traceable<String>>),
    Templates(Vec<RoleTemplate>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    String,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleTemplate {
    pub source: SourcePath,
    pub format: TemplateFormat,
    pub template: Traceable<Value>,
}

/// A node of the mapping rule tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub source: SourcePath,
    pub kind: RuleKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    Any(Vec<Rule>),
    All(Vec<Rule>),
    Except(Box<Rule>),
    Field(FieldRule),
}

impl RuleKind {
    pub fn name(&self) -> &str {
        match self {
            RuleKind::Any(_) => "any",
            RuleKind::All(_) => "all",
            RuleKind::Except(_) => "except",
            RuleKind::Field(_) => "field",
        }
    }
}

/// `{"field": {"<name>": <value or list>}}`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field: Traceable<String>,
    pub values: Vec<Traceable<Value>>,
}
