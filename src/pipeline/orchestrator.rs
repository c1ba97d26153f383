//! Migration run.
//!
//! Coordinates one run end to end:
//! 1. Load and read every supplied document into the IR
//! 2. Freeze the IR into a `MigrationContext`
//! 3. Run the registered sub-migrators
//! 4. Check output file names are unique
//! 5. Decide success or failure and render the report

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use chrono::{DateTime, Utc};

use crate::config::MigrationOptions;
use crate::error::{MigrationError, Result};
use crate::ir::IntermediateRepresentation;
use crate::loader::{load_document, LoadedDocument};
use crate::logging::structured::LogContext;
use crate::migrate::{
    AuthMigrator, FrontendAuthMigrator, RoleMappingsMigrator, RolesMigrator, SubMigrator, UsersMigrator,
};
use crate::readers;
use crate::report::MigrationReporter;
use crate::target::{NamedConfig, TargetConfig};

use super::context::{MigrationContext, RunContext};
use super::inputs::MigrationInputs;

type Reader = fn(&LoadedDocument, &mut IntermediateRepresentation, &MigrationReporter, &LogContext);

/// Readers in the order of `MigrationInputs::documents`.
const READERS: [Reader; 5] = [
    readers::read_elasticsearch_settings,
    readers::read_kibana_settings,
    readers::read_roles,
    readers::read_users,
    readers::read_role_mappings,
];

/// The report of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub text: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MigrationResult {
    Success {
        configs: Vec<TargetConfig>,
        report: RenderedReport,
    },
    Failure {
        report: RenderedReport,
    },
}

impl MigrationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MigrationResult::Success { .. })
    }

    pub fn report(&self) -> &RenderedReport {
        match self {
            MigrationResult::Success { report, .. } | MigrationResult::Failure { report } => report,
        }
    }

    /// Output records; empty for a failed run.
    pub fn configs(&self) -> &[TargetConfig] {
        match self {
            MigrationResult::Success { configs, .. } => configs,
            MigrationResult::Failure { .. } => &[],
        }
    }

    /// Write each record as YAML into `dir`, named by its file name.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let write_error = |path: &Path, source| MigrationError::Write {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(dir).map_err(|source| write_error(dir, source))?;

        let mut written = Vec::new();
        for config in self.configs() {
            let path = dir.join(config.file_name());
            fs::write(&path, config.to_yaml()?).map_err(|source| write_error(&path, source))?;
            written.push(path);
        }
        Ok(written)
    }
}

/// An ordered registry of sub-migrators.
pub struct Migrator {
    migrators: Vec<Box<dyn SubMigrator>>,
}

impl Migrator {
    pub fn new() -> Self {
        Self { migrators: Vec::new() }
    }

    /// The full X-Pack to Search Guard migration.
    pub fn search_guard() -> Self {
        let mut migrator = Self::new();
        migrator
            .register(AuthMigrator)
            .register(FrontendAuthMigrator)
            .register(RoleMappingsMigrator)
            .register(UsersMigrator)
            .register(RolesMigrator);
        migrator
    }

    pub fn register(&mut self, migrator: impl SubMigrator + 'static) -> &mut Self {
        self.migrators.push(Box::new(migrator));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.migrators.iter().map(|m| m.name()).collect()
    }

    pub fn run(&self, inputs: &MigrationInputs, options: &MigrationOptions) -> Result<MigrationResult> {
        let run = RunContext::new();
        let ctx = run.log_context();
        let reporter = MigrationReporter::from_options(options);
        crate::log_info!(
            ctx,
            "MIGRATION_START",
            migrators = self.names(),
            parallel = options.parallel,
        );

        if inputs.elasticsearch.is_none() {
            crate::log_error!(ctx, "MIGRATION_ABORTED", reason = "no_settings");
            reporter.generic_critical(
                "No elasticsearch.yml was supplied. Without the security settings there is nothing to migrate.",
            );
            return Ok(MigrationResult::Failure {
                report: render(&run, &reporter),
            });
        }

        let context = MigrationContext::new(read_inputs(inputs, options, &run, &reporter), ctx.clone());
        let outputs = if options.parallel {
            self.run_parallel(&context, &reporter)
        } else {
            self.migrators
                .iter()
                .map(|migrator| migrator.migrate(&context, &reporter))
                .collect()
        };

        let mut owners: HashMap<&'static str, &'static str> = HashMap::new();
        let mut configs = Vec::new();
        for (migrator, produced) in self.migrators.iter().zip(outputs) {
            for config in produced {
                if let Some(first) = owners.insert(config.file_name(), migrator.name()) {
                    return Err(MigrationError::DuplicateOutput {
                        file_name: config.file_name().to_string(),
                        first: first.to_string(),
                        second: migrator.name().to_string(),
                    });
                }
                crate::log_debug!(
                    ctx,
                    "OUTPUT_PRODUCED",
                    file = config.file_name(),
                    migrator = migrator.name(),
                );
                configs.push(config);
            }
        }

        let failed =
            reporter.has_fatal_problems() || (options.fail_on_critical && reporter.has_critical_problems());
        crate::log_info!(
            ctx,
            "MIGRATION_COMPLETE",
            success = !failed,
            outputs = configs.len(),
            findings = reporter.total_findings(),
            migrated = reporter.migrated_count(),
        );

        let report = render(&run, &reporter);
        if failed {
            Ok(MigrationResult::Failure { report })
        } else {
            Ok(MigrationResult::Success { configs, report })
        }
    }

    /// Each sub-migrator reports into its own reporter; those are merged in
    /// registration order so the report does not depend on scheduling.
    fn run_parallel(&self, context: &MigrationContext, reporter: &MigrationReporter) -> Vec<Vec<TargetConfig>> {
        let results: Vec<(Vec<TargetConfig>, MigrationReporter)> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .migrators
                .iter()
                .map(|migrator| {
                    let local = MigrationReporter::new(reporter.title(), reporter.target());
                    scope.spawn(move || (migrator.migrate(context, &local), local))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        results
            .into_iter()
            .map(|(configs, local)| {
                reporter.absorb(local);
                configs
            })
            .collect()
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::search_guard()
    }
}

/// Run the full migration with the default registry.
pub fn run_migration(inputs: &MigrationInputs, options: &MigrationOptions) -> Result<MigrationResult> {
    Migrator::search_guard().run(inputs, options)
}

fn read_inputs(
    inputs: &MigrationInputs,
    options: &MigrationOptions,
    run: &RunContext,
    reporter: &MigrationReporter,
) -> IntermediateRepresentation {
    let mut ir = IntermediateRepresentation::new();
    for ((input, format), read) in inputs.documents().into_iter().zip(READERS) {
        let Some(input) = input else {
            continue;
        };
        let ctx = run.document_context(&input.name);
        if options.include_digests {
            reporter.record_input(&input.name, input.digest());
        }
        let document = load_document(input, format, reporter, &ctx);
        read(&document, &mut ir, reporter, &ctx);
    }
    ir
}

fn render(run: &RunContext, reporter: &MigrationReporter) -> RenderedReport {
    RenderedReport {
        run_id: run.run_id.clone(),
        generated_at: run.generated_at,
        text: reporter.generate_report(),
        summary: reporter.generate_summary(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const SETTINGS: &str = "\
xpack.security.enabled: true
xpack.security.authc.realms:
  native.native1:
    order: 0
  ldap.ldap1:
    order: 1
    url: ldaps://ldap.example.com:636
    bind_dn: cn=admin,dc=example,dc=com
    user_search:
      base_dn: ou=people,dc=example,dc=com
      filter: (uid={0})
    group_search:
      base_dn: ou=groups,dc=example,dc=com
";

    const ROLES: &str = r#"{
        "logs": {"cluster": ["monitor"], "indices": [{"names": ["logs-*"], "privileges": ["read"]}]}
    }"#;

    const USERS: &str = r#"{
        "jdoe": {"username": "jdoe", "roles": ["logs"], "enabled": true, "full_name": "Jane Doe"}
    }"#;

    const MAPPINGS: &str = r#"{
        "ldap_logs": {"roles": ["logs"], "enabled": true, "rules": {"field": {"groups": "cn=logs,ou=groups,dc=example,dc=com"}}}
    }"#;

    fn full_inputs() -> MigrationInputs {
        MigrationInputs::new()
            .with_elasticsearch(SETTINGS)
            .with_roles(ROLES)
            .with_users(USERS)
            .with_role_mappings(MAPPINGS)
    }

    fn file<'a>(configs: &'a [TargetConfig], name: &str) -> Option<&'a TargetConfig> {
        configs.iter().find(|c| c.file_name() == name)
    }

    #[test]
    fn test_end_to_end_success() {
        let result = run_migration(&full_inputs(), &MigrationOptions::default()).unwrap();
        assert!(result.is_success());

        let names: Vec<&str> = result.configs().iter().map(|c| c.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "sg_authc.yml",
                "sg_frontend_authc.yml",
                "sg_roles_mapping.yml",
                "sg_internal_users.yml",
                "sg_roles.yml"
            ]
        );

        let mapping = file(result.configs(), "sg_roles_mapping.yml").unwrap().to_value().unwrap();
        assert_eq!(mapping, json!({"logs": {"backend_roles": ["cn=logs,ou=groups,dc=example,dc=com"]}}));

        let users = file(result.configs(), "sg_internal_users.yml").unwrap().to_value().unwrap();
        assert_eq!(users["jdoe"]["backend_roles"], json!(["logs"]));

        let report = result.report();
        assert!(report.run_id.starts_with("run-"));
        assert!(report.text.starts_with("# sgctl migrate-security report"));
        assert!(report.text.contains("* role.json (sha256 "));
    }

    #[test]
    fn test_missing_settings_fails() {
        let inputs = MigrationInputs::new().with_roles(ROLES);
        let result = run_migration(&inputs, &MigrationOptions::default()).unwrap();
        assert!(!result.is_success());
        assert!(result.configs().is_empty());
        assert!(result.report().summary.contains("critical"));
    }

    #[test]
    fn test_unparseable_rules_fail_the_run() {
        let inputs = MigrationInputs::new()
            .with_elasticsearch(SETTINGS)
            .with_role_mappings(r#"{"broken": {"roles": ["logs"], "rules": {"field": {}}}}"#);
        let result = run_migration(&inputs, &MigrationOptions::default()).unwrap();
        assert!(!result.is_success());
    }

    #[test]
    fn test_fail_on_critical() {
        let inputs = MigrationInputs::new().with_elasticsearch(SETTINGS).with_role_mappings(
            r#"{"strict": {"roles": ["logs"], "rules": {"all": [{"field": {"username": "a"}}, {"field": {"groups": "g"}}]}}}"#,
        );

        let lenient = run_migration(&inputs, &MigrationOptions::default()).unwrap();
        assert!(lenient.is_success());

        let strict = run_migration(&inputs, &MigrationOptions::default().with_fail_on_critical(true)).unwrap();
        assert!(!strict.is_success());
    }

    #[test]
    fn test_malformed_document_degrades_to_empty() {
        let inputs = MigrationInputs::new()
            .with_elasticsearch(SETTINGS)
            .with_users("{not json")
            .with_roles(ROLES);
        let result = run_migration(&inputs, &MigrationOptions::default()).unwrap();
        assert!(result.is_success());
        assert!(file(result.configs(), "sg_internal_users.yml").is_none());
        assert!(result.report().text.contains("Could not parse user.json as json"));
    }

    #[test]
    fn test_parallel_report_matches_sequential() {
        let options = MigrationOptions::default().with_digests(false);
        let sequential = run_migration(&full_inputs(), &options).unwrap();
        let parallel = run_migration(&full_inputs(), &options.clone().with_parallel(true)).unwrap();

        assert_eq!(sequential.configs(), parallel.configs());
        assert_eq!(sequential.report().text, parallel.report().text);
    }

    struct ClashingRoles;

    impl SubMigrator for ClashingRoles {
        fn name(&self) -> &'static str {
            "clashing_roles"
        }

        fn migrate(&self, _: &MigrationContext, _: &MigrationReporter) -> Vec<TargetConfig> {
            vec![crate::target::SgRoles::default().into()]
        }
    }

    #[test]
    fn test_duplicate_output_is_an_error() {
        let mut migrator = Migrator::search_guard();
        migrator.register(ClashingRoles);
        assert_eq!(migrator.names().last(), Some(&"clashing_roles"));

        let err = migrator.run(&full_inputs(), &MigrationOptions::default()).unwrap_err();
        match err {
            MigrationError::DuplicateOutput { file_name, first, second } => {
                assert_eq!(file_name, "sg_roles.yml");
                assert_eq!(first, "roles");
                assert_eq!(second, "clashing_roles");
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_write_to_directory() {
        let result = run_migration(&full_inputs(), &MigrationOptions::default()).unwrap();
        let dir = std::env::temp_dir().join(format!("xpack-migrate-out-{}", uuid::Uuid::new_v4()));

        let written = result.write_to(&dir).unwrap();
        assert_eq!(written.len(), 5);
        let roles = std::fs::read_to_string(dir.join("sg_roles.yml")).unwrap();
        let parsed: Value = serde_yaml::from_str(&roles).unwrap();
        assert_eq!(parsed["logs"]["cluster_permissions"], json!(["SGS_CLUSTER_MONITOR"]));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_reader_findings_reach_the_report() {
        let inputs = MigrationInputs::new()
            .with_elasticsearch(SETTINGS)
            .with_roles(r#"{"r": {"cluster": ["monitor"], "colour": "red"}}"#);
        let result = run_migration(&inputs, &MigrationOptions::default().with_digests(false)).unwrap();
        assert!(result.report().text.contains("r.colour"));
        assert!(!result.report().text.contains("Input documents"));
    }
}
