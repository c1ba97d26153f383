//! The report sink.
//!
//! One reporter is created per run and passed by reference to every reader
//! and sub-migrator. State sits behind a mutex so sub-migrators may append
//! from several threads.

use parking_lot::Mutex;

use crate::config::MigrationOptions;
use crate::trace::{SourcePath, Subject};

use super::finding::{Category, Finding, GenericMessage, GenericSeverity};
use super::render;

#[derive(Debug, Default)]
struct ReportState {
    findings: Vec<Finding>,
    generic: Vec<GenericMessage>,
    inputs: Vec<(String, Option<String>)>,
    migrated: usize,
}

/// Accumulates findings for one migration run.
#[derive(Debug)]
pub struct MigrationReporter {
    title: String,
    target: String,
    state: Mutex<ReportState>,
}

impl MigrationReporter {
    pub fn new(title: &str, target: &str) -> Self {
        Self {
            title: title.to_string(),
            target: target.to_string(),
            state: Mutex::new(ReportState::default()),
        }
    }

    pub fn search_guard() -> Self {
        Self::new("sgctl migrate-security report", "Search Guard")
    }

    pub fn from_options(options: &MigrationOptions) -> Self {
        Self::new(&options.report_title, &options.target_name)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Record a finding. Messages for the same source and category are
    /// appended to one entry.
    pub fn add<S: Subject + ?Sized>(&self, category: Category, subject: &S, message: impl Into<String>) {
        self.push(category, subject, message.into(), false);
    }

    fn push<S: Subject + ?Sized>(&self, category: Category, subject: &S, message: String, fatal: bool) {
        let source = subject.subject_source();
        log::debug!(
            "REPORT_FINDING category={} path={} fatal={}",
            category.as_str(),
            source,
            fatal
        );

        let mut state = self.state.lock();
        if let Some(existing) = state
            .findings
            .iter_mut()
            .find(|f| f.category == category && &f.source == source)
        {
            existing.messages.push(message);
            existing.fatal |= fatal;
            if existing.value.is_none() {
                existing.value = subject.subject_value();
            }
            return;
        }

        state.findings.push(Finding {
            category,
            source: source.clone(),
            value: subject.subject_value(),
            messages: vec![message],
            fatal,
        });
    }

    pub fn problem<S: Subject + ?Sized>(&self, subject: &S, message: impl Into<String>) {
        self.add(Category::Problem, subject, message);
    }

    pub fn inconvertible<S: Subject + ?Sized>(&self, subject: &S, message: impl Into<String>) {
        self.add(Category::Inconvertible, subject, message);
    }

    pub fn critical<S: Subject + ?Sized>(&self, subject: &S, message: impl Into<String>) {
        self.add(Category::Critical, subject, message);
    }

    /// A critical finding that also fails the run.
    pub fn fatal<S: Subject + ?Sized>(&self, subject: &S, message: impl Into<String>) {
        self.push(Category::Critical, subject, message.into(), true);
    }

    pub fn manual_action<S: Subject + ?Sized>(&self, subject: &S, message: impl Into<String>) {
        self.add(Category::ManualAction, subject, message);
    }

    pub fn unknown_key<S: Subject + ?Sized>(&self, subject: &S) {
        let key = last_key(subject.subject_source());
        self.add(
            Category::UnknownKey,
            subject,
            format!("Encountered unknown key '{}'", key),
        );
    }

    pub fn invalid_type<S: Subject + ?Sized>(&self, subject: &S, expected: &str, found: &str) {
        self.add(
            Category::InvalidType,
            subject,
            format!("Expected type '{}', but found '{}'", expected, found),
        );
    }

    pub fn missing_parameter<S: Subject + ?Sized>(&self, subject: &S, parameter: &str) {
        self.add(
            Category::MissingParameter,
            subject,
            format!("Missing required parameter '{}'", parameter),
        );
    }

    pub fn ignored_key<S: Subject + ?Sized>(&self, subject: &S, reason: &str) {
        let key = last_key(subject.subject_source());
        self.add(
            Category::IgnoredKey,
            subject,
            format!("Key '{}' is ignored for migration: {}", key, reason),
        );
    }

    /// Note that a field was absent and a default was used in its place.
    pub fn default_applied<S: Subject + ?Sized>(&self, subject: &S, field: &str, default: &str) {
        self.add(
            Category::Problem,
            subject,
            format!("'{}' is not set; using the default '{}'", field, default),
        );
    }

    /// A message with no specific source.
    pub fn generic(&self, message: impl Into<String>) {
        self.push_generic(GenericSeverity::Problem, message.into());
    }

    pub fn generic_critical(&self, message: impl Into<String>) {
        self.push_generic(GenericSeverity::Critical, message.into());
    }

    fn push_generic(&self, severity: GenericSeverity, text: String) {
        log::debug!("REPORT_GENERIC severity={:?} text={}", severity, text);
        self.state.lock().generic.push(GenericMessage { severity, text });
    }

    /// Count a setting or entity that converted cleanly.
    pub fn migrated<S: Subject + ?Sized>(&self, subject: &S) {
        log::trace!("REPORT_MIGRATED path={}", subject.subject_source());
        self.state.lock().migrated += 1;
    }

    /// Append everything another reporter collected, as if it had been
    /// reported here in the same order.
    pub fn absorb(&self, other: MigrationReporter) {
        let other = other.state.into_inner();
        let mut state = self.state.lock();
        for finding in other.findings {
            match state
                .findings
                .iter_mut()
                .find(|f| f.category == finding.category && f.source == finding.source)
            {
                Some(existing) => {
                    existing.messages.extend(finding.messages);
                    existing.fatal |= finding.fatal;
                    if existing.value.is_none() {
                        existing.value = finding.value;
                    }
                }
                None => state.findings.push(finding),
            }
        }
        state.generic.extend(other.generic);
        state.inputs.extend(other.inputs);
        state.migrated += other.migrated;
    }

    /// Remember an input document for the report header.
    pub fn record_input(&self, name: &str, digest: Option<String>) {
        self.state.lock().inputs.push((name.to_string(), digest));
    }

    pub fn findings(&self, category: Category) -> Vec<Finding> {
        self.state
            .lock()
            .findings
            .iter()
            .filter(|f| f.category == category)
            .cloned()
            .collect()
    }

    pub fn all_findings(&self) -> Vec<Finding> {
        self.state.lock().findings.clone()
    }

    pub fn generic_messages(&self) -> Vec<GenericMessage> {
        self.state.lock().generic.clone()
    }

    /// Findings whose source lies in the given document.
    pub fn findings_for_document(&self, document: &str) -> Vec<Finding> {
        self.state
            .lock()
            .findings
            .iter()
            .filter(|f| f.source.document_name() == Some(document))
            .cloned()
            .collect()
    }

    pub fn total_findings(&self) -> usize {
        let state = self.state.lock();
        state.findings.len() + state.generic.len()
    }

    pub fn migrated_count(&self) -> usize {
        self.state.lock().migrated
    }

    pub fn has_critical_problems(&self) -> bool {
        let state = self.state.lock();
        state.findings.iter().any(|f| f.category == Category::Critical)
            || state
                .generic
                .iter()
                .any(|g| g.severity == GenericSeverity::Critical)
    }

    pub fn has_fatal_problems(&self) -> bool {
        self.state.lock().findings.iter().any(|f| f.fatal)
    }

    pub fn has_inconvertible(&self) -> bool {
        self.state
            .lock()
            .findings
            .iter()
            .any(|f| f.category == Category::Inconvertible)
    }

    /// Render the full report.
    pub fn generate_report(&self) -> String {
        let state = self.state.lock();
        render::render_report(
            &self.title,
            &self.target,
            &state.inputs,
            state.migrated,
            &state.findings,
            &state.generic,
        )
    }

    /// Render the short summary.
    pub fn generate_summary(&self) -> String {
        let state = self.state.lock();
        render::render_summary(&self.title, &self.target, &state.findings, &state.generic)
    }
}

fn last_key(source: &SourcePath) -> String {
    source
        .segments()
        .iter()
        .rev()
        .find_map(|segment| match segment {
            crate::trace::Segment::Key(key) => Some(key.clone()),
            crate::trace::Segment::Index(_) => None,
        })
        .unwrap_or_else(|| "origin".to_string())
}
