//! Migration options.

/// Caller-controlled settings for one migration run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOptions {
    pub report_title: String,
    pub target_name: String,
    /// Treat any critical finding as fatal, not only the built-in fatal conditions.
    pub fail_on_critical: bool,
    /// Run sub-migrators on scoped threads.
    pub parallel: bool,
    /// List input documents with their SHA-256 in the report header.
    pub include_digests: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self::search_guard()
    }
}

impl MigrationOptions {
    pub fn search_guard() -> Self {
        Self {
            report_title: "sgctl migrate-security report".to_string(),
            target_name: "Search Guard".to_string(),
            fail_on_critical: false,
            parallel: false,
            include_digests: true,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.report_title = title.to_string();
        self
    }

    pub fn with_fail_on_critical(mut self, fail_on_critical: bool) -> Self {
        self.fail_on_critical = fail_on_critical;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_digests(mut self, include_digests: bool) -> Self {
        self.include_digests = include_digests;
        self
    }
}
