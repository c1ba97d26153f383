//! Input documents and parsing.
//!
//! A document that cannot be read or parsed is reported against its origin
//! and treated as empty. Loading never aborts the run.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::logging::structured::LogContext;
use crate::report::MigrationReporter;
use crate::trace::SourcePath;

/// Syntax of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentFormat::Json => "json",
            DocumentFormat::Yaml => "yaml",
        }
    }
}

/// Raw content of an input, or the reason it could not be read.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentContent {
    Text(String),
    Unreadable(String),
}

/// A legacy input document as handed to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDocument {
    pub name: String,
    pub content: DocumentContent,
}

impl InputDocument {
    pub fn from_text(name: &str, text: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            content: DocumentContent::Text(text.into()),
        }
    }

    /// Read a document from disk under the given name.
    ///
    /// Read failures are kept in the document, not returned.
    pub fn read(name: &str, path: &Path) -> Self {
        let content = match read_text(path) {
            Ok(text) => DocumentContent::Text(text),
            Err(err) => DocumentContent::Unreadable(format!("{:#}", err)),
        };
        Self {
            name: name.to_string(),
            content,
        }
    }

    /// SHA-256 of the document text, hex encoded.
    pub fn digest(&self) -> Option<String> {
        match &self.content {
            DocumentContent::Text(text) => {
                let mut hasher = Sha256::new();
                hasher.update(text.as_bytes());
                Some(hex::encode(hasher.finalize()))
            }
            DocumentContent::Unreadable(_) => None,
        }
    }
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
}

/// A parsed document. `root` is `None` when the document is empty or was
/// degraded after a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub source: SourcePath,
    pub root: Option<Value>,
}

impl LoadedDocument {
    pub fn empty(name: &str) -> Self {
        Self {
            source: SourcePath::document(name),
            root: None,
        }
    }

    pub fn name(&self) -> &str {
        self.source.document_name().unwrap_or("")
    }
}

/// Parse an input document.
///
/// # Arguments
/// * `input` - the raw document
/// * `format` - JSON or YAML
/// * `reporter` - sink for read and parse failures
/// * `ctx` - logging context
///
/// # Returns
/// The parsed tree, or an empty document when the input was blank,
/// unreadable or malformed.
pub fn load_document(
    input: &InputDocument,
    format: DocumentFormat,
    reporter: &MigrationReporter,
    ctx: &LogContext,
) -> LoadedDocument {
    let source = SourcePath::document(&input.name);

    let text = match &input.content {
        DocumentContent::Text(text) => text,
        DocumentContent::Unreadable(reason) => {
            crate::log_warn!(ctx, "DOCUMENT_UNREADABLE", error = reason);
            reporter.problem(&source, reason.clone());
            return LoadedDocument::empty(&input.name);
        }
    };

    if text.trim().is_empty() {
        crate::log_debug!(ctx, "DOCUMENT_EMPTY");
        return LoadedDocument::empty(&input.name);
    }

    let parsed: Result<Value, String> = match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
    };

    match parsed {
        Ok(Value::Null) => LoadedDocument::empty(&input.name),
        Ok(root) => {
            crate::log_debug!(ctx, "DOCUMENT_PARSED", format = format.as_str());
            LoadedDocument {
                source,
                root: Some(root),
            }
        }
        Err(err) => {
            crate::log_warn!(ctx, "DOCUMENT_PARSE_FAILED", format = format.as_str(), error = err);
            reporter.problem(
                &source,
                format!("Could not parse {} as {}: {}", input.name, format.as_str(), err),
            );
            LoadedDocument::empty(&input.name)
        }
    }
}
