//! Structured source locations.
//!
//! Paths stay as a list of segments and are only rendered to text when a
//! message is produced.

use std::fmt;

/// One step in a source path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Location of a value: the document it came from and the path inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourcePath {
    document: Option<String>,
    segments: Vec<Segment>,
}

impl SourcePath {
    /// A location with no document, used for values synthesized by the migrator.
    pub fn none() -> Self {
        Self::default()
    }

    /// The root of a document.
    pub fn document(name: &str) -> Self {
        Self {
            document: Some(name.to_string()),
            segments: Vec::new(),
        }
    }

    /// Child location for an object key.
    pub fn attribute(&self, name: &str) -> Self {
        let mut child = self.clone();
        child.segments.push(Segment::Key(name.to_string()));
        child
    }

    /// Child location for a dotted key path, one segment per component.
    pub fn attributes(&self, dotted: &str) -> Self {
        let mut child = self.clone();
        child.segments.extend(
            dotted
                .split('.')
                .filter(|part| !part.is_empty())
                .map(|part| Segment::Key(part.to_string())),
        );
        child
    }

    /// Child location for a list element.
    pub fn entry(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.segments.push(Segment::Index(index));
        child
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render the path inside the document, e.g. `admin.indices[0].names`.
    ///
    /// Keys containing separator characters are quoted so the rendering
    /// stays unambiguous.
    pub fn path_string(&self) -> String {
        if self.segments.is_empty() {
            return "origin".to_string();
        }

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    if needs_quoting(key) {
                        out.push('"');
                        out.push_str(&key.replace('"', "\\\""));
                        out.push('"');
                    } else {
                        out.push_str(key);
                    }
                }
                Segment::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    /// Render document and path, e.g. `role.json: admin.cluster`.
    pub fn full_path_string(&self) -> String {
        match &self.document {
            Some(document) => format!("{}: {}", document, self.path_string()),
            None => self.path_string(),
        }
    }
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty() || key.contains(['.', '[', ']', '"', ' '])
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path_string())
    }
}
