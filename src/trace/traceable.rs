//! Values paired with their source location.

use std::fmt;

use serde_json::Value;

use super::source::SourcePath;

/// A value and the place it was read from.
///
/// Created once when a value is extracted from a document and carried
/// unchanged through every later transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct Traceable<T> {
    value: T,
    source: SourcePath,
}

impl<T> Traceable<T> {
    pub fn new(value: T, source: SourcePath) -> Self {
        Self { value, source }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn source(&self) -> &SourcePath {
        &self.source
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// Transform the value, keeping the source.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Traceable<U> {
        Traceable {
            value: f(self.value),
            source: self.source,
        }
    }
}

/// A possibly absent attribute.
///
/// Unlike `Option<Traceable<T>>` this still knows where the attribute would
/// have been, so "missing" findings can cite a path.
#[derive(Debug, Clone, PartialEq)]
pub struct OptTraceable<T> {
    value: Option<T>,
    source: SourcePath,
}

impl<T> OptTraceable<T> {
    pub fn absent(source: SourcePath) -> Self {
        Self {
            value: None,
            source,
        }
    }

    pub fn present(value: T, source: SourcePath) -> Self {
        Self {
            value: Some(value),
            source,
        }
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn source(&self) -> &SourcePath {
        &self.source
    }

    pub fn set(&mut self, value: T, source: SourcePath) {
        self.value = Some(value);
        self.source = source;
    }

    pub fn to_traceable(&self) -> Option<Traceable<T>>
    where
        T: Clone,
    {
        self.value
            .as_ref()
            .map(|value| Traceable::new(value.clone(), self.source.clone()))
    }

    pub fn get_or(&self, default: T) -> T
    where
        T: Clone,
    {
        self.value.clone().unwrap_or(default)
    }
}

impl<T> From<Traceable<T>> for OptTraceable<T> {
    fn from(traceable: Traceable<T>) -> Self {
        Self {
            value: Some(traceable.value),
            source: traceable.source,
        }
    }
}

/// Values that can be shown next to their path in the report.
pub trait ReportValue {
    fn render(&self) -> String;
}

impl ReportValue for String {
    fn render(&self) -> String {
        self.clone()
    }
}

impl ReportValue for bool {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl ReportValue for i64 {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl ReportValue for Value {
    fn render(&self) -> String {
        crate::loader::values::value_to_string(self)
    }
}

impl<T: ReportValue> ReportValue for Vec<T> {
    fn render(&self) -> String {
        let items: Vec<String> = self.iter().map(ReportValue::render).collect();
        format!("[{}]", items.join(", "))
    }
}

impl<T: ReportValue> ReportValue for Traceable<T> {
    fn render(&self) -> String {
        self.value.render()
    }
}

/// Anything a finding can be attached to.
pub trait Subject {
    fn subject_source(&self) -> &SourcePath;

    fn subject_value(&self) -> Option<String> {
        None
    }
}

impl Subject for SourcePath {
    fn subject_source(&self) -> &SourcePath {
        self
    }
}

impl<T: ReportValue> Subject for Traceable<T> {
    fn subject_source(&self) -> &SourcePath {
        &self.source
    }

    fn subject_value(&self) -> Option<String> {
        Some(self.value.render())
    }
}

impl<T: ReportValue> Subject for OptTraceable<T> {
    fn subject_source(&self) -> &SourcePath {
        &self.source
    }

    fn subject_value(&self) -> Option<String> {
        self.value.as_ref().map(ReportValue::render)
    }
}

impl<T: fmt::Display> fmt::Display for Traceable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_keeps_source() {
        let source = SourcePath::document("role.json").attribute("admin");
        let traced = Traceable::new("read".to_string(), source.clone());
        let upper = traced.map(|s| s.to_uppercase());
        assert_eq!(upper.get(), "READ");
        assert_eq!(upper.source(), &source);
    }

    #[test]
    fn test_opt_traceable_absent() {
        let source = SourcePath::document("user.json").attribute("jdoe").attribute("email");
        let opt: OptTraceable<String> = OptTraceable::absent(source.clone());
        assert!(!opt.is_present());
        assert_eq!(opt.source(), &source);
        assert_eq!(opt.subject_value(), None);
        assert!(opt.to_traceable().is_none());
    }

    #[test]
    fn test_opt_traceable_set() {
        let mut opt: OptTraceable<bool> = OptTraceable::absent(SourcePath::document("a"));
        opt.set(false, SourcePath::document("a").attribute("enabled"));
        assert_eq!(opt.get(), Some(&false));
        assert_eq!(opt.get_or(true), false);
        assert_eq!(opt.source().path_string(), "enabled");
    }

    #[test]
    fn test_subject_value_rendering() {
        let list = Traceable::new(
            vec!["a".to_string(), "b".to_string()],
            SourcePath::document("doc"),
        );
        assert_eq!(list.subject_value(), Some("[a, b]".to_string()));

        let raw = Traceable::new(json!({"k": 1}), SourcePath::document("doc"));
        assert_eq!(raw.subject_value(), Some("{\"k\":1}".to_string()));
    }
}
