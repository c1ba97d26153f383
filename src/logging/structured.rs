//! Structured logging utilities.
//!
//! Provides context-aware logging with run_id and the current document
//! included in every log message. Every log line that has a run context
//! goes through the `log_*!` macros below; the reporter, which has no run
//! context, logs through `log` directly.

use std::fmt;

/// Logging context for one migration run.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub document: Option<String>,
}

impl LogContext {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            document: None,
        }
    }

    /// Context scoped to one input document or sub-migrator.
    pub fn with_document(&self, document: &str) -> Self {
        Self {
            run_id: self.run_id.clone(),
            document: Some(document.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.document {
            Some(doc) => write!(f, "[run={}] [doc={}]", self.run_id, doc),
            None => write!(f, "[run={}]", self.run_id),
        }
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(,)?) => {
        log::info!("{} {}", $ctx, $event);
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::info!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(,)?) => {
        log::warn!("{} {}", $ctx, $event);
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::warn!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr $(,)?) => {
        log::error!("{} {}", $ctx, $event);
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::error!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr $(,)?) => {
        log::debug!("{} {}", $ctx, $event);
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::debug!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context_display() {
        let ctx = LogContext::new("run-1a2b3c4d");
        assert_eq!(format!("{}", ctx), "[run=run-1a2b3c4d]");

        let doc_ctx = ctx.with_document("role.json");
        assert_eq!(
            format!("{}", doc_ctx),
            "[run=run-1a2b3c4d] [doc=role.json]"
        );
    }

    #[test]
    fn test_macros_expand() {
        let ctx = LogContext::new("run-x").with_document("user.json");
        crate::log_info!(ctx, "USER_READ", name = "jdoe", roles = 2);
        crate::log_debug!(ctx, "USER_SKIPPED", name = "old");
    }

    #[test]
    fn test_macros_accept_event_without_fields() {
        let ctx = LogContext::new("run-x").with_document("role.json");
        crate::log_debug!(ctx, "DOCUMENT_EMPTY");
        crate::log_warn!(&ctx, "DOCUMENT_EMPTY",);
        crate::log_info!(ctx, "DOCUMENT_EMPTY");
        crate::log_error!(ctx, "DOCUMENT_EMPTY");
    }
}
