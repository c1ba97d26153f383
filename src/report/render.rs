//! Report rendering.
//!
//! Output is deterministic: sections follow `Category::ALL`, documents
//! within a section follow first appearance, entries follow insertion order.

use std::fmt::Write;

use super::finding::{Category, Finding, GenericMessage, GenericSeverity};

pub fn render_report(
    title: &str,
    target: &str,
    inputs: &[(String, Option<String>)],
    migrated: usize,
    findings: &[Finding],
    generic: &[GenericMessage],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", title);

    if !inputs.is_empty() {
        out.push_str("\nInput documents:\n");
        for (name, digest) in inputs {
            match digest {
                Some(digest) => {
                    let _ = writeln!(out, "* {} (sha256 {})", name, digest);
                }
                None => {
                    let _ = writeln!(out, "* {} (unreadable)", name);
                }
            }
        }
    }

    let _ = writeln!(out, "\n{} setting(s) were migrated to {}.", migrated, target);

    for category in Category::ALL {
        let entries: Vec<&Finding> = findings.iter().filter(|f| f.category == category).collect();
        if entries.is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            "\n## {} setting(s) {}",
            entries.len(),
            category.description(target)
        );
        render_grouped(&mut out, &entries);

        if category == Category::Critical {
            render_generic(&mut out, generic, GenericSeverity::Critical, "other critical problem(s)");
        }
    }

    if !findings.iter().any(|f| f.category == Category::Critical) {
        render_generic(&mut out, generic, GenericSeverity::Critical, "other critical problem(s)");
    }
    render_generic(&mut out, generic, GenericSeverity::Problem, "other problem(s)");

    out
}

fn render_grouped(out: &mut String, entries: &[&Finding]) {
    let mut documents: Vec<Option<&str>> = Vec::new();
    for entry in entries {
        let document = entry.source.document_name();
        if !documents.contains(&document) {
            documents.push(document);
        }
    }

    for document in documents {
        let _ = writeln!(out, "\n### {}", document.unwrap_or("(generated)"));
        for entry in entries.iter().filter(|e| e.source.document_name() == document) {
            match &entry.value {
                Some(value) => {
                    let _ = writeln!(out, "* {}: {}", entry.source.path_string(), value);
                }
                None => {
                    let _ = writeln!(out, "* {}", entry.source.path_string());
                }
            }
            for message in &entry.messages {
                let _ = writeln!(out, "  * {}", message);
            }
        }
    }
}

fn render_generic(out: &mut String, generic: &[GenericMessage], severity: GenericSeverity, heading: &str) {
    let messages: Vec<&GenericMessage> = generic.iter().filter(|g| g.severity == severity).collect();
    if messages.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n## {}", heading);
    for message in messages {
        let _ = writeln!(out, "* {}", message.text);
    }
}

pub fn render_summary(
    title: &str,
    target: &str,
    findings: &[Finding],
    generic: &[GenericMessage],
) -> String {
    let mut out = format!("{} summary:", title);
    let mut any = false;

    for category in Category::ALL {
        let count = findings.iter().filter(|f| f.category == category).count();
        if count > 0 {
            any = true;
            let _ = write!(out, "\n\t* {} setting(s) {}", count, category.description(target));
        }
    }

    for (severity, label) in [
        (GenericSeverity::Critical, "other critical problem(s)"),
        (GenericSeverity::Problem, "other problem(s)"),
    ] {
        let count = generic.iter().filter(|g| g.severity == severity).count();
        if count > 0 {
            any = true;
            let _ = write!(out, "\n\t* {} {}", count, label);
        }
    }

    if !any {
        out.push_str("\n\tNo issues were found.");
    }
    out
}
