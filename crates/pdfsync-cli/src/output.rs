//! Console output
//!
//! Every command writes through an [`OutputFormatter`]. The human formatter
//! prints marked status lines and aligned summary fields; the JSON formatter
//! keeps stdout for the one document a command produces and sends
//! diagnostics to stderr.

use pdfsync_sync::{ReportedError, RunReport};

const MARK_OK: char = '\u{2713}';
const MARK_ERROR: char = '\u{2717}';
const MARK_WARN: char = '\u{26a0}';

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Trait for formatting CLI output
pub trait OutputFormatter: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    /// One `label: value` line of a summary block
    fn field(&self, label: &str, value: &str);
    fn print_json(&self, value: &serde_json::Value);
    /// Prints the result of a sync or validate-only run
    fn run_report(&self, report: &RunReport);
}

pub fn format_duration(ms: u64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}

/// Counter lines shown after a run, in display order
pub fn summary_fields(report: &RunReport) -> Vec<(&'static str, String)> {
    let stats = &report.stats;
    let mut fields = if report.validate_only {
        vec![
            ("Valid", stats.success.to_string()),
            ("Invalid", stats.invalid.to_string()),
            ("Missing", stats.skipped.to_string()),
        ]
    } else {
        vec![
            ("Downloaded", stats.success.to_string()),
            ("Skipped", stats.skipped.to_string()),
            ("Invalid", stats.invalid.to_string()),
            ("Errors", stats.errors.to_string()),
        ]
    };
    if stats.archived > 0 || stats.archive_failures > 0 {
        fields.push(("Archived", stats.archived.to_string()));
    }
    fields
}

/// Display lines for the recorded errors, quarantine location indented below
pub fn error_lines(errors: &[ReportedError]) -> Vec<String> {
    let mut lines = Vec::with_capacity(errors.len());
    for entry in errors {
        let kind = entry.kind.map(|k| format!(" ({k})")).unwrap_or_default();
        lines.push(format!("{} [{}]{}: {}", entry.name, entry.id, kind, entry.error));
        if let Some(moved_to) = &entry.moved_to {
            lines.push(format!("    quarantined at {}", moved_to.display()));
        }
    }
    lines
}

/// Human-readable output with status marks and aligned fields
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("{MARK_OK} {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("{MARK_ERROR} Error: {message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("{MARK_WARN} Warning: {message}");
    }

    fn info(&self, message: &str) {
        println!("  {message}");
    }

    fn field(&self, label: &str, value: &str) {
        println!("  {:<12}{}", format!("{label}:"), value);
    }

    fn print_json(&self, _value: &serde_json::Value) {}

    fn run_report(&self, report: &RunReport) {
        let what = if report.validate_only { "Validation" } else { "Sync" };
        self.success(&format!(
            "{what} completed in {}",
            format_duration(report.duration_ms)
        ));
        for (label, value) in summary_fields(report) {
            self.field(label, &value);
        }

        let stats = &report.stats;
        if stats.archive_failures > 0 {
            self.warn(&format!("{} file(s) could not be archived", stats.archive_failures));
        }
        if stats.folder_failures > 0 {
            self.warn(&format!("{} folder(s) could not be listed", stats.folder_failures));
        }

        if !report.errors.is_empty() {
            println!();
            self.warn(&format!("Files with errors ({}):", report.errors.len()));
            for line in error_lines(&report.errors) {
                self.info(&line);
            }
            self.info("Use 'pdfsync reset <id>' or 'pdfsync sync --force' to retry.");
        }
    }
}

/// JSON output
///
/// Only `print_json` and `run_report` write to stdout, so a command's final
/// document is the only thing a script has to parse.
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, _message: &str) {}

    fn error(&self, message: &str) {
        eprintln!("{}", serde_json::json!({ "success": false, "error": message }));
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", serde_json::json!({ "level": "warning", "message": message }));
    }

    fn info(&self, _message: &str) {}

    fn field(&self, _label: &str, _value: &str) {}

    fn print_json(&self, value: &serde_json::Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(e) => self.error(&format!("Failed to render JSON: {e}")),
        }
    }

    fn run_report(&self, report: &RunReport) {
        match serde_json::to_value(report) {
            Ok(value) => self.print_json(&value),
            Err(e) => self.error(&format!("Failed to serialize run report: {e}")),
        }
    }
}

pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}
