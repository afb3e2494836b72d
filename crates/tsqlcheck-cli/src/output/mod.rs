//! Output formatting

use miette::{IntoDiagnostic, Result};
use tsqlcheck_core::{CheckResults, Diagnostic, DiagnosticKind, Severity, SyntaxError};

use crate::args::OutputFormat;

/// Results for one input, named by its path (`<inline>` for `--inline`)
#[derive(Debug)]
pub struct FileReport {
    pub path: String,
    pub results: CheckResults,
}

/// Output formatter for check results
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print every report in the configured format
    pub fn print_reports(&self, reports: &[FileReport]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                for report in reports {
                    for line in human_lines(report) {
                        eprintln!("{}", line);
                    }
                }
            }
            OutputFormat::Json => {
                let output = serde_json::to_string_pretty(&json_report(reports)).into_diagnostic()?;
                println!("{}", output);
            }
            OutputFormat::Sarif => {
                let output = serde_json::to_string_pretty(&sarif_report(reports)).into_diagnostic()?;
                println!("{}", output);
            }
        }
        Ok(())
    }
}

/// `{path}({line}) : ERROR {code} : {message}`
pub fn format_error(path: &str, error: &SyntaxError) -> String {
    format!("{}({}) : ERROR {} : {}", path, error.line(), error.code(), error)
}

/// `{path}({line}) : WARNING {number} : {message}`
pub fn format_warning(path: &str, diagnostic: &Diagnostic) -> String {
    format!(
        "{}({}) : WARNING {} : {}",
        path,
        diagnostic.line,
        diagnostic.code(),
        diagnostic.message
    )
}

fn human_lines(report: &FileReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.results.has_errors() {
        lines.push("SQL Parse Errors:".to_string());
        lines.extend(
            report
                .results
                .errors
                .iter()
                .map(|error| format_error(&report.path, error)),
        );
    }
    if !report.results.diagnostics.is_empty() {
        lines.push("Warnings:".to_string());
        lines.extend(
            report
                .results
                .diagnostics
                .iter()
                .map(|diagnostic| format_warning(&report.path, diagnostic)),
        );
    }
    lines
}

fn json_report(reports: &[FileReport]) -> serde_json::Value {
    let files: Vec<serde_json::Value> = reports
        .iter()
        .map(|report| {
            serde_json::json!({
                "file": report.path,
                "errors": report.results.errors.iter().map(|e| serde_json::json!({
                    "line": e.line(),
                    "code": e.code(),
                    "message": e.to_string(),
                })).collect::<Vec<_>>(),
                "diagnostics": report.results.diagnostics,
            })
        })
        .collect();
    serde_json::json!({ "files": files })
}

fn sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "error",
        Severity::Serious => "warning",
        Severity::Minor | Severity::None => "note",
    }
}

fn sarif_result(
    rule_id: String,
    level: &str,
    message: String,
    path: &str,
    line: u64,
) -> serde_json::Value {
    serde_json::json!({
        "ruleId": rule_id,
        "level": level,
        "message": {
            "text": message
        },
        "locations": [{
            "physicalLocation": {
                "artifactLocation": {
                    "uri": path
                },
                "region": {
                    "startLine": line
                }
            }
        }]
    })
}

fn sarif_report(reports: &[FileReport]) -> serde_json::Value {
    let rules: Vec<serde_json::Value> = DiagnosticKind::ALL
        .iter()
        .map(|kind| {
            serde_json::json!({
                "id": kind.name(),
                "shortDescription": { "text": kind.title() },
                "fullDescription": { "text": kind.description() },
                "defaultConfiguration": { "level": sarif_level(kind.severity()) }
            })
        })
        .collect();

    let mut results = Vec::new();
    for report in reports {
        for error in &report.results.errors {
            results.push(sarif_result(
                "syntax-error".to_string(),
                "error",
                error.to_string(),
                &report.path,
                error.line(),
            ));
        }
        for diagnostic in &report.results.diagnostics {
            results.push(sarif_result(
                diagnostic.kind.name().to_string(),
                sarif_level(diagnostic.severity),
                diagnostic.message.clone(),
                &report.path,
                diagnostic.line,
            ));
        }
    }

    serde_json::json!({
        "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "tsqlcheck",
                    "version": env!("CARGO_PKG_VERSION"),
                    "rules": rules
                }
            },
            "results": results
        }]
    })
}

/// Markdown description of every warning, for `--list-warnings`
pub fn warnings_markdown() -> String {
    let mut out = String::new();
    for kind in DiagnosticKind::ALL {
        out.push_str(&format!(
            "\n### Warning {:04} : {}\n`{}`, level {} ({})\n\n{}\n",
            kind.number(),
            kind.title(),
            kind.name(),
            kind.severity().level(),
            kind.severity(),
            kind.description()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tsqlcheck_core::Analyzer;

    fn report(sql: &str) -> FileReport {
        FileReport {
            path: "<inline>".to_string(),
            results: Analyzer::new().analyze(sql),
        }
    }

    #[test]
    fn test_warning_line() {
        let report = report("\nset @undeclared = 7");
        assert_eq!(
            human_lines(&report),
            vec![
                "Warnings:".to_string(),
                "<inline>(2) : WARNING 1 : Variable @undeclared used before being declared"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_error_line() {
        let report = report("\nselect >>>");
        let lines = human_lines(&report);
        assert_eq!(lines[0], "SQL Parse Errors:");
        assert!(lines[1].starts_with("<inline>(2) : ERROR 102 : Incorrect syntax near"));
    }

    #[test]
    fn test_clean_input_prints_nothing() {
        assert!(human_lines(&report("select 1")).is_empty());
    }

    #[test]
    fn test_json_report() {
        let value = json_report(&[report("set @undeclared = 7")]);
        assert_eq!(value["files"][0]["file"], "<inline>");
        assert_eq!(value["files"][0]["diagnostics"][0]["line"], 1);
        assert_eq!(
            value["files"][0]["diagnostics"][0]["kind"],
            "UndeclaredVariableUsed"
        );
    }

    #[test]
    fn test_sarif_report() {
        let value = sarif_report(&[report("set @undeclared = 7")]);
        let run = &value["runs"][0];
        assert_eq!(
            run["tool"]["driver"]["rules"].as_array().map(|r| r.len()),
            Some(DiagnosticKind::ALL.len())
        );
        assert_eq!(run["results"][0]["ruleId"], "undeclared-variable");
        assert_eq!(run["results"][0]["level"], "error");
        assert_eq!(
            run["results"][0]["locations"][0]["physicalLocation"]["region"]["startLine"],
            1
        );
    }

    #[test]
    fn test_warnings_markdown() {
        let docs = warnings_markdown();
        assert!(docs.contains("### Warning 0001 : Undeclared Variable used"));
        assert!(docs.contains("### Warning 0011 : "));
    }
}
