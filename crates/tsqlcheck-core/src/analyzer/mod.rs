//! SQL analyzer module

mod symbols;
mod visitor;

use serde::Serialize;

use crate::dialect::SqlVersion;
use crate::error::{filter, Diagnostic, DiagnosticKind, Severity, SyntaxError};
use crate::syntax::{self, Script};

pub use symbols::{Symbol, SymbolTable};
pub use visitor::CheckVisitor;

/// Syntax errors and diagnostics for one input
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResults {
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<SyntaxError>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckResults {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.diagnostics.is_empty()
    }
}

fn serialize_errors<S: serde::Serializer>(
    errors: &[SyntaxError],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;

    #[derive(Serialize)]
    struct Error {
        line: u64,
        code: u32,
        message: String,
    }

    let mut seq = serializer.serialize_seq(Some(errors.len()))?;
    for error in errors {
        seq.serialize_element(&Error {
            line: error.line(),
            code: error.code(),
            message: error.to_string(),
        })?;
    }
    seq.end()
}

/// SQL Analyzer - checks T-SQL scripts for variable and type misuse
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    version: SqlVersion,
    threshold: Severity,
    disabled: Vec<DiagnosticKind>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(version: SqlVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Report only diagnostics at least as severe as `threshold`
    pub fn with_threshold(mut self, threshold: Severity) -> Self {
        self.threshold = threshold;
        self
    }

    /// Never report `kind`
    pub fn disable(mut self, kind: DiagnosticKind) -> Self {
        if !self.disabled.contains(&kind) {
            self.disabled.push(kind);
        }
        self
    }

    pub fn version(&self) -> SqlVersion {
        self.version
    }

    /// Parse and check `sql`
    pub fn analyze(&self, sql: &str) -> CheckResults {
        let parsed = syntax::parse(sql, self.version);
        tracing::debug!(
            batches = parsed.script.batches.len(),
            errors = parsed.errors.len(),
            version = %self.version,
            "parsed script"
        );

        CheckResults {
            errors: parsed.errors,
            diagnostics: self.analyze_script(&parsed.script),
        }
    }

    /// Check an already parsed script, applying the threshold and disabled kinds
    pub fn analyze_script(&self, script: &Script) -> Vec<Diagnostic> {
        let mut visitor = CheckVisitor::new();
        visitor.visit_script(script);
        let diagnostics = visitor.into_diagnostics();
        let total = diagnostics.len();

        let diagnostics: Vec<Diagnostic> = filter(diagnostics, self.threshold)
            .into_iter()
            .filter(|d| !self.disabled.contains(&d.kind))
            .collect();
        tracing::debug!(total, reported = diagnostics.len(), "checked script");
        diagnostics
    }
}
