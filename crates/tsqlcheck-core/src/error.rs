//! Error and diagnostic types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dialect::SqlVersion;

/// Diagnostic severity level
///
/// Ordered from "report nothing" to "report everything": a threshold keeps every
/// diagnostic whose kind has a severity less than or equal to it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None = 0,
    Critical = 1,
    #[default]
    Serious = 2,
    Minor = 3,
}

impl Severity {
    /// Threshold that keeps every diagnostic
    pub const ALL: Severity = Severity::Minor;

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Severity::None),
            1 => Some(Severity::Critical),
            2 => Some(Severity::Serious),
            3 => Some(Severity::Minor),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "none"),
            Severity::Critical => write!(f, "critical"),
            Severity::Serious => write!(f, "serious"),
            Severity::Minor => write!(f, "minor"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(level) = s.trim().parse::<u8>() {
            return Severity::from_level(level)
                .ok_or_else(|| format!("Invalid Warning Level '{}'", s));
        }
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Severity::None),
            "critical" => Ok(Severity::Critical),
            "serious" => Ok(Severity::Serious),
            "minor" | "all" => Ok(Severity::Minor),
            _ => Err(format!("Invalid Warning Level '{}'", s)),
        }
    }
}

/// A finding reported against a line of the analyzed script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// Line number (1-indexed)
    pub line: u64,
    pub message: String,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, line: u64, message: String) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            line,
            message,
        }
    }

    pub fn undeclared_variable(line: u64, name: &str) -> Self {
        Self::new(
            DiagnosticKind::UndeclaredVariableUsed,
            line,
            format!("Variable {} used before being declared", name),
        )
    }

    pub fn unused_variable(line: u64, name: &str) -> Self {
        Self::new(
            DiagnosticKind::UnusedVariableDeclared,
            line,
            format!("Variable {} declared but never used", name),
        )
    }

    pub fn procedure_without_nocount(line: u64, procedure: &str) -> Self {
        Self::new(
            DiagnosticKind::ProcedureWithoutNoCount,
            line,
            format!("Procedure {} does not SET NOCOUNT ON", procedure),
        )
    }

    pub fn procedure_with_sp_prefix(line: u64, procedure: &str) -> Self {
        Self::new(
            DiagnosticKind::ProcedureWithSPPrefix,
            line,
            format!(
                "Procedure {} should not be named with the prefix sp_",
                procedure
            ),
        )
    }

    pub fn implicit_length(line: u64, name: &str) -> Self {
        Self::new(
            DiagnosticKind::CharVariableWithImplicitLength,
            line,
            format!("Variable {} declared without an explicit length", name),
        )
    }

    pub fn string_truncated(line: u64, name: &str, target: u64, source: u64) -> Self {
        Self::new(
            DiagnosticKind::StringTruncated,
            line,
            format!(
                "Variable {} has length {} and is assigned a value with length up to {}, which might be truncated",
                name,
                display_length(target),
                display_length(source)
            ),
        )
    }

    pub fn string_converted(line: u64, name: &str) -> Self {
        Self::new(
            DiagnosticKind::StringConverted,
            line,
            format!(
                "Variable {} is a narrow (non-unicode) string and is assigned a unicode value, which might be converted lossily",
                name
            ),
        )
    }

    pub fn implicit_conversion(line: u64, name: &str, target_type: &str, source_type: &str) -> Self {
        Self::new(
            DiagnosticKind::ImplicitConversion,
            line,
            format!(
                "Variable {} has type {} and is assigned a value of type {}, which will be implicitly converted",
                name, target_type, source_type
            ),
        )
    }

    pub fn convert_without_length(line: u64, operation: &str, type_name: &str) -> Self {
        Self::new(
            DiagnosticKind::ConvertToVarCharOfUnspecifiedLength,
            line,
            format!("{} to {} without specifying a length", operation, type_name),
        )
    }

    pub fn convert_to_too_short_string(line: u64, name: &str, target: u64, source: u64) -> Self {
        Self::new(
            DiagnosticKind::ConvertToTooShortString,
            line,
            format!(
                "Variable {} has length {} and is assigned a value which, converted to a string, may have length up to {}",
                name,
                display_length(target),
                display_length(source)
            ),
        )
    }

    pub fn numeric_overflow(line: u64, name: &str, target_type: &str, source_type: &str) -> Self {
        Self::new(
            DiagnosticKind::NumericOverflow,
            line,
            format!(
                "Variable {} has type {} and is assigned a value of type {}, which might overflow",
                name, target_type, source_type
            ),
        )
    }

    /// Stable warning number (e.g. 6 for a truncated string)
    pub fn code(&self) -> u32 {
        self.kind.number()
    }
}

fn display_length(length: u64) -> String {
    if length == u64::MAX {
        "max".to_string()
    } else {
        length.to_string()
    }
}

/// Drop every diagnostic less severe than `threshold`.
///
/// `Severity::None` drops everything, `Severity::ALL` keeps everything.
pub fn filter(diagnostics: Vec<Diagnostic>, threshold: Severity) -> Vec<Diagnostic> {
    diagnostics
        .into_iter()
        .filter(|d| d.kind.severity() != Severity::None && d.kind.severity() <= threshold)
        .collect()
}

/// Types of diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// 1: Variable referenced without a declaration in the batch
    UndeclaredVariableUsed,
    /// 2: Variable or parameter declared and never referenced
    UnusedVariableDeclared,
    /// 3: Stored procedure never runs SET NOCOUNT ON
    ProcedureWithoutNoCount,
    /// 4: Stored procedure named with the reserved sp_ prefix
    ProcedureWithSPPrefix,
    /// 5: Character variable declared without a length
    CharVariableWithImplicitLength,
    /// 6: String assignment that may truncate
    StringTruncated,
    /// 7: Unicode value assigned to a narrow string
    StringConverted,
    /// 8: Assignment relying on a lossy implicit conversion
    ImplicitConversion,
    /// 9: CAST/CONVERT to a character type without a length
    ConvertToVarCharOfUnspecifiedLength,
    /// 10: Number converted into a string too short to hold it
    ConvertToTooShortString,
    /// 11: Assignment from a wider to a narrower numeric type
    NumericOverflow,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 11] = [
        DiagnosticKind::UndeclaredVariableUsed,
        DiagnosticKind::UnusedVariableDeclared,
        DiagnosticKind::ProcedureWithoutNoCount,
        DiagnosticKind::ProcedureWithSPPrefix,
        DiagnosticKind::CharVariableWithImplicitLength,
        DiagnosticKind::StringTruncated,
        DiagnosticKind::StringConverted,
        DiagnosticKind::ImplicitConversion,
        DiagnosticKind::ConvertToVarCharOfUnspecifiedLength,
        DiagnosticKind::ConvertToTooShortString,
        DiagnosticKind::NumericOverflow,
    ];

    pub fn number(&self) -> u32 {
        match self {
            DiagnosticKind::UndeclaredVariableUsed => 1,
            DiagnosticKind::UnusedVariableDeclared => 2,
            DiagnosticKind::ProcedureWithoutNoCount => 3,
            DiagnosticKind::ProcedureWithSPPrefix => 4,
            DiagnosticKind::CharVariableWithImplicitLength => 5,
            DiagnosticKind::StringTruncated => 6,
            DiagnosticKind::StringConverted => 7,
            DiagnosticKind::ImplicitConversion => 8,
            DiagnosticKind::ConvertToVarCharOfUnspecifiedLength => 9,
            DiagnosticKind::ConvertToTooShortString => 10,
            DiagnosticKind::NumericOverflow => 11,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::UndeclaredVariableUsed => Severity::Critical,
            DiagnosticKind::UnusedVariableDeclared | DiagnosticKind::ProcedureWithoutNoCount => {
                Severity::Minor
            }
            DiagnosticKind::ProcedureWithSPPrefix
            | DiagnosticKind::CharVariableWithImplicitLength
            | DiagnosticKind::StringTruncated
            | DiagnosticKind::StringConverted
            | DiagnosticKind::ImplicitConversion
            | DiagnosticKind::ConvertToVarCharOfUnspecifiedLength
            | DiagnosticKind::ConvertToTooShortString
            | DiagnosticKind::NumericOverflow => Severity::Serious,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::UndeclaredVariableUsed => "undeclared-variable",
            DiagnosticKind::UnusedVariableDeclared => "unused-variable",
            DiagnosticKind::ProcedureWithoutNoCount => "missing-nocount",
            DiagnosticKind::ProcedureWithSPPrefix => "sp-prefix",
            DiagnosticKind::CharVariableWithImplicitLength => "implicit-length",
            DiagnosticKind::StringTruncated => "string-truncated",
            DiagnosticKind::StringConverted => "unicode-narrowing",
            DiagnosticKind::ImplicitConversion => "implicit-conversion",
            DiagnosticKind::ConvertToVarCharOfUnspecifiedLength => "convert-without-length",
            DiagnosticKind::ConvertToTooShortString => "convert-to-short-string",
            DiagnosticKind::NumericOverflow => "numeric-overflow",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DiagnosticKind::UndeclaredVariableUsed => "Undeclared Variable used",
            DiagnosticKind::UnusedVariableDeclared => "Unused Variable declared",
            DiagnosticKind::ProcedureWithoutNoCount => "Procedure without SET NOCOUNT ON",
            DiagnosticKind::ProcedureWithSPPrefix => "Procedure name begins with sp_",
            DiagnosticKind::CharVariableWithImplicitLength => {
                "Fixed-length or Variable-length variable declared without explicit length"
            }
            DiagnosticKind::StringTruncated => {
                "Fixed-length or variable-length variable assigned a value greater than it can hold"
            }
            DiagnosticKind::StringConverted => "Unicode string assigned to a narrow string",
            DiagnosticKind::ImplicitConversion => "Suspicious implicit conversion",
            DiagnosticKind::ConvertToVarCharOfUnspecifiedLength => {
                "CAST or CONVERT to a string type without a length"
            }
            DiagnosticKind::ConvertToTooShortString => {
                "Value converted to a string too short to hold it"
            }
            DiagnosticKind::NumericOverflow => "Numeric value assigned to a narrower type",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiagnosticKind::UndeclaredVariableUsed => {
                "A variable which was not declared was referenced or set. Declare it before use, for example 'DECLARE @variable AS INT'."
            }
            DiagnosticKind::UnusedVariableDeclared => {
                "A variable or parameter was declared, but never referenced. It could be removed without affecting the procedure's logic, or this could indicate a typo or logical error."
            }
            DiagnosticKind::ProcedureWithoutNoCount => {
                "Performance for stored procedures can be increased with the SET NOCOUNT ON option. Some SQL tools require the rowcount to be returned; if you use one of those, suppress this warning."
            }
            DiagnosticKind::ProcedureWithSPPrefix => {
                "sp_ is a reserved prefix in SQL Server. Even a procedure which does not clash with any system procedure incurs a lookup penalty when using this prefix. Rename the procedure."
            }
            DiagnosticKind::CharVariableWithImplicitLength => {
                "char, varchar, nchar and nvarchar have short implicit lengths. To reduce the risk of truncating data, declare the length you want explicitly, eg char(1) instead of char."
            }
            DiagnosticKind::StringTruncated => {
                "A variable was assigned a string which may be too large for it to hold. The string will be silently truncated."
            }
            DiagnosticKind::StringConverted => {
                "A unicode (nchar/nvarchar) value was assigned to a char or varchar variable. Characters outside the variable's code page will be replaced."
            }
            DiagnosticKind::ImplicitConversion => {
                "A value is implicitly converted to a type it may not convert cleanly to. Use an explicit CAST or CONVERT, or change the variable's type."
            }
            DiagnosticKind::ConvertToVarCharOfUnspecifiedLength => {
                "CAST and CONVERT to char, varchar, nchar or nvarchar without a length use a default length of 30, which silently truncates longer values."
            }
            DiagnosticKind::ConvertToTooShortString => {
                "A numeric value is assigned to a string variable which cannot hold every value of the numeric type once rendered as text."
            }
            DiagnosticKind::NumericOverflow => {
                "A value of a wider numeric type is assigned to a narrower one. Values outside the narrower range raise an arithmetic overflow error at runtime."
            }
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DiagnosticKind {
    type Err = String;

    /// Accepts either the warning number ("6") or its name ("string-truncated")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let found = match trimmed.parse::<u32>() {
            Ok(number) => DiagnosticKind::ALL
                .iter()
                .find(|kind| kind.number() == number),
            Err(_) => DiagnosticKind::ALL
                .iter()
                .find(|kind| kind.name().eq_ignore_ascii_case(trimmed)),
        };
        found
            .copied()
            .ok_or_else(|| format!("Unknown warning '{}'", s))
    }
}

/// Errors produced while turning source text into a syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
pub enum SyntaxError {
    #[error("{message}")]
    #[diagnostic(code(tsqlcheck::tokenize))]
    Tokenize { line: u64, message: String },

    #[error("Incorrect syntax near '{near}'")]
    #[diagnostic(code(tsqlcheck::syntax))]
    Unexpected { line: u64, near: String },

    #[error("Incorrect syntax near '{found}', expected {expected}")]
    #[diagnostic(code(tsqlcheck::syntax))]
    Expected {
        line: u64,
        expected: String,
        found: String,
    },

    #[error("{feature} is not supported by SQL Server {target} (requires {required} or later)")]
    #[diagnostic(code(tsqlcheck::version))]
    Unsupported {
        line: u64,
        feature: String,
        required: SqlVersion,
        target: SqlVersion,
    },

    #[error("Some part of your SQL statement is nested too deeply")]
    #[diagnostic(code(tsqlcheck::nesting))]
    TooDeeplyNested { line: u64 },
}

impl SyntaxError {
    pub fn line(&self) -> u64 {
        match self {
            SyntaxError::Tokenize { line, .. }
            | SyntaxError::Unexpected { line, .. }
            | SyntaxError::Expected { line, .. }
            | SyntaxError::Unsupported { line, .. }
            | SyntaxError::TooDeeplyNested { line } => *line,
        }
    }

    /// SQL Server error number closest to this failure
    pub fn code(&self) -> u32 {
        match self {
            SyntaxError::Tokenize { .. } => 105,
            SyntaxError::Unexpected { .. } | SyntaxError::Expected { .. } => 102,
            SyntaxError::Unsupported { .. } => 195,
            SyntaxError::TooDeeplyNested { .. } => 191,
        }
    }
}
