//! tsqlcheck-core: T-SQL static analysis library
//!
//! This library parses T-SQL scripts and reports undeclared and unused
//! variables, risky implicit conversions, string truncation and a few stored
//! procedure conventions, without requiring a database connection.

pub mod analyzer;
pub mod dialect;
pub mod error;
pub mod syntax;
pub mod types;

pub use analyzer::{Analyzer, CheckResults};
pub use dialect::SqlVersion;
pub use error::{filter, Diagnostic, DiagnosticKind, Severity, SyntaxError};
pub use types::{check_assignment, AssignmentResult, BaseType, Length, SqlType};
