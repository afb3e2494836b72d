//! SQL type system

mod conversion;

use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::syntax::ast::{DataTypeRef, TypeParam};

pub use conversion::{conversion, Conversion};

/// Length given to `char`/`varchar`/`nchar`/`nvarchar` declared without a size
pub const IMPLICIT_DECLARATION_LENGTH: u64 = 1;

/// Length given to an unsized character target of CAST or CONVERT
pub const IMPLICIT_CAST_LENGTH: u64 = 30;

/// SQL Server scalar base types
///
/// Declaration order is the row/column order of the conversion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    // Character types
    Char,
    VarChar,
    NChar,
    NVarChar,

    // Integer types
    TinyInt,
    SmallInt,
    Int,
    BigInt,

    Bit,
    Decimal,
    Numeric,
    Float,
    Real,
    Money,
    SmallMoney,

    // Date/Time types
    Date,
    Time,
    DateTime,
    DateTime2,
    DateTimeOffset,
    SmallDateTime,

    // Large objects and binary
    Text,
    NText,
    Image,
    Binary,
    VarBinary,

    Timestamp,
    UniqueIdentifier,
    SqlVariant,
    Xml,
}

impl BaseType {
    pub const ALL: [BaseType; 30] = [
        BaseType::Char,
        BaseType::VarChar,
        BaseType::NChar,
        BaseType::NVarChar,
        BaseType::TinyInt,
        BaseType::SmallInt,
        BaseType::Int,
        BaseType::BigInt,
        BaseType::Bit,
        BaseType::Decimal,
        BaseType::Numeric,
        BaseType::Float,
        BaseType::Real,
        BaseType::Money,
        BaseType::SmallMoney,
        BaseType::Date,
        BaseType::Time,
        BaseType::DateTime,
        BaseType::DateTime2,
        BaseType::DateTimeOffset,
        BaseType::SmallDateTime,
        BaseType::Text,
        BaseType::NText,
        BaseType::Image,
        BaseType::Binary,
        BaseType::VarBinary,
        BaseType::Timestamp,
        BaseType::UniqueIdentifier,
        BaseType::SqlVariant,
        BaseType::Xml,
    ];

    /// `char`, `varchar`, `nchar` or `nvarchar`
    pub const fn is_string(self) -> bool {
        matches!(
            self,
            BaseType::Char | BaseType::VarChar | BaseType::NChar | BaseType::NVarChar
        )
    }

    pub const fn is_wide_string(self) -> bool {
        matches!(self, BaseType::NChar | BaseType::NVarChar)
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            BaseType::TinyInt | BaseType::SmallInt | BaseType::Int | BaseType::BigInt
        )
    }

    /// Storage width in bytes for the integer family, 0 otherwise
    pub const fn integer_width(self) -> u8 {
        match self {
            BaseType::TinyInt => 1,
            BaseType::SmallInt => 2,
            BaseType::Int => 4,
            BaseType::BigInt => 8,
            _ => 0,
        }
    }

    /// Characters needed to render the widest value of an integer type
    pub const fn rendered_length(self) -> Option<u64> {
        match self {
            BaseType::TinyInt => Some(3),
            BaseType::SmallInt => Some(6),
            BaseType::Int => Some(11),
            BaseType::BigInt => Some(20),
            _ => None,
        }
    }

    /// Precedence rank; lower ranks win when two types meet in arithmetic
    pub const fn precedence(self) -> u8 {
        match self {
            BaseType::SqlVariant => 1,
            BaseType::Xml => 2,
            BaseType::DateTimeOffset => 3,
            BaseType::DateTime2 => 4,
            BaseType::DateTime => 5,
            BaseType::SmallDateTime => 6,
            BaseType::Date => 7,
            BaseType::Time => 8,
            BaseType::Float => 9,
            BaseType::Real => 10,
            BaseType::Decimal | BaseType::Numeric => 11,
            BaseType::Money => 12,
            BaseType::SmallMoney => 13,
            BaseType::BigInt => 14,
            BaseType::Int => 15,
            BaseType::SmallInt => 16,
            BaseType::TinyInt => 17,
            BaseType::Bit => 18,
            BaseType::NText => 19,
            BaseType::Text => 20,
            BaseType::Image => 21,
            BaseType::Timestamp => 22,
            BaseType::UniqueIdentifier => 23,
            BaseType::VarBinary => 24,
            BaseType::Binary => 25,
            BaseType::NChar => 26,
            BaseType::NVarChar => 27,
            BaseType::Char => 28,
            BaseType::VarChar => 29,
        }
    }

    /// Types whose first parameter is a length
    pub const fn has_length(self) -> bool {
        self.is_string() || matches!(self, BaseType::Binary | BaseType::VarBinary)
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseType::Char => "char",
            BaseType::VarChar => "varchar",
            BaseType::NChar => "nchar",
            BaseType::NVarChar => "nvarchar",
            BaseType::TinyInt => "tinyint",
            BaseType::SmallInt => "smallint",
            BaseType::Int => "int",
            BaseType::BigInt => "bigint",
            BaseType::Bit => "bit",
            BaseType::Decimal => "decimal",
            BaseType::Numeric => "numeric",
            BaseType::Float => "float",
            BaseType::Real => "real",
            BaseType::Money => "money",
            BaseType::SmallMoney => "smallmoney",
            BaseType::Date => "date",
            BaseType::Time => "time",
            BaseType::DateTime => "datetime",
            BaseType::DateTime2 => "datetime2",
            BaseType::DateTimeOffset => "datetimeoffset",
            BaseType::SmallDateTime => "smalldatetime",
            BaseType::Text => "text",
            BaseType::NText => "ntext",
            BaseType::Image => "image",
            BaseType::Binary => "binary",
            BaseType::VarBinary => "varbinary",
            BaseType::Timestamp => "timestamp",
            BaseType::UniqueIdentifier => "uniqueidentifier",
            BaseType::SqlVariant => "sql_variant",
            BaseType::Xml => "xml",
        }
    }

    /// Case-insensitive lookup, aliases included
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        let base = match lower.as_str() {
            "character" => BaseType::Char,
            "integer" => BaseType::Int,
            "dec" => BaseType::Decimal,
            "double precision" => BaseType::Float,
            "rowversion" => BaseType::Timestamp,
            "sysname" => BaseType::NVarChar,
            other => return BaseType::ALL.iter().find(|b| b.name() == other).copied(),
        };
        Some(base)
    }
}

/// Declared length of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    /// Declared without a size
    Implicit,
    Explicit(u64),
    Max,
}

/// Internal representation of SQL types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    /// Anything the analyzer cannot classify; never produces a diagnostic
    Unknown,
    Known { base: BaseType, length: Length },
}

impl SqlType {
    pub fn unknown() -> Self {
        SqlType::Unknown
    }

    pub fn known(base: BaseType, length: Length) -> Self {
        SqlType::Known { base, length }
    }

    /// Build a type from a declaration such as `varchar(20)` or `nvarchar(max)`
    pub fn from_declaration(decl: &DataTypeRef) -> Self {
        let Some(base) = BaseType::from_name(&decl.name) else {
            return SqlType::Unknown;
        };

        if decl.name.eq_ignore_ascii_case("sysname") {
            return SqlType::known(BaseType::NVarChar, Length::Explicit(128));
        }

        let length = if base.has_length() {
            match decl.params.first() {
                Some(TypeParam::Integer(n)) => Length::Explicit(*n),
                Some(TypeParam::Max) => Length::Max,
                None => Length::Implicit,
            }
        } else {
            Length::Implicit
        };

        SqlType::known(base, length)
    }

    /// Character type declared with no explicit length
    pub fn is_implicit_length_string(&self) -> bool {
        matches!(
            self,
            SqlType::Known { base, length: Length::Implicit } if base.is_string()
        )
    }

    pub fn base(&self) -> Option<BaseType> {
        match self {
            SqlType::Unknown => None,
            SqlType::Known { base, .. } => Some(*base),
        }
    }

    /// Length used for comparisons; `max` is the largest representable length
    pub fn resolved_length(&self) -> Option<u64> {
        match self {
            SqlType::Unknown => None,
            SqlType::Known { length, .. } => Some(match length {
                Length::Implicit => IMPLICIT_DECLARATION_LENGTH,
                Length::Explicit(n) => *n,
                Length::Max => u64::MAX,
            }),
        }
    }

    /// Replace an implicit length on a character type with `length`
    pub fn with_default_length(self, length: u64) -> Self {
        match self {
            SqlType::Known {
                base,
                length: Length::Implicit,
            } if base.is_string() => SqlType::known(base, Length::Explicit(length)),
            other => other,
        }
    }

    /// Result type of arithmetic between `self` and `other`
    pub fn higher_precedence(&self, other: &SqlType) -> SqlType {
        match (self, other) {
            (SqlType::Known { base: left, .. }, SqlType::Known { base: right, .. }) => {
                if left.precedence() < right.precedence() {
                    self.clone()
                } else {
                    other.clone()
                }
            }
            _ => SqlType::Unknown,
        }
    }

    /// Get a display name for the type
    pub fn display_name(&self) -> String {
        match self {
            SqlType::Unknown => "unknown".to_string(),
            SqlType::Known { base, length } => match length {
                Length::Explicit(n) if base.has_length() => format!("{}({})", base.name(), n),
                Length::Max => format!("{}(max)", base.name()),
                _ => base.name().to_string(),
            },
        }
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Outcome of a single assignment check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentResult {
    pub is_ok: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl AssignmentResult {
    fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            is_ok: diagnostics.is_empty(),
            diagnostics,
        }
    }
}

/// Check assigning a `source` value to the variable `name` of type `target`.
///
/// Every applicable diagnostic is returned; a long unicode value going into a
/// short narrow variable yields both a truncation and a narrowing diagnostic.
pub fn check_assignment(
    line: u64,
    name: &str,
    target: &SqlType,
    source: &SqlType,
) -> AssignmentResult {
    let (
        SqlType::Known {
            base: target_base, ..
        },
        SqlType::Known {
            base: source_base, ..
        },
    ) = (target, source)
    else {
        return AssignmentResult::from_diagnostics(Vec::new());
    };

    let outcome = conversion(*source_base, *target_base);
    let target_len = target.resolved_length().unwrap_or(u64::MAX);
    let source_len = source.resolved_length().unwrap_or(0);
    let mut diagnostics = Vec::new();

    if outcome.contains(Conversion::CHECK_LENGTH) && target_len < source_len {
        diagnostics.push(Diagnostic::string_truncated(
            line, name, target_len, source_len,
        ));
    }

    if outcome.contains(Conversion::CHECK_CONVERTED_LENGTH) {
        if let Some(rendered) = source_base.rendered_length() {
            if target_len < rendered {
                diagnostics.push(Diagnostic::convert_to_too_short_string(
                    line, name, target_len, rendered,
                ));
            }
        }
    }

    if outcome.contains(Conversion::NARROWING) {
        diagnostics.push(Diagnostic::string_converted(line, name));
    }

    if outcome.contains(Conversion::IMPLICIT_LOSSY) {
        diagnostics.push(Diagnostic::implicit_conversion(
            line,
            name,
            &target.display_name(),
            &source.display_name(),
        ));
    }

    if outcome.contains(Conversion::NUMERIC_OVERFLOW) {
        diagnostics.push(Diagnostic::numeric_overflow(
            line,
            name,
            &target.display_name(),
            &source.display_name(),
        ));
    }

    AssignmentResult::from_diagnostics(diagnostics)
}
