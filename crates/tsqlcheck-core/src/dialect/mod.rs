//! Targeted SQL Server version

use serde::{Deserialize, Serialize};
use sqlparser::dialect::MsSqlDialect;
use std::str::FromStr;

/// SQL Server versions the front end knows how to gate syntax for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum SqlVersion {
    Sql2000,
    Sql2005,
    Sql2008,
    Sql2012,
    #[default]
    Sql2014,
    Sql2016,
}

impl SqlVersion {
    pub const ALL: [SqlVersion; 6] = [
        SqlVersion::Sql2000,
        SqlVersion::Sql2005,
        SqlVersion::Sql2008,
        SqlVersion::Sql2012,
        SqlVersion::Sql2014,
        SqlVersion::Sql2016,
    ];

    /// Get the sqlparser dialect used for tokenizing
    pub fn tokenizer_dialect(&self) -> MsSqlDialect {
        MsSqlDialect {}
    }

    pub fn year(&self) -> u16 {
        match self {
            SqlVersion::Sql2000 => 2000,
            SqlVersion::Sql2005 => 2005,
            SqlVersion::Sql2008 => 2008,
            SqlVersion::Sql2012 => 2012,
            SqlVersion::Sql2014 => 2014,
            SqlVersion::Sql2016 => 2016,
        }
    }

    /// `DECLARE @v type = value`
    pub fn supports_declare_initializer(&self) -> bool {
        *self >= SqlVersion::Sql2008
    }

    /// `SET @v += value` and friends
    pub fn supports_compound_assignment(&self) -> bool {
        *self >= SqlVersion::Sql2008
    }

    /// `IIF`, `TRY_CAST` and `TRY_CONVERT`
    pub fn supports_2012_functions(&self) -> bool {
        *self >= SqlVersion::Sql2012
    }

    pub fn supports_create_or_alter(&self) -> bool {
        *self >= SqlVersion::Sql2016
    }
}

impl FromStr for SqlVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let year = trimmed
            .strip_prefix("sql")
            .or_else(|| trimmed.strip_prefix("SQL"))
            .unwrap_or(trimmed);
        SqlVersion::ALL
            .iter()
            .find(|v| v.year().to_string() == year)
            .copied()
            .ok_or_else(|| {
                let known: Vec<String> = SqlVersion::ALL.iter().map(|v| v.to_string()).collect();
                format!(
                    "Unknown SQL version '{}'. Known versions are: {}",
                    s,
                    known.join(", ")
                )
            })
    }
}

impl std::fmt::Display for SqlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        assert_eq!("2008".parse::<SqlVersion>(), Ok(SqlVersion::Sql2008));
        assert_eq!("sql2016".parse::<SqlVersion>(), Ok(SqlVersion::Sql2016));
        assert_eq!(SqlVersion::default(), SqlVersion::Sql2014);
    }

    #[test]
    fn test_unknown_version_lists_known() {
        let err = "1999".parse::<SqlVersion>().unwrap_err();
        assert_eq!(
            err,
            "Unknown SQL version '1999'. Known versions are: 2000, 2005, 2008, 2012, 2014, 2016"
        );
    }

    #[test]
    fn test_feature_gates() {
        assert!(!SqlVersion::Sql2005.supports_declare_initializer());
        assert!(SqlVersion::Sql2008.supports_compound_assignment());
        assert!(!SqlVersion::Sql2008.supports_2012_functions());
        assert!(SqlVersion::Sql2012.supports_2012_functions());
        assert!(!SqlVersion::Sql2014.supports_create_or_alter());
        assert!(SqlVersion::Sql2016.supports_create_or_alter());
    }
}
