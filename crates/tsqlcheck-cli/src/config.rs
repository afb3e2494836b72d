//! Configuration file handling

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::args::{Args, OutputFormat};

pub const CONFIG_FILE_NAME: &str = "tsqlcheck.toml";

/// Configuration for tsqlcheck
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SQL Server version (e.g. "2012")
    #[serde(default)]
    pub sql_version: Option<String>,

    /// Warning level, 0 to 3
    #[serde(default)]
    pub warn: Option<u8>,

    /// Output format (human, json, sarif)
    #[serde(default)]
    pub format: Option<OutputFormat>,

    /// Warnings to disable, by number or name (e.g. [2, "sp-prefix"])
    #[serde(default, deserialize_with = "deserialize_warnings")]
    pub disable: Vec<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Error reading config file {}", path.display()))?;
        Self::from_toml(&contents)
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).into_diagnostic()
    }

    /// Try to find and load tsqlcheck.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let current_dir = std::env::current_dir().into_diagnostic()?;
        match Self::find_from(&current_dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using config file");
                Ok(Some(Self::from_file(&path)?))
            }
            None => Ok(None),
        }
    }

    fn find_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|path| path.is_file())
    }

    /// Merge CLI arguments into configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(mut self, args: &Args) -> Self {
        if args.sql_version.is_some() {
            self.sql_version = args.sql_version.clone();
        }

        if args.warn.is_some() {
            self.warn = args.warn;
        }

        if args.format.is_some() {
            self.format = args.format;
        }

        if !args.disable.is_empty() {
            self.disable = args.disable.clone();
        }

        self
    }
}

/// Accept warning numbers as well as names in `disable`
fn deserialize_warnings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Warning {
        Number(u32),
        Name(String),
    }

    let warnings = Vec::<Warning>::deserialize(deserializer)?;
    Ok(warnings
        .into_iter()
        .map(|warning| match warning {
            Warning::Number(number) => number.to_string(),
            Warning::Name(name) => name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_config() {
        let config = Config::from_toml(
            r#"
sql_version = "2012"
warn = 3
format = "json"
disable = [2, "sp-prefix"]
"#,
        )
        .unwrap();
        assert_eq!(
            config,
            Config {
                sql_version: Some("2012".to_string()),
                warn: Some(3),
                format: Some(OutputFormat::Json),
                disable: vec!["2".to_string(), "sp-prefix".to_string()],
            }
        );
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(Config::from_toml("dialect = \"postgresql\"").is_err());
    }

    #[test]
    fn test_args_take_precedence() {
        let config = Config::from_toml("sql_version = \"2008\"\nwarn = 1\ndisable = [4]").unwrap();
        let args = Args::try_parse_from(["tsqlcheck", "a.sql", "-w", "3"]).unwrap();
        let merged = config.merge_with_args(&args);
        assert_eq!(merged.warn, Some(3));
        assert_eq!(merged.sql_version.as_deref(), Some("2008"));
        assert_eq!(merged.disable, vec!["4".to_string()]);
    }
}
