//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "tsqlcheck")]
#[command(author, version, about = "T-SQL static analysis tool")]
pub struct Args {
    /// SQL files to check (supports glob patterns)
    #[arg(value_name = "FILES", required_unless_present_any = ["inline", "list_warnings"])]
    pub files: Vec<PathBuf>,

    /// Check SQL given on the command line instead of a file
    #[arg(short, long, value_name = "SQL")]
    pub inline: Option<String>,

    /// SQL Server version whose syntax is accepted (2000, 2005, 2008, 2012, 2014, 2016)
    #[arg(short = 'v', long, value_name = "VERSION", env = "TSQLCHECK_SQL_VERSION")]
    pub sql_version: Option<String>,

    /// Warning level: 0 none, 1 critical, 2 serious, 3 all
    #[arg(short, long, value_name = "LEVEL", value_parser = clap::value_parser!(u8).range(0..=3))]
    pub warn: Option<u8>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Configuration file (defaults to the nearest tsqlcheck.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Warning to turn off, by number or name (repeatable)
    #[arg(short, long = "disable", value_name = "WARNING")]
    pub disable: Vec<String>,

    /// Do not print the version banner
    #[arg(short = 'q', long)]
    pub nologo: bool,

    /// Print the warning catalog as markdown and exit
    #[arg(long)]
    pub list_warnings: bool,

    /// Enable verbose logging
    #[arg(long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per error or warning on stderr
    #[default]
    Human,
    /// JSON output
    Json,
    /// SARIF output (for GitHub Code Scanning)
    Sarif,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_files_and_flags() {
        let args = Args::try_parse_from([
            "tsqlcheck", "a.sql", "b.sql", "-w", "3", "-v", "2008", "-d", "6", "-d", "unused-variable",
            "-q",
        ])
        .unwrap();
        assert_eq!(args.files, vec![PathBuf::from("a.sql"), PathBuf::from("b.sql")]);
        assert_eq!(args.warn, Some(3));
        assert_eq!(args.sql_version.as_deref(), Some("2008"));
        assert_eq!(args.disable, vec!["6", "unused-variable"]);
        assert!(args.nologo);
    }

    #[test]
    fn test_inline_replaces_files() {
        let args = Args::try_parse_from(["tsqlcheck", "-i", "select 1"]).unwrap();
        assert!(args.files.is_empty());
        assert_eq!(args.inline.as_deref(), Some("select 1"));
    }

    #[test]
    fn test_input_is_required() {
        assert!(Args::try_parse_from(["tsqlcheck"]).is_err());
        assert!(Args::try_parse_from(["tsqlcheck", "--list-warnings"]).is_ok());
    }

    #[test]
    fn test_warn_level_range() {
        assert!(Args::try_parse_from(["tsqlcheck", "a.sql", "-w", "4"]).is_err());
        assert!(Args::try_parse_from(["tsqlcheck", "a.sql", "-w", "0"]).is_ok());
    }

    #[test]
    fn test_format() {
        let args = Args::try_parse_from(["tsqlcheck", "a.sql", "-f", "sarif"]).unwrap();
        assert_eq!(args.format, Some(OutputFormat::Sarif));
    }
}
