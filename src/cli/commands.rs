//! CLI commands and argument parsing

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Catalog Harvest CLI
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every matching product
    Fetch {
        /// Only products created on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Only parent products
        #[arg(long)]
        parent_only: bool,

        /// Output format
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch matching products and upload them as a CSV feed
    Upload {
        /// Only products created on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Only parent products
        #[arg(long)]
        parent_only: bool,

        /// Profile ID to upload into
        #[arg(long)]
        region: u64,
    },

    /// Obtain the first token pair through the browser consent page
    Authorize {
        /// Authorization code; prompted for on stdin if omitted
        #[arg(long)]
        code: Option<String>,
    },

    /// Validate the configuration
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// CSV upload feed layout
    Csv,
    /// JSON array of products
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from([
            "catalog-harvest",
            "--config",
            "harvest.yaml",
            "fetch",
            "--since",
            "2024-01-31",
            "--parent-only",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("harvest.yaml")));
        match cli.command {
            Commands::Fetch {
                since,
                parent_only,
                format,
                output,
            } => {
                assert_eq!(since, NaiveDate::from_ymd_opt(2024, 1, 31));
                assert!(parent_only);
                assert_eq!(format, OutputFormat::Json);
                assert!(output.is_none());
            }
            other => panic!("Expected Fetch, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_upload_requires_region() {
        assert!(Cli::try_parse_from(["catalog-harvest", "upload"]).is_err());

        let cli = Cli::try_parse_from(["catalog-harvest", "upload", "--region", "12", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Upload {
                region: 12,
                since: None,
                parent_only: false
            }
        ));
    }

    #[test]
    fn test_parse_authorize() {
        let cli = Cli::try_parse_from(["catalog-harvest", "authorize"]).unwrap();
        assert!(matches!(cli.command, Commands::Authorize { code: None }));

        let cli = Cli::try_parse_from(["catalog-harvest", "authorize", "--code", "abc"]).unwrap();
        assert!(matches!(cli.command, Commands::Authorize { code: Some(ref c) } if c == "abc"));
    }

    #[test]
    fn test_parse_bad_date() {
        assert!(Cli::try_parse_from(["catalog-harvest", "fetch", "--since", "yesterday"]).is_err());
    }
}
