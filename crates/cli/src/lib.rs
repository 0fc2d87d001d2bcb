use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "coinfilter")]
#[command(about = "Coin qualification filter backed by live futures market data")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the refresh daemon until Ctrl+C
    Start {
        /// Path to the configuration file (defaults apply when omitted)
        #[arg(short, long, env = "COINFILTER_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Refresh once and print the candidates that pass every threshold
    Filter {
        #[arg(short, long, env = "COINFILTER_CONFIG")]
        config: Option<PathBuf>,

        /// Maximum number of symbols to print (0 or less = no limit)
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        limit: i64,

        /// Print the verdict for every candidate instead
        #[arg(long)]
        explain: bool,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Candidate symbols, e.g. BTCUSDT ethusdt
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Refresh once and print quote-asset symbols by 24h quote volume
    Top {
        #[arg(short, long, env = "COINFILTER_CONFIG")]
        config: Option<PathBuf>,

        #[arg(short, long, default_value_t = 20, allow_negative_numbers = true)]
        limit: i64,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate configuration without starting the daemon
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "coinfilter.yaml")]
        config: PathBuf,
    },

    /// Initialize a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "coinfilter.yaml")]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One symbol per line
    Text,

    /// A JSON array
    Json,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Map a user-supplied limit onto the query convention (`0` = no limit)
pub fn normalize_limit(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_command() {
        let cli = Cli::try_parse_from([
            "coinfilter", "filter", "--limit", "3", "--explain", "BTCUSDT", "ethusdt",
        ])
        .unwrap();

        match cli.command {
            Commands::Filter {
                limit,
                explain,
                format,
                symbols,
                ..
            } => {
                assert_eq!(limit, 3);
                assert!(explain);
                assert_eq!(format, OutputFormat::Text);
                assert_eq!(symbols, vec!["BTCUSDT", "ethusdt"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_filter_requires_symbols() {
        assert!(Cli::try_parse_from(["coinfilter", "filter"]).is_err());
    }

    #[test]
    fn test_negative_limit_parses() {
        let cli = Cli::try_parse_from(["coinfilter", "top", "--limit", "-5", "--format", "json"])
            .unwrap();
        match cli.command {
            Commands::Top { limit, format, .. } => {
                assert_eq!(normalize_limit(limit), 0);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_normalize_limit() {
        assert_eq!(normalize_limit(0), 0);
        assert_eq!(normalize_limit(-1), 0);
        assert_eq!(normalize_limit(7), 7);
    }
}
