use clap::{Parser, builder::BoolishValueParser};
use std::error::Error;
use std::fmt;
use std::time::Duration;

const DEFAULT_DB_URI: &str = "mem://";
const DEFAULT_DB_NAMESPACE: &str = "trove";
const DEFAULT_DB_DATABASE: &str = "deep_tree";
const DEFAULT_MAX_DEPTH: usize = 8;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;

#[derive(Parser, Debug)]
#[command(
    name = "trove-deep-tree",
    version,
    about = "Self-referential inventory hierarchy population demo."
)]
struct CliArgs {
    #[arg(long, env = "TROVE_DB_URI", default_value = DEFAULT_DB_URI)]
    db_uri: String,

    #[arg(long, env = "TROVE_DB_NAMESPACE", default_value = DEFAULT_DB_NAMESPACE)]
    db_namespace: String,

    #[arg(long, env = "TROVE_DB_DATABASE", default_value = DEFAULT_DB_DATABASE)]
    db_database: String,

    #[arg(long, env = "TROVE_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[arg(
        long,
        env = "TROVE_STORE_TIMEOUT_SECS",
        default_value_t = DEFAULT_STORE_TIMEOUT_SECS
    )]
    store_timeout_secs: u64,

    #[arg(
        long,
        env = "TROVE_COMPACT",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    compact: bool,
}

/// Runtime configuration loaded from CLI arguments and environment
/// variables.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub db_uri: String,
    pub db_namespace: String,
    pub db_database: String,
    pub max_depth: usize,
    pub store_timeout: Duration,
    pub compact: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl DemoConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

impl TryFrom<CliArgs> for DemoConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.db_uri.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "TROVE_DB_URI",
                value: args.db_uri,
            });
        }
        if args.db_namespace.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "TROVE_DB_NAMESPACE",
                value: args.db_namespace,
            });
        }
        // The demo plan nests three levels; a smaller bound would reject it
        // before the first query.
        if args.max_depth < 3 {
            return Err(ConfigError::InvalidSetting {
                name: "TROVE_MAX_DEPTH",
                value: args.max_depth.to_string(),
            });
        }

        Ok(Self {
            db_uri: args.db_uri,
            db_namespace: args.db_namespace,
            db_database: args.db_database,
            max_depth: args.max_depth,
            store_timeout: Duration::from_secs(args.store_timeout_secs),
            compact: args.compact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            db_uri: DEFAULT_DB_URI.to_string(),
            db_namespace: DEFAULT_DB_NAMESPACE.to_string(),
            db_database: DEFAULT_DB_DATABASE.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            store_timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
            compact: false,
        }
    }

    #[test]
    fn rejects_a_bound_below_the_demo_plan() {
        let mut args = base_args();
        args.max_depth = 2;

        let err = DemoConfig::try_from(args).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                name: "TROVE_MAX_DEPTH",
                ..
            }
        ));
    }

    #[test]
    fn defaults_parse() {
        let config = DemoConfig::try_from(base_args()).expect("config should parse");
        assert_eq!(config.db_database, "deep_tree");
        assert_eq!(config.max_depth, 8);
    }
}
