//! CLI command definitions and subcommands

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::Config;
use crate::domain::{AlternativeOption, UserChoice};

/// tp - weather-aware trip planner
#[derive(Parser)]
#[command(
    name = "tp",
    about = "Weather-aware trip planner: checks the forecast, suggests alternatives, writes the itinerary",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a trip: analyze the weather and, if it is suitable, build the itinerary
    Start {
        /// Starting city
        #[arg(short, long)]
        from: String,

        /// Destination city
        #[arg(short, long)]
        to: String,

        /// Travel date (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,

        /// Trip duration in days
        #[arg(long, default_value = "3")]
        days: u32,

        /// Reuse an existing session ID instead of creating one
        #[arg(short, long)]
        session: Option<String>,

        /// Skip the pause before a suitable forecast moves on to the itinerary
        #[arg(long)]
        no_wait: bool,
    },

    /// Answer the weather analysis of a session
    Choose {
        /// Session ID
        id: String,

        /// continue, different-date, different-city, restart, an alternative number or city name
        choice: String,

        /// Skip the pause before a suitable forecast moves on to the itinerary
        #[arg(long)]
        no_wait: bool,
    },

    /// Recompute whatever a session is missing (after a failed call)
    Resume {
        /// Session ID
        id: String,
    },

    /// Show a session
    Show {
        /// Session ID
        id: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List sessions, most recent first
    List {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a session
    Clear {
        /// Session ID
        id: String,
    },

    /// Plan a trip interactively
    Plan {
        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,
    },
}

/// Turn a typed choice into a `UserChoice` against the offered alternatives
///
/// Accepts the keywords `continue`, `different-date`, `different-city` and
/// `restart`, a 1-based alternative number, or an alternative city name
/// (case-insensitive).
pub fn parse_choice(raw: &str, alternatives: &[AlternativeOption]) -> Result<UserChoice, String> {
    debug!(%raw, offered = alternatives.len(), "parse_choice: called");
    let normalized = raw.trim().to_lowercase().replace(['_', ' '], "-");
    match normalized.as_str() {
        "" => return Err("Empty choice".to_string()),
        "continue" | "continue-anyway" | "c" => return Ok(UserChoice::Continue),
        "different-date" | "date" => return Ok(UserChoice::DifferentDate),
        "different-city" | "city" => return Ok(UserChoice::DifferentCity),
        "restart" | "r" => return Ok(UserChoice::Restart),
        _ => {}
    }

    if let Ok(n) = raw.trim().parse::<usize>() {
        return match n.checked_sub(1).and_then(|i| alternatives.get(i)) {
            Some(option) => Ok(UserChoice::Alternative(option.clone())),
            None => Err(format!(
                "Alternative {} does not exist; {} offered",
                n,
                alternatives.len()
            )),
        };
    }

    alternatives
        .iter()
        .find(|a| a.city.eq_ignore_ascii_case(raw.trim()))
        .map(|a| UserChoice::Alternative(a.clone()))
        .ok_or_else(|| {
            format!(
                "Unknown choice '{}'. Use: continue, different-date, different-city, restart, or an alternative",
                raw.trim()
            )
        })
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplanner")
        .join("logs")
        .join("tripplanner.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with API key checks and the log path
pub fn generate_after_help(config: &Config) -> String {
    debug!("generate_after_help: called");
    let keys = [
        ("llm", config.llm.api_key_env.as_str()),
        ("weather", config.weather.api_key_env.as_str()),
        ("search", config.search.api_key_env.as_str()),
    ];

    let mut help = String::new();
    help.push_str("API Keys:\n");
    for (service, env) in keys {
        let set = std::env::var(env).is_ok_and(|v| !v.trim().is_empty());
        let icon = if set { "\u{2705}" } else { "\u{274C}" };
        help.push_str(&format!("  {} {:<8} {}\n", icon, service, env));
    }

    help.push('\n');
    help.push_str(&format!("Sessions are stored in: {}\n", config.storage.sessions_dir.display()));
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Output format for show/list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
