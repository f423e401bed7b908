//! tp - weather-aware trip planner
//!
//! CLI entry point for planning trips and managing saved sessions.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use tripplanner::agents::{AgentContext, AgentSettings};
use tripplanner::cli::{Cli, Command, OutputFormat, generate_after_help, parse_choice};
use tripplanner::config::Config;
use tripplanner::domain::{TripInput, TripSession};
use tripplanner::interactive;
use tripplanner::llm::create_client;
use tripplanner::prompts::PromptLoader;
use tripplanner::providers::{OpenWeatherMapClient, SerpApiClient};
use tripplanner::report;
use tripplanner::state::StateManager;
use tripplanner::workflow::{WorkflowEngine, WorkflowError};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplanner")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("tripplanner.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // after_help shows which API keys are set, so it needs the default config chain
    let help_config = Config::load(None).unwrap_or_default();
    let cmd = Cli::command().after_help(generate_after_help(&help_config));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    info!(provider = %config.llm.provider, model = %config.llm.model, "tp loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Start {
            from,
            to,
            date,
            days,
            session,
            no_wait,
        }) => {
            let input = TripInput::new(from, to, date, days);
            cmd_start(&config, input, session, no_wait).await
        }
        Some(Command::Choose { id, choice, no_wait }) => cmd_choose(&config, &id, &choice, no_wait).await,
        Some(Command::Resume { id }) => cmd_resume(&config, &id).await,
        Some(Command::Show { id, format }) => cmd_show(&config, &id, format).await,
        Some(Command::List { format }) => cmd_list(&config, format).await,
        Some(Command::Clear { id }) => cmd_clear(&config, &id).await,
        Some(Command::Plan { session }) => {
            let engine = build_engine(&config, false)?;
            interactive::run_interactive(&engine, session).await
        }
        None => {
            debug!("main: no command specified, launching interactive planner");
            let engine = build_engine(&config, false)?;
            interactive::run_interactive(&engine, None).await
        }
    }
}

/// Wire the model client, providers and session store into an engine
fn build_engine(config: &Config, no_wait: bool) -> Result<WorkflowEngine> {
    debug!(no_wait, "build_engine: called");
    config.validate()?;

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let prompts = Arc::new(PromptLoader::new(config.workflow.prompts_dir.clone()));
    let settings = AgentSettings {
        max_tokens: config.llm.max_tokens,
        temperature: Some(config.llm.temperature),
        timeout: config.workflow.call_timeout(),
    };

    let weather =
        Arc::new(OpenWeatherMapClient::from_config(&config.weather).context("Failed to create weather client")?);
    let search = Arc::new(SerpApiClient::from_config(&config.search).context("Failed to create search client")?);
    let state = open_state(config)?;

    let engine = WorkflowEngine::new(
        AgentContext::new(llm, prompts, settings),
        weather,
        search,
        state,
        &config.workflow,
    );
    Ok(if no_wait {
        engine.with_auto_advance_delay(Duration::ZERO)
    } else {
        engine
    })
}

fn open_state(config: &Config) -> Result<StateManager> {
    StateManager::spawn(&config.storage.sessions_dir).context(format!(
        "Failed to open session store at {}",
        config.storage.sessions_dir.display()
    ))
}

/// Print the session, or return the error so the process exits non-zero
fn finish(result: std::result::Result<TripSession, WorkflowError>) -> Result<()> {
    let session = result?;
    print!("{}", report::render_session(&session));
    Ok(())
}

async fn cmd_start(config: &Config, input: TripInput, session: Option<String>, no_wait: bool) -> Result<()> {
    debug!(?input, ?session, no_wait, "cmd_start: called");
    let engine = build_engine(config, no_wait)?;
    println!("{}", "Planning your trip...".dimmed());
    finish(engine.start(&input, session).await)
}

async fn cmd_choose(config: &Config, id: &str, choice: &str, no_wait: bool) -> Result<()> {
    debug!(%id, %choice, no_wait, "cmd_choose: called");
    let engine = build_engine(config, no_wait)?;
    let session = engine.get(id).await?;
    let alternatives = session.alternatives.clone().unwrap_or_default();
    let choice = parse_choice(choice, &alternatives).map_err(|e| eyre::eyre!(e))?;
    finish(engine.choose(id, &choice).await)
}

async fn cmd_resume(config: &Config, id: &str) -> Result<()> {
    debug!(%id, "cmd_resume: called");
    let engine = build_engine(config, false)?;
    finish(engine.resume(id).await)
}

async fn cmd_show(config: &Config, id: &str, format: OutputFormat) -> Result<()> {
    debug!(%id, %format, "cmd_show: called");
    let state = open_state(config)?;
    let session = state.get_session_required(id).await?;
    match format {
        OutputFormat::Text => print!("{}", report::render_session(&session)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&session)?),
    }
    Ok(())
}

async fn cmd_list(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(%format, "cmd_list: called");
    let state = open_state(config)?;
    let sessions = state.list_sessions().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sessions)?),
        OutputFormat::Text => {
            if sessions.is_empty() {
                println!("No sessions.");
            }
            for session in &sessions {
                println!("{}", report::render_summary(session));
            }
        }
    }
    Ok(())
}

async fn cmd_clear(config: &Config, id: &str) -> Result<()> {
    debug!(%id, "cmd_clear: called");
    let state = open_state(config)?;
    if state.clear_session(id).await? {
        println!("Cleared session {}", id);
        Ok(())
    } else {
        Err(eyre::eyre!("Session not found: {}", id))
    }
}
