//! Interactive trip planner
//!
//! Walks the user through the three steps with readline prompts. Every
//! answer goes through the same `WorkflowEngine` operations the one-shot
//! subcommands use, so a session started here can be resumed with `tp resume`.

use chrono::NaiveDate;
use colored::Colorize;
use eyre::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use crate::cli::parse_choice;
use crate::domain::{Step, TripInput, TripSession};
use crate::report;
use crate::workflow::{Effect, WorkflowEngine};

/// What the user typed at a prompt
enum Answer {
    Text(String),
    Quit,
}

/// Interactive planner bound to one session
pub struct Planner<'a> {
    engine: &'a WorkflowEngine,
    rl: DefaultEditor,
}

impl<'a> Planner<'a> {
    pub fn new(engine: &'a WorkflowEngine) -> Result<Self> {
        let rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        Ok(Self { engine, rl })
    }

    /// Run until the user quits
    pub async fn run(&mut self, session_id: Option<String>) -> Result<()> {
        debug!(?session_id, "Planner::run: called");
        self.print_welcome();

        let mut session = match session_id {
            Some(id) => {
                let session = self.engine.get(&id).await.context("Failed to load session")?;
                self.drive(session).await?
            }
            None => self.engine.create_session(None).await.context("Failed to create session")?,
        };
        info!(id = %session.id, "Interactive planning started");

        loop {
            session = match session.step {
                Step::CollectInput => match self.collect_input(session).await? {
                    Some(next) => next,
                    None => break,
                },
                Step::AnalyzeWeather => match self.analyze_weather(session).await? {
                    Some(next) => next,
                    None => break,
                },
                Step::BuildItinerary => match self.build_itinerary(session).await? {
                    Some(next) => next,
                    None => break,
                },
            };
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Trip Planner".bright_cyan().bold());
        println!("Press {} or type {} to quit at any prompt", "Ctrl+D".yellow(), "quit".yellow());
        println!();
    }

    /// Step 1: ask for trip details, prefilled with the previous answers
    async fn collect_input(&mut self, session: TripSession) -> Result<Option<TripSession>> {
        println!("{}", "Step 1: Trip details".bright_cyan());
        let prior = session.context.as_ref().map(|c| c.to_input());

        let from = prior.as_ref().map(|p| p.starting_city.clone()).unwrap_or_default();
        let Answer::Text(from) = self.ask("Starting city", &from)? else {
            return Ok(None);
        };
        let to = prior.as_ref().map(|p| p.destination_city.clone()).unwrap_or_default();
        let Answer::Text(to) = self.ask("Destination city", &to)? else {
            return Ok(None);
        };
        let date = prior
            .as_ref()
            .map(|p| p.travel_date.to_string())
            .unwrap_or_else(|| chrono::Local::now().date_naive().to_string());
        let Some(travel_date) = self.ask_parsed::<NaiveDate>("Travel date (YYYY-MM-DD)", &date)? else {
            return Ok(None);
        };
        let days = prior.as_ref().map(|p| p.duration_days).unwrap_or(3).to_string();
        let Some(duration_days) = self.ask_parsed::<u32>("Duration in days", &days)? else {
            return Ok(None);
        };

        let input = TripInput::new(from, to, travel_date, duration_days);
        let id = session.id.clone();
        match self.engine.accept_input(session, &input).await {
            Ok(accepted) => Ok(Some(self.drive(accepted).await?)),
            Err(e) => {
                print_error(&e);
                Ok(Some(self.engine.get(&id).await?))
            }
        }
    }

    /// Step 2: show the analysis and take the user's choice
    async fn analyze_weather(&mut self, session: TripSession) -> Result<Option<TripSession>> {
        if !session.awaiting_choice() {
            // a fault interrupted the analysis
            let Answer::Text(answer) = self.ask("Retry? (yes/restart)", "yes")? else {
                return Ok(None);
            };
            if answer.eq_ignore_ascii_case("restart") {
                return self.apply(session, "restart").await.map(Some);
            }
            return Ok(Some(self.drive(session).await?));
        }

        print!("{}", report::render_session(&session));
        let Answer::Text(answer) = self.ask("Your choice", "")? else {
            return Ok(None);
        };
        self.apply(session, &answer).await.map(Some)
    }

    /// Step 3: show the itinerary and offer another trip
    async fn build_itinerary(&mut self, session: TripSession) -> Result<Option<TripSession>> {
        if session.current_itinerary().is_none() {
            let Answer::Text(answer) = self.ask("Itinerary is incomplete. Retry? (yes/restart)", "yes")? else {
                return Ok(None);
            };
            if answer.eq_ignore_ascii_case("restart") {
                let id = session.id.clone();
                return match self.engine.plan_another(&id).await {
                    Ok(next) => Ok(Some(next)),
                    Err(e) => {
                        print_error(&e);
                        Ok(Some(self.engine.get(&id).await?))
                    }
                };
            }
            return Ok(Some(self.drive(session).await?));
        }

        print!("{}", report::render_session(&session));
        let Answer::Text(answer) = self.ask("Plan another trip? (yes/no)", "no")? else {
            return Ok(None);
        };
        if !answer.to_lowercase().starts_with('y') {
            return Ok(None);
        }
        Ok(Some(self.engine.plan_another(&session.id).await?))
    }

    async fn apply(&mut self, session: TripSession, answer: &str) -> Result<TripSession> {
        let alternatives = session.alternatives.clone().unwrap_or_default();
        let choice = match parse_choice(answer, &alternatives) {
            Ok(choice) => choice,
            Err(message) => {
                println!("{} {}", "?".yellow(), message);
                return Ok(session);
            }
        };

        let id = session.id.clone();
        match self.engine.accept_choice(session, &choice).await {
            Ok(next) => self.drive(next).await,
            Err(e) => {
                print_error(&e);
                Ok(self.engine.get(&id).await?)
            }
        }
    }

    /// Run effects, printing progress; a fault is shown and the stored session returned
    async fn drive(&mut self, session: TripSession) -> Result<TripSession> {
        let id = session.id.clone();
        match self.engine.drive_with(session, show_effect).await {
            Ok(next) => Ok(next),
            Err(e) => {
                print_error(&e);
                if e.is_transient() {
                    println!("{}", "The service may be temporarily unavailable; retrying often helps.".dimmed());
                }
                Ok(self.engine.get(&id).await?)
            }
        }
    }

    fn ask(&mut self, prompt: &str, initial: &str) -> Result<Answer> {
        let prompt = format!("{} {}: ", ">".bright_green(), prompt);
        loop {
            match self.rl.readline_with_initial(&prompt, (initial, "")) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                        return Ok(Answer::Quit);
                    }
                    if !line.is_empty() {
                        let _ = self.rl.add_history_entry(line.as_str());
                    }
                    return Ok(Answer::Text(line));
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    return Ok(Answer::Quit);
                }
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            }
        }
    }

    fn ask_parsed<T: std::str::FromStr>(&mut self, prompt: &str, initial: &str) -> Result<Option<T>> {
        loop {
            let Answer::Text(text) = self.ask(prompt, initial)? else {
                return Ok(None);
            };
            match text.parse::<T>() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => println!("{} Could not understand '{}'", "?".yellow(), text),
            }
        }
    }
}

fn show_effect(session: &TripSession, effect: Effect) {
    if effect == Effect::AutoAdvance
        && let Some(decision) = session.current_decision()
    {
        print!("{}", report::render_decision(decision));
    }
    println!("{}", report::effect_message(effect).dimmed());
}

fn print_error(error: &dyn std::fmt::Display) {
    println!("{} {}", "Error:".red().bold(), error);
}

/// Run the interactive planner
///
/// This is the main entry point for `tp plan`.
pub async fn run_interactive(engine: &WorkflowEngine, session_id: Option<String>) -> Result<()> {
    let mut planner = Planner::new(engine)?;
    planner.run(session_id).await
}
