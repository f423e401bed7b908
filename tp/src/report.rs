//! Terminal rendering of trip sessions
//!
//! Shared by the one-shot subcommands and the interactive planner.

use colored::Colorize;

use crate::domain::{AlternativeOption, Step, SuitabilityDecision, TripSession, Verdict};
use crate::workflow::Effect;

/// Progress line shown while an effect runs
pub fn effect_message(effect: Effect) -> &'static str {
    match effect {
        Effect::FetchWeather => "Fetching weather...",
        Effect::Judge => "Analyzing weather suitability...",
        Effect::FindAlternatives => "Looking for destinations with better weather...",
        Effect::AutoAdvance => "Weather looks good, moving on to your itinerary...",
        Effect::FetchTravelOptions => "Searching flights, hotels and attractions...",
        Effect::ComposeItinerary => "Writing your itinerary...",
    }
}

pub fn render_decision(decision: &SuitabilityDecision) -> String {
    let mut out = String::new();
    let verdict = match decision.verdict {
        Verdict::Suitable => "Weather is suitable for travel".green().bold(),
        Verdict::NotSuitable => "Weather is not ideal for travel".yellow().bold(),
    };
    out.push_str(&format!("{}\n", verdict));
    out.push_str(&format!("  {} {}\n", "Reasoning:".bold(), decision.reasoning));
    if !decision.concerns.is_empty() {
        out.push_str(&format!("  {}\n", "Concerns:".bold()));
        for concern in &decision.concerns {
            out.push_str(&format!("    - {}\n", concern));
        }
    }
    out.push_str(&format!("  {} {}\n", "Recommendation:".bold(), decision.recommendation));
    out
}

pub fn render_alternatives(alternatives: &[AlternativeOption]) -> String {
    if alternatives.is_empty() {
        return format!("{}\n", "No alternative destinations could be suggested.".dimmed());
    }
    let mut out = format!("{}\n", "Alternative destinations:".bright_cyan());
    for (i, alt) in alternatives.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, alt.city.bold()));
        if !alt.reason.is_empty() {
            out.push_str(&format!("     {}\n", alt.reason));
        }
        if !alt.expected_weather.is_empty() {
            out.push_str(&format!("     Expected weather: {}\n", alt.expected_weather));
        }
    }
    out
}

/// The options a waiting session offers, as typed for `tp choose`
pub fn render_choices(session: &TripSession) -> String {
    let mut out = String::from("Choose: continue, different-date, different-city, restart");
    if session.alternatives.as_ref().is_some_and(|a| !a.is_empty()) {
        out.push_str(", or an alternative number");
    }
    out.push('\n');
    out
}

/// Full text view of a session
pub fn render_session(session: &TripSession) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}  (step {}: {})\n",
        "Session".bright_cyan().bold(),
        session.id,
        session.step.number(),
        session.step.title()
    ));

    let Some(context) = &session.context else {
        out.push_str("  No trip details yet.\n");
        return out;
    };
    out.push_str(&format!(
        "  {} -> {} on {} for {} days\n",
        context.starting_city, context.destination_city, context.travel_date, context.duration_days
    ));

    if session.step == Step::CollectInput {
        out.push_str(&format!("  {}\n", "Waiting for new trip details.".dimmed()));
    }

    if let Some(weather) = session.current_weather() {
        out.push('\n');
        out.push_str(&format!("{}\n{}\n", "Weather:".bold(), weather.text.trim_end()));
    }

    if let Some(decision) = session.current_decision() {
        out.push('\n');
        out.push_str(&render_decision(decision));
    }

    if session.awaiting_choice()
        && let Some(alternatives) = &session.alternatives
    {
        out.push('\n');
        out.push_str(&render_alternatives(alternatives));
        out.push_str(&render_choices(session));
    }

    if let Some(itinerary) = session.current_itinerary() {
        out.push('\n');
        out.push_str(&format!("{}\n", "Flights:".bold()));
        out.push_str(&itinerary.options.flights_table());
        out.push_str(&format!("\n\n{}\n", "Hotels:".bold()));
        out.push_str(&itinerary.options.hotels_table());
        out.push_str(&format!("\n\n{}\n", "Attractions:".bold()));
        out.push_str(&itinerary.options.attractions_table());
        out.push_str(&format!("\n\n{}\n{}\n", "Itinerary:".bright_green().bold(), itinerary.text));
    }

    if let Some(error) = &session.last_error {
        out.push('\n');
        out.push_str(&format!("{} {}\n", "Error:".red().bold(), error));
        out.push_str(&format!("Run {} to retry.\n", format!("tp resume {}", session.id).yellow()));
    }
    out
}

/// One line per session for `tp list`
pub fn render_summary(session: &TripSession) -> String {
    let route = session
        .context
        .as_ref()
        .map(|c| format!("{} -> {} ({})", c.starting_city, c.destination_city, c.travel_date))
        .unwrap_or_else(|| "-".to_string());
    let marker = if session.last_error.is_some() {
        "!".red().to_string()
    } else {
        " ".to_string()
    };
    format!("{}{:<32} step {}  {}", marker, session.id, session.step.number(), route)
}
