//! Itinerary composer
//!
//! Turns the travel option tables into a day-by-day plan. Faults propagate.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use super::{AgentContext, AgentError};
use crate::domain::TravelOptions;
use crate::prompts::COMPOSER_TEMPLATE;

static BLANK_RUNS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\n{3,}").ok());

#[derive(Serialize)]
struct ComposerPrompt<'a> {
    city: &'a str,
    days: u32,
    flights: String,
    hotels: String,
    attractions: String,
}

/// Trim the text and collapse runs of blank lines to a single blank line
pub fn tidy_itinerary(text: &str) -> String {
    let text = text.trim().replace("\r\n", "\n");
    match BLANK_RUNS.as_ref() {
        Some(re) => re.replace_all(&text, "\n\n").into_owned(),
        None => text,
    }
}

/// Itinerary writing agent
pub struct ItineraryComposer {
    ctx: AgentContext,
}

impl ItineraryComposer {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Compose a `duration_days` itinerary for `city` from the option tables
    pub async fn compose(&self, options: &TravelOptions, duration_days: u32, city: &str) -> Result<String, AgentError> {
        debug!(%city, %duration_days, flights = options.flights.len(), hotels = options.hotels.len(), "compose: called");
        let vars = ComposerPrompt {
            city,
            days: duration_days,
            flights: options.flights_table(),
            hotels: options.hotels_table(),
            attractions: options.attractions_table(),
        };

        // free-form prose: provider default temperature
        let text = self.ctx.ask(COMPOSER_TEMPLATE, &vars, None).await?;
        let itinerary = tidy_itinerary(&text);
        info!(%city, chars = itinerary.len(), "compose: itinerary ready");
        Ok(itinerary)
    }
}
