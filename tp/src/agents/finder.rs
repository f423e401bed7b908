//! Alternative destination finder
//!
//! Asked only after a NOT_SUITABLE verdict. Any fault yields an empty list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::normalize::{json_kind, parse_json};
use super::{AgentContext, AgentError, AgentOutcome};
use crate::domain::AlternativeOption;
use crate::prompts::FINDER_TEMPLATE;

#[derive(Serialize)]
struct FinderPrompt<'a> {
    original_destination: &'a str,
    starting_city: &'a str,
    travel_date: String,
    reason: &'a str,
    count: usize,
}

#[derive(Deserialize)]
struct RawAlternative {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    expected_weather: Option<String>,
}

/// Parse the model's answer, dropping entries without a city and keeping at most `limit`
pub fn parse_alternatives(raw: &str, limit: usize) -> Result<Vec<AlternativeOption>, AgentError> {
    let entries = match parse_json(raw)? {
        serde_json::Value::Object(mut wrapper) => match wrapper.remove("alternatives") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(list)) => list,
            Some(other) => {
                return Err(AgentError::Malformed(format!(
                    "alternatives must be an array, got {}",
                    json_kind(&other)
                )));
            }
        },
        serde_json::Value::Array(list) => list,
        other => {
            return Err(AgentError::Malformed(format!(
                "expected a JSON object or array, got {}",
                json_kind(&other)
            )));
        }
    };
    let entries = entries
        .into_iter()
        .map(|entry| {
            if !entry.is_object() {
                return Err(AgentError::Malformed(format!(
                    "alternative must be a JSON object, got {}",
                    json_kind(&entry)
                )));
            }
            serde_json::from_value::<RawAlternative>(entry).map_err(|e| AgentError::Malformed(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries
        .into_iter()
        .filter_map(|a| {
            let city = a.city.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())?;
            Some(AlternativeOption::new(
                city,
                a.reason.unwrap_or_default(),
                a.expected_weather.unwrap_or_default(),
            ))
        })
        .take(limit)
        .collect())
}

/// Alternative destination agent
pub struct AlternativeFinder {
    ctx: AgentContext,
    max_alternatives: usize,
}

impl AlternativeFinder {
    pub fn new(ctx: AgentContext, max_alternatives: usize) -> Self {
        Self { ctx, max_alternatives }
    }

    /// Suggest destinations reachable from `starting_city` with better weather
    pub async fn suggest(
        &self,
        original_destination: &str,
        rejection_reason: &str,
        starting_city: &str,
        travel_date: NaiveDate,
    ) -> AgentOutcome<Vec<AlternativeOption>> {
        debug!(%original_destination, %starting_city, %travel_date, "suggest: called");
        let vars = FinderPrompt {
            original_destination,
            starting_city,
            travel_date: travel_date.to_string(),
            reason: rejection_reason,
            count: self.max_alternatives,
        };

        let result = self
            .ctx
            .ask(FINDER_TEMPLATE, &vars, self.ctx.settings.temperature)
            .await
            .and_then(|text| parse_alternatives(&text, self.max_alternatives));

        match result {
            Ok(alternatives) => {
                info!(%original_destination, count = alternatives.len(), "suggest: alternatives found");
                AgentOutcome::ok(alternatives)
            }
            Err(e) => {
                warn!(%original_destination, error = %e, "suggest: no alternatives available");
                AgentOutcome::recovered(Vec::new(), format!("Alternative suggestions failed: {}", e))
            }
        }
    }
}
