//! Suitability judge
//!
//! Asks the model whether the weather at the destination suits the trip.
//! Never fails: any fault yields a fallback decision plus a diagnostic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::normalize::{json_kind, parse_json};
use super::{AgentContext, AgentError, AgentOutcome};
use crate::domain::{DEFAULT_REASONING, DEFAULT_RECOMMENDATION, SuitabilityDecision, Verdict};
use crate::prompts::JUDGE_TEMPLATE;

#[derive(Serialize)]
struct JudgePrompt<'a> {
    destination: &'a str,
    travel_date: String,
    weather: &'a str,
}

/// Decision as the model writes it; every field may be missing or null
#[derive(Deserialize)]
struct RawDecision {
    #[serde(default)]
    decision: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    concerns: Option<Vec<String>>,
    #[serde(default)]
    recommendation: Option<String>,
}

/// Parse the model's answer into a decision, defaulting missing fields
pub fn parse_decision(raw: &str) -> Result<SuitabilityDecision, AgentError> {
    let value = parse_json(raw)?;
    if !value.is_object() {
        return Err(AgentError::Malformed(format!("expected a JSON object, got {}", json_kind(&value))));
    }
    let parsed: RawDecision = serde_json::from_value(value).map_err(|e| AgentError::Malformed(e.to_string()))?;

    let verdict = match parsed.decision {
        None => Verdict::Suitable,
        Some(s) => Verdict::parse(&s).ok_or_else(|| AgentError::Malformed(format!("unknown decision '{}'", s)))?,
    };

    Ok(SuitabilityDecision {
        verdict,
        reasoning: parsed.reasoning.unwrap_or_else(|| DEFAULT_REASONING.to_string()),
        concerns: parsed.concerns.unwrap_or_default(),
        recommendation: parsed
            .recommendation
            .unwrap_or_else(|| DEFAULT_RECOMMENDATION.to_string()),
    })
}

/// Weather suitability agent
pub struct SuitabilityJudge {
    ctx: AgentContext,
    fallback_verdict: Verdict,
}

impl SuitabilityJudge {
    pub fn new(ctx: AgentContext, fallback_verdict: Verdict) -> Self {
        Self { ctx, fallback_verdict }
    }

    /// Judge the weather for `destination` on `travel_date`
    pub async fn judge(
        &self,
        weather_text: &str,
        destination: &str,
        travel_date: NaiveDate,
    ) -> AgentOutcome<SuitabilityDecision> {
        debug!(%destination, %travel_date, "judge: called");
        let vars = JudgePrompt {
            destination,
            travel_date: travel_date.to_string(),
            weather: weather_text,
        };

        let result = match self.ctx.ask(JUDGE_TEMPLATE, &vars, self.ctx.settings.temperature).await {
            Ok(text) => parse_decision(&text).map_err(|e| (e, Some(text))),
            Err(e) => Err((e, None)),
        };

        match result {
            Ok(decision) => {
                info!(%destination, verdict = %decision.verdict, "judge: decision reached");
                AgentOutcome::ok(decision)
            }
            Err((e, text)) if e.is_malformed() => {
                let excerpt: String = text.unwrap_or_default().chars().take(200).collect();
                warn!(%destination, error = %e, %excerpt, "judge: unparseable response, using fallback");
                AgentOutcome::recovered(
                    SuitabilityDecision::parse_failure(self.fallback_verdict),
                    format!("Weather analysis could not be parsed: {}", e),
                )
            }
            Err((e, _)) => {
                warn!(%destination, error = %e, "judge: analysis failed, using fallback");
                AgentOutcome::recovered(
                    SuitabilityDecision::analysis_failure(self.fallback_verdict),
                    format!("Weather analysis failed: {}", e),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentSettings;
    use crate::llm::client::mock::MockLlmClient;
    use crate::prompts::PromptLoader;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn judge_with(llm: MockLlmClient, fallback: Verdict) -> (SuitabilityJudge, Arc<MockLlmClient>) {
        let llm = Arc::new(llm);
        let ctx = AgentContext::new(llm.clone(), Arc::new(PromptLoader::embedded_only()), AgentSettings::default());
        (SuitabilityJudge::new(ctx, fallback), llm)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()
    }

    #[tokio::test]
    async fn test_judge_roundtrips_model_decision() {
        let decision = SuitabilityDecision {
            verdict: Verdict::NotSuitable,
            reasoning: "Blizzard expected".to_string(),
            concerns: vec!["-15°C".to_string(), "snow".to_string()],
            recommendation: "Pick another week".to_string(),
        };
        let raw = serde_json::to_string(&decision).unwrap();
        let (judge, llm) = judge_with(MockLlmClient::new(vec![&raw]), Verdict::Suitable);

        let outcome = judge.judge("Temp: -15°C, snow", "Oslo", date()).await;
        assert_eq!(outcome.value, decision);
        assert!(!outcome.is_fallback());

        let prompts = llm.prompts();
        assert!(prompts[0].contains("Weather Data for Oslo on 2026-01-20:"));
        assert!(prompts[0].contains("Temp: -15°C, snow"));
    }

    #[tokio::test]
    async fn test_judge_accepts_fenced_json() {
        let raw = "```json\n{\"decision\": \"NOT_SUITABLE\", \"reasoning\": \"storms\", \"concerns\": [\"wind\"], \"recommendation\": \"wait\"}\n```";
        let (judge, _) = judge_with(MockLlmClient::new(vec![raw]), Verdict::Suitable);
        let outcome = judge.judge("storm", "Miami", date()).await;
        assert_eq!(outcome.value.verdict, Verdict::NotSuitable);
        assert_eq!(outcome.value.concerns, vec!["wind".to_string()]);
    }

    #[tokio::test]
    async fn test_judge_defaults_missing_fields() {
        let (judge, _) = judge_with(MockLlmClient::new(vec!["{\"concerns\": null}"]), Verdict::NotSuitable);
        let outcome = judge.judge("mild", "Lisbon", date()).await;
        assert_eq!(outcome.value, SuitabilityDecision::default());
        assert!(!outcome.is_fallback());
    }

    #[tokio::test]
    async fn test_judge_parse_failure_fallback() {
        let (judge, _) = judge_with(MockLlmClient::new(vec!["The weather looks great!"]), Verdict::Suitable);
        let outcome = judge.judge("sunny", "Rome", date()).await;
        assert_eq!(outcome.value, SuitabilityDecision::parse_failure(Verdict::Suitable));
        assert!(outcome.diagnostic.unwrap().contains("could not be parsed"));
    }

    #[tokio::test]
    async fn test_judge_unknown_verdict_is_parse_failure() {
        let (judge, _) = judge_with(MockLlmClient::new(vec!["{\"decision\": \"MAYBE\"}"]), Verdict::Suitable);
        let outcome = judge.judge("sunny", "Rome", date()).await;
        assert_eq!(outcome.value.reasoning, "Unable to parse weather analysis, proceeding with caution");
    }

    #[tokio::test]
    async fn test_judge_wrong_field_type_is_parse_failure() {
        let (judge, _) = judge_with(MockLlmClient::new(vec!["{\"concerns\": \"wind\"}"]), Verdict::Suitable);
        let outcome = judge.judge("windy", "Chicago", date()).await;
        assert_eq!(outcome.value, SuitabilityDecision::parse_failure(Verdict::Suitable));
    }

    #[tokio::test]
    async fn test_judge_model_error_fallback() {
        let (judge, _) = judge_with(
            MockLlmClient::with_results(vec![Err("overloaded".to_string())]),
            Verdict::Suitable,
        );
        let outcome = judge.judge("sunny", "Rome", date()).await;
        assert_eq!(outcome.value, SuitabilityDecision::analysis_failure(Verdict::Suitable));
        assert!(outcome.diagnostic.unwrap().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_judge_empty_response_fallback_fail_closed() {
        let (judge, _) = judge_with(MockLlmClient::new(vec![""]), Verdict::NotSuitable);
        let outcome = judge.judge("sunny", "Rome", date()).await;
        assert_eq!(outcome.value.verdict, Verdict::NotSuitable);
        assert_eq!(outcome.value.recommendation, "Review weather data manually");
    }

    #[tokio::test]
    async fn test_judge_timeout_fallback() {
        struct SlowClient;

        #[async_trait::async_trait]
        impl crate::llm::LlmClient for SlowClient {
            async fn complete(
                &self,
                _request: crate::llm::CompletionRequest,
            ) -> Result<crate::llm::CompletionResponse, crate::llm::LlmError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(crate::llm::CompletionResponse::text("{}"))
            }
        }

        let settings = AgentSettings {
            timeout: Duration::from_millis(20),
            ..AgentSettings::default()
        };
        let ctx = AgentContext::new(Arc::new(SlowClient), Arc::new(PromptLoader::embedded_only()), settings);
        let judge = SuitabilityJudge::new(ctx, Verdict::Suitable);

        let outcome = judge.judge("sunny", "Rome", date()).await;
        assert_eq!(outcome.value, SuitabilityDecision::analysis_failure(Verdict::Suitable));
        assert!(outcome.diagnostic.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_judge_non_object_json_uses_configured_fallback() {
        let answers = ["[]", "42", "\"42\"", "null", r#"["NOT_SUITABLE", "storm", ["wind"], "stay"]"#];
        for fallback in [Verdict::Suitable, Verdict::NotSuitable] {
            for raw in answers {
                let (judge, _) = judge_with(MockLlmClient::new(vec![raw]), fallback);
                let outcome = judge.judge("storm", "Miami", date()).await;
                assert_eq!(outcome.value, SuitabilityDecision::parse_failure(fallback), "answer {}", raw);
                assert!(outcome.diagnostic.unwrap().contains("could not be parsed"), "answer {}", raw);
            }
        }
    }

    #[tokio::test]
    async fn test_judge_accepts_lowercase_verdict() {
        let raw = r#"{"decision": "not_suitable", "reasoning": "Hurricane", "concerns": ["wind"], "recommendation": "Stay home"}"#;
        let (judge, _) = judge_with(MockLlmClient::new(vec![raw]), Verdict::Suitable);
        let outcome = judge.judge("hurricane warning", "Miami", date()).await;
        assert_eq!(outcome.value.verdict, Verdict::NotSuitable);
        assert_eq!(outcome.value.reasoning, "Hurricane");
        assert!(!outcome.is_fallback());
    }

    #[tokio::test]
    async fn test_judge_truncated_answer_uses_parse_fallback() {
        let ctx = AgentContext::new(
            Arc::new(crate::agents::tests::CutOffClient),
            Arc::new(PromptLoader::embedded_only()),
            AgentSettings::default(),
        );
        let judge = SuitabilityJudge::new(ctx, Verdict::NotSuitable);
        let outcome = judge.judge("storm", "Miami", date()).await;
        assert_eq!(outcome.value, SuitabilityDecision::parse_failure(Verdict::NotSuitable));
        assert!(outcome.diagnostic.unwrap().contains("cut off"));
    }

    #[test]
    fn test_parse_decision_rejects_arrays() {
        let err = parse_decision(r#"["SUITABLE"]"#).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_parse_decision_preserves_fields_verbatim() {
        let decision = parse_decision(
            r#"{"decision":"SUITABLE","reasoning":"  spaced  ","concerns":[],"recommendation":"go"}"#,
        )
        .unwrap();
        assert_eq!(decision.reasoning, "  spaced  ");
    }

    fn verdicts() -> impl Strategy<Value = Verdict> {
        prop_oneof![Just(Verdict::Suitable), Just(Verdict::NotSuitable)]
    }

    proptest! {
        #[test]
        fn prop_judge_roundtrip(
            verdict in verdicts(),
            reasoning in "\\PC*",
            concerns in proptest::collection::vec("\\PC*", 0..5),
            recommendation in "\\PC*",
            fenced in any::<bool>(),
        ) {
            let decision = SuitabilityDecision { verdict, reasoning, concerns, recommendation };
            let json = serde_json::to_string(&decision).unwrap();
            let raw = if fenced { format!("```json\n{}\n```", json) } else { json };
            prop_assert_eq!(parse_decision(&raw).unwrap(), decision);
        }
    }
}
