// src/strategies/mod.rs
use crate::errors::AnalysisError;
use crate::types::{PartialAnalysis, TimeframeRequest};
use crate::validation::ValidationConfig;

/// Knobs for the cross-timeframe combination step.
#[derive(Debug, Clone, Copy)]
pub struct CombinationParams {
    /// Added to the averaged confidence when entry direction matches the
    /// primary trend.
    pub agreement_bonus: f64,
    /// Multiplier applied to confidence when the entry direction contradicts
    /// the primary trend.
    pub contradiction_penalty: f64,
}

impl Default for CombinationParams {
    fn default() -> Self {
        Self {
            agreement_bonus: 0.05,
            contradiction_penalty: 0.6,
        }
    }
}

/// A trading strategy: which two timeframes to analyze and how to prompt the
/// model for each. The entry prompt is always conditioned on the parsed
/// primary analysis.
pub trait Strategy: Send + Sync {
    fn key(&self) -> &'static str;
    fn label(&self) -> &'static str;

    /// [primary, entry]
    fn required_timeframes(&self) -> [TimeframeRequest; 2];

    fn build_primary_prompt(&self, pair: &str) -> String;
    fn build_entry_prompt(&self, pair: &str, primary: &PartialAnalysis) -> String;

    fn validation_config(&self) -> ValidationConfig;

    fn combination_params(&self) -> CombinationParams {
        CombinationParams::default()
    }
}

mod scalping;
mod swing;

pub use scalping::ScalpingStrategy;
pub use swing::SwingStrategy;

/// Resolve a strategy by its registry key.
pub fn strategy_for(name: &str) -> Result<Box<dyn Strategy>, AnalysisError> {
    match name {
        "swing" => Ok(Box::new(SwingStrategy)),
        "scalping" => Ok(Box::new(ScalpingStrategy)),
        other => Err(AnalysisError::Strategy(other.to_string())),
    }
}

/// Registry keys, for surfaces that enumerate strategies.
pub fn strategy_keys() -> &'static [&'static str] {
    &["swing", "scalping"]
}

// Shared tail of every primary prompt: the JSON contract the model must
// honor so the parser can map the reply onto PartialAnalysis.
pub(crate) const PRIMARY_RESPONSE_CONTRACT: &str = r#"Respond with a single JSON object and nothing else, with exactly these fields:
{
  "trend": "bullish" | "bearish" | "neutral",
  "pattern": "<name of the dominant price pattern, or null>",
  "zone": { "price_low": <number>, "price_high": <number> },
  "reasoning": "<2-3 sentences>",
  "confidence": <number between 0 and 1>
}"#;

pub(crate) const ENTRY_RESPONSE_CONTRACT: &str = r#"Respond with a single JSON object and nothing else, with exactly these fields:
{
  "micro_trend": "bullish" | "bearish" | "neutral",
  "entry_signal": "buy" | "sell" | "wait",
  "pattern": "<name of the dominant price pattern, or null>",
  "zone": { "price_low": <number>, "price_high": <number> },
  "reasoning": "<2-3 sentences>",
  "confidence": <number between 0 and 1>
}"#;

/// Condensed primary result embedded into the entry prompt so the model can
/// check cross-timeframe alignment.
pub(crate) fn primary_summary(primary: &PartialAnalysis) -> String {
    let zone_text = primary
        .zone
        .as_ref()
        .and_then(|z| z.bounds())
        .map(|(lo, hi)| format!("{:.5} - {:.5}", lo, hi))
        .unwrap_or_else(|| "not identified".to_string());
    format!(
        "Higher-timeframe context: trend is {} (confidence {:.2}), pattern: {}, key zone: {}.",
        primary.trend,
        primary.confidence,
        primary.pattern.as_deref().unwrap_or("none"),
        zone_text
    )
}
