// src/strategies/scalping.rs
use super::{
    primary_summary, CombinationParams, Strategy, ENTRY_RESPONSE_CONTRACT,
    PRIMARY_RESPONSE_CONTRACT,
};
use crate::types::{PartialAnalysis, TimeframeRequest};
use crate::validation::ValidationConfig;

/// 15-minute primary context, 5-minute entry timing.
pub struct ScalpingStrategy;

impl Strategy for ScalpingStrategy {
    fn key(&self) -> &'static str {
        "scalping"
    }

    fn label(&self) -> &'static str {
        "Scalping (M15 + M5)"
    }

    fn required_timeframes(&self) -> [TimeframeRequest; 2] {
        [
            TimeframeRequest {
                interval: "15min",
                bar_count: 100,
            },
            TimeframeRequest {
                interval: "5min",
                bar_count: 100,
            },
        ]
    }

    fn build_primary_prompt(&self, pair: &str) -> String {
        format!(
            "You are an intraday scalper analyzing the 15-minute chart of {pair}.\n\
             Identify the short-term trend, the most relevant intraday price \
             pattern, and the tightest actionable support or resistance zone. \
             Scalping zones must be narrow and recent - ignore levels the \
             market has not touched within the shown bars.\n\n{contract}",
            pair = pair,
            contract = PRIMARY_RESPONSE_CONTRACT
        )
    }

    fn build_entry_prompt(&self, pair: &str, primary: &PartialAnalysis) -> String {
        format!(
            "You are timing a scalp entry on the 5-minute chart of {pair}.\n\
             {summary}\n\
             Judge whether the 5-minute price action confirms that context. \
             Scalps need immediate confluence: only signal buy or sell when \
             the micro trend agrees with the 15-minute trend and price is at \
             the zone right now; otherwise signal wait.\n\n{contract}",
            pair = pair,
            summary = primary_summary(primary),
            contract = ENTRY_RESPONSE_CONTRACT
        )
    }

    fn validation_config(&self) -> ValidationConfig {
        ValidationConfig {
            min_zone_pips: 3.0,
            max_zone_pips: 30.0,
            boundary_margin: 0.10,
        }
    }

    fn combination_params(&self) -> CombinationParams {
        // Scalps punish disagreement harder - a contradicted scalp is noise.
        CombinationParams {
            agreement_bonus: 0.05,
            contradiction_penalty: 0.5,
        }
    }
}
