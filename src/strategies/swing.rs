// src/strategies/swing.rs
use super::{
    primary_summary, CombinationParams, Strategy, ENTRY_RESPONSE_CONTRACT,
    PRIMARY_RESPONSE_CONTRACT,
};
use crate::types::{PartialAnalysis, TimeframeRequest};
use crate::validation::ValidationConfig;

/// Daily primary trend, 30-minute entry timing.
pub struct SwingStrategy;

impl Strategy for SwingStrategy {
    fn key(&self) -> &'static str {
        "swing"
    }

    fn label(&self) -> &'static str {
        "Swing (Daily + M30)"
    }

    fn required_timeframes(&self) -> [TimeframeRequest; 2] {
        [
            TimeframeRequest {
                interval: "1day",
                bar_count: 120,
            },
            TimeframeRequest {
                interval: "30min",
                bar_count: 100,
            },
        ]
    }

    fn build_primary_prompt(&self, pair: &str) -> String {
        format!(
            "You are a senior swing trader analyzing the daily chart of {pair}.\n\
             Identify the dominant trend over the shown bars, the most relevant \
             price pattern, and the single strongest support or resistance zone \
             a swing entry could be staged from. Daily swing zones should be \
             meaningful bands, not single prices.\n\n{contract}",
            pair = pair,
            contract = PRIMARY_RESPONSE_CONTRACT
        )
    }

    fn build_entry_prompt(&self, pair: &str, primary: &PartialAnalysis) -> String {
        format!(
            "You are timing a swing entry on the 30-minute chart of {pair}.\n\
             {summary}\n\
             Judge whether the 30-minute price action confirms that context. \
             Only signal buy or sell when the micro trend and the \
             higher-timeframe trend agree and price is interacting with a \
             usable zone; otherwise signal wait.\n\n{contract}",
            pair = pair,
            summary = primary_summary(primary),
            contract = ENTRY_RESPONSE_CONTRACT
        )
    }

    fn validation_config(&self) -> ValidationConfig {
        ValidationConfig {
            min_zone_pips: 15.0,
            max_zone_pips: 150.0,
            boundary_margin: 0.10,
        }
    }

    fn combination_params(&self) -> CombinationParams {
        CombinationParams::default()
    }
}
