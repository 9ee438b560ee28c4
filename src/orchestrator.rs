// src/orchestrator.rs
// The two-stage multi-timeframe analysis pipeline. Strictly sequential:
// the entry prompt depends on the parsed primary analysis, so the primary
// AI call must complete before the entry call is built.

use crate::analyzer::AnalysisModel;
use crate::charts::{render_chart, ChartAnnotations};
use crate::errors::AnalysisError;
use crate::formatter::format_for_ai;
use crate::history::HistoryStore;
use crate::quotes::QuoteProvider;
use crate::strategies::{strategy_for, Strategy};
use crate::types::{ChartImage, CombinedAnalysis, PartialAnalysis, Signal, ValidationSummary};
use crate::validation::{trend_contradicts, validate_zone};
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;

pub struct AnalysisOrchestrator {
    quotes: Arc<dyn QuoteProvider>,
    model: Arc<dyn AnalysisModel>,
    history: Option<Arc<HistoryStore>>,
}

impl AnalysisOrchestrator {
    pub fn new(
        quotes: Arc<dyn QuoteProvider>,
        model: Arc<dyn AnalysisModel>,
        history: Option<Arc<HistoryStore>>,
    ) -> Self {
        Self {
            quotes,
            model,
            history,
        }
    }

    /// Run the full pipeline for one pair/strategy. Any credential, provider
    /// or parse failure aborts the run; a setup failing validation does NOT -
    /// the result comes back with `valid = false` and charts attached.
    pub async fn run_analysis(
        &self,
        pair: &str,
        strategy_name: &str,
    ) -> Result<CombinedAnalysis, AnalysisError> {
        // Credentials are checked before any network call.
        if !self.quotes.has_credentials() {
            return Err(AnalysisError::Credential(
                "quote API key is not configured".to_string(),
            ));
        }
        if !self.model.has_credentials() {
            return Err(AnalysisError::Credential(
                "AI API key is not configured".to_string(),
            ));
        }

        let strategy = strategy_for(strategy_name)?;
        let [primary_tf, entry_tf] = strategy.required_timeframes();

        info!(
            "[ORCHESTRATOR] Starting {} analysis for {} ({} + {})",
            strategy.key(),
            pair,
            primary_tf.interval,
            entry_tf.interval
        );

        let primary_bars = self
            .quotes
            .fetch_bars(pair, primary_tf.interval, primary_tf.bar_count)
            .await?;
        let primary_data = format_for_ai(&primary_bars, pair, primary_tf.interval);
        let primary = self
            .model
            .analyze(&strategy.build_primary_prompt(pair), &primary_data)
            .await?;
        debug!(
            "[ORCHESTRATOR] Primary {} analysis: trend={} confidence={:.2}",
            primary_tf.interval, primary.trend, primary.confidence
        );

        let entry_bars = self
            .quotes
            .fetch_bars(pair, entry_tf.interval, entry_tf.bar_count)
            .await?;
        let entry_data = format_for_ai(&entry_bars, pair, entry_tf.interval);
        let entry = self
            .model
            .analyze(&strategy.build_entry_prompt(pair, &primary), &entry_data)
            .await?;
        debug!(
            "[ORCHESTRATOR] Entry {} analysis: trend={} signal={:?} confidence={:.2}",
            entry_tf.interval, entry.trend, entry.entry_signal, entry.confidence
        );

        let mut combined = combine(pair, strategy_name, strategy.as_ref(), primary, entry);

        // Charts are always rendered, valid or not, so the setup can be
        // inspected visually. Primary first, entry last. The entry chart
        // carries the trade levels; the primary chart shows its own zone.
        let primary_annotations = ChartAnnotations {
            zone: combined.primary.zone.as_ref().and_then(|z| z.bounds()),
            ..Default::default()
        };
        let entry_annotations = ChartAnnotations {
            zone: combined.entry.zone.as_ref().and_then(|z| z.bounds()),
            stop_loss: combined.stop_loss,
            take_profit_1: combined.take_profit_1,
            take_profit_2: combined.take_profit_2,
        };
        combined.charts = vec![
            ChartImage {
                interval: primary_tf.interval.to_string(),
                png: render_chart(&primary_bars, &primary_annotations)?,
            },
            ChartImage {
                interval: entry_tf.interval.to_string(),
                png: render_chart(&entry_bars, &entry_annotations)?,
            },
        ];

        if let Some(history) = &self.history {
            // The analysis already succeeded; a bookkeeping failure is
            // logged, not surfaced.
            if let Err(e) = history.record_analysis(&combined) {
                warn!("[ORCHESTRATOR] Failed to record analysis history: {}", e);
            }
        }

        info!(
            "[ORCHESTRATOR] Completed {} {}: signal={} confidence={:.2} valid={}",
            strategy.key(),
            pair,
            combined.signal,
            combined.confidence,
            combined.valid
        );

        Ok(combined)
    }

    /// Same pipeline, additionally snapshotting the full result as the
    /// user's "last analysis" for later conversational reference.
    pub async fn run_analysis_for_user(
        &self,
        user_id: i64,
        pair: &str,
        strategy_name: &str,
    ) -> Result<CombinedAnalysis, AnalysisError> {
        let combined = self.run_analysis(pair, strategy_name).await?;
        if let Some(history) = &self.history {
            if let Err(e) = history.save_last_analysis(user_id, &combined) {
                warn!(
                    "[ORCHESTRATOR] Failed to save last analysis for user {}: {}",
                    user_id, e
                );
            }
        }
        Ok(combined)
    }
}

/// Direction the entry analysis points at: the explicit entry_signal when
/// the model gave one, otherwise derived from the micro trend.
pub fn entry_direction(entry: &PartialAnalysis) -> Signal {
    let hint = entry
        .entry_signal
        .as_deref()
        .map(|s| s.trim().to_ascii_lowercase());
    match hint.as_deref() {
        Some("buy") => Signal::Buy,
        Some("sell") => Signal::Sell,
        Some("wait") => Signal::Wait,
        _ => {
            if entry.trend.eq_ignore_ascii_case("bullish") {
                Signal::Buy
            } else if entry.trend.eq_ignore_ascii_case("bearish") {
                Signal::Sell
            } else {
                Signal::Wait
            }
        }
    }
}

/// Merge the two partial analyses into one result: derive signal and
/// confidence, run structural validation, derive stop/targets.
pub fn combine(
    pair: &str,
    strategy_name: &str,
    strategy: &dyn Strategy,
    primary: PartialAnalysis,
    entry: PartialAnalysis,
) -> CombinedAnalysis {
    let cfg = strategy.validation_config();
    let params = strategy.combination_params();

    let mut validation = ValidationSummary {
        primary: validate_zone(primary.zone.as_ref(), pair, &cfg),
        entry: validate_zone(entry.zone.as_ref(), pair, &cfg),
    };

    let direction = entry_direction(&entry);
    let mut confidence =
        (primary.confidence.clamp(0.0, 1.0) + entry.confidence.clamp(0.0, 1.0)) / 2.0;

    let signal = if trend_contradicts(&primary.trend, direction) {
        // A contradicted entry is never traded silently: the conflict is
        // surfaced as a warning and the confidence takes the penalty.
        validation.entry.warnings.push(format!(
            "entry signal '{}' contradicts the {} primary trend",
            direction, primary.trend
        ));
        confidence *= params.contradiction_penalty;
        Signal::Wait
    } else {
        if direction != Signal::Wait {
            confidence = (confidence + params.agreement_bonus).min(1.0);
        }
        direction
    };

    let (stop_loss, take_profit_1, take_profit_2) =
        derive_levels(&entry, &primary, direction);

    let valid = validation.is_valid();

    CombinedAnalysis {
        pair: pair.to_string(),
        strategy: strategy_name.to_string(),
        signal,
        confidence: confidence.clamp(0.0, 1.0),
        valid,
        validation,
        stop_loss,
        take_profit_1,
        take_profit_2,
        primary,
        entry,
        charts: Vec::new(),
        created_at: Utc::now(),
    }
}

/// Stop and targets derived from the entry zone as width multiples.
/// On a wait signal the dominant trend still picks the direction so the
/// charts stay annotated.
fn derive_levels(
    entry: &PartialAnalysis,
    primary: &PartialAnalysis,
    direction: Signal,
) -> (Option<f64>, Option<f64>, Option<f64>) {
    let (lo, hi) = match entry.zone.as_ref().and_then(|z| z.bounds()) {
        Some(bounds) => bounds,
        None => return (None, None, None),
    };
    let width = hi - lo;
    if width <= 0.0 {
        return (None, None, None);
    }

    let effective = match direction {
        Signal::Wait => {
            if primary.trend.eq_ignore_ascii_case("bearish") {
                Signal::Sell
            } else {
                Signal::Buy
            }
        }
        other => other,
    };

    match effective {
        Signal::Buy => (
            Some(lo - 0.25 * width),
            Some(hi + 1.0 * width),
            Some(hi + 2.0 * width),
        ),
        Signal::Sell => (
            Some(hi + 0.25 * width),
            Some(lo - 1.0 * width),
            Some(lo - 2.0 * width),
        ),
        Signal::Wait => unreachable!("wait resolved to a direction above"),
    }
}
