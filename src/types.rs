// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Market data ---

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CandleData {
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// One timeframe slot of a strategy (primary or entry).
#[derive(Debug, Clone, Copy)]
pub struct TimeframeRequest {
    pub interval: &'static str,
    pub bar_count: usize,
}

// --- AI analysis output ---

/// Support/resistance band returned by the model. Bounds are optional on
/// purpose: the model omitting one is a validation error, not a parse error.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Zone {
    pub price_low: Option<f64>,
    pub price_high: Option<f64>,
}

impl Zone {
    pub fn new(price_low: f64, price_high: f64) -> Self {
        Self {
            price_low: Some(price_low),
            price_high: Some(price_high),
        }
    }

    /// Both bounds, when present and finite.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.price_low, self.price_high) {
            (Some(lo), Some(hi)) if lo.is_finite() && hi.is_finite() => Some((lo, hi)),
            _ => None,
        }
    }
}

/// Parsed output of a single AI call for one timeframe.
/// The entry-timeframe variant reports its trend as `micro_trend` and may
/// carry an explicit `entry_signal` hint; both map onto the same shape here.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PartialAnalysis {
    #[serde(alias = "micro_trend")]
    pub trend: String,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub zone: Option<Zone>,
    #[serde(default)]
    pub entry_signal: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    pub confidence: f64,
}

// --- Combined result ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Wait,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Buy => write!(f, "buy"),
            Signal::Sell => write!(f, "sell"),
            Signal::Wait => write!(f, "wait"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TimeframeReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ValidationSummary {
    pub primary: TimeframeReport,
    pub entry: TimeframeReport,
}

impl ValidationSummary {
    /// Warnings never invalidate a setup, only errors do.
    pub fn is_valid(&self) -> bool {
        self.primary.errors.is_empty() && self.entry.errors.is_empty()
    }
}

/// One rendered chart. PNG bytes stay out of JSON snapshots; the REST layer
/// re-encodes them as base64 where needed.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ChartImage {
    pub interval: String,
    #[serde(skip)]
    pub png: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CombinedAnalysis {
    pub pair: String,
    pub strategy: String,
    pub signal: Signal,
    pub confidence: f64,
    pub valid: bool,
    pub validation: ValidationSummary,
    pub stop_loss: Option<f64>,
    pub take_profit_1: Option<f64>,
    pub take_profit_2: Option<f64>,
    pub primary: PartialAnalysis,
    pub entry: PartialAnalysis,
    #[serde(skip)]
    pub charts: Vec<ChartImage>,
    pub created_at: DateTime<Utc>,
}

// --- REST surface ---

#[derive(Deserialize, Debug, Clone)]
pub struct RunAnalysisRequest {
    pub pair: String,
    pub strategy: String,
    /// "forex" or "gold"; informational - the pair symbol already carries it.
    #[serde(default)]
    pub market: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct ChartPayload {
    pub interval: String,
    pub image_base64: String,
}

#[derive(Serialize, Debug)]
pub struct AnalysisResponse {
    pub pair: String,
    pub strategy: String,
    pub signal: Signal,
    pub confidence: f64,
    pub valid: bool,
    pub validation: ValidationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_2: Option<f64>,
    pub primary: PartialAnalysis,
    pub entry: PartialAnalysis,
    pub charts: Vec<ChartPayload>,
    pub created_at: DateTime<Utc>,
}
