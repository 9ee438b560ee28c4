// src/quotes.rs
// Quote provider client - fetches OHLCV time series for a pair/interval.

use crate::errors::AnalysisError;
use crate::types::CandleData;
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::env;

/// Seam between the orchestrator and the upstream quote API, so tests can
/// substitute canned bars.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch up to `bar_count` bars, returned oldest-to-newest.
    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: &str,
        bar_count: usize,
    ) -> Result<Vec<CandleData>, AnalysisError>;

    fn has_credentials(&self) -> bool {
        true
    }
}

// --- Twelve Data style REST client ---

#[derive(Deserialize, Debug)]
struct TimeSeriesResponse {
    #[serde(default)]
    values: Vec<RawBar>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// The provider encodes all numerics as strings.
#[derive(Deserialize, Debug)]
struct RawBar {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: Option<String>,
}

pub struct TwelveDataClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TwelveDataClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    /// Reads QUOTE_API_KEY / QUOTE_API_BASE. A missing key does not fail
    /// construction; the orchestrator checks credentials per request.
    pub fn from_env() -> Self {
        let api_key = env::var("QUOTE_API_KEY").unwrap_or_default();
        let base_url =
            env::var("QUOTE_API_BASE").unwrap_or_else(|_| "https://api.twelvedata.com".to_string());
        if api_key.is_empty() {
            warn!("[QUOTES] QUOTE_API_KEY not set - quote requests will be rejected");
        }
        Self::new(api_key, base_url)
    }

    fn parse_bar(raw: &RawBar) -> Result<CandleData, AnalysisError> {
        let parse_price = |field: &str, value: &str| -> Result<f64, AnalysisError> {
            value.parse::<f64>().map_err(|_| {
                AnalysisError::Provider(format!(
                    "quote provider returned non-numeric {}: '{}'",
                    field, value
                ))
            })
        };
        Ok(CandleData {
            time: raw.datetime.clone(),
            open: parse_price("open", &raw.open)?,
            high: parse_price("high", &raw.high)?,
            low: parse_price("low", &raw.low)?,
            close: parse_price("close", &raw.close)?,
            volume: raw
                .volume
                .as_deref()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0),
        })
    }
}

#[async_trait]
impl QuoteProvider for TwelveDataClient {
    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: &str,
        bar_count: usize,
    ) -> Result<Vec<CandleData>, AnalysisError> {
        let url = format!("{}/time_series", self.base_url);
        debug!(
            "[QUOTES] Fetching {} bars of {} {}",
            bar_count, symbol, interval
        );

        let outputsize = bar_count.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("outputsize", outputsize.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Provider(format!(
                "quote API returned {}: {}",
                status, body
            )));
        }

        let payload: TimeSeriesResponse = response.json().await?;

        if payload.status.as_deref() == Some("error") {
            return Err(AnalysisError::Provider(format!(
                "quote API error for {}: {}",
                symbol,
                payload.message.unwrap_or_else(|| "no message".to_string())
            )));
        }

        if payload.values.is_empty() {
            return Err(AnalysisError::Provider(format!(
                "quote API returned no bars for {} {}",
                symbol, interval
            )));
        }

        let mut bars = payload
            .values
            .iter()
            .map(Self::parse_bar)
            .collect::<Result<Vec<_>, _>>()?;

        // The provider sends newest-first; everything downstream assumes
        // oldest-to-newest. Timestamps are ISO-8601 so a string sort holds.
        bars.sort_by(|a, b| a.time.cmp(&b.time));

        debug!(
            "[QUOTES] Got {} bars for {} {} ({} .. {})",
            bars.len(),
            symbol,
            interval,
            bars.first().map(|b| b.time.as_str()).unwrap_or("-"),
            bars.last().map(|b| b.time.as_str()).unwrap_or("-")
        );

        Ok(bars)
    }

    fn has_credentials(&self) -> bool {
        !self.api_key.is_empty()
    }
}
