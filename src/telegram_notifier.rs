// src/telegram_notifier.rs
use crate::strategies::strategy_for;
use crate::types::{CombinedAnalysis, Signal};
use log::{error, info, warn};
use reqwest::multipart;
use reqwest::Client;
use serde_json::json;
use std::env;

pub struct TelegramNotifier {
    client: Client,
    bot_token: Option<String>,
    chat_id: Option<String>,
    api_base: String,
    enabled: bool,
}

impl TelegramNotifier {
    pub fn new() -> Self {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN").ok();
        let chat_id = env::var("TELEGRAM_CHAT_ID").ok();

        let enabled = bot_token.is_some() && chat_id.is_some();

        if enabled {
            info!("📱 Telegram notifier initialized");
        } else {
            warn!("📱 Telegram notifier disabled - missing TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID");
        }

        Self {
            client: Client::new(),
            bot_token,
            chat_id,
            api_base: "https://api.telegram.org".to_string(),
            enabled,
        }
    }

    #[cfg(test)]
    fn with_endpoint(bot_token: &str, chat_id: &str, api_base: &str) -> Self {
        Self {
            client: Client::new(),
            bot_token: Some(bot_token.to_string()),
            chat_id: Some(chat_id.to_string()),
            api_base: api_base.to_string(),
            enabled: true,
        }
    }

    /// Deliver a finished analysis: one caption message plus one photo per
    /// chart. Delivery failures - transport errors included - are logged,
    /// never propagated; the analysis itself already succeeded.
    pub async fn send_analysis(&self, analysis: &CombinedAnalysis) {
        if !self.enabled {
            return;
        }

        let bot_token = self.bot_token.as_ref().unwrap();
        let chat_id = self.chat_id.as_ref().unwrap();

        let message = build_analysis_message(analysis);

        let url = format!("{}/bot{}/sendMessage", self.api_base, bot_token);
        let payload = json!({
            "chat_id": chat_id,
            "text": message,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true
        });

        let response = match self.client.post(&url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("📱 Failed to send Telegram analysis: {}", e);
                return;
            }
        };

        if response.status().is_success() {
            info!(
                "📱 Telegram analysis sent for {} {} ({})",
                analysis.pair, analysis.strategy, analysis.signal
            );
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("📱 Failed to send Telegram analysis: {}", error_text);
            return;
        }

        for chart in &analysis.charts {
            if let Err(e) = self
                .send_chart_photo(bot_token, chat_id, &analysis.pair, &chart.interval, &chart.png)
                .await
            {
                error!(
                    "📱 Failed to send {} chart for {}: {}",
                    chart.interval, analysis.pair, e
                );
            }
        }
    }

    async fn send_chart_photo(
        &self,
        bot_token: &str,
        chat_id: &str,
        pair: &str,
        interval: &str,
        png: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/bot{}/sendPhoto", self.api_base, bot_token);

        let part = multipart::Part::bytes(png.to_vec())
            .file_name(format!(
                "{}_{}.png",
                pair.replace('/', ""),
                interval
            ))
            .mime_str("image/png")?;
        let form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", format!("{} {} chart", pair, interval))
            .part("photo", part);

        let response = self.client.post(&url).multipart(form).send().await?;

        if response.status().is_success() {
            info!("📱 Chart photo sent for {} {}", pair, interval);
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(format!("sendPhoto failed: {}", error_text).into())
        }
    }
}

fn build_analysis_message(analysis: &CombinedAnalysis) -> String {
    let emoji = match analysis.signal {
        Signal::Buy => "🟢",
        Signal::Sell => "🔴",
        Signal::Wait => "🟡",
    };
    let validity = if analysis.valid { "✅ Valid setup" } else { "⚠️ Setup did not validate" };

    // Human-readable strategy label when the key resolves; snapshots loaded
    // from older history rows may carry keys that no longer do.
    let strategy_label = strategy_for(&analysis.strategy)
        .map(|s| s.label().to_string())
        .unwrap_or_else(|_| analysis.strategy.clone());

    let zone_text = analysis
        .entry
        .zone
        .as_ref()
        .and_then(|z| z.bounds())
        .map(|(lo, hi)| format!("`{:.5} - {:.5}`", lo, hi))
        .unwrap_or_else(|| "`n/a`".to_string());

    let level = |v: Option<f64>| {
        v.map(|p| format!("`{:.5}`", p))
            .unwrap_or_else(|| "`n/a`".to_string())
    };

    let mut message = format!(
        "{} *{} SIGNAL* {}\n\
        \n\
        📊 *Pair:* `{}`\n\
        🧭 *Strategy:* `{}`\n\
        💪 *Confidence:* `{:.0}%`\n\
        📍 *Zone:* {}\n\
        🛑 *Stop Loss:* {}\n\
        🎯 *TP1:* {} | *TP2:* {}\n\
        \n\
        {}",
        emoji,
        analysis.signal.to_string().to_uppercase(),
        emoji,
        analysis.pair,
        strategy_label,
        analysis.confidence * 100.0,
        zone_text,
        level(analysis.stop_loss),
        level(analysis.take_profit_1),
        level(analysis.take_profit_2),
        validity
    );

    let issues: Vec<String> = analysis
        .validation
        .primary
        .errors
        .iter()
        .chain(analysis.validation.entry.errors.iter())
        .map(|e| format!("❌ {}", e))
        .chain(
            analysis
                .validation
                .primary
                .warnings
                .iter()
                .chain(analysis.validation.entry.warnings.iter())
                .map(|w| format!("⚠️ {}", w)),
        )
        .collect();

    if !issues.is_empty() {
        message.push_str("\n\n*Validation notes:*\n");
        message.push_str(&issues.join("\n"));
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChartImage, PartialAnalysis, ValidationSummary, Zone};
    use chrono::Utc;

    fn sample() -> CombinedAnalysis {
        CombinedAnalysis {
            pair: "EUR/USD".to_string(),
            strategy: "swing".to_string(),
            signal: Signal::Buy,
            confidence: 0.75,
            valid: false,
            validation: ValidationSummary {
                primary: crate::types::TimeframeReport {
                    errors: vec!["zone is missing price_low".to_string()],
                    warnings: vec![],
                },
                entry: Default::default(),
            },
            stop_loss: Some(1.0950),
            take_profit_1: Some(1.1050),
            take_profit_2: Some(1.1100),
            primary: PartialAnalysis {
                trend: "bullish".to_string(),
                pattern: None,
                zone: None,
                entry_signal: None,
                reasoning: None,
                confidence: 0.8,
            },
            entry: PartialAnalysis {
                trend: "bullish".to_string(),
                pattern: None,
                zone: Some(Zone::new(1.0980, 1.1000)),
                entry_signal: Some("buy".to_string()),
                reasoning: None,
                confidence: 0.7,
            },
            charts: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn message_carries_signal_and_validation_notes() {
        let message = build_analysis_message(&sample());
        assert!(message.contains("BUY"));
        assert!(message.contains("EUR/USD"));
        assert!(message.contains("75%"));
        assert!(message.contains("zone is missing price_low"));
        assert!(message.contains("did not validate"));
    }

    #[test]
    fn message_uses_the_strategy_display_label() {
        let message = build_analysis_message(&sample());
        assert!(message.contains("Swing (Daily + M30)"));

        let mut unknown = sample();
        unknown.strategy = "legacy_grid".to_string();
        let message = build_analysis_message(&unknown);
        assert!(message.contains("legacy_grid"));
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed_and_logged() {
        // Nothing listens on the discard port; the sendMessage POST fails at
        // the transport level. send_analysis must still return normally.
        let notifier = TelegramNotifier::with_endpoint("token", "42", "http://127.0.0.1:9");
        let mut analysis = sample();
        analysis.charts = vec![ChartImage {
            interval: "30min".to_string(),
            png: vec![0u8; 16],
        }];
        notifier.send_analysis(&analysis).await;
    }
}
