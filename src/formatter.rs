// src/formatter.rs
// Renders fetched bars as a compact fixed-width table for the AI prompt.

use crate::types::CandleData;

/// Upper bound on bars included in a prompt, to keep prompt size predictable.
pub const MAX_BARS_IN_PROMPT: usize = 50;

/// Deterministic, pure transform of bars into prompt text. Only the most
/// recent `MAX_BARS_IN_PROMPT` bars are rendered.
pub fn format_for_ai(bars: &[CandleData], pair: &str, interval: &str) -> String {
    let window_start = bars.len().saturating_sub(MAX_BARS_IN_PROMPT);
    let window = &bars[window_start..];

    let mut out = String::with_capacity(window.len() * 80 + 200);
    out.push_str(&format!(
        "Market data for {} ({} timeframe), {} bars, oldest first:\n",
        pair,
        interval,
        window.len()
    ));
    out.push_str(&format!(
        "{:<20} {:>12} {:>12} {:>12} {:>12} {:>10}\n",
        "time", "open", "high", "low", "close", "volume"
    ));

    for bar in window {
        out.push_str(&format!(
            "{:<20} {:>12.5} {:>12.5} {:>12.5} {:>12.5} {:>10}\n",
            bar.time, bar.open, bar.high, bar.low, bar.close, bar.volume
        ));
    }

    if let Some(last) = window.last() {
        let window_high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let window_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        out.push_str(&format!(
            "Latest close: {:.5}. Range over shown bars: {:.5} - {:.5}.\n",
            last.close, window_low, window_high
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(time: &str, close: f64) -> CandleData {
        CandleData {
            time: time.to_string(),
            open: close - 0.001,
            high: close + 0.002,
            low: close - 0.002,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn includes_pair_and_interval_labels() {
        let bars = vec![bar("2024-01-01 00:00:00", 1.1000)];
        let text = format_for_ai(&bars, "EUR/USD", "1day");
        assert!(text.contains("EUR/USD"));
        assert!(text.contains("1day"));
        assert!(text.contains("1.10000"));
    }

    #[test]
    fn caps_rendered_bars() {
        let bars: Vec<CandleData> = (0..200)
            .map(|i| bar(&format!("2024-01-01 {:02}:{:02}:00", i / 60, i % 60), 1.1))
            .collect();
        let text = format_for_ai(&bars, "EUR/USD", "5min");
        // Header line + column line + N bar rows + summary line.
        let data_rows = text
            .lines()
            .filter(|l| l.starts_with("2024-01-01"))
            .count();
        assert_eq!(data_rows, MAX_BARS_IN_PROMPT);
        assert!(text.contains(&format!("{} bars", MAX_BARS_IN_PROMPT)));
    }

    #[test]
    fn is_deterministic() {
        let bars = vec![bar("2024-01-01 00:00:00", 1.2345), bar("2024-01-02 00:00:00", 1.2350)];
        assert_eq!(
            format_for_ai(&bars, "GBP/USD", "1day"),
            format_for_ai(&bars, "GBP/USD", "1day")
        );
    }
}
