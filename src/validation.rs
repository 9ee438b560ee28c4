// src/validation.rs
// Structural checks on AI-returned zones plus pip arithmetic per
// instrument class. Cutoffs live in ValidationConfig, not in check logic.

use crate::types::{Signal, TimeframeReport, Zone};

/// Numeric cutoffs for zone checks. Each strategy supplies its own defaults.
#[derive(Debug, Clone, Copy)]
pub struct ValidationConfig {
    pub min_zone_pips: f64,
    pub max_zone_pips: f64,
    /// Fraction of the [min,max] span treated as "near the boundary";
    /// widths inside the band but within this margin of either bound get a
    /// warning.
    pub boundary_margin: f64,
}

/// Minimum meaningful price increment for the instrument.
/// Forex pairs use 0.0001, JPY-quoted pairs 0.01, gold 0.1.
pub fn pip_size(pair: &str) -> f64 {
    let upper = pair.to_ascii_uppercase();
    if upper == "XAU/USD" {
        0.1
    } else if upper.ends_with("/JPY") {
        0.01
    } else {
        0.0001
    }
}

/// Zone width measured in pips for the given instrument.
pub fn pip_width(price_low: f64, price_high: f64, pair: &str) -> f64 {
    (price_high - price_low).abs() / pip_size(pair)
}

/// Run all structural checks for one timeframe's zone.
pub fn validate_zone(zone: Option<&Zone>, pair: &str, cfg: &ValidationConfig) -> TimeframeReport {
    let mut report = TimeframeReport::default();

    let zone = match zone {
        Some(z) => z,
        None => {
            report.errors.push("no zone returned by the model".to_string());
            return report;
        }
    };

    let lo = zone.price_low;
    let hi = zone.price_high;

    if lo.is_none() {
        report.errors.push("zone is missing price_low".to_string());
    }
    if hi.is_none() {
        report.errors.push("zone is missing price_high".to_string());
    }
    let (lo, hi) = match (lo, hi) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return report,
    };

    if !lo.is_finite() || !hi.is_finite() {
        report
            .errors
            .push("zone bounds must be finite numbers".to_string());
        return report;
    }

    // An inverted zone is always an error, never a warning.
    if lo > hi {
        report.errors.push(format!(
            "zone price_low {:.5} is above price_high {:.5}",
            lo, hi
        ));
        return report;
    }

    let width = pip_width(lo, hi, pair);
    if width < cfg.min_zone_pips || width > cfg.max_zone_pips {
        report.errors.push(format!(
            "zone width {:.1} pips is outside the allowed {:.1}-{:.1} pip range",
            width, cfg.min_zone_pips, cfg.max_zone_pips
        ));
        return report;
    }

    let span = cfg.max_zone_pips - cfg.min_zone_pips;
    let margin = span * cfg.boundary_margin;
    if width - cfg.min_zone_pips < margin {
        report.warnings.push(format!(
            "zone width {:.1} pips is close to the {:.1} pip minimum",
            width, cfg.min_zone_pips
        ));
    } else if cfg.max_zone_pips - width < margin {
        report.warnings.push(format!(
            "zone width {:.1} pips is close to the {:.1} pip maximum",
            width, cfg.max_zone_pips
        ));
    }

    report
}

/// True when the entry direction runs against the primary trend.
/// A wait/neutral combination never counts as a contradiction.
pub fn trend_contradicts(primary_trend: &str, entry_direction: Signal) -> bool {
    match entry_direction {
        Signal::Buy => primary_trend.eq_ignore_ascii_case("bearish"),
        Signal::Sell => primary_trend.eq_ignore_ascii_case("bullish"),
        Signal::Wait => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pip_sizes_per_instrument_class() {
        assert_eq!(pip_size("EUR/USD"), 0.0001);
        assert_eq!(pip_size("GBP/JPY"), 0.01);
        assert_eq!(pip_size("usd/jpy"), 0.01);
        assert_eq!(pip_size("XAU/USD"), 0.1);
    }

    #[test]
    fn gold_pip_width_example() {
        // Width 10.50 at a 0.1 pip unit.
        let width = pip_width(2000.00, 2010.50, "XAU/USD");
        assert!((width - 105.0).abs() < 1e-9);
    }
}
