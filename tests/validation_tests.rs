// tests/validation_tests.rs
//
// Structural validation and combination rules: pip arithmetic per
// instrument class, error/warning severity, and cross-timeframe signal
// derivation.

use signal_desk::orchestrator::{combine, entry_direction};
use signal_desk::strategies::{strategy_for, SwingStrategy};
use signal_desk::types::{PartialAnalysis, Signal, Zone};
use signal_desk::validation::{pip_size, pip_width, validate_zone, ValidationConfig};

fn swing_cfg() -> ValidationConfig {
    strategy_for("swing").unwrap().validation_config()
}

fn analysis(trend: &str, zone: Option<Zone>, confidence: f64) -> PartialAnalysis {
    PartialAnalysis {
        trend: trend.to_string(),
        pattern: None,
        zone,
        entry_signal: None,
        reasoning: None,
        confidence,
    }
}

fn entry_with_signal(trend: &str, signal: &str, zone: Option<Zone>, confidence: f64) -> PartialAnalysis {
    PartialAnalysis {
        entry_signal: Some(signal.to_string()),
        ..analysis(trend, zone, confidence)
    }
}

// A 50-pip EUR/USD zone: comfortably inside the swing 15-150 pip band.
fn good_zone() -> Zone {
    Zone::new(1.0800, 1.0850)
}

#[test]
fn pip_divisors_per_instrument_class() {
    assert_eq!(pip_size("EUR/USD"), 0.0001);
    assert_eq!(pip_size("GBP/USD"), 0.0001);
    assert_eq!(pip_size("USD/JPY"), 0.01);
    assert_eq!(pip_size("EUR/JPY"), 0.01);
    assert_eq!(pip_size("XAU/USD"), 0.1);
}

#[test]
fn gold_zone_width_literal_example() {
    // XAU/USD [2000.00, 2010.50]: width 10.50 at a 0.1 pip unit -> 105 pips.
    let width = pip_width(2000.00, 2010.50, "XAU/USD");
    assert!((width - 105.0).abs() < 1e-9);
}

#[test]
fn jpy_zone_width_uses_001_divisor() {
    let width = pip_width(150.00, 150.45, "USD/JPY");
    assert!((width - 45.0).abs() < 1e-9);
}

#[test]
fn inverted_zone_is_always_an_error() {
    // price_low above price_high.
    let zone = Zone::new(1.0850, 1.0800);
    let report = validate_zone(Some(&zone), "EUR/USD", &swing_cfg());
    assert!(!report.errors.is_empty());
    assert!(report.warnings.is_empty());
    assert!(report.errors[0].contains("above"));
}

#[test]
fn missing_bound_is_an_error() {
    let zone = Zone {
        price_low: None,
        price_high: Some(1.0850),
    };
    let report = validate_zone(Some(&zone), "EUR/USD", &swing_cfg());
    assert!(report.errors.iter().any(|e| e.contains("price_low")));
}

#[test]
fn missing_zone_is_an_error() {
    let report = validate_zone(None, "EUR/USD", &swing_cfg());
    assert!(!report.errors.is_empty());
}

#[test]
fn width_outside_bounds_is_an_error() {
    // 5 pips, under the swing 15-pip minimum.
    let zone = Zone::new(1.0800, 1.0805);
    let report = validate_zone(Some(&zone), "EUR/USD", &swing_cfg());
    assert!(report.errors.iter().any(|e| e.contains("outside")));

    // 200 pips, over the 150-pip maximum.
    let zone = Zone::new(1.0800, 1.1000);
    let report = validate_zone(Some(&zone), "EUR/USD", &swing_cfg());
    assert!(report.errors.iter().any(|e| e.contains("outside")));
}

#[test]
fn width_near_boundary_is_a_warning_not_an_error() {
    // 16 pips: inside the band but within the 10% margin of the minimum.
    let zone = Zone::new(1.0800, 1.0816);
    let report = validate_zone(Some(&zone), "EUR/USD", &swing_cfg());
    assert!(report.errors.is_empty());
    assert!(!report.warnings.is_empty());
}

#[test]
fn comfortable_width_is_clean() {
    let report = validate_zone(Some(&good_zone()), "EUR/USD", &swing_cfg());
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn entry_direction_prefers_explicit_signal() {
    let entry = entry_with_signal("neutral", "sell", None, 0.5);
    assert_eq!(entry_direction(&entry), Signal::Sell);

    // Without an explicit signal the micro trend decides.
    assert_eq!(entry_direction(&analysis("bullish", None, 0.5)), Signal::Buy);
    assert_eq!(entry_direction(&analysis("bearish", None, 0.5)), Signal::Sell);
    assert_eq!(entry_direction(&analysis("neutral", None, 0.5)), Signal::Wait);
}

#[test]
fn contradiction_is_never_silent() {
    // Primary bullish, entry says sell: the conflict must surface as a
    // warning and a confidence downgrade, and the signal degrades to wait.
    let primary = analysis("bullish", Some(good_zone()), 0.8);
    let entry = entry_with_signal("bearish", "sell", Some(good_zone()), 0.8);

    let combined = combine("EUR/USD", "swing", &SwingStrategy, primary, entry);

    assert_eq!(combined.signal, Signal::Wait);
    assert!(combined
        .validation
        .entry
        .warnings
        .iter()
        .any(|w| w.contains("contradicts")));
    // Average confidence would be 0.8; the penalty must pull it down.
    assert!(combined.confidence < 0.8);
}

#[test]
fn aligned_signals_combine_into_a_trade() {
    let primary = analysis("bullish", Some(good_zone()), 0.8);
    let entry = entry_with_signal("bullish", "buy", Some(good_zone()), 0.6);

    let combined = combine("EUR/USD", "swing", &SwingStrategy, primary, entry);

    assert_eq!(combined.signal, Signal::Buy);
    assert!(combined.valid);
    assert!(combined.confidence >= 0.7); // mean 0.7 plus agreement bonus
    assert!(combined.confidence <= 1.0);

    // Stop below the zone, targets above it.
    let (lo, hi) = good_zone().bounds().unwrap();
    assert!(combined.stop_loss.unwrap() < lo);
    assert!(combined.take_profit_1.unwrap() > hi);
    assert!(combined.take_profit_2.unwrap() > combined.take_profit_1.unwrap());
}

#[test]
fn valid_iff_no_errors_regardless_of_warnings() {
    // Near-boundary zones: warnings on both timeframes, zero errors.
    let warn_zone = Zone::new(1.0800, 1.0816);
    let primary = analysis("bullish", Some(warn_zone.clone()), 0.7);
    let entry = entry_with_signal("bullish", "buy", Some(warn_zone), 0.7);

    let combined = combine("EUR/USD", "swing", &SwingStrategy, primary, entry);
    assert!(combined.valid);
    assert!(!combined.validation.primary.warnings.is_empty());

    // One inverted zone: an error, so the setup is invalid.
    let primary = analysis("bullish", Some(Zone::new(1.0850, 1.0800)), 0.7);
    let entry = entry_with_signal("bullish", "buy", Some(good_zone()), 0.7);
    let combined = combine("EUR/USD", "swing", &SwingStrategy, primary, entry);
    assert!(!combined.valid);
}

#[test]
fn wait_entry_keeps_levels_for_chart_annotation() {
    let primary = analysis("bearish", Some(good_zone()), 0.6);
    let entry = entry_with_signal("neutral", "wait", Some(good_zone()), 0.5);

    let combined = combine("EUR/USD", "swing", &SwingStrategy, primary, entry);
    assert_eq!(combined.signal, Signal::Wait);
    // Levels follow the dominant (bearish) direction: stop above the zone.
    let (_, hi) = good_zone().bounds().unwrap();
    assert!(combined.stop_loss.unwrap() > hi);
}

#[test]
fn unknown_strategy_is_rejected() {
    assert!(strategy_for("martingale").is_err());
    assert!(strategy_for("swing").is_ok());
    assert!(strategy_for("scalping").is_ok());
}
