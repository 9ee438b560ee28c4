// src/charts.rs
// Candlestick chart rendering with zone band and stop/target lines.
// Rendered without text overlays so no system fonts are required.

use crate::errors::AnalysisError;
use crate::types::CandleData;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::{RangedCoordf64, RangedCoordi32};
use plotters::prelude::*;
use uuid::Uuid;

const CHART_WIDTH: u32 = 1024;
const CHART_HEIGHT: u32 = 640;

/// Price levels drawn over the candles.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartAnnotations {
    pub zone: Option<(f64, f64)>,
    pub stop_loss: Option<f64>,
    pub take_profit_1: Option<f64>,
    pub take_profit_2: Option<f64>,
}

impl ChartAnnotations {
    fn levels(&self) -> impl Iterator<Item = f64> {
        self.stop_loss
            .into_iter()
            .chain(self.take_profit_1)
            .chain(self.take_profit_2)
    }
}

/// Render one annotated candlestick chart as PNG bytes.
pub fn render_chart(
    bars: &[CandleData],
    annotations: &ChartAnnotations,
) -> Result<Vec<u8>, AnalysisError> {
    if bars.is_empty() {
        return Err(AnalysisError::Chart("no bars to render".to_string()));
    }

    // plotters' bitmap encoder writes to a path; render to a temp file and
    // read it back so callers get bytes they can ship anywhere.
    let path = std::env::temp_dir().join(format!("signal_desk_chart_{}.png", Uuid::new_v4()));

    let render_result = draw(bars, annotations, &path);

    let bytes = match render_result {
        Ok(()) => std::fs::read(&path)
            .map_err(|e| AnalysisError::Chart(format!("failed to read rendered chart: {}", e))),
        Err(e) => Err(e),
    };
    let _ = std::fs::remove_file(&path);
    bytes
}

fn draw(
    bars: &[CandleData],
    annotations: &ChartAnnotations,
    path: &std::path::Path,
) -> Result<(), AnalysisError> {
    let chart_err = |e: &dyn std::fmt::Display| AnalysisError::Chart(e.to_string());

    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_err(&e))?;

    let mut y_min = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let mut y_max = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    for level in annotations.levels() {
        y_min = y_min.min(level);
        y_max = y_max.max(level);
    }
    if let Some((lo, hi)) = annotations.zone {
        y_min = y_min.min(lo);
        y_max = y_max.max(hi);
    }
    let pad = (y_max - y_min).max(f64::EPSILON) * 0.05;

    let x_end = bars.len() as i32;
    let mut chart = ChartBuilder::on(&root)
        .margin(16)
        .build_cartesian_2d(-1i32..x_end, (y_min - pad)..(y_max + pad))
        .map_err(|e| chart_err(&e))?;

    // Zone band under the candles.
    if let Some((lo, hi)) = annotations.zone {
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(-1, lo), (x_end, hi)],
                BLUE.mix(0.15).filled(),
            )))
            .map_err(|e| chart_err(&e))?;
    }

    chart
        .draw_series(bars.iter().enumerate().map(|(i, bar)| {
            CandleStick::new(
                i as i32,
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                GREEN.filled(),
                RED.filled(),
                candle_width(bars.len()),
            )
        }))
        .map_err(|e| chart_err(&e))?;

    if let Some(sl) = annotations.stop_loss {
        draw_level(&mut chart, x_end, sl, RED.stroke_width(2))?;
    }
    if let Some(tp) = annotations.take_profit_1 {
        draw_level(&mut chart, x_end, tp, GREEN.stroke_width(2))?;
    }
    if let Some(tp) = annotations.take_profit_2 {
        draw_level(&mut chart, x_end, tp, GREEN.mix(0.6).stroke_width(2))?;
    }

    root.present().map_err(|e| chart_err(&e))?;
    Ok(())
}

fn draw_level<'a, 'b>(
    chart: &mut ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordi32, RangedCoordf64>>,
    x_end: i32,
    level: f64,
    style: ShapeStyle,
) -> Result<(), AnalysisError> {
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(-1, level), (x_end, level)],
            style,
        )))
        .map_err(|e| AnalysisError::Chart(e.to_string()))?;
    Ok(())
}

fn candle_width(bar_count: usize) -> u32 {
    // Keep candles readable for short windows without overlapping long ones.
    let usable = CHART_WIDTH.saturating_sub(64) / (bar_count.max(1) as u32);
    usable.saturating_sub(2).clamp(1, 12)
}

/// Transport encoding for the REST payload.
pub fn to_base64(png: &[u8]) -> String {
    BASE64.encode(png)
}
