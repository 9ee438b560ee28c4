// src/api/analysis_handler.rs
use crate::api::AppState;
use crate::charts;
use crate::errors::AnalysisError;
use crate::types::{AnalysisResponse, ChartPayload, CombinedAnalysis, RunAnalysisRequest};
use actix_web::{web, HttpResponse, Responder};
use log::info;
use serde::Deserialize;

/// POST /api/analysis/run
pub async fn run_analysis_handler(
    state: web::Data<AppState>,
    body: web::Json<RunAnalysisRequest>,
) -> Result<HttpResponse, AnalysisError> {
    let request = body.into_inner();
    info!(
        "[API] Analysis requested: {} / {} (market: {})",
        request.pair,
        request.strategy,
        request.market.as_deref().unwrap_or("unspecified")
    );

    let analysis = match request.user_id {
        Some(user_id) => {
            state
                .orchestrator
                .run_analysis_for_user(user_id, &request.pair, &request.strategy)
                .await?
        }
        None => {
            state
                .orchestrator
                .run_analysis(&request.pair, &request.strategy)
                .await?
        }
    };

    // Delivery is best-effort; failures are logged inside the notifier.
    state.notifier.send_analysis(&analysis).await;

    Ok(HttpResponse::Ok().json(to_response(analysis)))
}

fn to_response(analysis: CombinedAnalysis) -> AnalysisResponse {
    let charts = analysis
        .charts
        .iter()
        .map(|c| ChartPayload {
            interval: c.interval.clone(),
            image_base64: charts::to_base64(&c.png),
        })
        .collect();

    AnalysisResponse {
        pair: analysis.pair,
        strategy: analysis.strategy,
        signal: analysis.signal,
        confidence: analysis.confidence,
        valid: analysis.valid,
        validation: analysis.validation,
        stop_loss: analysis.stop_loss,
        take_profit_1: analysis.take_profit_1,
        take_profit_2: analysis.take_profit_2,
        primary: analysis.primary,
        entry: analysis.entry,
        charts,
        created_at: analysis.created_at,
    }
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// GET /api/analysis/history
pub async fn history_handler(
    state: web::Data<AppState>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AnalysisError> {
    let limit = query.limit.unwrap_or(20).min(200);
    let rows = match &state.history {
        Some(history) => history.recent(limit)?,
        None => Vec::new(),
    };
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /health
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("OK, analysis server is running")
}
