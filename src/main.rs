// src/main.rs
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use signal_desk::analyzer::OpenAiAnalyzer;
use signal_desk::api::{analysis_handler, AppState};
use signal_desk::history::HistoryStore;
use signal_desk::orchestrator::AnalysisOrchestrator;
use signal_desk::quotes::TwelveDataClient;
use signal_desk::strategies::strategy_keys;
use signal_desk::telegram_notifier::TelegramNotifier;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    log4rs::init_file("log4rs.yaml", Default::default()).expect("Failed to initialize log4rs");

    let host = "127.0.0.1";
    let port = 8080;

    let db_path = env::var("ANALYSIS_DB_PATH").unwrap_or_else(|_| "data/analysis.db".to_string());
    let history = match HistoryStore::open(&PathBuf::from(&db_path)) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            log::error!("Could not open history store at {}: {}", db_path, e);
            None
        }
    };

    let orchestrator = Arc::new(AnalysisOrchestrator::new(
        Arc::new(TwelveDataClient::from_env()),
        Arc::new(OpenAiAnalyzer::from_env()),
        history.clone(),
    ));
    let notifier = Arc::new(TelegramNotifier::new());

    let state = web::Data::new(AppState {
        orchestrator,
        history,
        notifier,
    });

    log::info!("Starting analysis server on http://{}:{}", host, port);
    log::info!("Registered strategies: {}", strategy_keys().join(", "));
    println!("Available endpoints:");
    println!("  POST http://{}:{}/api/analysis/run", host, port);
    println!("  GET  http://{}:{}/api/analysis/history", host, port);
    println!("  GET  http://{}:{}/health", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:4200")
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);
        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .route(
                "/api/analysis/run",
                web::post().to(analysis_handler::run_analysis_handler),
            )
            .route(
                "/api/analysis/history",
                web::get().to(analysis_handler::history_handler),
            )
            .route("/health", web::get().to(analysis_handler::health_check))
    })
    .bind((host, port))?
    .run()
    .await
}
