// src/errors.rs
use actix_web::{HttpResponse, ResponseError};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Missing or invalid credentials: {0}")]
    Credential(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Could not parse AI response: {0}")]
    Parse(String),

    #[error("Unknown strategy: {0}")]
    Strategy(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("History store error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ResponseError for AnalysisError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AnalysisError::Strategy(name) => {
                HttpResponse::BadRequest().body(format!("Unknown strategy '{}'", name))
            }
            AnalysisError::Credential(msg) => {
                log::error!("Configuration error: {}", msg);
                HttpResponse::InternalServerError().body("Server configuration error")
            }
            AnalysisError::Provider(msg) => {
                log::error!("Upstream provider error: {}", msg);
                HttpResponse::InternalServerError().body("Error communicating with data provider")
            }
            AnalysisError::Reqwest(e) => {
                log::error!("HTTP client error: {}", e);
                HttpResponse::InternalServerError().body("Error communicating with data provider")
            }
            AnalysisError::Parse(msg) => {
                log::error!("AI response parse error: {}", msg);
                HttpResponse::InternalServerError().body("Analysis could not be completed")
            }
            AnalysisError::Chart(msg) => {
                log::error!("Chart rendering error: {}", msg);
                HttpResponse::InternalServerError().body("Chart rendering failed")
            }
            AnalysisError::Db(e) => {
                log::error!("History store error: {}", e);
                HttpResponse::InternalServerError().body("Storage error")
            }
            AnalysisError::Storage(msg) => {
                log::error!("Storage error: {}", msg);
                HttpResponse::InternalServerError().body("Storage error")
            }
        }
    }
}
