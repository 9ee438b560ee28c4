// src/api/mod.rs
pub mod analysis_handler;

use crate::history::HistoryStore;
use crate::orchestrator::AnalysisOrchestrator;
use crate::telegram_notifier::TelegramNotifier;
use std::sync::Arc;

/// Shared state handed to every handler.
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub history: Option<Arc<HistoryStore>>,
    pub notifier: Arc<TelegramNotifier>,
}
