// src/lib.rs
pub mod analyzer;
pub mod api;
pub mod charts;
pub mod errors;
pub mod formatter;
pub mod history;
pub mod orchestrator;
pub mod quotes;
pub mod strategies;
pub mod telegram_notifier;
pub mod types;
pub mod validation;
