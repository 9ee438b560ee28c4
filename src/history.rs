// src/history.rs
// SQLite-backed analysis bookkeeping: a flattened history row per run plus
// a full JSON "last analysis" snapshot per user.

use crate::errors::AnalysisError;
use crate::types::CombinedAnalysis;
use chrono::Utc;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HistoryRow {
    pub id: i64,
    pub pair: String,
    pub strategy: String,
    pub signal: String,
    pub confidence: f64,
    pub valid: bool,
    pub zone_low: Option<f64>,
    pub zone_high: Option<f64>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    pub fn open(path: &Path) -> Result<Self, AnalysisError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AnalysisError::Storage(format!("failed to create data directory: {}", e))
            })?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::initialize_schema(&conn)?;
        info!("[HISTORY] Analysis store opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, AnalysisError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), AnalysisError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS analysis_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pair TEXT NOT NULL,
                strategy TEXT NOT NULL,
                signal TEXT NOT NULL,
                confidence REAL NOT NULL,
                valid INTEGER NOT NULL,
                zone_low REAL,
                zone_high REAL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS last_analysis (
                user_id INTEGER PRIMARY KEY,
                payload_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Append the flattened summary of one completed run.
    pub fn record_analysis(&self, analysis: &CombinedAnalysis) -> Result<i64, AnalysisError> {
        let (zone_low, zone_high) = analysis
            .entry
            .zone
            .as_ref()
            .map(|z| (z.price_low, z.price_high))
            .unwrap_or((None, None));

        let conn = self.conn.lock().expect("history store lock poisoned");
        conn.execute(
            "INSERT INTO analysis_history
                (pair, strategy, signal, confidence, valid, zone_low, zone_high, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                analysis.pair,
                analysis.strategy,
                analysis.signal.to_string(),
                analysis.confidence,
                analysis.valid as i64,
                zone_low,
                zone_high,
                analysis.created_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Upsert the full JSON snapshot used by the conversational layer.
    pub fn save_last_analysis(
        &self,
        user_id: i64,
        analysis: &CombinedAnalysis,
    ) -> Result<(), AnalysisError> {
        let payload = serde_json::to_string(analysis).map_err(|e| {
            AnalysisError::Storage(format!("failed to serialize analysis snapshot: {}", e))
        })?;
        let conn = self.conn.lock().expect("history store lock poisoned");
        conn.execute(
            "INSERT INTO last_analysis (user_id, payload_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                payload_json = excluded.payload_json,
                updated_at = excluded.updated_at",
            params![user_id, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn last_for_user(&self, user_id: i64) -> Result<Option<CombinedAnalysis>, AnalysisError> {
        let conn = self.conn.lock().expect("history store lock poisoned");
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload_json FROM last_analysis WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        match payload {
            Some(json) => serde_json::from_str(&json).map(Some).map_err(|e| {
                AnalysisError::Storage(format!("stored analysis snapshot is corrupt: {}", e))
            }),
            None => Ok(None),
        }
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryRow>, AnalysisError> {
        let conn = self.conn.lock().expect("history store lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, pair, strategy, signal, confidence, valid, zone_low, zone_high, created_at
             FROM analysis_history
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(HistoryRow {
                    id: row.get(0)?,
                    pair: row.get(1)?,
                    strategy: row.get(2)?,
                    signal: row.get(3)?,
                    confidence: row.get(4)?,
                    valid: row.get::<_, i64>(5)? != 0,
                    zone_low: row.get(6)?,
                    zone_high: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn unwritable_data_directory_is_a_storage_error() {
        // A plain file where the data directory should go: create_dir_all
        // cannot succeed underneath it.
        let blocker = std::env::temp_dir().join(format!("signal_desk_hist_{}", Uuid::new_v4()));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = HistoryStore::open(&blocker.join("sub").join("analysis.db")).unwrap_err();
        assert!(matches!(err, AnalysisError::Storage(_)));

        let _ = std::fs::remove_file(&blocker);
    }
}
