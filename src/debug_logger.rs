// Debug logging module for per-turn decision records
//
// Each decision is appended as one JSON line so a session can be replayed
// later with the `replay` binary. Writes are synchronous and cheap; failures
// are logged and never interrupt play.

use log::error;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Arc;

use crate::board::Board;
use crate::types::{Move, PlayerTag};

/// Represents a single decision log entry
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub turn: u32,
    pub player: PlayerTag,
    pub strategy: String,
    pub time_remaining_ms: u64,
    pub decision: String,
    pub chosen_move: Option<Move>,
    pub board: Board,
    pub timestamp: String,
}

/// Shared decision logger
/// Clones share the same file handle
#[derive(Clone)]
pub struct DecisionLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DecisionLogger {
    /// Creates a new decision logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return DecisionLogger::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
        {
            Ok(file) => {
                log::info!("Decision logging enabled: {}", log_file_path);
                DecisionLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create decision log file '{}': {}", log_file_path, e);
                DecisionLogger::disabled()
            }
        }
    }

    /// Creates a disabled logger (no-op)
    pub fn disabled() -> Self {
        DecisionLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Appends one decision to the log
    #[allow(clippy::too_many_arguments)]
    pub fn log_turn(
        &self,
        turn: u32,
        player: PlayerTag,
        strategy: &str,
        time_remaining_ms: u64,
        decision: &str,
        chosen_move: Option<Move>,
        board: &Board,
    ) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            turn,
            player,
            strategy: strategy.to_string(),
            time_remaining_ms,
            decision: decision.to_string(),
            chosen_move,
            board: board.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let json_line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize decision log entry: {}", e);
                return;
            }
        };

        let mut file_guard = self.file.lock();
        if let Some(file) = file_guard.as_mut() {
            if let Err(e) = writeln!(file, "{}", json_line) {
                error!("Failed to write decision log entry: {}", e);
            } else if let Err(e) = file.flush() {
                // Flush to ensure data is written to disk
                error!("Failed to flush decision log: {}", e);
            }
        }
    }
}
