// Replay module for analyzing logged decisions
//
// This module provides functionality to:
// 1. Parse JSONL decision logs
// 2. Re-run the engine on each logged board
// 3. Compare logged vs replayed moves
// 4. Generate analysis reports

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::bot::{Bot, Session};
use crate::config::Config;
use crate::debug_logger::LogEntry;
use crate::types::{Move, Side};

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: u32,
    pub original_move: Option<Move>,
    pub replayed_move: Option<Move>,
    pub original_decision: String,
    pub replayed_decision: &'static str,
    pub matches: bool,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing decision logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;
            entry
                .board
                .validate()
                .map_err(|e| format!("Invalid board on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Replays a single log entry and compares the result
    ///
    /// The engine resumes with the turn counter the logged engine had before
    /// this decision, so progress-gated behaviour matches.
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        if self.verbose {
            info!("Replaying turn {} ({})...", entry.turn, entry.player);
        }

        if entry.turn == 0 {
            return Err("Logged turns start at 1".to_string());
        }

        if entry.strategy != self.config.strategy.name {
            warn!(
                "Turn {} was logged by '{}' but is replayed with '{}'",
                entry.turn, entry.strategy, self.config.strategy.name
            );
        }

        let mut bot = Bot::new(entry.player, self.config.clone())
            .with_session(Session::at_turn(entry.turn - 1));
        let report = bot.decide(&entry.board, entry.time_remaining_ms);

        let matches = report.chosen == entry.chosen_move;
        let result = ReplayResult {
            turn: entry.turn,
            original_move: entry.chosen_move,
            replayed_move: report.chosen,
            original_decision: entry.decision.clone(),
            replayed_decision: report.decision.as_str(),
            matches,
            computation_time_ms: report.elapsed_ms,
        };

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: ✓ MATCH - {} via {} (time: {}ms)",
                    entry.turn,
                    format_move(result.replayed_move),
                    result.replayed_decision,
                    result.computation_time_ms
                );
            } else {
                warn!(
                    "Turn {}: ✗ MISMATCH - Original: {} via {}, Replayed: {} via {} (time: {}ms)",
                    entry.turn,
                    format_move(result.original_move),
                    result.original_decision,
                    format_move(result.replayed_move),
                    result.replayed_decision,
                    result.computation_time_ms
                );
            }
        }

        Ok(result)
    }

    /// Replays all entries in a log file
    pub fn replay_all(&self, entries: &[LogEntry]) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", entry.turn, e);
                }
            }
        }

        Ok(results)
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(
        &self,
        entries: &[LogEntry],
        turn_numbers: &[u32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn_num)
                .ok_or_else(|| format!("Turn {} not found in log file", turn_num))?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", turn_num, e);
                }
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results.iter().map(|r| r.computation_time_ms as f64).sum::<f64>()
                / results.len() as f64;
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Turn {}: {} ({}) → {} ({}) (time: {}ms)",
                    result.turn,
                    format_move(result.original_move),
                    result.original_decision,
                    format_move(result.replayed_move),
                    result.replayed_decision,
                    result.computation_time_ms
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were made
    pub fn validate_expected_moves(
        &self,
        entries: &[LogEntry],
        expected_moves: &[(u32, Vec<Move>)], // (turn, acceptable_moves)
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            let accepted = entry
                .chosen_move
                .map_or(false, |mv| acceptable.contains(&mv));
            if !accepted {
                return Err(format!(
                    "Turn {}: Expected one of [{}], but got {}",
                    turn,
                    acceptable
                        .iter()
                        .map(|mv| mv.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    format_move(entry.chosen_move)
                ));
            }
        }

        Ok(())
    }

    /// Parses a move written as `row-col-side`, e.g. `2-0-left`
    pub fn parse_move(s: &str) -> Result<Move, String> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != 3 {
            return Err(format!("Invalid move '{}'. Expected 'row-col-side'", s));
        }

        let row = parts[0]
            .parse::<usize>()
            .map_err(|e| format!("Invalid row '{}': {}", parts[0], e))?;
        let col = parts[1]
            .parse::<usize>()
            .map_err(|e| format!("Invalid column '{}': {}", parts[1], e))?;
        let side = match parts[2].to_lowercase().as_str() {
            "top" => Side::Top,
            "right" => Side::Right,
            "bottom" => Side::Bottom,
            "left" => Side::Left,
            other => return Err(format!("Invalid side: {}", other)),
        };

        Ok(Move::new(row, col, side))
    }
}

fn format_move(mv: Option<Move>) -> String {
    mv.map_or_else(|| "none".to_string(), |mv| mv.to_string())
}
