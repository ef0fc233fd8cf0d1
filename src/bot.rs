// Strategy selector
//
// One configurable engine covers both the baseline and the refined play
// styles. Each turn it tries, in order: closing a cycle, growing a chain,
// a time-boxed minimax search, and finally a cheap fallback move.

use log::{debug, info};
use std::time::Instant;

use crate::agent::Agent;
use crate::board::{Board, BoardAdapter, GridAdapter};
use crate::chains::{
    close_cycle, cycle_opportunity, developed_cells, extend_chain, find_chains,
    find_chains_within, is_cycle, Chain, Deadline,
};
use crate::config::{Config, Fallback};
use crate::debug_logger::DecisionLogger;
use crate::search::{find_best_move, SearchContext};
use crate::types::{Move, PlayerTag};

/// Per-match state owned by one engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    turn_count: u32,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// Session that has already played `turn_count` turns
    pub fn at_turn(turn_count: u32) -> Self {
        Session { turn_count }
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    fn advance(&mut self) -> u32 {
        self.turn_count += 1;
        self.turn_count
    }

    /// Turns played over the expected length of a match, 2·N² moves
    pub fn game_progress(&self, board_size: usize) -> f64 {
        let expected = 2 * board_size * board_size;
        if expected == 0 {
            return 0.0;
        }
        self.turn_count as f64 / expected as f64
    }
}

/// Why a move was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No legal move on the board
    NoMoves,
    /// Sacrifice move opening a detected cycle
    CloseCycle { chain_len: usize },
    /// Chain pushed into a low-degree neighbour
    ExtendChain,
    /// Minimax root move
    Search { depth: u8, score: i32, nodes: u64 },
    /// Side completing a three-sided cell
    FreeCapture,
    /// Move that leaves no three-sided cell
    SafeMove,
    /// Every move gives something away
    RiskyMove,
    /// First legal move
    FirstMove,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::NoMoves => "no_moves",
            Decision::CloseCycle { .. } => "close_cycle",
            Decision::ExtendChain => "extend_chain",
            Decision::Search { .. } => "search",
            Decision::FreeCapture => "free_capture",
            Decision::SafeMove => "safe_move",
            Decision::RiskyMove => "risky_move",
            Decision::FirstMove => "first_move",
        }
    }
}

/// Summary of one `compute` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnReport {
    pub turn: u32,
    pub chosen: Option<Move>,
    pub decision: Decision,
    pub legal_moves: usize,
    pub opportunity: usize,
    pub game_progress: f64,
    /// Chains found this turn; `None` when detection did not run
    pub chains_found: Option<usize>,
    pub elapsed_ms: u128,
}

/// Inputs shared by the gates of one turn
struct TurnState<'a> {
    started: Instant,
    board: &'a Board,
    moves: &'a [Move],
    time_remaining_ms: u64,
    opportunity: usize,
    progress: f64,
}

/// Move-selection engine for one colour
pub struct Bot<A: BoardAdapter = GridAdapter> {
    color: PlayerTag,
    config: Config,
    adapter: A,
    session: Session,
    logger: DecisionLogger,
    last_report: Option<TurnReport>,
}

impl Bot<GridAdapter> {
    /// Creates a new engine playing `color` on the standard grid rules
    ///
    /// # Arguments
    /// * `color` - Fixed player identity for the whole match
    /// * `config` - Static configuration that does not change during the bot's lifetime
    pub fn new(color: PlayerTag, config: Config) -> Self {
        Bot::with_adapter(color, config, GridAdapter)
    }
}

impl<A: BoardAdapter> Bot<A> {
    /// Creates an engine on a custom board adapter
    pub fn with_adapter(color: PlayerTag, config: Config, adapter: A) -> Self {
        Bot {
            color,
            config,
            adapter,
            session: Session::new(),
            logger: DecisionLogger::disabled(),
            last_report: None,
        }
    }

    /// Attaches a decision log
    pub fn with_logger(mut self, logger: DecisionLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Replaces the session, e.g. to resume from a logged turn
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn last_report(&self) -> Option<TurnReport> {
        self.last_report
    }

    /// Runs one turn of the decision procedure
    pub fn decide(&mut self, board: &Board, time_remaining_ms: u64) -> TurnReport {
        let start_time = Instant::now();
        let turn = self.session.advance();

        let moves = self.adapter.valid_moves(board);
        let state = TurnState {
            started: start_time,
            board,
            moves: &moves,
            time_remaining_ms,
            opportunity: cycle_opportunity(board),
            progress: self.session.game_progress(board.size()),
        };

        let (decision, chosen, chains_found) = if moves.is_empty() {
            (Decision::NoMoves, None, None)
        } else {
            let (decision, mv, chains_found) = self.choose(&state);
            (decision, Some(mv), chains_found)
        };

        let report = TurnReport {
            turn,
            chosen,
            decision,
            legal_moves: moves.len(),
            opportunity: state.opportunity,
            game_progress: state.progress,
            chains_found,
            elapsed_ms: start_time.elapsed().as_millis(),
        };

        info!(
            "Turn {} ({}): {} via {} (moves: {}, three-sided: {}, progress: {:.2}, \
             time left: {}ms, took: {}ms)",
            turn,
            self.color,
            chosen.map_or_else(|| "none".to_string(), |mv| mv.to_string()),
            decision.as_str(),
            report.legal_moves,
            report.opportunity,
            report.game_progress,
            time_remaining_ms,
            report.elapsed_ms
        );

        self.logger.log_turn(
            turn,
            self.color,
            &self.config.strategy.name,
            time_remaining_ms,
            decision.as_str(),
            chosen,
            board,
        );

        self.last_report = Some(report);
        report
    }

    /// Decision, move, and the number of chains detected if detection ran
    fn choose(&self, state: &TurnState<'_>) -> (Decision, Move, Option<usize>) {
        let chains = if self.cycle_gate_open(state) {
            Some(self.detect_chains(state))
        } else {
            None
        };
        let chains_found = chains.as_ref().map(Vec::len);

        if let Some(chains) = &chains {
            if let Some((decision, mv)) = self.tactical_move(state, chains) {
                return (decision, mv, chains_found);
            }
        }

        if self.search_gate_open(state) {
            if let Some((decision, mv)) = self.search(state) {
                return (decision, mv, chains_found);
            }
        }

        let (decision, mv) = match self.config.strategy.fallback {
            Fallback::FirstMove => (Decision::FirstMove, state.moves[0]),
            Fallback::SafeRisky => self.safe_or_risky(state.board, state.moves),
        };
        (decision, mv, chains_found)
    }

    /// Cycle closing, then chain extension when enabled
    fn tactical_move(&self, state: &TurnState<'_>, chains: &[Chain]) -> Option<(Decision, Move)> {
        let board = state.board;

        if let Some(cycle) = chains.iter().find(|chain| is_cycle(chain, board)) {
            if let Some(mv) = close_cycle(board, cycle).filter(|mv| state.moves.contains(mv)) {
                return Some((Decision::CloseCycle { chain_len: cycle.len() }, mv));
            }
        }

        if self.config.cycles.extend_chains && !chains.is_empty() {
            if let Some(mv) = extend_chain(board, chains).filter(|mv| state.moves.contains(mv)) {
                return Some((Decision::ExtendChain, mv));
            }
        }

        None
    }

    fn cycle_gate_open(&self, state: &TurnState<'_>) -> bool {
        let cycles = &self.config.cycles;
        state.opportunity >= cycles.min_opportunity
            && cycles
                .min_time_remaining_ms
                .map_or(true, |min| state.time_remaining_ms > min)
            && cycles
                .min_game_progress
                .map_or(true, |min| state.progress > min)
    }

    fn detect_chains(&self, state: &TurnState<'_>) -> Vec<Chain> {
        let min_len = self.config.cycles.min_chain_len;
        match self.config.cycles.time_slice {
            Some(slice) => {
                let budget_ms = slice.budget_ms(state.time_remaining_ms);
                let deadline = Deadline::starting_at(state.started, budget_ms);
                let chains = find_chains_within(state.board, min_len, deadline);
                debug!(
                    "Chain detection ({}ms budget) found {} chains",
                    budget_ms,
                    chains.len()
                );
                chains
            }
            None => find_chains(state.board, min_len),
        }
    }

    fn search_gate_open(&self, state: &TurnState<'_>) -> bool {
        let search = &self.config.search;

        let developed_enough = search.min_developed_ratio.map_or(true, |ratio| {
            let (developed, total) = developed_cells(state.board);
            developed as f64 >= total as f64 * ratio
        });

        developed_enough
            && search
                .min_time_remaining_ms
                .map_or(true, |min| state.time_remaining_ms > min)
            && state.opportunity >= search.min_opportunity
            && search
                .max_legal_moves
                .map_or(true, |max| state.moves.len() < max)
            && search
                .min_game_progress
                .map_or(true, |min| state.progress > min)
    }

    fn search(&self, state: &TurnState<'_>) -> Option<(Decision, Move)> {
        let depth = self
            .config
            .search
            .depth_for(state.time_remaining_ms, state.opportunity);

        let mut ctx = SearchContext::new(&self.adapter, self.color, self.config.heuristic);
        if let Some(slice) = self.config.search.time_slice {
            let budget_ms = slice.budget_ms(state.time_remaining_ms);
            ctx = ctx.with_deadline(Deadline::starting_at(state.started, budget_ms));
        }

        let (mv, score) = find_best_move(state.board, depth, &mut ctx)?;
        Some((
            Decision::Search {
                depth,
                score,
                nodes: ctx.stats().nodes,
            },
            mv,
        ))
    }

    /// Free capture if any; otherwise prefer moves that leave no three-sided cell
    fn safe_or_risky(&self, board: &Board, moves: &[Move]) -> (Decision, Move) {
        if let Some(&mv) = moves.iter().find(|mv| board.lines_at(mv.coord()) == 3) {
            return (Decision::FreeCapture, mv);
        }

        let mut safe = Vec::new();
        let mut first_risky = None;
        for &mv in moves {
            let mut next = self.adapter.clone_board(board);
            self.adapter.apply_move(&mut next, mv, self.color);
            if cycle_opportunity(&next) == 0 {
                safe.push(mv);
            } else if first_risky.is_none() {
                first_risky = Some(mv);
            }
        }

        let preferred = [0u8, 1]
            .iter()
            .find_map(|&lines| safe.iter().find(|mv| board.lines_at(mv.coord()) == lines))
            .or_else(|| safe.first());

        match (preferred, first_risky) {
            (Some(&mv), _) => (Decision::SafeMove, mv),
            (None, Some(mv)) => (Decision::RiskyMove, mv),
            // Unreachable with a non-empty move list
            (None, None) => (Decision::FirstMove, moves[0]),
        }
    }
}

impl<A: BoardAdapter> Agent for Bot<A> {
    fn color(&self) -> PlayerTag {
        self.color
    }

    fn name(&self) -> &str {
        &self.config.strategy.name
    }

    fn compute(&mut self, board: &Board, time_remaining_ms: u64) -> Option<Move> {
        self.decide(board, time_remaining_ms).chosen
    }

    /// Clears the session for a new match
    fn start(&mut self) {
        info!("GAME START ({} as {})", self.config.strategy.name, self.color);
        self.session = Session::new();
        self.last_report = None;
    }

    fn end(&mut self, board: &Board) {
        info!(
            "GAME OVER ({} as {}): {} to {} after {} turns",
            self.config.strategy.name,
            self.color,
            board.score(self.color),
            board.score(self.color.opponent()),
            self.session.turn_count()
        );
    }
}
