// Match host: drives two agents over one board until every box is claimed

use log::{debug, info};
use std::error::Error;
use std::fmt::{self, Display};
use std::time::Instant;

use crate::agent::Agent;
use crate::board::{Board, BoardAdapter, GridAdapter};
use crate::types::{Move, PlayerTag};

/// Reasons a match cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayError {
    /// The agent returned a move that is not currently legal
    IllegalMove { player: PlayerTag, mv: Move },
    /// The agent returned nothing although legal moves remain
    NoMoveReturned { player: PlayerTag },
}

impl Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayError::IllegalMove { player, mv } => {
                write!(f, "{} played {}, which is not a legal move", player, mv)
            }
            PlayError::NoMoveReturned { player } => {
                write!(f, "{} returned no move while legal moves remain", player)
            }
        }
    }
}

impl Error for PlayError {}

/// Outcome of one applied move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    pub player: PlayerTag,
    pub mv: Move,
    pub claimed: usize,
}

/// Final state of a finished match
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    pub red_score: usize,
    pub blue_score: usize,
    pub moves_played: usize,
    pub board: Board,
}

impl MatchResult {
    /// `None` on a draw
    pub fn winner(&self) -> Option<PlayerTag> {
        use std::cmp::Ordering::*;
        match self.red_score.cmp(&self.blue_score) {
            Greater => Some(PlayerTag::Red),
            Less => Some(PlayerTag::Blue),
            Equal => None,
        }
    }
}

/// One game between a red and a blue agent
pub struct Match {
    board: Board,
    red: Box<dyn Agent>,
    blue: Box<dyn Agent>,
    to_move: PlayerTag,
    red_time_ms: u64,
    blue_time_ms: u64,
    moves_played: usize,
}

impl Match {
    /// Red moves first; each side starts with `time_bank_ms`
    pub fn new(size: usize, red: Box<dyn Agent>, blue: Box<dyn Agent>, time_bank_ms: u64) -> Self {
        Match::from_board(Board::new(size), red, blue, time_bank_ms)
    }

    /// Starts from an arbitrary position, red to move
    pub fn from_board(
        board: Board,
        red: Box<dyn Agent>,
        blue: Box<dyn Agent>,
        time_bank_ms: u64,
    ) -> Self {
        Match {
            board,
            red,
            blue,
            to_move: PlayerTag::Red,
            red_time_ms: time_bank_ms,
            blue_time_ms: time_bank_ms,
            moves_played: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> PlayerTag {
        self.to_move
    }

    pub fn time_remaining_ms(&self, player: PlayerTag) -> u64 {
        match player {
            PlayerTag::Red => self.red_time_ms,
            PlayerTag::Blue => self.blue_time_ms,
        }
    }

    pub fn is_over(&self) -> bool {
        GridAdapter.valid_moves(&self.board).is_empty()
    }

    /// Asks the side to move for a move and applies it.
    /// Returns `Ok(None)` once the match is over.
    pub fn step(&mut self) -> Result<Option<TurnOutcome>, PlayError> {
        let legal = GridAdapter.valid_moves(&self.board);
        if legal.is_empty() {
            return Ok(None);
        }

        let player = self.to_move;
        let time_remaining_ms = self.time_remaining_ms(player);
        let agent = match player {
            PlayerTag::Red => &mut self.red,
            PlayerTag::Blue => &mut self.blue,
        };

        let start_time = Instant::now();
        let chosen = agent.compute(&self.board, time_remaining_ms);
        let spent_ms = start_time.elapsed().as_millis() as u64;

        match player {
            PlayerTag::Red => self.red_time_ms = self.red_time_ms.saturating_sub(spent_ms),
            PlayerTag::Blue => self.blue_time_ms = self.blue_time_ms.saturating_sub(spent_ms),
        }

        let mv = chosen.ok_or(PlayError::NoMoveReturned { player })?;
        if !legal.contains(&mv) {
            return Err(PlayError::IllegalMove { player, mv });
        }

        let claimed = GridAdapter.apply_move(&mut self.board, mv, player);
        self.moves_played += 1;
        debug!("{} played {} in {}ms, claimed {}", player, mv, spent_ms, claimed);

        // Completing a box earns another move
        if claimed == 0 {
            self.to_move = player.opponent();
        }

        Ok(Some(TurnOutcome { player, mv, claimed }))
    }

    /// Plays until no legal move remains
    pub fn play(&mut self) -> Result<MatchResult, PlayError> {
        info!(
            "Match start: {} (red) vs {} (blue) on {}x{}",
            self.red.name(),
            self.blue.name(),
            self.board.size(),
            self.board.size()
        );

        self.red.start();
        self.blue.start();

        while self.step()?.is_some() {}

        self.red.end(&self.board);
        self.blue.end(&self.board);

        let result = MatchResult {
            red_score: self.board.score(PlayerTag::Red),
            blue_score: self.board.score(PlayerTag::Blue),
            moves_played: self.moves_played,
            board: self.board.clone(),
        };

        info!(
            "Match over after {} moves: red {} - blue {}",
            result.moves_played, result.red_score, result.blue_score
        );
        Ok(result)
    }
}
