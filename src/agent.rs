// Agent capability shared by every player the match host can drive

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{Board, BoardAdapter, GridAdapter};
use crate::types::{Move, PlayerTag};

/// A player: fixed colour, one move per call
pub trait Agent {
    /// Colour this agent plays; owner tag for its own moves
    fn color(&self) -> PlayerTag;

    /// Short label for logs and reports
    fn name(&self) -> &str;

    /// Chooses the next move, or `None` when the board has no legal move
    fn compute(&mut self, board: &Board, time_remaining_ms: u64) -> Option<Move>;

    /// Called once before the first move of a match
    fn start(&mut self) {}

    /// Called once with the final board
    fn end(&mut self, _board: &Board) {}
}

/// Plays a uniformly random legal move; deterministic for a given seed
pub struct RandomAgent {
    color: PlayerTag,
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(color: PlayerTag, seed: u64) -> Self {
        RandomAgent {
            color,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn color(&self) -> PlayerTag {
        self.color
    }

    fn name(&self) -> &str {
        "random"
    }

    fn compute(&mut self, board: &Board, _time_remaining_ms: u64) -> Option<Move> {
        let moves = GridAdapter.valid_moves(board);
        if moves.is_empty() {
            return None;
        }
        Some(moves[self.rng.random_range(0..moves.len())])
    }
}
