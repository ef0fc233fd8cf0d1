// Minimax search with alpha-beta pruning
//
// Every hypothetical move is played on a clone obtained from the board
// adapter; the caller's board is never touched. An optional deadline turns
// the search into a best-effort one: it is checked on entry to each node,
// and a node entered after it expires returns its static evaluation.

use log::debug;

use crate::board::{Board, BoardAdapter};
use crate::chains::Deadline;
use crate::config::HeuristicConfig;
use crate::eval::evaluate_board;
use crate::types::{Move, PlayerTag};

/// Counters collected during one search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub evaluations: u64,
    pub cutoffs: u64,
    pub deadline_hits: u64,
}

/// Everything a search needs besides the board
pub struct SearchContext<'a, A: BoardAdapter + ?Sized> {
    adapter: &'a A,
    me: PlayerTag,
    weights: HeuristicConfig,
    deadline: Option<Deadline>,
    stats: SearchStats,
}

impl<'a, A: BoardAdapter + ?Sized> SearchContext<'a, A> {
    pub fn new(adapter: &'a A, me: PlayerTag, weights: HeuristicConfig) -> Self {
        SearchContext {
            adapter,
            me,
            weights,
            deadline: None,
            stats: SearchStats::default(),
        }
    }

    /// Bounds the search by a wall-clock deadline
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    fn out_of_time(&self) -> bool {
        self.deadline.map_or(false, |d| d.expired())
    }

    fn evaluate(&mut self, board: &Board) -> i32 {
        self.stats.evaluations += 1;
        evaluate_board(board, self.me, &self.weights)
    }

    /// Clone of `board` with `mv` played by `player`
    fn child(&self, board: &Board, mv: Move, player: PlayerTag) -> Board {
        let mut next = self.adapter.clone_board(board);
        self.adapter.apply_move(&mut next, mv, player);
        next
    }
}

/// Minimax value of `board` searched `depth` plies deep
///
/// Maximizing nodes play for the context's player, minimizing nodes for the
/// opponent. Sibling moves are skipped once `beta <= alpha`.
pub fn minimax<A: BoardAdapter + ?Sized>(
    board: &Board,
    depth: u8,
    maximizing: bool,
    mut alpha: i32,
    mut beta: i32,
    ctx: &mut SearchContext<'_, A>,
) -> i32 {
    ctx.stats.nodes += 1;

    if ctx.out_of_time() {
        ctx.stats.deadline_hits += 1;
        return ctx.evaluate(board);
    }

    let moves = ctx.adapter.valid_moves(board);
    if depth == 0 || moves.is_empty() {
        return ctx.evaluate(board);
    }

    if maximizing {
        let mut best = i32::MIN;
        for mv in moves {
            let next = ctx.child(board, mv, ctx.me);
            let score = minimax(&next, depth - 1, false, alpha, beta, ctx);
            best = best.max(score);
            alpha = alpha.max(score);
            if beta <= alpha {
                ctx.stats.cutoffs += 1;
                break;
            }
        }
        best
    } else {
        let mut best = i32::MAX;
        for mv in moves {
            let next = ctx.child(board, mv, ctx.me.opponent());
            let score = minimax(&next, depth - 1, true, alpha, beta, ctx);
            best = best.min(score);
            beta = beta.min(score);
            if beta <= alpha {
                ctx.stats.cutoffs += 1;
                break;
            }
        }
        best
    }
}

/// Best root move for the context's player and its minimax value
///
/// Ties keep the earliest move. With a deadline, no new root move is started
/// once it has passed; the best so far (initially the first legal move) is
/// returned. `None` when there are no legal moves.
pub fn find_best_move<A: BoardAdapter + ?Sized>(
    board: &Board,
    depth: u8,
    ctx: &mut SearchContext<'_, A>,
) -> Option<(Move, i32)> {
    let moves = ctx.adapter.valid_moves(board);
    let mut best_move = *moves.first()?;
    let mut best_score = i32::MIN;
    let next_depth = depth.saturating_sub(1);

    for mv in moves {
        if ctx.out_of_time() {
            ctx.stats.deadline_hits += 1;
            break;
        }

        let next = ctx.child(board, mv, ctx.me);
        let score = minimax(&next, next_depth, false, i32::MIN, i32::MAX, ctx);
        if score > best_score {
            best_score = score;
            best_move = mv;
        }
    }

    debug!(
        "Search depth {}: best {} score {} ({} nodes, {} evals, {} cutoffs, {} deadline hits)",
        depth,
        best_move,
        best_score,
        ctx.stats.nodes,
        ctx.stats.evaluations,
        ctx.stats.cutoffs,
        ctx.stats.deadline_hits
    );

    Some((best_move, best_score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GridAdapter;
    use crate::config::Config;
    use crate::types::{Cell, Side};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn weights() -> HeuristicConfig {
        Config::refined().heuristic
    }

    /// Plain minimax without pruning, as a reference
    fn exhaustive(board: &Board, depth: u8, maximizing: bool, me: PlayerTag) -> i32 {
        let adapter = GridAdapter;
        let moves = adapter.valid_moves(board);
        if depth == 0 || moves.is_empty() {
            return evaluate_board(board, me, &weights());
        }
        let player = if maximizing { me } else { me.opponent() };
        let scores = moves.into_iter().map(|mv| {
            let mut next = board.clone();
            adapter.apply_move(&mut next, mv, player);
            exhaustive(&next, depth - 1, !maximizing, me)
        });
        if maximizing {
            scores.max().unwrap_or(i32::MIN)
        } else {
            scores.min().unwrap_or(i32::MAX)
        }
    }

    fn exhaustive_root(board: &Board, depth: u8, me: PlayerTag) -> (Move, i32) {
        let adapter = GridAdapter;
        let mut best: Option<(Move, i32)> = None;
        for mv in adapter.valid_moves(board) {
            let mut next = board.clone();
            adapter.apply_move(&mut next, mv, me);
            let score = exhaustive(&next, depth - 1, false, me);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((mv, score));
            }
        }
        best.unwrap()
    }

    /// Plays `plies` random moves from an empty board
    fn random_position(size: usize, plies: usize, seed: u64) -> Board {
        let adapter = GridAdapter;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::new(size);
        let mut player = PlayerTag::Red;
        for _ in 0..plies {
            let moves = adapter.valid_moves(&board);
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.random_range(0..moves.len())];
            adapter.apply_move(&mut board, mv, player);
            player = player.opponent();
        }
        board
    }

    #[test]
    fn test_depth_zero_returns_static_evaluation() {
        let board = random_position(3, 7, 1);
        let mut ctx = SearchContext::new(&GridAdapter, PlayerTag::Red, weights());
        let score = minimax(&board, 0, true, i32::MIN, i32::MAX, &mut ctx);
        assert_eq!(score, evaluate_board(&board, PlayerTag::Red, &weights()));
    }

    #[test]
    fn test_terminal_board_returns_static_evaluation() {
        let board = Board::from_rows(vec![
            vec![Cell::Claimed { owner: PlayerTag::Red }, Cell::Claimed { owner: PlayerTag::Blue }],
            vec![Cell::Claimed { owner: PlayerTag::Red }, Cell::Claimed { owner: PlayerTag::Red }],
        ])
        .unwrap();
        let mut ctx = SearchContext::new(&GridAdapter, PlayerTag::Red, weights());
        let score = minimax(&board, 4, false, i32::MIN, i32::MAX, &mut ctx);
        assert_eq!(score, 100);
        assert_eq!(find_best_move(&board, 4, &mut ctx), None);
    }

    #[test]
    fn test_pruning_matches_exhaustive_minimax() {
        for seed in 0..6 {
            let board = random_position(2, 6 + seed as usize, seed);
            for depth in 1..=3 {
                let mut ctx = SearchContext::new(&GridAdapter, PlayerTag::Blue, weights());
                let pruned = find_best_move(&board, depth, &mut ctx);
                let expected = exhaustive_root(&board, depth, PlayerTag::Blue);
                assert_eq!(pruned, Some(expected), "seed {} depth {}", seed, depth);
            }
        }
    }

    #[test]
    fn test_pruning_cuts_nodes() {
        let board = random_position(2, 4, 9);
        let mut ctx = SearchContext::new(&GridAdapter, PlayerTag::Red, weights());
        find_best_move(&board, 3, &mut ctx);
        assert!(ctx.stats().cutoffs > 0);
    }

    #[test]
    fn test_search_never_mutates_input() {
        let board = random_position(3, 10, 3);
        let before = board.clone();
        let mut ctx = SearchContext::new(&GridAdapter, PlayerTag::Red, weights());
        find_best_move(&board, 2, &mut ctx);
        assert_eq!(board, before);
    }

    #[test]
    fn test_takes_free_box() {
        // (0,0) is missing only its top side: taking it is worth a box
        let board = Board::from_rows(vec![
            vec![Cell::Open { mask: 0b1110 }, Cell::Open { mask: 0b1000 }],
            vec![Cell::Open { mask: 0b0001 }, Cell::Open { mask: 0b0000 }],
        ])
        .unwrap();
        let mut ctx = SearchContext::new(&GridAdapter, PlayerTag::Red, weights());
        let (mv, _) = find_best_move(&board, 1, &mut ctx).unwrap();
        assert_eq!(mv, Move::new(0, 0, Side::Top));
    }

    #[test]
    fn test_expired_deadline_falls_back_to_first_move() {
        let board = Board::new(3);
        let deadline = Deadline::after_ms(0);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let mut ctx =
            SearchContext::new(&GridAdapter, PlayerTag::Red, weights()).with_deadline(deadline);
        let (mv, score) = find_best_move(&board, 4, &mut ctx).unwrap();
        assert_eq!(mv, GridAdapter.valid_moves(&board)[0]);
        assert_eq!(score, i32::MIN);
        assert_eq!(ctx.stats().nodes, 0);
    }

    #[test]
    fn test_expired_deadline_returns_static_value_at_node() {
        let board = Board::new(2);
        let deadline = Deadline::after_ms(0);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let mut ctx =
            SearchContext::new(&GridAdapter, PlayerTag::Red, weights()).with_deadline(deadline);
        let score = minimax(&board, 5, true, i32::MIN, i32::MAX, &mut ctx);
        assert_eq!(score, evaluate_board(&board, PlayerTag::Red, &weights()));
        assert_eq!(ctx.stats().deadline_hits, 1);
    }
}
