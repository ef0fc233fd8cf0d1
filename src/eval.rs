// Static position evaluation
// Scores a board from one player's point of view using ownership and the
// distribution of filled edges over the open cells

use crate::board::Board;
use crate::config::HeuristicConfig;
use crate::types::{Cell, PlayerTag};

/// Scores `board` for `me`; higher is better
///
/// * claimed cells: `+claimed_weight` when mine, `-claimed_weight` when the opponent's
/// * open cells with two lines: `+chain_seed_weight`
/// * open cells with no lines: `+untouched_weight`
/// * open cells with three lines: `-three_lines_penalty`
pub fn evaluate_board(board: &Board, me: PlayerTag, weights: &HeuristicConfig) -> i32 {
    let mut score = 0;
    let mut three_lines_cells = 0;

    for (_, cell) in board.iter() {
        match cell {
            Cell::Claimed { owner } if owner == me => score += weights.claimed_weight,
            Cell::Claimed { .. } => score -= weights.claimed_weight,
            Cell::Open { .. } => match cell.lines() {
                0 => score += weights.untouched_weight,
                2 => score += weights.chain_seed_weight,
                3 => three_lines_cells += 1,
                _ => {}
            },
        }
    }

    score - three_lines_cells * weights.three_lines_penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn weights(penalty: i32) -> HeuristicConfig {
        HeuristicConfig {
            claimed_weight: 50,
            chain_seed_weight: 5,
            untouched_weight: 1,
            three_lines_penalty: penalty,
        }
    }

    #[test]
    fn test_empty_board_counts_untouched_cells() {
        let board = Board::new(3);
        assert_eq!(evaluate_board(&board, PlayerTag::Red, &weights(15)), 9);
    }

    #[test]
    fn test_ownership_is_symmetric() {
        let board = Board::from_rows(vec![
            vec![Cell::Claimed { owner: PlayerTag::Red }, Cell::Claimed { owner: PlayerTag::Red }],
            vec![Cell::Claimed { owner: PlayerTag::Blue }, Cell::Open { mask: 0b0011 }],
        ])
        .unwrap();

        let w = weights(0);
        assert_eq!(evaluate_board(&board, PlayerTag::Red, &w), 50 + 50 - 50 + 5);
        assert_eq!(evaluate_board(&board, PlayerTag::Blue, &w), -50 - 50 + 50 + 5);
    }

    #[test]
    fn test_three_line_penalty_only_in_refined_weights() {
        let board = Board::from_rows(vec![
            vec![Cell::Open { mask: 0b0111 }, Cell::Open { mask: 0b0001 }],
            vec![Cell::Open { mask: 0b1011 }, Cell::Open { mask: 0b0000 }],
        ])
        .unwrap();

        let baseline = Config::baseline().heuristic;
        let refined = Config::refined().heuristic;
        assert_eq!(evaluate_board(&board, PlayerTag::Red, &baseline), 1);
        assert_eq!(evaluate_board(&board, PlayerTag::Red, &refined), 1 - 30);
    }

    #[test]
    fn test_claimed_cells_get_no_line_bonus() {
        let board = Board::from_rows(vec![vec![Cell::Claimed { owner: PlayerTag::Blue }]]).unwrap();
        assert_eq!(evaluate_board(&board, PlayerTag::Red, &weights(15)), -50);
    }
}
