//! Stacked-history observation planes.
//!
//! Layout (`2 * history + 1` planes of `size x size`):
//! - planes `2k` and `2k + 1`: stones of the player to move and of the
//!   opponent, `k` plies before the current position
//! - last plane: all ones when black is to move, zeros otherwise
//!
//! Positions older than the start of the game encode as empty boards.

use crate::board::Board;
use alphazero_core::Player;

/// Number of planes for a history depth.
pub fn num_planes(history: usize) -> usize {
    2 * history + 1
}

/// Encode `board` with `history` positions of context.
pub fn encode(board: &Board, history: usize) -> Vec<f32> {
    let area = board.size() * board.size();
    let mut planes = vec![0.0; num_planes(history) * area];
    let me = board.to_play();
    let moves = board.moves();
    let mut cells = board.cells().to_vec();

    for step in 0..history {
        let own = 2 * step * area;
        let theirs = own + area;
        for (i, cell) in cells.iter().enumerate() {
            match cell {
                Some(p) if *p == me => planes[own + i] = 1.0,
                Some(_) => planes[theirs + i] = 1.0,
                None => {}
            }
        }

        // Take back one ply; once the board is empty the rest stay zero
        match moves.len().checked_sub(step + 1) {
            Some(idx) => cells[moves[idx]] = None,
            None => break,
        }
    }

    if me == Player::Black {
        let color = 2 * history * area;
        planes[color..color + area].fill(1.0);
    }

    planes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardSpec;

    fn play(spec: &BoardSpec, moves: &[usize]) -> Board {
        moves
            .iter()
            .fold(Board::empty(spec.size), |board, &a| spec.place(&board, a))
    }

    fn plane(obs: &[f32], index: usize, area: usize) -> &[f32] {
        &obs[index * area..(index + 1) * area]
    }

    #[test]
    fn test_empty_board_black_to_move() {
        let board = Board::empty(3);
        let obs = encode(&board, 2);
        assert_eq!(obs.len(), 5 * 9);
        assert!(obs[..4 * 9].iter().all(|&x| x == 0.0));
        assert!(plane(&obs, 4, 9).iter().all(|&x| x == 1.0));
    }

    #[test]
    fn test_planes_follow_side_to_move() {
        let spec = BoardSpec::new(3, 3, 2).unwrap();
        // Black 0, white 4; black to move
        let board = play(&spec, &[0, 4]);
        let obs = encode(&board, 2);

        assert_eq!(plane(&obs, 0, 9)[0], 1.0);
        assert_eq!(plane(&obs, 1, 9)[4], 1.0);
        assert_eq!(plane(&obs, 0, 9).iter().sum::<f32>(), 1.0);
        assert!(plane(&obs, 4, 9).iter().all(|&x| x == 1.0));

        // One ply back white's stone is gone
        assert_eq!(plane(&obs, 2, 9)[0], 1.0);
        assert_eq!(plane(&obs, 3, 9).iter().sum::<f32>(), 0.0);
    }

    #[test]
    fn test_white_to_move_has_zero_color_plane() {
        let spec = BoardSpec::new(3, 3, 1).unwrap();
        let board = play(&spec, &[0]);
        let obs = encode(&board, 1);
        // White to move: black's stone is the opponent plane
        assert_eq!(plane(&obs, 1, 9)[0], 1.0);
        assert_eq!(plane(&obs, 0, 9).iter().sum::<f32>(), 0.0);
        assert!(plane(&obs, 2, 9).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_history_older_than_game_is_empty() {
        let spec = BoardSpec::new(3, 3, 4).unwrap();
        let board = play(&spec, &[0]);
        let obs = encode(&board, 4);
        for step in 1..4 {
            assert_eq!(plane(&obs, 2 * step, 9).iter().sum::<f32>(), 0.0);
            assert_eq!(plane(&obs, 2 * step + 1, 9).iter().sum::<f32>(), 0.0);
        }
    }
}
