//! Move generation and cheap move ordering

use crate::game::{Move, State};

/// Collects candidate moves and yields them best-first.
///
/// Moves pushed with equal scores come out in the reverse order they were
/// pushed in, so push in reverse to keep a stable order among ties.
pub struct MoveSorter {
    moves: Vec<(Move, i32)>,
}

impl MoveSorter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            moves: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, new_move: Move, score: i32) {
        let mut pos = self.moves.len();
        self.moves.push((new_move, score));
        while pos != 0 && self.moves[pos - 1].1 > score {
            self.moves[pos] = self.moves[pos - 1];
            pos -= 1;
        }
        self.moves[pos] = (new_move, score);
    }
}

impl Iterator for MoveSorter {
    type Item = Move;

    fn next(&mut self) -> Option<Self::Item> {
        self.moves.pop().map(|(mv, _)| mv)
    }
}

/// All empty cells, in row-major order
pub fn legal_moves(state: &State) -> Vec<Move> {
    state
        .board()
        .cells()
        .filter(|(_, _, cell)| cell.is_empty())
        .map(|(row, col, _)| Move::new(row, col))
        .collect()
}

/// Sorts moves by [`move_heuristic`], highest first, keeping the input order among ties
pub fn order_moves(state: &State, moves: Vec<Move>) -> Vec<Move> {
    let mut sorter = MoveSorter::with_capacity(moves.len());
    for &mv in moves.iter().rev() {
        sorter.push(mv, move_heuristic(state, mv));
    }
    sorter.collect()
}

/// Closeness to the centre plus the number of neighbouring markers.
///
/// Looks at no more than the 8 neighbours, far less work than a static evaluation.
pub fn move_heuristic(state: &State, mv: Move) -> i32 {
    let board = state.board();
    let (centre_row, centre_col) = ((board.rows() / 2) as isize, (board.cols() / 2) as isize);
    let (row, col) = (mv.row as isize, mv.col as isize);

    let distance = (row - centre_row).abs() + (col - centre_col).abs();
    let mut score = -(distance as i32) * 10;

    for dr in -1..=1 {
        for dc in -1..=1 {
            if (dr, dc) == (0, 0) {
                continue;
            }
            if let Some(cell) = board.cell(row + dr, col + dc) {
                if cell.marker().is_some() {
                    score += 5;
                }
            }
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Marker};

    #[test]
    fn sorter_keeps_ties_in_order() {
        let mut sorter = MoveSorter::with_capacity(3);
        let moves = [Move::new(0, 0), Move::new(0, 1), Move::new(0, 2)];
        for &mv in moves.iter().rev() {
            sorter.push(mv, 0);
        }
        assert_eq!(sorter.collect::<Vec<_>>(), moves.to_vec());
    }

    #[test]
    fn centre_and_neighbours_first() -> anyhow::Result<()> {
        let board = Board::from_rows(&["X    ", "     ", "     ", "     ", "     "])?;
        let state = State::new(board, Marker::O);
        let ordered = order_moves(&state, legal_moves(&state));
        assert_eq!(ordered[0], Move::new(2, 2));
        assert_eq!(ordered.len(), 24);
        // two steps out, one neighbouring marker
        assert_eq!(move_heuristic(&state, Move::new(1, 1)), -15);
        Ok(())
    }
}
