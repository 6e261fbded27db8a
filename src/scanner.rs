//! Win detection and partial-line counting along the four line directions

use crate::game::{Board, Cell, Marker, Move, State};

/// Right, down, down-right and down-left
pub const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// The state of a game after a move, as seen by the driver
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Outcome {
    Ongoing,
    Win(Marker),
    Draw,
}

/// Returns true if `marker` has `k` contiguous cells in any of the four directions
pub fn has_win(board: &Board, marker: Marker, k: usize) -> bool {
    for (row, col, cell) in board.cells() {
        if cell != Cell::Taken(marker) {
            continue;
        }
        for &(dr, dc) in DIRECTIONS.iter() {
            if line_complete(board, row as isize, col as isize, dr, dc, marker, k) {
                return true;
            }
        }
    }
    false
}

/// The marker with a completed line, checking X first
pub fn winner(board: &Board, k: usize) -> Option<Marker> {
    if has_win(board, Marker::X, k) {
        Some(Marker::X)
    } else if has_win(board, Marker::O, k) {
        Some(Marker::O)
    } else {
        None
    }
}

/// True if either side has won or no empty cell remains
pub fn is_terminal(board: &Board, k: usize) -> bool {
    board.is_full() || winner(board, k).is_some()
}

// walk k-1 further steps from a cell already known to hold `marker`
#[inline]
fn line_complete(
    board: &Board,
    row: isize,
    col: isize,
    dr: isize,
    dc: isize,
    marker: Marker,
    k: usize,
) -> bool {
    (1..k as isize).all(|step| board.cell(row + step * dr, col + step * dc) == Some(Cell::Taken(marker)))
}

/// Counts maximal runs of exactly `length` markers that have at least one empty
/// cell at an end and enough room (empty or own cells, no opponent, no forbidden
/// cell, no edge) around them to be extended to `k`.
pub fn count_open_sequences(board: &Board, marker: Marker, length: usize, k: usize) -> usize {
    let own = Cell::Taken(marker);
    let mut count = 0;

    for (row, col, cell) in board.cells() {
        if cell != own {
            continue;
        }
        let (row, col) = (row as isize, col as isize);
        for &(dr, dc) in DIRECTIONS.iter() {
            // only start counting at the first cell of a run
            if board.cell(row - dr, col - dc) == Some(own) {
                continue;
            }

            let mut run = 1;
            while board.cell(row + run as isize * dr, col + run as isize * dc) == Some(own) {
                run += 1;
            }
            if run != length {
                continue;
            }

            let before = board.cell(row - dr, col - dc);
            let after = board.cell(row + run as isize * dr, col + run as isize * dc);
            if before != Some(Cell::Empty) && after != Some(Cell::Empty) {
                continue;
            }

            if room(board, row, col, dr, dc, run, marker, k) >= k {
                count += 1;
            }
        }
    }
    count
}

// number of cells on the line through the run that the run could grow into, capped at k
#[allow(clippy::too_many_arguments)]
fn room(
    board: &Board,
    row: isize,
    col: isize,
    dr: isize,
    dc: isize,
    run: usize,
    marker: Marker,
    k: usize,
) -> usize {
    let open = |cell: Option<Cell>| match cell {
        Some(Cell::Empty) => true,
        Some(Cell::Taken(m)) => m == marker,
        _ => false,
    };

    let mut span = run;
    let mut step = run as isize;
    while span < k && open(board.cell(row + step * dr, col + step * dc)) {
        span += 1;
        step += 1;
    }
    let mut step = 1;
    while span < k && open(board.cell(row - step * dr, col - step * dc)) {
        span += 1;
        step += 1;
    }
    span
}

/// Checks the lines through `last_move` for a win by the marker placed there,
/// then whether the board is full.
///
/// Lets a driver confirm game-ending conditions independently of the search.
pub fn test_win(state: &State, last_move: Move, k: usize) -> Outcome {
    let board = state.board();
    let (row, col) = (last_move.row as isize, last_move.col as isize);
    // an off-board move completes nothing
    if let Some(marker) = board.cell(row, col).and_then(|cell| cell.marker()) {
        let own = Cell::Taken(marker);
        for &(dr, dc) in DIRECTIONS.iter() {
            let mut run = 1;
            for &sign in [-1isize, 1].iter() {
                let mut step = 1;
                while board.cell(row + sign * step * dr, col + sign * step * dc) == Some(own) {
                    run += 1;
                    step += 1;
                }
            }
            if run >= k {
                return Outcome::Win(marker);
            }
        }
    }

    if board.is_full() {
        Outcome::Draw
    } else {
        Outcome::Ongoing
    }
}
