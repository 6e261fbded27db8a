//! Board, state and game type definitions

use anyhow::{anyhow, Result};

use std::fmt;
use std::time::Duration;

use crate::MAX_DIMENSION;

/// One of the two players' markers
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Marker {
    X,
    O,
}

impl Marker {
    pub fn opponent(self) -> Self {
        match self {
            Marker::X => Marker::O,
            Marker::O => Marker::X,
        }
    }

    /// Index of the marker in per-marker tables
    pub fn index(self) -> usize {
        match self {
            Marker::X => 0,
            Marker::O => 1,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Marker::X => 'X',
            Marker::O => 'O',
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Cell {
    Empty,
    Forbidden,
    Taken(Marker),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            _ => false,
        }
    }

    pub fn marker(&self) -> Option<Marker> {
        match self {
            Cell::Taken(marker) => Some(*marker),
            _ => None,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' | '.' => Some(Cell::Empty),
            '-' | '#' => Some(Cell::Forbidden),
            'X' | 'x' => Some(Cell::Taken(Marker::X)),
            'O' | 'o' => Some(Cell::Taken(Marker::O)),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Forbidden => '-',
            Cell::Taken(marker) => marker.as_char(),
        }
    }
}

impl From<Marker> for Cell {
    fn from(marker: Marker) -> Self {
        Cell::Taken(marker)
    }
}

/// A 0-indexed (row, column) coordinate of the cell to fill
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Move {
    pub row: usize,
    pub col: usize,
}

impl Move {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// An n×m grid of cells, stored row-major
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Board {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    /// Parses a board from one string per row.
    ///
    /// `X`/`O` are markers, a space or `.` is empty and `-` or `#` is a forbidden cell.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let cols = rows.first().map_or(0, |row| row.as_ref().chars().count());
        if rows.is_empty() || cols == 0 {
            return Err(anyhow!("a board needs at least one row and one column"));
        }
        if rows.len() > MAX_DIMENSION || cols > MAX_DIMENSION {
            return Err(anyhow!(
                "board of {}x{} exceeds the maximum dimension of {}",
                rows.len(),
                cols,
                MAX_DIMENSION
            ));
        }

        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != cols {
                return Err(anyhow!(
                    "row {} has {} cells, expected {}",
                    row_index,
                    row.chars().count(),
                    cols
                ));
            }
            for c in row.chars() {
                match Cell::from_char(c) {
                    Some(cell) => cells.push(cell),
                    None => return Err(anyhow!("could not parse '{}' as a board cell", c)),
                }
            }
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.cols + col]
    }

    /// Bounds-checked access with signed coordinates, for line walks
    #[inline]
    pub fn cell(&self, row: isize, col: isize) -> Option<Cell> {
        if self.in_bounds(row, col) {
            Some(self.cells[row as usize * self.cols + col as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn in_bounds(&self, row: isize, col: isize) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[row * self.cols + col] = cell;
    }

    /// Iterates over every cell as `(row, col, cell)` in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (idx / cols, idx % cols, *cell))
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_empty()).count()
    }

    pub fn marker_count(&self, marker: Marker) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == Cell::Taken(marker))
            .count()
    }

    pub fn is_full(&self) -> bool {
        !self.cells.iter().any(|cell| cell.is_empty())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..self.cols {
                write!(f, "{}", self.get(row, col).as_char())?;
            }
        }
        Ok(())
    }
}

/// An immutable snapshot of the grid and whose turn is next.
///
/// Every move produces a new `State`; nothing is mutated in place, so branches
/// of the search tree never share a board.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct State {
    board: Board,
    whose_move: Marker,
    finished: bool,
}

impl State {
    pub fn new(board: Board, whose_move: Marker) -> Self {
        Self {
            board,
            whose_move,
            finished: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn whose_move(&self) -> Marker {
        self.whose_move
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_full(&self) -> bool {
        self.board.is_full()
    }

    pub fn marker_count(&self, marker: Marker) -> usize {
        self.board.marker_count(marker)
    }

    /// Marks the game as over
    pub fn finish(mut self) -> Self {
        self.finished = true;
        self
    }

    /// Copies the state with `mv` filled by the side to move and the turn flipped.
    ///
    /// The move is assumed to be legal; use [`State::apply`] for untrusted input.
    pub fn with_move(&self, mv: Move) -> Self {
        debug_assert!(self.board.get(mv.row, mv.col).is_empty());
        let mut board = self.board.clone();
        board.set(mv.row, mv.col, Cell::Taken(self.whose_move));
        Self {
            board,
            whose_move: self.whose_move.opponent(),
            finished: false,
        }
    }

    /// Validates and applies a move from an untrusted source
    pub fn apply(&self, mv: Move) -> Result<Self> {
        if self.finished {
            return Err(anyhow!("Invalid move {}, the game is already over", mv));
        }
        if mv.row >= self.board.rows() || mv.col >= self.board.cols() {
            return Err(anyhow!(
                "Invalid move {}, out of range. Rows must be below {} and columns below {}",
                mv,
                self.board.rows(),
                self.board.cols()
            ));
        }
        match self.board.get(mv.row, mv.col) {
            Cell::Empty => Ok(self.with_move(mv)),
            Cell::Forbidden => Err(anyhow!("Invalid move {}, cell is forbidden", mv)),
            Cell::Taken(marker) => Err(anyhow!(
                "Invalid move {}, cell already taken by {}",
                mv,
                marker
            )),
        }
    }
}

/// The rules of one game: win length, dimensions, starting position and limits
#[derive(Clone, Debug)]
pub struct GameType {
    pub long_name: String,
    pub short_name: String,
    /// Number of markers in a line needed to win
    pub k: usize,
    /// Rows
    pub n: usize,
    /// Columns
    pub m: usize,
    pub initial_state: State,
    pub turn_limit: usize,
    pub time_per_move: Duration,
}

impl GameType {
    pub fn new<S: Into<String>>(
        long_name: S,
        short_name: S,
        k: usize,
        initial_state: State,
        turn_limit: usize,
        time_per_move: Duration,
    ) -> Result<Self> {
        let (n, m) = (initial_state.board().rows(), initial_state.board().cols());
        if n == 0 || m == 0 || n > MAX_DIMENSION || m > MAX_DIMENSION {
            return Err(anyhow!(
                "board dimensions must be between 1 and {}, got {}x{}",
                MAX_DIMENSION,
                n,
                m
            ));
        }
        if k == 0 {
            return Err(anyhow!("k must be at least 1"));
        }
        if k > n.max(m) {
            return Err(anyhow!(
                "{}-in-a-row can never be completed on a {}x{} board",
                k,
                n,
                m
            ));
        }
        Ok(Self {
            long_name: long_name.into(),
            short_name: short_name.into(),
            k,
            n,
            m,
            initial_state,
            turn_limit,
            time_per_move,
        })
    }

    /// Classic 3x3 tic-tac-toe
    pub fn tic_tac_toe() -> Self {
        Self {
            long_name: "Tic-Tac-Toe".to_string(),
            short_name: "TTT".to_string(),
            k: 3,
            n: 3,
            m: 3,
            initial_state: State::new(Board::new(3, 3), Marker::X),
            turn_limit: 9,
            time_per_move: Duration::from_secs(1),
        }
    }

    /// Five in a row on a 7x7 board with the corners forbidden
    pub fn five_in_a_row() -> Self {
        let mut board = Board::new(7, 7);
        for &(row, col) in [(0, 0), (0, 6), (6, 0), (6, 6)].iter() {
            board.set(row, col, Cell::Forbidden);
        }
        Self {
            long_name: "Five in a Row on Seven-by-Seven Board with Corners Forbidden".to_string(),
            short_name: "5-in-a-Row".to_string(),
            k: 5,
            n: 7,
            m: 7,
            initial_state: State::new(board, Marker::X),
            turn_limit: 45,
            time_per_move: Duration::from_secs(1),
        }
    }

    /// Five in a row on a 7x8 board with a block of obstacles in the middle
    pub fn cassini() -> Self {
        let mut board = Board::new(7, 8);
        for &(row, col) in [(2, 3), (2, 4), (3, 2), (3, 3), (3, 4), (3, 5), (4, 3), (4, 4)].iter() {
            board.set(row, col, Cell::Forbidden);
        }
        Self {
            long_name: "Cassini: Five in a Row around an Obstacle".to_string(),
            short_name: "Cassini".to_string(),
            k: 5,
            n: 7,
            m: 8,
            initial_state: State::new(board, Marker::X),
            turn_limit: 48,
            time_per_move: Duration::from_secs(1),
        }
    }

    /// An empty n×m board with k-in-a-row to win
    pub fn custom(k: usize, n: usize, m: usize) -> Result<Self> {
        if n == 0 || m == 0 || n > MAX_DIMENSION || m > MAX_DIMENSION {
            return Err(anyhow!(
                "board dimensions must be between 1 and {}, got {}x{}",
                MAX_DIMENSION,
                n,
                m
            ));
        }
        Self::new(
            format!("{}-in-a-Row on {}x{} Board", k, n, m),
            format!("{}-in-a-Row", k),
            k,
            State::new(Board::new(n, m), Marker::X),
            n * m,
            Duration::from_secs(1),
        )
    }

    /// A custom game starting from a textual board (see [`Board::from_rows`])
    pub fn from_rows<S: AsRef<str>>(k: usize, rows: &[S], whose_move: Marker) -> Result<Self> {
        let board = Board::from_rows(rows)?;
        let (n, m) = (board.rows(), board.cols());
        let turn_limit = board.empty_count();
        Self::new(
            format!("{}-in-a-Row on {}x{} Board", k, n, m),
            format!("{}-in-a-Row", k),
            k,
            State::new(board, whose_move),
            turn_limit,
            Duration::from_secs(1),
        )
    }
}
