use rand::{rngs::StdRng, Rng, SeedableRng};

use std::collections::HashMap;

use crate::game::{Board, GameType, Marker, Move};

/// Seed used for every game's Zobrist keys, so hashes are reproducible
pub const ZOBRIST_SEED: u64 = 42;

/// Independent random keys for every (row, column, marker) triple.
///
/// The hash of a board is the XOR of the keys of its occupied cells, so it only
/// depends on which cells hold which marker and not on the order they were filled.
#[derive(Clone, Debug)]
pub struct ZobristTable {
    cols: usize,
    keys: Vec<[u64; 2]>,
}

impl ZobristTable {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_seed(rows, cols, ZOBRIST_SEED)
    }

    pub fn with_seed(rows: usize, cols: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let keys = (0..rows * cols)
            .map(|_| [rng.random::<u64>(), rng.random::<u64>()])
            .collect();
        Self { cols, keys }
    }

    pub fn for_game(game: &GameType) -> Self {
        Self::new(game.n, game.m)
    }

    #[inline]
    pub fn key(&self, row: usize, col: usize, marker: Marker) -> u64 {
        self.keys[row * self.cols + col][marker.index()]
    }

    /// Full hash of a board; empty and forbidden cells contribute nothing
    pub fn hash(&self, board: &Board) -> u64 {
        board.cells().fold(0, |hash, (row, col, cell)| match cell.marker() {
            Some(marker) => hash ^ self.key(row, col, marker),
            None => hash,
        })
    }

    /// Hash after `marker` fills the cell of `mv`
    #[inline]
    pub fn update(&self, hash: u64, mv: Move, marker: Marker) -> u64 {
        hash ^ self.key(mv.row, mv.col, marker)
    }
}

/// How a stored score relates to the true value of the position
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Bound {
    Exact,
    /// The search failed high: the true value is at least the score
    Lower,
    /// The search failed low: the true value is at most the score
    Upper,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Entry {
    pub score: i32,
    pub depth_remaining: u32,
    pub bound: Bound,
}

impl Entry {
    /// The stored score if it settles a search within `(alpha, beta)`
    pub fn cutoff(&self, alpha: i32, beta: i32) -> Option<i32> {
        match self.bound {
            Bound::Exact => Some(self.score),
            Bound::Lower if self.score >= beta => Some(self.score),
            Bound::Upper if self.score <= alpha => Some(self.score),
            _ => None,
        }
    }
}

/// Scores of already-searched positions, keyed by Zobrist hash.
///
/// Distinct positions sharing a hash overwrite each other; that collision risk
/// is accepted rather than checked.
#[derive(Clone, Default, Debug)]
pub struct TranspositionTable {
    entries: HashMap<u64, Entry>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the entry for `hash` if it was searched at least `depth_remaining` deep
    pub fn lookup(&self, hash: u64, depth_remaining: u32) -> Option<Entry> {
        self.entries
            .get(&hash)
            .filter(|entry| entry.depth_remaining >= depth_remaining)
            .copied()
    }

    /// Stores an entry, replacing whatever was there
    pub fn store(&mut self, hash: u64, entry: Entry) {
        self.entries.insert(hash, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
