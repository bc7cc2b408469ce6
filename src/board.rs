//! Board representation and move execution for the block-clearing puzzle.
//!
//! A board is a rectangular grid of cells, each either empty or holding one
//! of the palette colors. Clicking a cell removes the whole connected group
//! of same-colored cells (a *blob*), after which every column compacts
//! downward under gravity.
//!
//! Coordinates are `(x, y)` with `x` the column and `y` the row, `y = 0`
//! being the top row. Boards are plain values: every transformation either
//! works on `&mut self` explicitly or returns a fresh board.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{EMPTY_SYMBOL, SYMBOLS};

/// A block color from the fixed palette.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Blue,
    Green,
    Purple,
    Orange,
}

impl Color {
    /// Every palette color, in the same order as [`SYMBOLS`].
    pub const ALL: [Color; 4] = [Color::Blue, Color::Green, Color::Purple, Color::Orange];

    /// The board-file symbol for this color.
    pub fn symbol(self) -> char {
        match self {
            Color::Blue => SYMBOLS[0],
            Color::Green => SYMBOLS[1],
            Color::Purple => SYMBOLS[2],
            Color::Orange => SYMBOLS[3],
        }
    }

    /// Parse a board-file symbol. The empty marker is not a color.
    pub fn from_symbol(symbol: char) -> Option<Color> {
        Color::ALL.into_iter().find(|c| c.symbol() == symbol)
    }
}

/// A click on the cell at column `x`, row `y`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    pub x: usize,
    pub y: usize,
}

impl Move {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Errors raised while loading a board file.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("failed to read board file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid board: symbol {symbol:?} at row {row}, column {column} is not in the palette")]
    InvalidSymbol {
        symbol: char,
        row: usize,
        column: usize,
    },
    #[error("invalid board: row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A rectangular puzzle board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Option<Color>>,
}

impl Board {
    /// Create an empty board.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    /// Build a board from rows of cells, top row first.
    ///
    /// Fails if the rows are not all the same length. Floating blocks are
    /// settled by gravity, so the result is always a reachable position.
    pub fn from_rows(rows: Vec<Vec<Option<Color>>>) -> Result<Self, BoardError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(width * height);
        for (row, cols) in rows.into_iter().enumerate() {
            if cols.len() != width {
                return Err(BoardError::RaggedRow {
                    row,
                    expected: width,
                    found: cols.len(),
                });
            }
            cells.extend(cols);
        }
        let mut board = Self {
            width,
            height,
            cells,
        };
        board.apply_gravity();
        Ok(board)
    }

    /// Load a board file: one row per line, one palette symbol per cell.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BoardError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| BoardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    /// Generate a board with every cell drawn uniformly from the palette.
    pub fn random(width: usize, height: usize, rng: &mut fastrand::Rng) -> Self {
        let cells = (0..width * height)
            .map(|_| Some(Color::ALL[rng.usize(..Color::ALL.len())]))
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells on the board. Upper bound on the clicks needed to clear it.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Color at `(x, y)`, or `None` for empty and out-of-bounds cells.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Color> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells[self.idx(x, y)]
    }

    #[inline]
    pub fn is_empty(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_none()
    }

    /// True once the board has been cleared.
    ///
    /// Gravity keeps every column packed from the bottom, so an empty bottom
    /// row means an empty board.
    pub fn is_terminal(&self) -> bool {
        if self.height == 0 {
            return true;
        }
        let bottom = self.idx(0, self.height - 1);
        self.cells[bottom..bottom + self.width]
            .iter()
            .all(Option::is_none)
    }

    /// Number of non-empty cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Coordinates of every non-empty cell, in row-major order.
    pub fn occupied(&self) -> Vec<Move> {
        let mut out = Vec::with_capacity(self.cells.len());
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cells[self.idx(x, y)].is_some() {
                    out.push(Move::new(x, y));
                }
            }
        }
        out
    }

    fn neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = Move> {
        let (w, h) = (self.width, self.height);
        let mut v = Vec::with_capacity(4);
        if x + 1 < w {
            v.push(Move::new(x + 1, y));
        }
        if x > 0 {
            v.push(Move::new(x - 1, y));
        }
        if y + 1 < h {
            v.push(Move::new(x, y + 1));
        }
        if y > 0 {
            v.push(Move::new(x, y - 1));
        }
        v.into_iter()
    }

    /// Flood-fill the same-colored group containing `start`.
    ///
    /// Cells are marked in `visited` as they are pushed, so each cell enters
    /// the stack at most once. The first element of `out` is `start`.
    fn flood(&self, start: Move, visited: &mut [bool], out: &mut Vec<Move>) {
        let Some(color) = self.get(start.x, start.y) else {
            return;
        };
        let mut stack = vec![start];
        visited[self.idx(start.x, start.y)] = true;
        while let Some(p) = stack.pop() {
            out.push(p);
            for n in self.neighbors(p.x, p.y) {
                let ni = self.idx(n.x, n.y);
                if !visited[ni] && self.cells[ni] == Some(color) {
                    visited[ni] = true;
                    stack.push(n);
                }
            }
        }
    }

    /// Every cell of the blob containing `mv`. Empty when the cell is empty.
    pub fn blob(&self, mv: Move) -> Vec<Move> {
        let mut out = Vec::new();
        if self.in_bounds(mv.x, mv.y) {
            let mut visited = vec![false; self.cells.len()];
            self.flood(mv, &mut visited, &mut out);
        }
        out
    }

    /// One representative move per blob, in row-major scan order.
    ///
    /// The representative is the first cell of the blob met by the scan.
    pub fn blobs(&self) -> Vec<Move> {
        let mut visited = vec![false; self.cells.len()];
        let mut members = Vec::new();
        let mut blobs = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let i = self.idx(x, y);
                if visited[i] || self.cells[i].is_none() {
                    continue;
                }
                members.clear();
                self.flood(Move::new(x, y), &mut visited, &mut members);
                blobs.push(Move::new(x, y));
            }
        }
        blobs
    }

    /// Compact every column downward, keeping the vertical order of blocks.
    pub fn apply_gravity(&mut self) {
        for x in 0..self.width {
            let mut write = self.height;
            for y in (0..self.height).rev() {
                let i = self.idx(x, y);
                if self.cells[i].is_none() {
                    continue;
                }
                write -= 1;
                if write != y {
                    let w = self.idx(x, write);
                    self.cells[w] = self.cells[i].take();
                }
            }
        }
    }

    /// Click `mv` in place: remove its blob and apply gravity.
    ///
    /// Returns the number of cells removed. Clicking an empty or
    /// out-of-bounds cell leaves the board untouched and returns 0.
    pub fn play(&mut self, mv: Move) -> usize {
        let removed = self.blob(mv);
        if removed.is_empty() {
            return 0;
        }
        for p in &removed {
            let i = self.idx(p.x, p.y);
            self.cells[i] = None;
        }
        self.apply_gravity();
        removed.len()
    }

    /// The board that results from clicking `mv`.
    pub fn apply(&self, mv: Move) -> Board {
        let mut next = self.clone();
        next.play(mv);
        next
    }

    /// Apply a whole move sequence, returning the final board.
    pub fn replay(&self, moves: &[Move]) -> Board {
        let mut board = self.clone();
        for &mv in moves {
            board.play(mv);
        }
        board
    }
}

impl FromStr for Board {
    type Err = BoardError;

    /// Parse the board-file format. Trailing blank lines are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines: Vec<&str> = s.lines().map(str::trim).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        let mut rows = Vec::with_capacity(lines.len());
        for (row, line) in lines.iter().enumerate() {
            let cells = line
                .chars()
                .enumerate()
                .map(|(column, symbol)| {
                    Color::from_symbol(symbol)
                        .map(Some)
                        .ok_or(BoardError::InvalidSymbol {
                            symbol,
                            row,
                            column,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(cells);
        }
        Board::from_rows(rows)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let ch = self.get(x, y).map_or(EMPTY_SYMBOL, Color::symbol);
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
