use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GridError, GridResult};

/// A cell coordinate. Rows grow downwards, columns grow to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }

    /// Number of axis-aligned unit steps between two cells
    pub fn manhattan(&self, other: &Coord) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Visual and search state of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Free,
    Barrier,
    Start,
    End,
    /// Discovered by the search, not yet expanded
    Open,
    /// Fully expanded by the search
    Closed,
    /// Part of the reconstructed shortest path
    Path,
}

impl CellState {
    /// True for the states written by a search run
    pub fn is_search_mark(self) -> bool {
        matches!(self, CellState::Open | CellState::Closed | CellState::Path)
    }

    /// Character used by the ASCII layout format
    pub fn symbol(self) -> char {
        match self {
            CellState::Free => '.',
            CellState::Barrier => '#',
            CellState::Start => 'S',
            CellState::End => 'E',
            CellState::Open => 'o',
            CellState::Closed => 'x',
            CellState::Path => '*',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(CellState::Free),
            '#' => Some(CellState::Barrier),
            'S' => Some(CellState::Start),
            'E' => Some(CellState::End),
            'o' => Some(CellState::Open),
            'x' => Some(CellState::Closed),
            '*' => Some(CellState::Path),
            _ => None,
        }
    }
}

/// Snapshot of one grid square
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub state: CellState,
}

impl Cell {
    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

/// Square N x N grid of cells, stored row-major.
///
/// The grid tracks which cell currently holds the Start and End markers so that at
/// most one of each exists no matter how callers paint.
#[derive(Clone, Debug)]
pub struct Grid {
    size: usize,
    cells: Vec<CellState>,
    start: Option<Coord>,
    end: Option<Coord>,
    /// Revision number - incremented whenever a cell changes
    revision: u64,
}

impl Grid {
    /// Create an N x N grid with every cell free
    pub fn create(size: usize) -> GridResult<Self> {
        if size < 1 {
            return Err(GridError::InvalidSize(size));
        }
        let count = size.checked_mul(size).ok_or(GridError::InvalidSize(size))?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(count)
            .map_err(|_| GridError::InvalidSize(size))?;
        cells.resize(count, CellState::Free);
        Ok(Grid {
            size,
            cells,
            start: None,
            end: None,
            revision: 0,
        })
    }

    /// Build a grid from an ASCII layout, one line per row.
    ///
    /// Blank lines and surrounding whitespace are ignored. Every row must have as many
    /// cells as there are rows.
    pub fn from_layout(layout: &str) -> GridResult<Self> {
        let rows: Vec<&str> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if rows.is_empty() {
            return Err(GridError::InvalidLayout("no rows".to_string()));
        }

        let size = rows.len();
        for (row, line) in rows.iter().enumerate() {
            let width = line.chars().count();
            if width != size {
                return Err(GridError::InvalidLayout(format!(
                    "row {} has {} cells, expected {}",
                    row, width, size
                )));
            }
        }

        let mut grid = Grid::create(size)?;
        for (row, line) in rows.iter().enumerate() {
            for (col, symbol) in line.chars().enumerate() {
                let state = CellState::from_symbol(symbol).ok_or_else(|| {
                    GridError::InvalidLayout(format!("unknown symbol '{}' at ({},{})", symbol, row, col))
                })?;
                if state == CellState::Start && grid.start.is_some() {
                    return Err(GridError::InvalidLayout("more than one start cell".to_string()));
                }
                if state == CellState::End && grid.end.is_some() {
                    return Err(GridError::InvalidLayout("more than one end cell".to_string()));
                }
                grid.set_state(row, col, state)?;
            }
        }

        Ok(grid)
    }

    /// Render the grid in the format read by [`Grid::from_layout`]
    pub fn to_layout(&self) -> String {
        let mut result = String::with_capacity(self.size * (self.size + 1));
        for row in self.cells.chunks(self.size) {
            result.extend(row.iter().map(|state| state.symbol()));
            result.push('\n');
        }
        result
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.size && coord.col < self.size
    }

    /// Cell currently marked as Start
    pub fn start(&self) -> Option<Coord> {
        self.start
    }

    /// Cell currently marked as End
    pub fn end(&self) -> Option<Coord> {
        self.end
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, row: usize, col: usize) -> GridResult<Cell> {
        let index = self.index(Coord::new(row, col))?;
        Ok(Cell { row, col, state: self.cells[index] })
    }

    pub fn state(&self, coord: Coord) -> GridResult<CellState> {
        Ok(self.cells[self.index(coord)?])
    }

    /// Assign a state to one cell.
    ///
    /// Assigning Start or End first clears the previous holder of that marker back to
    /// Free. Overwriting the Start or End cell with any other state drops the marker.
    pub fn set_state(&mut self, row: usize, col: usize, state: CellState) -> GridResult<()> {
        let coord = Coord::new(row, col);
        let index = self.index(coord)?;
        let old = self.cells[index];
        if old == state {
            return Ok(());
        }

        match state {
            CellState::Start => {
                if let Some(previous) = self.start.take() {
                    self.write(previous, CellState::Free);
                }
            }
            CellState::End => {
                if let Some(previous) = self.end.take() {
                    self.write(previous, CellState::Free);
                }
            }
            _ => {}
        }

        match old {
            CellState::Start => self.start = None,
            CellState::End => self.end = None,
            _ => {}
        }

        self.write(coord, state);
        match state {
            CellState::Start => self.start = Some(coord),
            CellState::End => self.end = Some(coord),
            _ => {}
        }
        Ok(())
    }

    /// In-bounds, non-barrier cells adjacent to `coord`, in the order down, up, right, left
    pub fn neighbors(&self, coord: Coord) -> GridResult<Vec<Cell>> {
        self.index(coord)?;
        let Coord { row, col } = coord;

        let mut candidates = Vec::with_capacity(4);
        if row + 1 < self.size {
            candidates.push(Coord::new(row + 1, col));
        }
        if row > 0 {
            candidates.push(Coord::new(row - 1, col));
        }
        if col + 1 < self.size {
            candidates.push(Coord::new(row, col + 1));
        }
        if col > 0 {
            candidates.push(Coord::new(row, col - 1));
        }

        Ok(candidates
            .into_iter()
            .map(|c| Cell { row: c.row, col: c.col, state: self.cells[c.row * self.size + c.col] })
            .filter(|cell| cell.state != CellState::Barrier)
            .collect())
    }

    /// Return every cell to Free, dropping the Start and End markers
    pub fn reset(&mut self) {
        self.cells.fill(CellState::Free);
        self.start = None;
        self.end = None;
        self.revision += 1;
    }

    /// Take over the cells and markers of another grid of the same size.
    ///
    /// Counts as a change, so the revision keeps increasing.
    pub fn copy_from(&mut self, other: &Grid) -> GridResult<()> {
        if other.size != self.size {
            return Err(GridError::InvalidSize(other.size));
        }
        self.cells.copy_from_slice(&other.cells);
        self.start = other.start;
        self.end = other.end;
        self.revision += 1;
        Ok(())
    }

    /// Return Open, Closed and Path cells to Free. Barriers and markers are kept.
    pub fn clear_search_marks(&mut self) {
        let mut changed = false;
        for state in self.cells.iter_mut().filter(|s| s.is_search_mark()) {
            *state = CellState::Free;
            changed = true;
        }
        if changed {
            self.revision += 1;
        }
    }

    /// All coordinates in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.size).flat_map(move |row| (0..self.size).map(move |col| Coord::new(row, col)))
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().enumerate().map(move |(index, &state)| Cell {
            row: index / self.size,
            col: index % self.size,
            state,
        })
    }

    /// Count cells in a given state
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&s| s == state).count()
    }

    pub(crate) fn index(&self, coord: Coord) -> GridResult<usize> {
        if self.contains(coord) {
            Ok(coord.row * self.size + coord.col)
        } else {
            Err(GridError::OutOfBounds { coord, size: self.size })
        }
    }

    fn write(&mut self, coord: Coord, state: CellState) {
        self.cells[coord.row * self.size + coord.col] = state;
        self.revision += 1;
    }
}
