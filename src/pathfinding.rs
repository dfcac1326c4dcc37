use crate::error::{GridError, SearchError, SearchResult};
use crate::grid::{CellState, Coord, Grid};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::ops::ControlFlow;

/// g/f score of a cell that has not been reached yet
const UNREACHABLE: usize = usize::MAX;

/// Manhattan distance. Admissible and consistent for unit-cost 4-directional moves.
pub fn heuristic(from: Coord, to: Coord) -> usize {
    from.manhattan(&to)
}

/// Terminal result of a search run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Shortest path from start to end, both inclusive
    Found(Vec<Coord>),
    /// Frontier exhausted without reaching the end cell
    NotFound,
    /// The progress callback asked to stop; the grid keeps the partial trace
    Cancelled,
}

/// An entry in the open frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrontierEntry {
    f_score: usize,
    sequence: u64,
    coord: Coord,
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .f_score
            .cmp(&self.f_score)
            // Tie-breaker: earlier insertion wins
            .then_with(|| other.sequence.cmp(&self.sequence))
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

/// A* search between two cells, advanced one frontier pop at a time.
///
/// All state lives here and is dropped with the value, so cancelling a run is just a
/// matter of not calling [`AStar::step`] again. The grid is only touched to write the
/// Open, Closed and Path marks; Start and End cells keep their markers.
#[derive(Debug)]
pub struct AStar {
    start: Coord,
    end: Coord,
    size: usize,
    frontier: BinaryHeap<FrontierEntry>,
    open_membership: HashSet<Coord>,
    closed: HashSet<Coord>,
    g_score: Vec<usize>,
    f_score: Vec<usize>,
    came_from: HashMap<Coord, Coord>,
    counter: u64,
    expanded: usize,
    outcome: Option<SearchOutcome>,
}

impl AStar {
    /// Validate the endpoints and seed the frontier with `start`
    pub fn new(grid: &Grid, start: Coord, end: Coord) -> SearchResult<Self> {
        for (name, coord) in [("start", start), ("end", end)] {
            match grid.state(coord) {
                Err(e) => return Err(SearchError::InvalidInput(format!("{} {}", name, e))),
                Ok(CellState::Barrier) => {
                    return Err(SearchError::InvalidInput(format!("{} {} is a barrier", name, coord)))
                }
                Ok(_) => {}
            }
        }
        if start == end {
            return Err(SearchError::InvalidInput(format!(
                "start and end are the same cell {}",
                start
            )));
        }

        let size = grid.size();
        let mut g_score = vec![UNREACHABLE; size * size];
        let mut f_score = vec![UNREACHABLE; size * size];
        let start_index = start.row * size + start.col;
        g_score[start_index] = 0;
        f_score[start_index] = heuristic(start, end);

        let mut frontier = BinaryHeap::new();
        frontier.push(FrontierEntry {
            f_score: f_score[start_index],
            sequence: 0,
            coord: start,
        });

        Ok(AStar {
            start,
            end,
            size,
            frontier,
            open_membership: HashSet::from([start]),
            closed: HashSet::new(),
            g_score,
            f_score,
            came_from: HashMap::new(),
            counter: 0,
            expanded: 0,
            outcome: None,
        })
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn end(&self) -> Coord {
        self.end
    }

    /// Number of cells expanded so far
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Number of entries waiting in the frontier, stale ones included
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Best known cost from start to `coord`, if it has been reached
    pub fn g_score(&self, coord: Coord) -> Option<usize> {
        self.score(&self.g_score, coord)
    }

    /// Priority key of `coord`, if it has been reached
    pub fn f_score(&self, coord: Coord) -> Option<usize> {
        self.score(&self.f_score, coord)
    }

    /// Pop one frontier entry and process it.
    ///
    /// Returns `Ok(None)` while the search is still running and the terminal outcome
    /// once it is known. Calling again after termination returns the same outcome.
    /// `on_progress` receives every cell whose state changed, in order.
    pub fn step<F>(&mut self, grid: &mut Grid, on_progress: &mut F) -> SearchResult<Option<SearchOutcome>>
    where
        F: FnMut(Coord, CellState) -> ControlFlow<()>,
    {
        if let Some(outcome) = &self.outcome {
            return Ok(Some(outcome.clone()));
        }
        if grid.size() != self.size {
            return Err(SearchError::InvalidInput(format!(
                "grid resized from {} to {} during the search",
                self.size,
                grid.size()
            )));
        }

        let outcome = self.advance(grid, on_progress)?;
        if let Some(outcome) = &outcome {
            self.outcome = Some(outcome.clone());
        }
        Ok(outcome)
    }

    fn advance<F>(&mut self, grid: &mut Grid, on_progress: &mut F) -> SearchResult<Option<SearchOutcome>>
    where
        F: FnMut(Coord, CellState) -> ControlFlow<()>,
    {
        let Some(entry) = self.frontier.pop() else {
            return Ok(Some(SearchOutcome::NotFound));
        };
        let current = entry.coord;
        self.open_membership.remove(&current);

        // Skip stale entries for cells that were already expanded
        if !self.closed.insert(current) {
            return Ok(None);
        }
        self.expanded += 1;

        if current == self.end {
            return self.reconstruct_path(grid, on_progress).map(Some);
        }

        let current_g = self.g_score[self.index(current)];
        let neighbors = grid
            .neighbors(current)
            .map_err(|e| SearchError::InvalidInput(e.to_string()))?;

        for neighbor in neighbors {
            let next = neighbor.coord();
            let next_index = self.index(next);
            let tentative_g = current_g + 1;

            if tentative_g >= self.g_score[next_index] {
                continue;
            }

            self.came_from.insert(next, current);
            self.g_score[next_index] = tentative_g;
            self.f_score[next_index] = tentative_g + heuristic(next, self.end);

            if self.open_membership.insert(next) {
                self.counter += 1;
                self.frontier.push(FrontierEntry {
                    f_score: self.f_score[next_index],
                    sequence: self.counter,
                    coord: next,
                });
                if self.mark(grid, next, CellState::Open, on_progress)?.is_break() {
                    return Ok(Some(SearchOutcome::Cancelled));
                }
            }
        }

        if self.mark(grid, current, CellState::Closed, on_progress)?.is_break() {
            return Ok(Some(SearchOutcome::Cancelled));
        }

        Ok(None)
    }

    /// Walk `came_from` back from the end cell, marking intermediate cells as Path
    fn reconstruct_path<F>(&self, grid: &mut Grid, on_progress: &mut F) -> SearchResult<SearchOutcome>
    where
        F: FnMut(Coord, CellState) -> ControlFlow<()>,
    {
        let mut path = vec![self.end];
        let mut current = self.end;

        while let Some(&previous) = self.came_from.get(&current) {
            path.push(previous);
            current = previous;
            if self.mark(grid, previous, CellState::Path, on_progress)?.is_break() {
                return Ok(SearchOutcome::Cancelled);
            }
        }

        path.reverse();
        Ok(SearchOutcome::Found(path))
    }

    /// Write a search mark and report it.
    ///
    /// The run's own endpoints are never marked, and neither are cells painted as
    /// Start or End on the grid.
    fn mark<F>(
        &self,
        grid: &mut Grid,
        coord: Coord,
        state: CellState,
        on_progress: &mut F,
    ) -> SearchResult<ControlFlow<()>>
    where
        F: FnMut(Coord, CellState) -> ControlFlow<()>,
    {
        if coord == self.start || coord == self.end {
            return Ok(ControlFlow::Continue(()));
        }
        let invalid = |e: GridError| SearchError::InvalidInput(e.to_string());
        match grid.state(coord).map_err(invalid)? {
            CellState::Start | CellState::End => return Ok(ControlFlow::Continue(())),
            current if current == state => return Ok(ControlFlow::Continue(())),
            _ => {}
        }
        grid.set_state(coord.row, coord.col, state).map_err(invalid)?;
        Ok(on_progress(coord, state))
    }

    fn index(&self, coord: Coord) -> usize {
        coord.row * self.size + coord.col
    }

    fn score(&self, scores: &[usize], coord: Coord) -> Option<usize> {
        if coord.row >= self.size || coord.col >= self.size {
            return None;
        }
        match scores[self.index(coord)] {
            UNREACHABLE => None,
            score => Some(score),
        }
    }
}

/// Run A* from `start` to `end` to completion.
///
/// Marks left by a previous run are cleared first, after the inputs are validated.
pub fn search<F>(grid: &mut Grid, start: Coord, end: Coord, mut on_progress: F) -> SearchResult<SearchOutcome>
where
    F: FnMut(Coord, CellState) -> ControlFlow<()>,
{
    let mut astar = AStar::new(grid, start, end)?;
    grid.clear_search_marks();

    loop {
        if let Some(outcome) = astar.step(grid, &mut on_progress)? {
            return Ok(outcome);
        }
    }
}

/// Run A* between the grid's current Start and End cells
pub fn search_markers<F>(grid: &mut Grid, on_progress: F) -> SearchResult<SearchOutcome>
where
    F: FnMut(Coord, CellState) -> ControlFlow<()>,
{
    let start = grid
        .start()
        .ok_or_else(|| SearchError::InvalidInput("no start cell".to_string()))?;
    let end = grid
        .end()
        .ok_or_else(|| SearchError::InvalidInput("no end cell".to_string()))?;
    search(grid, start, end, on_progress)
}

/// Format path for display
pub fn format_path(path: &[Coord]) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    path.iter()
        .map(Coord::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keep_going(_: Coord, _: CellState) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    #[test]
    fn test_frontier_orders_by_f_then_sequence() {
        let mut heap = BinaryHeap::new();
        heap.push(FrontierEntry { f_score: 4, sequence: 1, coord: Coord::new(0, 0) });
        heap.push(FrontierEntry { f_score: 3, sequence: 3, coord: Coord::new(0, 1) });
        heap.push(FrontierEntry { f_score: 3, sequence: 2, coord: Coord::new(0, 2) });

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop()).map(|e| e.sequence).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_heuristic_is_manhattan() {
        assert_eq!(heuristic(Coord::new(0, 0), Coord::new(4, 4)), 8);
        assert_eq!(heuristic(Coord::new(3, 1), Coord::new(1, 2)), 3);
    }

    #[test]
    fn test_exact_progress_sequence_on_2x2() {
        let mut grid = Grid::create(2).unwrap();
        let mut events = Vec::new();

        let outcome = search(&mut grid, Coord::new(0, 0), Coord::new(1, 1), |coord, state| {
            events.push((coord, state));
            ControlFlow::Continue(())
        })
        .unwrap();

        assert_eq!(
            outcome,
            SearchOutcome::Found(vec![Coord::new(0, 0), Coord::new(1, 0), Coord::new(1, 1)])
        );
        assert_eq!(
            events,
            vec![
                (Coord::new(1, 0), CellState::Open),
                (Coord::new(0, 1), CellState::Open),
                (Coord::new(1, 0), CellState::Closed),
                (Coord::new(0, 1), CellState::Closed),
                (Coord::new(1, 0), CellState::Path),
            ]
        );
    }

    #[test]
    fn test_step_reports_terminal_outcome_repeatedly() {
        let mut grid = Grid::create(2).unwrap();
        let mut astar = AStar::new(&grid, Coord::new(0, 0), Coord::new(0, 1)).unwrap();
        let mut on_progress = keep_going;

        let mut outcome = None;
        while outcome.is_none() {
            outcome = astar.step(&mut grid, &mut on_progress).unwrap();
        }
        assert!(astar.is_finished());
        assert_eq!(astar.step(&mut grid, &mut on_progress).unwrap(), outcome);
        assert_eq!(astar.g_score(Coord::new(0, 1)), Some(1));
        assert_eq!(astar.f_score(Coord::new(0, 0)), Some(1));
    }

    #[test]
    fn test_unreached_cells_have_no_score() {
        let grid = Grid::create(3).unwrap();
        let astar = AStar::new(&grid, Coord::new(0, 0), Coord::new(2, 2)).unwrap();
        assert_eq!(astar.g_score(Coord::new(0, 0)), Some(0));
        assert_eq!(astar.f_score(Coord::new(0, 0)), Some(4));
        assert_eq!(astar.g_score(Coord::new(1, 1)), None);
        assert_eq!(astar.g_score(Coord::new(9, 9)), None);
        assert_eq!(astar.frontier_len(), 1);
    }

    #[test]
    fn test_invalid_endpoints() {
        let mut grid = Grid::create(3).unwrap();
        grid.set_state(1, 1, CellState::Barrier).unwrap();

        let same = search(&mut grid, Coord::new(0, 0), Coord::new(0, 0), keep_going);
        assert!(matches!(same, Err(SearchError::InvalidInput(_))));

        let outside = search(&mut grid, Coord::new(0, 0), Coord::new(3, 0), keep_going);
        assert!(matches!(outside, Err(SearchError::InvalidInput(_))));

        let walled = search(&mut grid, Coord::new(1, 1), Coord::new(0, 0), keep_going);
        assert!(matches!(walled, Err(SearchError::InvalidInput(_))));
    }

    #[test]
    fn test_resized_grid_is_rejected() {
        let grid = Grid::create(3).unwrap();
        let mut other = Grid::create(4).unwrap();
        let mut astar = AStar::new(&grid, Coord::new(0, 0), Coord::new(2, 2)).unwrap();
        let mut on_progress = keep_going;
        assert!(astar.step(&mut other, &mut on_progress).is_err());
    }

    #[test]
    fn test_format_path() {
        assert_eq!(format_path(&[]), "No path");
        assert_eq!(format_path(&[Coord::new(0, 0), Coord::new(1, 0)]), "(0,0) -> (1,0)");
    }
}
