use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;

use crate::action_log::{Action, ActionLog};
use crate::error::AppResult;
use crate::grid::{CellState, Coord, Grid};
use crate::pathfinding::{format_path, AStar, SearchOutcome};

/// Paint tools offered by the options panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    Start,
    End,
    Wall,
    Ground,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Start, Tool::End, Tool::Wall, Tool::Ground];

    pub fn label(self) -> &'static str {
        match self {
            Tool::Start => "Start",
            Tool::End => "End",
            Tool::Wall => "Wall",
            Tool::Ground => "Ground",
        }
    }

    /// State a cell receives when painted with this tool
    pub fn state(self) -> CellState {
        match self {
            Tool::Start => CellState::Start,
            Tool::End => CellState::End,
            Tool::Wall => CellState::Barrier,
            Tool::Ground => CellState::Free,
        }
    }
}

/// Semantic input decoded by the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SelectTool(Tool),
    /// Apply the selected tool to a cell
    Paint(Coord),
    /// Return a cell to free regardless of the selected tool
    Erase(Coord),
    RunSearch,
    /// Cancel any search and clear the board
    Reset,
    /// Stop a running search, keeping its partial trace
    Cancel,
}

/// Cell tallies for the status panel, recounted only when the grid revision moves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardStats {
    revision: Option<u64>,
    pub barriers: usize,
    pub open: usize,
    pub closed: usize,
    pub path: usize,
}

impl BoardStats {
    /// Recount if `grid` changed since the last refresh. Returns true when it did.
    pub fn refresh(&mut self, grid: &Grid) -> bool {
        if self.revision == Some(grid.revision()) {
            return false;
        }
        *self = BoardStats {
            revision: Some(grid.revision()),
            barriers: grid.count(CellState::Barrier),
            open: grid.count(CellState::Open),
            closed: grid.count(CellState::Closed),
            path: grid.count(CellState::Path),
        };
        true
    }
}

/// Everything the visualizer needs between two frames.
///
/// Holds at most one running search. While it runs, grid edits are ignored.
pub struct AppState {
    grid: Grid,
    tool: Option<Tool>,
    search: Option<AStar>,
    last_outcome: Option<SearchOutcome>,
    progress_events: usize,
    action_log: ActionLog,
}

impl AppState {
    pub fn new(size: usize) -> AppResult<Self> {
        Ok(AppState {
            grid: Grid::create(size)?,
            tool: None,
            search: None,
            last_outcome: None,
            progress_events: 0,
            action_log: ActionLog::new(),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tool(&self) -> Option<Tool> {
        self.tool
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    /// Result of the most recent finished, failed or cancelled run
    pub fn last_outcome(&self) -> Option<&SearchOutcome> {
        self.last_outcome.as_ref()
    }

    /// Cells expanded by the running search, if any
    pub fn expanded(&self) -> Option<usize> {
        self.search.as_ref().map(AStar::expanded)
    }

    /// Start and end of the running search, if any
    pub fn search_endpoints(&self) -> Option<(Coord, Coord)> {
        self.search.as_ref().map(|astar| (astar.start(), astar.end()))
    }

    /// Progress notifications received during the current or last run
    pub fn progress_events(&self) -> usize {
        self.progress_events
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.action_log
    }

    pub fn handle(&mut self, command: Command) -> AppResult<()> {
        match command {
            Command::SelectTool(tool) => {
                if self.tool != Some(tool) {
                    self.tool = Some(tool);
                    self.action_log.log_instant(Action::SelectTool { tool });
                }
            }
            Command::Paint(cell) => {
                let Some(tool) = self.tool else {
                    return Ok(());
                };
                if self.edit_blocked() {
                    return Ok(());
                }
                if self.grid.state(cell)? != tool.state() {
                    self.grid.set_state(cell.row, cell.col, tool.state())?;
                    self.action_log.log_instant(Action::Paint { cell, tool });
                }
            }
            Command::Erase(cell) => {
                if self.edit_blocked() {
                    return Ok(());
                }
                if self.grid.state(cell)? != CellState::Free {
                    self.grid.set_state(cell.row, cell.col, CellState::Free)?;
                    self.action_log.log_instant(Action::Erase { cell });
                }
            }
            Command::RunSearch => self.start_search()?,
            Command::Reset => {
                self.search = None;
                self.grid.reset();
                self.tool = None;
                self.last_outcome = None;
                self.progress_events = 0;
                self.action_log.log_instant(Action::Reset);
                info!("Board cleared");
            }
            Command::Cancel => {
                if let Some(astar) = self.search.take() {
                    info!(
                        "Search from {} to {} cancelled after {} expansions",
                        astar.start(),
                        astar.end(),
                        astar.expanded()
                    );
                    self.last_outcome = Some(SearchOutcome::Cancelled);
                    self.action_log.log_instant(Action::Cancel);
                }
            }
        }
        Ok(())
    }

    /// Replace the board with an ASCII layout of the same size
    pub fn load_layout(&mut self, layout: &str) -> AppResult<()> {
        if self.edit_blocked() {
            return Ok(());
        }
        let grid = Grid::from_layout(layout)?;
        if grid.size() != self.grid.size() {
            warn!(
                "Ignoring {}x{} layout on a {}x{} board",
                grid.size(),
                grid.size(),
                self.grid.size(),
                self.grid.size()
            );
            return Ok(());
        }
        self.grid.copy_from(&grid)?;
        self.action_log.log_instant(Action::PasteLayout { size: grid.size() });
        self.last_outcome = None;
        Ok(())
    }

    /// Advance the running search by at most `steps` frontier pops
    pub fn tick(&mut self, steps: usize) -> AppResult<Option<SearchOutcome>> {
        let Some(astar) = self.search.as_mut() else {
            return Ok(None);
        };

        let mut events = 0;
        let mut finished = None;
        for _ in 0..steps {
            let step = astar.step(&mut self.grid, &mut |_, _| {
                events += 1;
                ControlFlow::Continue(())
            })?;
            if let Some(outcome) = step {
                finished = Some((outcome, astar.expanded()));
                break;
            }
        }
        self.progress_events += events;

        let Some((outcome, expanded)) = finished else {
            return Ok(None);
        };
        self.search = None;
        self.finish_search(&outcome, expanded);
        Ok(Some(outcome))
    }

    fn start_search(&mut self) -> AppResult<()> {
        if self.search.is_some() {
            debug!("Search already running");
            return Ok(());
        }
        let (Some(start), Some(end)) = (self.grid.start(), self.grid.end()) else {
            warn!("Place both a start and an end cell before running a search");
            return Ok(());
        };

        let astar = AStar::new(&self.grid, start, end)?;
        self.grid.clear_search_marks();
        self.search = Some(astar);
        self.last_outcome = None;
        self.progress_events = 0;
        self.action_log.log_start(Action::Search { start, end });
        info!("Searching from {} to {}", start, end);
        Ok(())
    }

    fn finish_search(&mut self, outcome: &SearchOutcome, expanded: usize) {
        let (label, path_len) = match outcome {
            SearchOutcome::Found(path) => {
                info!("Path found ({} cells): {}", path.len(), format_path(path));
                ("found", path.len())
            }
            SearchOutcome::NotFound => {
                info!("No path exists");
                ("not_found", 0)
            }
            SearchOutcome::Cancelled => ("cancelled", 0),
        };
        debug!("{} expansions, {} progress events", expanded, self.progress_events);
        self.action_log.log_finish(Action::SearchResult {
            outcome: label.to_string(),
            path_len,
            expanded,
        });
        self.last_outcome = Some(outcome.clone());
    }

    fn edit_blocked(&self) -> bool {
        if self.search.is_some() {
            debug!("Ignoring edit while a search is running");
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(app: &mut AppState, tool: Tool, cells: &[(usize, usize)]) {
        app.handle(Command::SelectTool(tool)).unwrap();
        for &(row, col) in cells {
            app.handle(Command::Paint(Coord::new(row, col))).unwrap();
        }
    }

    #[test]
    fn test_paint_without_tool_is_noop() {
        let mut app = AppState::new(3).unwrap();
        app.handle(Command::Paint(Coord::new(1, 1))).unwrap();
        assert_eq!(app.grid().count(CellState::Free), 9);
    }

    #[test]
    fn test_tool_painting() {
        let mut app = AppState::new(3).unwrap();
        paint(&mut app, Tool::Start, &[(0, 0)]);
        paint(&mut app, Tool::End, &[(2, 2)]);
        paint(&mut app, Tool::Wall, &[(1, 1), (1, 0)]);
        paint(&mut app, Tool::Ground, &[(1, 0)]);

        assert_eq!(app.grid().start(), Some(Coord::new(0, 0)));
        assert_eq!(app.grid().end(), Some(Coord::new(2, 2)));
        assert_eq!(app.grid().count(CellState::Barrier), 1);
    }

    #[test]
    fn test_search_runs_over_ticks() {
        let mut app = AppState::new(5).unwrap();
        paint(&mut app, Tool::Start, &[(0, 0)]);
        paint(&mut app, Tool::End, &[(4, 4)]);

        app.handle(Command::RunSearch).unwrap();
        assert!(app.is_searching());

        let mut outcome = None;
        for _ in 0..100 {
            outcome = app.tick(1).unwrap();
            if outcome.is_some() {
                break;
            }
        }

        match outcome {
            Some(SearchOutcome::Found(path)) => assert_eq!(path.len(), 9),
            other => panic!("expected a path, got {:?}", other),
        }
        assert!(!app.is_searching());
        assert_eq!(app.grid().count(CellState::Path), 7);
        assert!(app.progress_events() > 0);
    }

    #[test]
    fn test_edits_blocked_while_searching() {
        let mut app = AppState::new(5).unwrap();
        paint(&mut app, Tool::Start, &[(0, 0)]);
        paint(&mut app, Tool::End, &[(4, 4)]);
        app.handle(Command::RunSearch).unwrap();

        paint(&mut app, Tool::Wall, &[(2, 2)]);
        app.handle(Command::Erase(Coord::new(0, 0))).unwrap();

        assert_eq!(app.grid().count(CellState::Barrier), 0);
        assert_eq!(app.grid().start(), Some(Coord::new(0, 0)));
    }

    #[test]
    fn test_run_without_markers_is_ignored() {
        let mut app = AppState::new(4).unwrap();
        paint(&mut app, Tool::Start, &[(0, 0)]);
        app.handle(Command::RunSearch).unwrap();
        assert!(!app.is_searching());
    }

    #[test]
    fn test_cancel_keeps_partial_trace() {
        let mut app = AppState::new(10).unwrap();
        paint(&mut app, Tool::Start, &[(0, 0)]);
        paint(&mut app, Tool::End, &[(9, 9)]);
        app.handle(Command::RunSearch).unwrap();
        assert_eq!(app.tick(3).unwrap(), None);

        assert_eq!(app.search_endpoints(), Some((Coord::new(0, 0), Coord::new(9, 9))));

        app.handle(Command::Cancel).unwrap();
        assert!(!app.is_searching());
        assert_eq!(app.search_endpoints(), None);
        assert_eq!(app.last_outcome(), Some(&SearchOutcome::Cancelled));
        assert_eq!(app.action_log().actions().last().map(|l| &l.action), Some(&Action::Cancel));
        assert!(app.grid().count(CellState::Open) > 0);
        assert_eq!(app.grid().count(CellState::Path), 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut app = AppState::new(4).unwrap();
        paint(&mut app, Tool::Start, &[(0, 0)]);
        paint(&mut app, Tool::End, &[(3, 3)]);
        app.handle(Command::RunSearch).unwrap();
        app.tick(2).unwrap();

        app.handle(Command::Reset).unwrap();
        assert!(!app.is_searching());
        assert_eq!(app.tool(), None);
        assert_eq!(app.grid().count(CellState::Free), 16);
        assert_eq!(app.last_outcome(), None);
    }

    #[test]
    fn test_load_layout_requires_matching_size() {
        let mut app = AppState::new(3).unwrap();
        app.load_layout("S..\n###\n..E").unwrap();
        assert_eq!(app.grid().count(CellState::Barrier), 3);

        app.load_layout("S.\n.E").unwrap();
        assert_eq!(app.grid().size(), 3);
        assert!(app.load_layout("S?.\n...\n...").is_err());
    }

    #[test]
    fn test_board_stats_follow_grid_changes() {
        let mut app = AppState::new(3).unwrap();
        let mut stats = BoardStats::default();
        assert!(stats.refresh(app.grid()));
        assert!(!stats.refresh(app.grid()));

        paint(&mut app, Tool::Wall, &[(1, 0), (1, 1)]);
        assert!(stats.refresh(app.grid()));
        assert_eq!(stats.barriers, 2);

        // A pasted board always counts as a change
        app.load_layout("S..\n.#.\n..E").unwrap();
        assert!(stats.refresh(app.grid()));
        assert_eq!(stats.barriers, 1);

        app.handle(Command::RunSearch).unwrap();
        while app.tick(1).unwrap().is_none() {}
        assert!(stats.refresh(app.grid()));
        assert_eq!(stats.path, 3);
        assert_eq!(stats.open + stats.closed + stats.path + stats.barriers + 2, 9 - app.grid().count(CellState::Free));
    }
}
