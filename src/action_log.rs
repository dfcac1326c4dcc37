use log::info;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::app::Tool;
use crate::grid::Coord;

/// Action phase - whether the action is starting, finishing, or happens at once
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionPhase {
    Start,
    Finish,
    Instant,
}

/// User actions and search milestones of one session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Select a paint tool
    SelectTool { tool: Tool },
    /// Paint a cell with the selected tool
    Paint { cell: Coord, tool: Tool },
    /// Return a cell to free
    Erase { cell: Coord },
    /// A search between two cells
    Search { start: Coord, end: Coord },
    /// Terminal result of the last search
    SearchResult { outcome: String, path_len: usize, expanded: usize },
    /// Stop a running search
    Cancel,
    /// Clear the board
    Reset,
    /// Replace the grid with a pasted layout
    PasteLayout { size: usize },
}

/// Logged action with timestamp and phase
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggedAction {
    /// Milliseconds since start
    pub timestamp_ms: u64,
    /// The action
    pub action: Action,
    pub phase: ActionPhase,
}

/// Action logger
pub struct ActionLog {
    start_time: Instant,
    actions: Vec<LoggedAction>,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionLog {
    pub fn new() -> Self {
        ActionLog {
            start_time: Instant::now(),
            actions: Vec::new(),
        }
    }

    /// Log an action with current timestamp and phase
    pub fn log(&mut self, action: Action, phase: ActionPhase) {
        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;

        self.actions.push(LoggedAction {
            timestamp_ms,
            action,
            phase,
        });
    }

    pub fn log_start(&mut self, action: Action) {
        self.log(action, ActionPhase::Start);
    }

    pub fn log_finish(&mut self, action: Action) {
        self.log(action, ActionPhase::Finish);
    }

    pub fn log_instant(&mut self, action: Action) {
        self.log(action, ActionPhase::Instant);
    }

    /// Get all logged actions
    pub fn actions(&self) -> &[LoggedAction] {
        &self.actions
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.actions)
    }

    /// Save log to JSON file
    pub fn save_to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Write every entry to the log output
    pub fn print(&self) {
        info!("=== Action Log ({} events) ===", self.actions.len());
        for (i, logged) in self.actions.iter().enumerate() {
            let phase_str = match logged.phase {
                ActionPhase::Start => "START  ",
                ActionPhase::Finish => "FINISH ",
                ActionPhase::Instant => "INSTANT",
            };
            info!("[{:6}ms] #{:3} {} {:?}", logged.timestamp_ms, i + 1, phase_str, logged.action);
        }
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut paint_count = 0;
        let mut erase_count = 0;
        let mut searches = 0;
        let mut found = 0;
        let mut cancelled = 0;
        let mut resets = 0;

        for logged in &self.actions {
            match (&logged.action, logged.phase) {
                (Action::Paint { .. }, _) => paint_count += 1,
                (Action::Erase { .. }, _) => erase_count += 1,
                (Action::Search { .. }, ActionPhase::Start) => searches += 1,
                (Action::SearchResult { outcome, .. }, _) if outcome == "found" => found += 1,
                (Action::Cancel, _) => cancelled += 1,
                (Action::Reset, _) => resets += 1,
                _ => {}
            }
        }

        let duration = self.actions.last().map_or(0, |last| last.timestamp_ms);

        format!(
            "Session Duration: {}ms\n\
             Total Events: {}\n\
             Grid Edits: {} painted, {} erased, {} resets\n\
             Searches: {} started, {} found a path, {} cancelled",
            duration,
            self.actions.len(),
            paint_count,
            erase_count,
            resets,
            searches,
            found,
            cancelled
        )
    }
}
