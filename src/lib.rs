pub mod action_log;
pub mod app;
pub mod config;
pub mod error;
pub mod grid;
pub mod layout;
pub mod pathfinding;

pub use error::{AppError, GridError, SearchError};
pub use grid::{Cell, CellState, Coord, Grid};
pub use pathfinding::{search, search_markers, AStar, SearchOutcome};
