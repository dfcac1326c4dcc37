use thiserror::Error;

use crate::grid::Coord;

/// Failures raised by grid accessors and constructors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("cell {coord} is outside a {size}x{size} grid")]
    OutOfBounds { coord: Coord, size: usize },
    #[error("grid size must be at least 1, got {0}")]
    InvalidSize(usize),
    #[error("invalid grid layout: {0}")]
    InvalidLayout(String),
}

/// Precondition failures of a search run. Reported before any search state exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("invalid search input: {0}")]
    InvalidInput(String),
}

/// Failures surfaced to the interactive driver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

pub type GridResult<T> = Result<T, GridError>;
pub type SearchResult<T> = Result<T, SearchError>;
pub type AppResult<T> = Result<T, AppError>;
