//! Error types for grid lookups and layout sheet parsing.

use thiserror::Error;

/// Errors surfaced by the grid core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// `get` was called on a coordinate that holds no cell.
    #[error("no cell at ({x}, {y})")]
    MissingCell { x: i32, y: i32 },

    /// A layout sheet could not be parsed or written.
    #[error("layout sheet: {0}")]
    Sheet(String),
}

pub type GridResult<T> = Result<T, GridError>;
