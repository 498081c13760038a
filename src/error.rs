// Error taxonomy for the grid, the minefield, and the configuration layer

use thiserror::Error;

/// Raised by `Grid` accessors when a coordinate falls outside the grid
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("coordinate ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("field dimensions must be positive and fit in memory, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error(
        "{mines} mines do not fit in {cells} cells (at most {} allowed)",
        .cells.saturating_sub(1)
    )]
    TooManyMines { mines: usize, cells: usize },

    /// The first-click exemption zone left fewer free cells than mines
    #[error("cannot place {mines} mines: only {eligible} cells lie outside the safe zone")]
    InfeasibleConfiguration { mines: usize, eligible: usize },

    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("width and height must be positive and not overflow, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("too many mines for the field! (max: {max})")]
    TooManyMines { mines: usize, max: usize },
}
