//! Minesweeper engine.
//!
//! [`grid::Grid`] is a generic fixed-size 2D container; [`field::Field`] builds
//! the game on top of it: lazy mine placement with a safe first click, reveal
//! and flag handling, flood fill of empty regions, and win/loss tracking.
//! [`config`] holds the difficulty presets and the persisted user settings.
//!
//! ```
//! use minegrid::field::{ClickOutcome, Field, RoundState};
//!
//! let mut field = Field::with_seed(9, 9, 10, 42)?;
//! let outcome = field.click((4, 4), false)?;
//! assert!(matches!(outcome, ClickOutcome::Revealed(_)));
//! assert_eq!(field.state(), RoundState::Playing);
//! # Ok::<(), minegrid::error::FieldError>(())
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod grid;

pub use error::{ConfigError, FieldError, GridError};
pub use field::{Cell, CellView, ClickOutcome, Field, RoundState};
pub use grid::{Coord, Grid};
