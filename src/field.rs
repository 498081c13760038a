// Minefield logic: mine placement, click handling, flood fill and win/loss tracking
// Built on top of Grid<Cell>; knows nothing about how the board is drawn

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::{FieldError, GridError};
use crate::grid::{Coord, Grid};

/// State of a single square on the minefield
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    pub mine: bool,      // Contains a mine (fixed once placed)
    pub uncovered: bool, // Revealed to the player (never reverts)
    pub adjacent: u8,    // Mined neighbours (0-8), 0 for mines
    pub flagged: bool,   // Marked by the player, only while covered
}

/// Lifecycle of one round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Playing,
    Lost,
    Won,
}

/// What a click did to the field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Out of bounds, already uncovered, or a reveal on a flagged cell
    Ignored,
    Flagged,
    Unflagged,
    /// Number of cells uncovered, flood fill included
    Revealed(usize),
    /// A mine was revealed at this coordinate
    Lost(Coord),
    Won,
}

/// How a cell should be shown, given the round state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Hidden,
    Flagged,
    Revealed(u8),
    /// Unflagged mine, shown once the round is lost
    Mine,
    /// Flag placed on a safe cell, shown once the round is lost
    WrongFlag,
    /// The mine that ended the round
    Detonated,
}

/// The minefield for one round.
///
/// Mines are placed lazily on the first click so that the clicked cell and its
/// two surrounding rings are always safe. Once `state()` leaves
/// `RoundState::Playing` the owner must stop forwarding clicks: `click` does not
/// check the round state itself.
#[derive(Debug, Clone)]
pub struct Field {
    grid: Grid<Cell>,
    mine_count: usize,
    remaining_flags: isize,
    correct_squares: usize,
    initialized: bool,
    target: Option<Coord>,
    state: RoundState,
    rng: StdRng,
}

impl Field {
    /// Create an empty field; mines are placed on the first click
    pub fn new(width: usize, height: usize, mine_count: usize) -> Result<Self, FieldError> {
        Self::with_rng(width, height, mine_count, StdRng::from_entropy())
    }

    /// Same as `new`, with a reproducible mine layout for a given seed
    pub fn with_seed(
        width: usize,
        height: usize,
        mine_count: usize,
        seed: u64,
    ) -> Result<Self, FieldError> {
        Self::with_rng(width, height, mine_count, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        width: usize,
        height: usize,
        mine_count: usize,
        rng: StdRng,
    ) -> Result<Self, FieldError> {
        let cells = match width.checked_mul(height) {
            Some(cells) if cells > 0 => cells,
            _ => return Err(FieldError::InvalidDimensions { width, height }),
        };
        if mine_count >= cells {
            return Err(FieldError::TooManyMines {
                mines: mine_count,
                cells,
            });
        }
        Ok(Field {
            grid: Grid::new(width, height, Cell::default()),
            mine_count,
            remaining_flags: mine_count as isize,
            correct_squares: 0,
            initialized: false,
            target: None,
            state: RoundState::Playing,
            rng,
        })
    }

    /// Build an already-initialized field with mines at the given coordinates.
    /// Duplicate coordinates count once.
    pub fn with_mines(width: usize, height: usize, mines: &[Coord]) -> Result<Self, FieldError> {
        let unique: HashSet<Coord> = mines.iter().copied().collect();
        let mut field = Self::new(width, height, unique.len())?;
        for &pos in &unique {
            field.grid.set(pos, Cell { mine: true, ..Cell::default() })?;
        }
        field.count_adjacent()?;
        field.initialized = true;
        Ok(field)
    }

    /// The clicked cell, its neighbours, and their neighbours
    pub fn exemption_zone(&self, pos: Coord) -> HashSet<Coord> {
        let mut zone = HashSet::from([pos]);
        for nb in self.grid.neighbours(pos) {
            zone.insert(nb);
            zone.extend(self.grid.neighbours(nb));
        }
        zone
    }

    /// Place `mine_count` mines uniformly outside `exempt` and compute adjacency.
    ///
    /// Fails without touching the field when fewer than `mine_count` cells are
    /// eligible. Does nothing if the field is already initialized.
    pub fn initialize(&mut self, exempt: &HashSet<Coord>) -> Result<(), FieldError> {
        if self.initialized {
            return Ok(());
        }
        let eligible: Vec<Coord> = self
            .grid
            .iter_all()
            .filter(|pos| !exempt.contains(pos))
            .collect();
        if eligible.len() < self.mine_count {
            return Err(FieldError::InfeasibleConfiguration {
                mines: self.mine_count,
                eligible: eligible.len(),
            });
        }

        let chosen: Vec<Coord> = eligible
            .choose_multiple(&mut self.rng, self.mine_count)
            .copied()
            .collect();
        for pos in chosen {
            self.grid.set(pos, Cell { mine: true, ..Cell::default() })?;
        }
        self.count_adjacent()?;
        self.initialized = true;
        debug!(
            mines = self.mine_count,
            eligible = eligible.len(),
            "mines placed"
        );
        Ok(())
    }

    fn count_adjacent(&mut self) -> Result<(), GridError> {
        for pos in self.grid.iter_all() {
            let cell = self.grid.get(pos)?;
            if cell.mine {
                continue;
            }
            let mut adjacent = 0u8;
            for nb in self.grid.neighbours(pos) {
                if self.grid.get(nb)?.mine {
                    adjacent += 1;
                }
            }
            self.grid.set(pos, Cell { adjacent, ..cell })?;
        }
        Ok(())
    }

    /// Handle a reveal (`flagging == false`) or flag toggle on a grid coordinate.
    ///
    /// The first click places the mines. Out-of-bounds coordinates are ignored.
    pub fn click(&mut self, pos: Coord, flagging: bool) -> Result<ClickOutcome, FieldError> {
        if !self.grid.contains(pos) {
            debug!(?pos, "click outside the field ignored");
            return Ok(ClickOutcome::Ignored);
        }

        if !self.initialized {
            let zone = self.exemption_zone(pos);
            self.initialize(&zone)?;
        }

        let cell = self.grid.get(pos)?;
        if cell.uncovered {
            return Ok(ClickOutcome::Ignored);
        }

        let outcome = if flagging {
            self.toggle_flag(pos, cell)?
        } else {
            if cell.flagged {
                return Ok(ClickOutcome::Ignored);
            }
            if cell.mine {
                self.target.get_or_insert(pos);
                self.state = RoundState::Lost;
                info!(?pos, "mine revealed, round lost");
                return Ok(ClickOutcome::Lost(pos));
            }
            self.uncover(pos, cell)?;
            let mut revealed = 1;
            if cell.adjacent == 0 {
                revealed += self.forest_fire(pos)?;
            }
            ClickOutcome::Revealed(revealed)
        };

        if self.correct_squares == self.grid.cell_count() {
            self.state = RoundState::Won;
            info!(mines = self.mine_count, "field cleared, round won");
            return Ok(ClickOutcome::Won);
        }
        Ok(outcome)
    }

    fn toggle_flag(&mut self, pos: Coord, cell: Cell) -> Result<ClickOutcome, GridError> {
        let flagged = !cell.flagged;
        self.grid.set(pos, Cell { flagged, ..cell })?;
        if flagged {
            self.remaining_flags -= 1;
            if cell.mine {
                self.correct_squares += 1;
            }
            Ok(ClickOutcome::Flagged)
        } else {
            self.remaining_flags += 1;
            if cell.mine {
                self.correct_squares -= 1;
            }
            Ok(ClickOutcome::Unflagged)
        }
    }

    // Only ever called on safe cells; drops any flag the cell carried
    fn uncover(&mut self, pos: Coord, cell: Cell) -> Result<(), GridError> {
        if cell.flagged {
            self.remaining_flags += 1;
        }
        self.grid.set(
            pos,
            Cell {
                uncovered: true,
                flagged: false,
                ..cell
            },
        )?;
        self.correct_squares += 1;
        Ok(())
    }

    /// Uncover the zero-adjacency region connected to `origin` plus its
    /// non-zero border. Returns how many cells were uncovered.
    fn forest_fire(&mut self, origin: Coord) -> Result<usize, GridError> {
        let mut visited = HashSet::from([origin]);
        let mut pending = vec![origin];
        let mut revealed = 0;

        while let Some(pos) = pending.pop() {
            for nb in self.grid.neighbours(pos) {
                let cell = self.grid.get(nb)?;
                if cell.uncovered || visited.contains(&nb) {
                    continue;
                }
                self.uncover(nb, cell)?;
                revealed += 1;
                if cell.adjacent == 0 {
                    visited.insert(nb);
                    pending.push(nb);
                }
            }
        }
        debug!(?origin, revealed, "flood fill");
        Ok(revealed)
    }

    /// Render state of a cell for the current round state
    pub fn view(&self, pos: Coord) -> Result<CellView, GridError> {
        let cell = self.grid.get(pos)?;
        if self.target == Some(pos) {
            return Ok(CellView::Detonated);
        }
        let view = match self.state {
            RoundState::Lost if cell.mine && !cell.flagged => CellView::Mine,
            RoundState::Lost if !cell.mine && cell.flagged => CellView::WrongFlag,
            RoundState::Won if !cell.mine => CellView::Revealed(cell.adjacent),
            _ if cell.flagged => CellView::Flagged,
            _ if cell.uncovered => CellView::Revealed(cell.adjacent),
            _ => CellView::Hidden,
        };
        Ok(view)
    }

    pub fn cell(&self, pos: Coord) -> Result<Cell, GridError> {
        self.grid.get(pos)
    }

    pub fn grid(&self) -> &Grid<Cell> {
        &self.grid
    }

    pub fn width(&self) -> usize {
        self.grid.cols()
    }

    pub fn height(&self) -> usize {
        self.grid.rows()
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    /// Mine counter for display: mines minus flags placed, may go negative
    pub fn remaining_flags(&self) -> isize {
        self.remaining_flags
    }

    /// Flagged mines plus uncovered safe cells
    pub fn correct_squares(&self) -> usize {
        self.correct_squares
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn target(&self) -> Option<Coord> {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mines_of(field: &Field) -> Vec<Coord> {
        field
            .grid()
            .iter_all()
            .filter(|&pos| field.cell(pos).unwrap().mine)
            .collect()
    }

    fn assert_no_flagged_and_uncovered(field: &Field) {
        for pos in field.grid().iter_all() {
            let cell = field.cell(pos).unwrap();
            assert!(!(cell.flagged && cell.uncovered), "cell {:?} is both", pos);
        }
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert_eq!(
            Field::new(0, 5, 0).unwrap_err(),
            FieldError::InvalidDimensions { width: 0, height: 5 }
        );
        assert_eq!(
            Field::new(3, 3, 9).unwrap_err(),
            FieldError::TooManyMines { mines: 9, cells: 9 }
        );
        assert!(Field::new(3, 3, 8).is_ok());
    }

    #[test]
    fn rejects_overflowing_dimensions() {
        assert_eq!(
            Field::new(usize::MAX, 2, 0).unwrap_err(),
            FieldError::InvalidDimensions { width: usize::MAX, height: 2 }
        );
    }

    #[test]
    fn target_keeps_the_first_detonation() {
        let mut field = Field::with_mines(3, 3, &[(0, 0), (2, 2)]).unwrap();
        assert_eq!(field.click((0, 0), false), Ok(ClickOutcome::Lost((0, 0))));
        // owner ignored the terminal state and kept forwarding clicks
        assert_eq!(field.click((2, 2), false), Ok(ClickOutcome::Lost((2, 2))));
        assert_eq!(field.target(), Some((0, 0)));
        assert_eq!(field.view((0, 0)), Ok(CellView::Detonated));
        assert_eq!(field.view((2, 2)), Ok(CellView::Mine));
    }

    #[test]
    fn new_field_is_uninitialized() {
        let field = Field::new(4, 4, 3).unwrap();
        assert!(!field.is_initialized());
        assert_eq!(field.state(), RoundState::Playing);
        assert_eq!(field.remaining_flags(), 3);
        assert_eq!(field.correct_squares(), 0);
        assert_eq!(field.target(), None);
        assert!(mines_of(&field).is_empty());
    }

    #[test]
    fn exemption_zone_is_two_rings() {
        let field = Field::new(9, 9, 10).unwrap();
        assert_eq!(field.exemption_zone((4, 4)).len(), 25);
        assert_eq!(field.exemption_zone((0, 0)).len(), 9);
        assert!(field.exemption_zone((0, 0)).contains(&(2, 2)));
        assert!(!field.exemption_zone((0, 0)).contains(&(3, 0)));
    }

    #[test]
    fn initialize_respects_exemption() {
        let mut field = Field::with_seed(4, 4, 15, 7).unwrap();
        let exempt = HashSet::from([(0, 0)]);
        field.initialize(&exempt).unwrap();
        let mines = mines_of(&field);
        assert_eq!(mines.len(), 15);
        assert!(!mines.contains(&(0, 0)));
        assert_eq!(field.cell((0, 0)).unwrap().adjacent, 3);
    }

    #[test]
    fn infeasible_first_click_leaves_field_untouched() {
        let mut field = Field::with_seed(3, 3, 1, 1).unwrap();
        assert_eq!(
            field.click((1, 1), false),
            Err(FieldError::InfeasibleConfiguration { mines: 1, eligible: 0 })
        );
        assert!(!field.is_initialized());
        assert!(mines_of(&field).is_empty());
        assert_eq!(field.state(), RoundState::Playing);
    }

    #[test]
    fn out_of_bounds_click_is_ignored() {
        let mut field = Field::new(3, 3, 1).unwrap();
        assert_eq!(field.click((3, 0), false), Ok(ClickOutcome::Ignored));
        assert_eq!(field.click((0, 7), true), Ok(ClickOutcome::Ignored));
        assert!(!field.is_initialized());
    }

    #[test]
    fn with_mines_counts_adjacency() {
        let field = Field::with_mines(3, 3, &[(0, 0), (2, 2), (0, 0)]).unwrap();
        assert_eq!(field.mine_count(), 2);
        assert!(field.is_initialized());
        assert_eq!(field.cell((1, 1)).unwrap().adjacent, 2);
        assert_eq!(field.cell((2, 0)).unwrap().adjacent, 0);
        assert_eq!(field.cell((0, 0)).unwrap().adjacent, 0);
    }

    #[test]
    fn with_mines_rejects_out_of_bounds() {
        assert!(matches!(
            Field::with_mines(3, 3, &[(5, 5)]),
            Err(FieldError::Grid(GridError::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn reveal_number_does_not_spread() {
        let mut field = Field::with_mines(3, 3, &[(0, 0)]).unwrap();
        assert_eq!(field.click((1, 1), false), Ok(ClickOutcome::Revealed(1)));
        assert!(field.cell((1, 1)).unwrap().uncovered);
        assert!(!field.cell((2, 2)).unwrap().uncovered);
    }

    #[test]
    fn clicking_uncovered_cell_is_ignored() {
        let mut field = Field::with_mines(3, 3, &[(0, 0)]).unwrap();
        field.click((1, 1), false).unwrap();
        assert_eq!(field.click((1, 1), false), Ok(ClickOutcome::Ignored));
        assert_eq!(field.click((1, 1), true), Ok(ClickOutcome::Ignored));
        assert_eq!(field.remaining_flags(), 1);
    }

    #[test]
    fn flagged_cell_cannot_be_revealed() {
        let mut field = Field::with_mines(3, 3, &[(0, 0)]).unwrap();
        field.click((0, 0), true).unwrap();
        assert_eq!(field.click((0, 0), false), Ok(ClickOutcome::Ignored));
        assert_eq!(field.state(), RoundState::Playing);
    }

    #[test]
    fn flood_fill_clears_flags_it_passes() {
        let mut field = Field::with_mines(4, 1, &[(3, 0)]).unwrap();
        field.click((1, 0), true).unwrap();
        assert_eq!(field.remaining_flags(), 0);

        assert_eq!(field.click((0, 0), false), Ok(ClickOutcome::Revealed(3)));
        let cell = field.cell((1, 0)).unwrap();
        assert!(cell.uncovered && !cell.flagged);
        assert_eq!(field.remaining_flags(), 1);
        assert_no_flagged_and_uncovered(&field);
    }

    #[test]
    fn flood_fill_reveals_component_and_border_only() {
        // Column of mines at x = 2 walls off the right side
        let mines = [(2, 0), (2, 1), (2, 2), (2, 3)];
        let mut field = Field::with_mines(5, 4, &mines).unwrap();
        assert_eq!(field.click((0, 0), false), Ok(ClickOutcome::Revealed(8)));
        for y in 0..4 {
            assert!(field.cell((0, y)).unwrap().uncovered);
            assert!(field.cell((1, y)).unwrap().uncovered);
            assert!(!field.cell((3, y)).unwrap().uncovered);
            assert!(!field.cell((4, y)).unwrap().uncovered);
        }
        assert_eq!(field.correct_squares(), 8);
    }

    #[test]
    fn losing_records_target_and_stops() {
        let mut field = Field::with_mines(3, 3, &[(0, 0), (2, 2)]).unwrap();
        assert_eq!(field.click((0, 0), false), Ok(ClickOutcome::Lost((0, 0))));
        assert_eq!(field.state(), RoundState::Lost);
        assert_eq!(field.target(), Some((0, 0)));
        assert!(!field.cell((0, 0)).unwrap().uncovered);
        assert_eq!(field.correct_squares(), 0);
    }

    #[test]
    fn flags_alone_do_not_win() {
        let mut field = Field::with_mines(3, 1, &[(0, 0)]).unwrap();
        assert_eq!(field.click((0, 0), true), Ok(ClickOutcome::Flagged));
        assert_eq!(field.state(), RoundState::Playing);
        assert_eq!(field.click((1, 0), false), Ok(ClickOutcome::Revealed(1)));
        assert_eq!(field.click((2, 0), false), Ok(ClickOutcome::Won));
        assert_eq!(field.state(), RoundState::Won);
    }

    #[test]
    fn over_flagging_drives_counter_negative() {
        let mut field = Field::with_mines(3, 1, &[(0, 0)]).unwrap();
        field.click((1, 0), true).unwrap();
        field.click((2, 0), true).unwrap();
        assert_eq!(field.remaining_flags(), -1);
        assert_eq!(field.correct_squares(), 0);
    }

    #[test]
    fn view_while_playing() {
        let mut field = Field::with_mines(3, 3, &[(0, 0)]).unwrap();
        field.click((1, 1), false).unwrap();
        field.click((2, 2), true).unwrap();
        assert_eq!(field.view((1, 1)), Ok(CellView::Revealed(1)));
        assert_eq!(field.view((2, 2)), Ok(CellView::Flagged));
        assert_eq!(field.view((0, 0)), Ok(CellView::Hidden));
    }

    #[test]
    fn view_after_loss_exposes_mines_and_wrong_flags() {
        let mut field = Field::with_mines(3, 3, &[(0, 0), (2, 0), (0, 2)]).unwrap();
        field.click((2, 0), true).unwrap();
        field.click((2, 2), true).unwrap();
        field.click((0, 0), false).unwrap();
        assert_eq!(field.view((0, 0)), Ok(CellView::Detonated));
        assert_eq!(field.view((0, 2)), Ok(CellView::Mine));
        assert_eq!(field.view((2, 0)), Ok(CellView::Flagged));
        assert_eq!(field.view((2, 2)), Ok(CellView::WrongFlag));
        assert_eq!(field.view((1, 1)), Ok(CellView::Hidden));
    }

    #[test]
    fn view_after_win_shows_all_numbers() {
        let mut field = Field::with_mines(2, 1, &[(0, 0)]).unwrap();
        field.click((0, 0), true).unwrap();
        assert_eq!(field.click((1, 0), false), Ok(ClickOutcome::Won));
        assert_eq!(field.view((0, 0)), Ok(CellView::Flagged));
        assert_eq!(field.view((1, 0)), Ok(CellView::Revealed(1)));
    }

    #[test]
    fn same_seed_same_layout() {
        let mut a = Field::with_seed(16, 16, 40, 99).unwrap();
        let mut b = Field::with_seed(16, 16, 40, 99).unwrap();
        a.click((8, 8), false).unwrap();
        b.click((8, 8), false).unwrap();
        assert_eq!(mines_of(&a), mines_of(&b));
    }

    proptest! {
        #[test]
        fn first_click_places_safe_exact_mines(
            seed in any::<u64>(),
            x in 0usize..9,
            y in 0usize..9,
            mines in 0usize..=56,
        ) {
            let mut field = Field::with_seed(9, 9, mines, seed).unwrap();
            let zone = field.exemption_zone((x, y));
            field.click((x, y), false).unwrap();

            let placed = mines_of(&field);
            prop_assert_eq!(placed.len(), mines);
            for pos in &placed {
                prop_assert!(!zone.contains(pos));
            }
            let expected = if mines == 0 { RoundState::Won } else { RoundState::Playing };
            prop_assert_eq!(field.state(), expected);
        }

        #[test]
        fn adjacency_matches_neighbours(seed in any::<u64>(), mines in 1usize..40) {
            let mut field = Field::with_seed(10, 8, mines, seed).unwrap();
            field.click((0, 0), true).unwrap();
            for pos in field.grid().iter_all() {
                let cell = field.cell(pos).unwrap();
                if cell.mine {
                    continue;
                }
                let expected = field
                    .grid()
                    .neighbours(pos)
                    .filter(|&nb| field.cell(nb).unwrap().mine)
                    .count();
                prop_assert_eq!(cell.adjacent as usize, expected);
            }
        }

        #[test]
        fn flood_fill_closure(seed in any::<u64>(), mines in 1usize..30) {
            let mut field = Field::with_seed(12, 12, mines, seed).unwrap();
            field.click((6, 6), false).unwrap();

            // Zero component of the click, computed independently
            let mut component = HashSet::from([(6, 6)]);
            let mut stack = vec![(6, 6)];
            while let Some(pos) = stack.pop() {
                for nb in field.grid().neighbours(pos) {
                    if field.cell(nb).unwrap().adjacent == 0 && component.insert(nb) {
                        stack.push(nb);
                    }
                }
            }
            let mut expected = component.clone();
            for &pos in &component {
                expected.extend(field.grid().neighbours(pos));
            }

            for pos in field.grid().iter_all() {
                prop_assert_eq!(field.cell(pos).unwrap().uncovered, expected.contains(&pos));
            }
            prop_assert_eq!(field.correct_squares(), expected.len());
        }

        #[test]
        fn random_play_keeps_invariants(
            seed in any::<u64>(),
            clicks in prop::collection::vec((0usize..8, 0usize..8, any::<bool>()), 1..60),
        ) {
            let mut field = Field::with_seed(8, 8, 10, seed).unwrap();
            for (x, y, flagging) in clicks {
                if field.state() != RoundState::Playing {
                    break;
                }
                let before = field.cell((x, y)).unwrap();
                let outcome = field.click((x, y), flagging).unwrap();
                let after = field.cell((x, y)).unwrap();

                let hit_mine = !flagging && !before.flagged && after.mine;
                prop_assert_eq!(field.state() == RoundState::Lost, hit_mine);
                prop_assert_eq!(outcome == ClickOutcome::Lost((x, y)), hit_mine);

                for pos in field.grid().iter_all() {
                    let cell = field.cell(pos).unwrap();
                    prop_assert!(!(cell.flagged && cell.uncovered));
                }

                let all_done = field.grid().iter_all().all(|pos| {
                    let cell = field.cell(pos).unwrap();
                    if cell.mine { cell.flagged } else { cell.uncovered }
                });
                prop_assert_eq!(field.state() == RoundState::Won, all_done);
            }
        }
    }
}
