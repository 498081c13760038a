// Generic fixed-size 2D container addressed by (x, y) coordinates

use crate::error::GridError;

/// Grid coordinate as (x, y), x = column, y = row
pub type Coord = (usize, usize);

/// Rectangular `width × height` array of cells, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid where every cell holds a copy of `default`
    pub fn new(width: usize, height: usize, default: T) -> Self {
        Grid {
            width,
            height,
            cells: vec![default; width * height],
        }
    }

    /// Read the whole value stored at `pos`
    pub fn get(&self, pos: Coord) -> Result<T, GridError> {
        let idx = self.index(pos)?;
        Ok(self.cells[idx].clone())
    }

    /// Overwrite the whole value stored at `pos`
    pub fn set(&mut self, pos: Coord, value: T) -> Result<(), GridError> {
        let idx = self.index(pos)?;
        self.cells[idx] = value;
        Ok(())
    }
}

impl<T> Grid<T> {
    pub fn contains(&self, (x, y): Coord) -> bool {
        x < self.width && y < self.height
    }

    fn index(&self, (x, y): Coord) -> Result<usize, GridError> {
        if !self.contains((x, y)) {
            return Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y * self.width + x)
    }

    /// Number of columns (the grid width)
    pub fn cols(&self) -> usize {
        self.width
    }

    /// Number of rows (the grid height)
    pub fn rows(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Every coordinate exactly once, y outer and x inner
    pub fn iter_all(&self) -> impl Iterator<Item = Coord> + use<T> {
        let (w, h) = (self.width, self.height);
        (0..h).flat_map(move |y| (0..w).map(move |x| (x, y)))
    }

    /// In-bounds 8-connected neighbours of `pos`, never `pos` itself.
    /// Order: N, S, then W, NW, SW, then E, NE, SE.
    pub fn neighbours(&self, (x, y): Coord) -> impl Iterator<Item = Coord> + use<T> {
        let mut out = Vec::with_capacity(8);
        let has_up = y > 0;
        let has_down = y + 1 < self.height;

        if has_up {
            out.push((x, y - 1));
        }
        if has_down {
            out.push((x, y + 1));
        }
        if x > 0 {
            out.push((x - 1, y));
            if has_up {
                out.push((x - 1, y - 1));
            }
            if has_down {
                out.push((x - 1, y + 1));
            }
        }
        if x + 1 < self.width {
            out.push((x + 1, y));
            if has_up {
                out.push((x + 1, y - 1));
            }
            if has_down {
                out.push((x + 1, y + 1));
            }
        }
        out.into_iter()
    }
}
