//! A rectangular grid on which households and their members are placed.
//!
//! Several agents may share a cell. Neighbourhoods are Moore neighbourhoods (the eight
//! surrounding cells), optionally wrapping around the edges.
use anyhow::{Result, ensure};
use serde::Deserialize;
use std::fmt;

/// A cell on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Position {
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
}

impl Position {
    /// Create a new [`Position`]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Something which occupies a cell, referred to by its index in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    /// A household
    Household(usize),
    /// A household member
    Member(usize),
}

/// A grid of cells, each holding any number of occupants
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    toroidal: bool,
    cells: Vec<Vec<Occupant>>,
}

impl Grid {
    /// Create a new empty [`Grid`].
    ///
    /// # Arguments
    ///
    /// * `width` - Number of columns
    /// * `height` - Number of rows
    /// * `toroidal` - Whether neighbourhoods wrap around the edges of the grid
    pub fn new(width: u32, height: u32, toroidal: bool) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "Grid dimensions must be greater than zero"
        );

        Ok(Self {
            width,
            height,
            toroidal,
            cells: vec![Vec::new(); width as usize * height as usize],
        })
    }

    /// Number of columns
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether neighbourhoods wrap around the edges
    pub fn is_toroidal(&self) -> bool {
        self.toroidal
    }

    /// Whether the position lies on the grid
    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    fn cell_index(&self, position: Position) -> usize {
        position.y as usize * self.width as usize + position.x as usize
    }

    /// Place an occupant in the given cell
    pub fn place(&mut self, occupant: Occupant, position: Position) -> Result<()> {
        ensure!(
            self.contains(position),
            "Position {position} is outside the {}x{} grid",
            self.width,
            self.height
        );
        let index = self.cell_index(position);
        self.cells[index].push(occupant);

        Ok(())
    }

    /// The occupants of a cell, in the order they were placed
    pub fn cell(&self, position: Position) -> &[Occupant] {
        &self.cells[self.cell_index(position)]
    }

    /// The cells in the Moore neighbourhood of a position, not including the position itself.
    ///
    /// On small toroidal grids the same cell can be reached in more than one direction; each
    /// cell is only returned once.
    pub fn neighbourhood(&self, position: Position) -> Vec<Position> {
        let mut cells = Vec::with_capacity(8);
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let Some(neighbour) = self.offset(position, dx, dy) else {
                    continue;
                };
                if neighbour != position && !cells.contains(&neighbour) {
                    cells.push(neighbour);
                }
            }
        }

        cells
    }

    /// All occupants of the cells neighbouring a position
    pub fn neighbours(&self, position: Position) -> impl Iterator<Item = Occupant> + '_ {
        self.neighbourhood(position)
            .into_iter()
            .flat_map(|cell| self.cell(cell).iter().copied())
    }

    /// Move from a position by an offset, wrapping if the grid is toroidal
    fn offset(&self, position: Position, dx: i64, dy: i64) -> Option<Position> {
        let (width, height) = (i64::from(self.width), i64::from(self.height));
        let mut x = i64::from(position.x) + dx;
        let mut y = i64::from(position.y) + dy;
        if self.toroidal {
            x = x.rem_euclid(width);
            y = y.rem_euclid(height);
        } else if !(0..width).contains(&x) || !(0..height).contains(&y) {
            return None;
        }

        Some(Position::new(
            u32::try_from(x).ok()?,
            u32::try_from(y).ok()?,
        ))
    }
}
