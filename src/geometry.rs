use serde::{Deserialize, Serialize};

/// A location in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Parking spot for the indicator while no pointer is down
    pub const OFFSCREEN: Point = Point {
        x: -100.0,
        y: -100.0,
    };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

/// Size of the interaction surface
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extents {
    pub width: f64,
    pub height: f64,
}

impl Extents {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Half of the longer side; the distance at which proximity bottoms out
    pub fn max_distance(&self) -> f64 {
        self.width.max(self.height) / 2.0
    }
}

/// Conversion between terminal cells and surface units.
///
/// Terminal cells are roughly twice as tall as they are wide, so the default
/// scale keeps distances visually round on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellScale {
    pub cell_width: f64,
    pub cell_height: f64,
}

impl CellScale {
    pub const fn new(cell_width: f64, cell_height: f64) -> Self {
        Self {
            cell_width,
            cell_height,
        }
    }

    pub fn extents(&self, columns: u16, rows: u16) -> Extents {
        Extents::new(
            columns as f64 * self.cell_width,
            rows as f64 * self.cell_height,
        )
    }

    /// Fewest whole cells (columns, rows) covering strictly more than `extents`
    pub fn cells_exceeding(&self, extents: Extents) -> (u16, u16) {
        (
            (extents.width / self.cell_width).floor() as u16 + 1,
            (extents.height / self.cell_height).floor() as u16 + 1,
        )
    }

    /// Centre of the cell at `(column, row)` relative to the surface origin
    pub fn cell_center(&self, column: u16, row: u16) -> Point {
        Point::new(
            (column as f64 + 0.5) * self.cell_width,
            (row as f64 + 0.5) * self.cell_height,
        )
    }
}

impl Default for CellScale {
    fn default() -> Self {
        Self::new(4.0, 8.0)
    }
}
