//! Strongly-typed keys and numeric primitives for dungeondraw.
//!
//! - Tiles are keyed by [`TileId`], cells by [`CellPos`]
//! - Map units become pixels only through a validated [`Scale`]

use std::borrow::Borrow;
use std::fmt;

use glam::{DVec2, dvec2};

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is zero when non-zero required
    Zero,
    /// Value is negative when positive required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Zero => write!(f, "value is zero"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Identifier of a tile in the tile table
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TileId(String);

impl TileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TileId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for TileId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grid position of a cell, in dungeon units
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
}

impl CellPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position displaced by `(dx, dy)` cells, `None` if it leaves the `i32` grid
    pub fn checked_offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// The cell's top-left corner in map units
    pub fn as_units(self) -> DVec2 {
        dvec2(self.x as f64, self.y as f64)
    }

    /// The cell's top-left corner in pixels: scaled, then nudged
    pub fn pixel_origin(self, scale: Scale, nudge: DVec2) -> DVec2 {
        self.as_units() * scale.factors() + nudge
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for CellPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Pixels per map unit, per axis. Always finite and positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale(DVec2);

impl Scale {
    /// Create a scale with validation (rejects NaN, infinite, zero and negative factors)
    pub fn try_new(x: f64, y: f64) -> Result<Scale, NumericError> {
        for v in [x, y] {
            if v.is_nan() {
                return Err(NumericError::NaN);
            } else if v.is_infinite() {
                return Err(NumericError::Infinite);
            } else if v == 0.0 {
                return Err(NumericError::Zero);
            } else if v < 0.0 {
                return Err(NumericError::Negative);
            }
        }
        Ok(Scale(dvec2(x, y)))
    }

    /// Same factor on both axes
    pub fn uniform(factor: f64) -> Result<Scale, NumericError> {
        Self::try_new(factor, factor)
    }

    #[inline]
    pub fn x(self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn factors(self) -> DVec2 {
        self.0
    }

    /// Scale a map-unit x value to whole pixels
    #[inline]
    pub fn px_x(self, units: f64) -> f64 {
        (units * self.0.x).round()
    }

    /// Scale a map-unit y value to whole pixels
    #[inline]
    pub fn px_y(self, units: f64) -> f64 {
        (units * self.0.y).round()
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale(dvec2(100.0, 100.0))
    }
}
