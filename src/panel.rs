//! Logical drawing coordinates, physical LED addresses, and per-panel wiring.
//!
//! The logical canvas is addressed by [`Point`] `(column, line)`, with `(0, 0)` the top-left
//! corner, columns increasing to the right, and lines increasing downward. Each physical LED
//! is addressed by [`LedAddress`] `(strip_index, led_index)`.
//!
//! A [`Panel`] records where its wiring starts ([`Corner`]), which strip it is on, and how many
//! LEDs precede it on that strip. See [`PanelLayout`] for the mapping between the two spaces.

pub mod layout;

pub use layout::{MAX_PANELS, PanelLayout, REFERENCE_PANELS};

use core::ops::{Add, Sub};

/// A position on the logical drawing grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point {
    /// Column, counted from the left edge.
    pub column: usize,
    /// Line, counted from the top edge.
    pub line: usize,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(column: usize, line: usize) -> Self {
        Self { column, line }
    }

    /// Row-major index of this point inside a rectangle `columns` wide.
    ///
    /// ```text
    /// columns = 3:
    ///   (0,0)=0  (1,0)=1  (2,0)=2
    ///   (0,1)=3  (1,1)=4  (2,1)=5
    /// ```
    #[must_use]
    pub const fn index_in_rectangle(self, columns: usize) -> usize {
        self.line * columns + self.column
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.column + other.column, self.line + other.line)
    }
}

/// Coordinates are unsigned; subtracting past zero panics in debug builds.
impl Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.column - other.column, self.line - other.line)
    }
}

/// Wire-level address of one LED: which strip, and how far along it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedAddress {
    /// Index of the physical strip (output).
    pub strip_index: usize,
    /// Offset of the LED on that strip.
    pub led_index: usize,
}

impl LedAddress {
    /// Create an address.
    #[must_use]
    pub const fn new(strip_index: usize, led_index: usize) -> Self {
        Self {
            strip_index,
            led_index,
        }
    }
}

/// Corner of a panel where its first physical LED is wired.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Corner {
    /// Top-left.
    #[default]
    NorthWest,
    /// Top-right.
    NorthEast,
    /// Bottom-right.
    SouthEast,
    /// Bottom-left.
    SouthWest,
}

impl Corner {
    /// Whether this corner is on the left edge.
    #[must_use]
    pub const fn is_west(self) -> bool {
        matches!(self, Self::NorthWest | Self::SouthWest)
    }

    /// Whether this corner is on the right edge.
    #[must_use]
    pub const fn is_east(self) -> bool {
        !self.is_west()
    }

    /// Whether this corner is on the top edge.
    #[must_use]
    pub const fn is_north(self) -> bool {
        matches!(self, Self::NorthWest | Self::NorthEast)
    }

    /// Whether this corner is on the bottom edge.
    #[must_use]
    pub const fn is_south(self) -> bool {
        !self.is_north()
    }
}

/// One rectangular panel: a serpentine run of LEDs on a single strip.
///
/// Rows are wired horizontally and alternate direction. The first row starts at
/// [`start`](Self::start); the rows then proceed toward the opposite edge.
///
/// ```text
/// NorthWest start, 4x3:        SouthEast start, 4x3:
///   0  1  2  3                   11 10  9  8
///   7  6  5  4                    4  5  6  7
///   8  9 10 11                    3  2  1  0
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Panel {
    /// Corner where the panel's first LED sits.
    pub start: Corner,
    /// Strip the panel is wired to.
    pub strip_index: usize,
    /// LEDs on the strip before this panel's first LED.
    pub skip: usize,
}

impl Panel {
    /// Create a panel that starts at the beginning of its strip.
    #[must_use]
    pub const fn new(start: Corner, strip_index: usize) -> Self {
        Self {
            start,
            strip_index,
            skip: 0,
        }
    }

    /// Create a panel that follows `skip` other LEDs on a shared strip.
    #[must_use]
    pub const fn with_skip(start: Corner, strip_index: usize, skip: usize) -> Self {
        Self {
            start,
            strip_index,
            skip,
        }
    }

    /// Whether physical row `row` (counted from the start corner's edge) runs left to right.
    ///
    /// The first row runs away from the start corner's side; every row after that flips.
    #[must_use]
    pub const fn is_left_to_right(&self, row: usize) -> bool {
        self.start.is_west() == (row % 2 == 0)
    }

    /// Whether the panel's first row is the top row.
    #[must_use]
    pub const fn is_top_to_bottom(&self) -> bool {
        self.start.is_north()
    }
}
