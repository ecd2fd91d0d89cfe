//! Panel geometry and wiring, validated once at startup.
//!
//! See [`PanelLayout`] for the coordinate transform and its validation rules.

use heapless::Vec;

use crate::panel::{Corner, LedAddress, Panel, Point};
use crate::{Error, Result};

/// Most panels a [`PanelLayout`] can describe.
pub const MAX_PANELS: usize = 16;

/// Panels of the reference 80×22 canvas: four 40×11 panels, one strip each.
///
/// ```text
///   +----------------+----------------+
///   | strip 0        |        strip 1 |
///   | NorthWest      |      NorthEast |
///   +----------------+----------------+
///   | SouthWest      |      SouthEast |
///   | strip 2        |        strip 3 |
///   +----------------+----------------+
/// ```
pub const REFERENCE_PANELS: [Panel; 4] = [
    Panel::new(Corner::NorthWest, 0),
    Panel::new(Corner::NorthEast, 1),
    Panel::new(Corner::SouthWest, 2),
    Panel::new(Corner::SouthEast, 3),
];

/// Immutable description of how panels tile the logical canvas.
///
/// Panels are listed row by row: the first `panel_columns()` panels form the top panel row,
/// left to right, and so on. Every panel is `columns_per_panel` × `lines_per_panel` LEDs.
///
/// `PanelLayout` maps a logical [`Point`] to the [`LedAddress`] of the LED drawn there
/// with [`locate`](Self::locate). Construction validates the layout:
/// - all dimensions are positive
/// - the panel count divides evenly into `panel_rows`
/// - no two panels on one strip claim the same LEDs
///
/// [`validate_strips`](Self::validate_strips) additionally checks the layout against the
/// strips it will be rendered to.
///
/// # Example
///
/// ```rust
/// use matrix_envoy::panel::{LedAddress, PanelLayout, Point};
///
/// let layout = PanelLayout::reference()?;
/// assert_eq!((layout.columns(), layout.lines()), (80, 22));
///
/// // The top-right panel starts in its north-east corner.
/// assert_eq!(layout.locate(Point::new(79, 0)), LedAddress::new(1, 0));
/// assert_eq!(layout.locate(Point::new(78, 0)), LedAddress::new(1, 1));
/// # Ok::<(), matrix_envoy::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelLayout {
    panels: Vec<Panel, MAX_PANELS>,
    panel_rows: usize,
    columns_per_panel: usize,
    lines_per_panel: usize,
}

impl PanelLayout {
    /// Validate and build a layout.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a dimension is zero, there are more than
    /// [`MAX_PANELS`] panels, the panel count is not a multiple of `panel_rows`, or two
    /// panels overlap on a shared strip.
    pub fn new(
        panels: &[Panel],
        panel_rows: usize,
        columns_per_panel: usize,
        lines_per_panel: usize,
    ) -> Result<Self> {
        if panels.is_empty() {
            return Err(Error::ZeroDimension {
                what: "panel count",
            });
        }
        if panel_rows == 0 {
            return Err(Error::ZeroDimension { what: "panel rows" });
        }
        if columns_per_panel == 0 {
            return Err(Error::ZeroDimension {
                what: "columns per panel",
            });
        }
        if lines_per_panel == 0 {
            return Err(Error::ZeroDimension {
                what: "lines per panel",
            });
        }
        let panels: Vec<Panel, MAX_PANELS> =
            Vec::from_slice(panels).map_err(|()| Error::TooManyPanels {
                panel_count: panels.len(),
                max: MAX_PANELS,
            })?;
        if panels.len() % panel_rows != 0 {
            return Err(Error::PanelRowsMismatch {
                panel_count: panels.len(),
                panel_rows,
            });
        }

        let layout = Self {
            panels,
            panel_rows,
            columns_per_panel,
            lines_per_panel,
        };
        layout.check_overlaps()?;
        Ok(layout)
    }

    /// The 80×22 reference layout built from [`REFERENCE_PANELS`].
    ///
    /// # Errors
    ///
    /// Never fails in practice; returns `Result` because it goes through [`Self::new`].
    pub fn reference() -> Result<Self> {
        Self::new(&REFERENCE_PANELS, 2, 40, 11)
    }

    fn check_overlaps(&self) -> Result<()> {
        let cells = self.cells_per_panel();
        for (first, a) in self.panels.iter().enumerate() {
            for (offset, b) in self.panels.iter().skip(first + 1).enumerate() {
                if a.strip_index == b.strip_index
                    && a.skip < b.skip + cells
                    && b.skip < a.skip + cells
                {
                    return Err(Error::PanelsOverlap {
                        first,
                        second: first + 1 + offset,
                        strip_index: a.strip_index,
                    });
                }
            }
        }
        Ok(())
    }

    /// Check that every panel fits on a store with `strip_count` strips of `capacity` LEDs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StripIndexOutOfRange`] or [`Error::PanelExceedsStrip`].
    pub fn validate_strips(&self, strip_count: usize, capacity: usize) -> Result<()> {
        let cells = self.cells_per_panel();
        for (panel_index, panel) in self.panels.iter().enumerate() {
            if panel.strip_index >= strip_count {
                return Err(Error::StripIndexOutOfRange {
                    panel_index,
                    strip_index: panel.strip_index,
                    strip_count,
                });
            }
            let needed = panel.skip + cells;
            if needed > capacity {
                return Err(Error::PanelExceedsStrip {
                    panel_index,
                    needed,
                    capacity,
                });
            }
        }
        Ok(())
    }

    /// Panels in row-major panel order.
    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Number of panels.
    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Number of panel rows.
    #[must_use]
    pub const fn panel_rows(&self) -> usize {
        self.panel_rows
    }

    /// Number of panel columns.
    #[must_use]
    pub fn panel_columns(&self) -> usize {
        self.panels.len() / self.panel_rows
    }

    /// Width of one panel in LEDs.
    #[must_use]
    pub const fn columns_per_panel(&self) -> usize {
        self.columns_per_panel
    }

    /// Height of one panel in LEDs.
    #[must_use]
    pub const fn lines_per_panel(&self) -> usize {
        self.lines_per_panel
    }

    /// LEDs in one panel.
    #[must_use]
    pub const fn cells_per_panel(&self) -> usize {
        self.columns_per_panel * self.lines_per_panel
    }

    /// Width of the logical canvas.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns_per_panel * self.panel_columns()
    }

    /// Height of the logical canvas.
    #[must_use]
    pub const fn lines(&self) -> usize {
        self.lines_per_panel * self.panel_rows
    }

    /// LEDs on the whole logical canvas.
    #[must_use]
    pub fn cells(&self) -> usize {
        self.columns() * self.lines()
    }

    /// Whether `point` lies on the logical canvas.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.column < self.columns() && point.line < self.lines()
    }

    /// Logical position of a corner of the panel at (`panel_column`, `panel_row`).
    ///
    /// Eastern and southern corners are exclusive: the north-east corner of the first panel
    /// is `(columns_per_panel, 0)`.
    #[must_use]
    pub const fn panel_corner(&self, panel_column: usize, panel_row: usize, corner: Corner) -> Point {
        let north_west = Point::new(
            panel_column * self.columns_per_panel,
            panel_row * self.lines_per_panel,
        );
        let column = if corner.is_east() {
            north_west.column + self.columns_per_panel
        } else {
            north_west.column
        };
        let line = if corner.is_south() {
            north_west.line + self.lines_per_panel
        } else {
            north_west.line
        };
        Point::new(column, line)
    }

    /// The panel containing `point`, and `point` relative to that panel's north-west corner.
    ///
    /// `point` must be on the canvas.
    #[must_use]
    pub fn find_panel(&self, point: Point) -> (&Panel, Point) {
        let panel_row = point.line / self.lines_per_panel;
        let panel_column = point.column / self.columns_per_panel;
        let panel_index = panel_row * self.panel_columns() + panel_column;
        let in_panel = point - self.panel_corner(panel_column, panel_row, Corner::NorthWest);
        (&self.panels[panel_index], in_panel)
    }

    /// Physical address of the LED drawn at `point`.
    ///
    /// `point` must be on the canvas; callers validate bounds first
    /// (see [`try_locate`](Self::try_locate)).
    #[must_use]
    pub fn locate(&self, point: Point) -> LedAddress {
        let (panel, in_panel) = self.find_panel(point);
        let row = if panel.is_top_to_bottom() {
            in_panel.line
        } else {
            self.lines_per_panel - 1 - in_panel.line
        };
        let column = if panel.is_left_to_right(row) {
            in_panel.column
        } else {
            self.columns_per_panel - 1 - in_panel.column
        };
        LedAddress::new(
            panel.strip_index,
            panel.skip + Point::new(column, row).index_in_rectangle(self.columns_per_panel),
        )
    }

    /// Bounds-checked [`locate`](Self::locate).
    ///
    /// # Errors
    ///
    /// Returns [`Error::PointOutOfBounds`] if `point` is off the canvas.
    pub fn try_locate(&self, point: Point) -> Result<LedAddress> {
        if self.contains(point) {
            Ok(self.locate(point))
        } else {
            Err(Error::PointOutOfBounds {
                column: point.column,
                line: point.line,
                columns: self.columns(),
                lines: self.lines(),
            })
        }
    }
}
