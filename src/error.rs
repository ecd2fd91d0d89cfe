//! Crate-wide error type.
//!
//! Every failure the crate can report is one [`Error`] variant. [`Error::kind`] groups the
//! variants the way a session cares about them: whether the byte stream is still aligned, and
//! whether the host did something out of order, out of range, or outside a value domain.

use derive_more::{Display, Error as DeriveError};
use embedded_io_async::ErrorKind as IoErrorKind;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported by layouts, frame stores, and protocol sessions.
#[derive(Debug, Display, DeriveError, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // ---- configuration ----
    /// A layout or store dimension is zero.
    #[display("{what} must be positive")]
    ZeroDimension {
        /// Which dimension was zero.
        what: &'static str,
    },
    /// The panel count is not a multiple of the number of panel rows.
    #[display("{panel_count} panels cannot be split evenly into {panel_rows} panel rows")]
    PanelRowsMismatch {
        /// Number of panels supplied.
        panel_count: usize,
        /// Number of panel rows requested.
        panel_rows: usize,
    },
    /// More panels than a layout can hold.
    #[display("{panel_count} panels exceeds the layout capacity of {max}")]
    TooManyPanels {
        /// Number of panels supplied.
        panel_count: usize,
        /// Capacity of the layout.
        max: usize,
    },
    /// A panel is wired to a strip the store does not have.
    #[display("panel {panel_index} uses strip {strip_index}, but only {strip_count} strips exist")]
    StripIndexOutOfRange {
        /// Index of the offending panel.
        panel_index: usize,
        /// Strip the panel claims.
        strip_index: usize,
        /// Number of strips available.
        strip_count: usize,
    },
    /// A panel's LEDs (after its skip) run past the end of its strip.
    #[display("panel {panel_index} needs {needed} LEDs on its strip, capacity is {capacity}")]
    PanelExceedsStrip {
        /// Index of the offending panel.
        panel_index: usize,
        /// LEDs needed (skip plus panel cells).
        needed: usize,
        /// Strip capacity.
        capacity: usize,
    },
    /// Two panels claim the same LEDs on one strip.
    #[display("panels {first} and {second} overlap on strip {strip_index}")]
    PanelsOverlap {
        /// First panel index.
        first: usize,
        /// Second panel index.
        second: usize,
        /// The shared strip.
        strip_index: usize,
    },
    /// Blink settings cannot produce a symmetric triangle wave: the period must be even and at
    /// least 4, and `low` must not exceed `high`.
    #[display("blink period {period_ticks} with range {low}..={high} is not a valid triangle wave")]
    InvalidBlinkConfig {
        /// Configured period.
        period_ticks: u32,
        /// Configured low value.
        low: u8,
        /// Configured high value.
        high: u8,
    },
    /// The canvas is wider than a session can buffer for one range update.
    #[display("canvas is {columns} columns wide, range buffer holds {capacity}")]
    RangeCapacity {
        /// Canvas width.
        columns: usize,
        /// Range buffer capacity.
        capacity: usize,
    },
    /// `resize` asked for more LEDs than a strip holds.
    #[display("cannot resize to {requested} LEDs, capacity is {capacity}")]
    ResizeBeyondCapacity {
        /// Requested active length.
        requested: usize,
        /// Strip capacity.
        capacity: usize,
    },
    /// A point lies outside the logical canvas.
    #[display("point ({column}, {line}) is outside the {columns}x{lines} canvas")]
    PointOutOfBounds {
        /// Point column.
        column: usize,
        /// Point line.
        line: usize,
        /// Canvas width.
        columns: usize,
        /// Canvas height.
        lines: usize,
    },

    // ---- framing ----
    /// A fixed-size command arrived with the wrong payload length.
    #[display("{command} expects a {expected}-byte payload, got {length}")]
    FixedLengthMismatch {
        /// Command name.
        command: &'static str,
        /// Expected payload length.
        expected: usize,
        /// Length field from the header.
        length: u32,
    },
    /// An array command's payload is not a whole number of elements.
    #[display("{command} payload of {length} bytes is not a multiple of {element_size}")]
    ArrayLengthMismatch {
        /// Command name.
        command: &'static str,
        /// Size of one element.
        element_size: usize,
        /// Length field from the header.
        length: u32,
    },

    // ---- sequencing ----
    /// A drawing or configuration command arrived before the handshake.
    #[display("{command} received before handshake")]
    HandshakeRequired {
        /// Command name.
        command: &'static str,
    },

    // ---- bounds ----
    /// `MoveCursor` targets a position outside the canvas.
    #[display("cursor ({column}, {line}) is outside the {columns}x{lines} canvas")]
    CursorOutOfBounds {
        /// Requested column.
        column: u32,
        /// Requested line.
        line: u32,
        /// Canvas width.
        columns: usize,
        /// Canvas height.
        lines: usize,
    },
    /// `UpdateRange` would run past the end of the cursor's row.
    #[display("{count} pixels from column {column} run past the {columns}-column row")]
    RangeOutOfBounds {
        /// Cursor column.
        column: usize,
        /// Number of pixels in the update.
        count: usize,
        /// Canvas width.
        columns: usize,
    },

    // ---- value domain ----
    /// The handshake payload is not `HELO`.
    #[display("handshake payload mismatch")]
    HandshakeMismatch,
    /// An LED descriptor's blink flag is neither 0 nor 1.
    #[display("blink flag must be 0 or 1, got {value}")]
    InvalidBlinkFlag {
        /// Received value.
        value: u8,
    },
    /// A `Configure` payload is neither 0 nor 1.
    #[display("configure value must be 0 or 1, got {value}")]
    InvalidConfigureValue {
        /// Received value.
        value: u8,
    },

    // ---- stream ----
    /// The stream ended part way through a message.
    #[display("stream ended in the middle of a message")]
    UnexpectedEof,
    /// The underlying reader or writer failed.
    #[display("I/O error: {kind:?}")]
    Io {
        /// Kind reported by the transport.
        kind: IoErrorKind,
    },
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Invalid layout, blink, or store configuration.
    Configuration,
    /// Length field inconsistent with the command.
    Framing,
    /// Command issued before the handshake.
    Sequencing,
    /// Cursor or range outside the canvas.
    Bounds,
    /// Payload value outside its allowed domain.
    ValueDomain,
    /// Transport failure or premature end of stream.
    Stream,
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroDimension { .. }
            | Self::PanelRowsMismatch { .. }
            | Self::TooManyPanels { .. }
            | Self::StripIndexOutOfRange { .. }
            | Self::PanelExceedsStrip { .. }
            | Self::PanelsOverlap { .. }
            | Self::InvalidBlinkConfig { .. }
            | Self::RangeCapacity { .. }
            | Self::ResizeBeyondCapacity { .. } => ErrorKind::Configuration,
            Self::FixedLengthMismatch { .. } | Self::ArrayLengthMismatch { .. } => {
                ErrorKind::Framing
            }
            Self::HandshakeRequired { .. } => ErrorKind::Sequencing,
            Self::PointOutOfBounds { .. }
            | Self::CursorOutOfBounds { .. }
            | Self::RangeOutOfBounds { .. } => ErrorKind::Bounds,
            Self::HandshakeMismatch
            | Self::InvalidBlinkFlag { .. }
            | Self::InvalidConfigureValue { .. } => ErrorKind::ValueDomain,
            Self::UnexpectedEof | Self::Io { .. } => ErrorKind::Stream,
        }
    }

    /// Whether a session can keep reading after this error.
    ///
    /// True for sequencing, bounds, and value-domain errors: the session has already consumed
    /// the rest of the offending message, so the next byte is a header.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Sequencing | ErrorKind::Bounds | ErrorKind::ValueDomain
        )
    }
}

impl Error {
    pub(crate) fn io<E: embedded_io_async::Error>(error: E) -> Self {
        Self::Io { kind: error.kind() }
    }
}

impl<E: embedded_io_async::Error> From<embedded_io_async::ReadExactError<E>> for Error {
    fn from(error: embedded_io_async::ReadExactError<E>) -> Self {
        match error {
            embedded_io_async::ReadExactError::UnexpectedEof => Self::UnexpectedEof,
            embedded_io_async::ReadExactError::Other(other) => Self::io(other),
        }
    }
}
