//! One host connection: handshake state, write cursor, and debug flag.
//!
//! A [`Session`] reads messages from an `embedded-io-async` byte stream and applies them to a
//! [`FrameStore`]. Processing one message has two phases:
//!
//! 1. [`Session::receive`] reads the header and the whole payload, and checks framing,
//!    sequencing, bounds, and value domains. It changes nothing.
//! 2. [`Session::apply`] updates the cursor, flags, and frame store.
//!
//! A message that fails phase 1 never touches the frame store.
//!
//! # Errors and stream alignment
//!
//! Framing and stream errors leave the stream position unknown; the session must be dropped.
//! For every other protocol error, the rest of the offending payload has already been read
//! when the error is returned, so the next byte is a header and the caller may keep going
//! ([`Error::is_recoverable`]). [`Session::serve`] stops at the first error of any kind.

use embedded_io_async::{Read, Write};
use heapless::Vec;

use crate::fmt::Debug2Format;
use crate::frame_store::{FrameStore, SharedFrameStore};
use crate::panel::{PanelLayout, Point};
use crate::protocol::{
    ACK, CONFIGURE_LEN, CommandId, HANDSHAKE_PAYLOAD, HEADER_LEN, Header, LED_DESCRIPTOR_LEN,
    LedDescriptor, MOVE_CURSOR_LEN, decode_configure, decode_cursor,
};
use crate::trace::{Event, NoopObserver, Observer};
use crate::{Error, Result};

/// Default capacity, in pixels, of one `UpdateRange`: the reference canvas width.
pub const DEFAULT_MAX_RANGE: usize = 80;

const DRAIN_CHUNK: usize = 8;

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// Only `Handshake` is accepted.
    #[default]
    AwaitingHandshake,
    /// Handshake done; every command is accepted. There is no way back.
    Ready,
}

/// A fully read and validated message, ready to [`apply`](Session::apply).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message<const MAX_RANGE: usize = DEFAULT_MAX_RANGE> {
    /// `Handshake` with the correct payload.
    Handshake,
    /// Pixels to write left to right from `start`.
    UpdateRange {
        /// Cursor position when the message was received.
        start: Point,
        /// Decoded pixels, in payload order.
        pixels: Vec<LedDescriptor, MAX_RANGE>,
    },
    /// New cursor position, on the canvas.
    MoveCursor(Point),
    /// New debug flag.
    Configure {
        /// Whether per-message diagnostics are logged.
        debug: bool,
    },
    /// An unrecognized command whose payload was skipped.
    Unknown {
        /// Raw command ID.
        id: u8,
        /// Skipped payload length.
        length: u32,
    },
}

/// Protocol state for one connection.
///
/// `MAX_RANGE` bounds how many pixels one `UpdateRange` may carry; it must be at least the
/// canvas width. `O` receives [`Event`]s.
///
/// # Example
///
/// ```rust
/// use embassy_futures::block_on;
/// use matrix_envoy::frame_store::{RENDER_DEFAULT, ReferenceFrameStore};
/// use matrix_envoy::panel::{PanelLayout, Point};
/// use matrix_envoy::protocol::{LedDescriptor, encode_handshake, encode_update_range_header};
/// use matrix_envoy::color::{Hsv, colors};
/// use matrix_envoy::session::Session;
///
/// let layout = PanelLayout::reference()?;
/// let mut store = ReferenceFrameStore::new(layout.clone(), RENDER_DEFAULT)?;
/// let mut session = Session::new(&layout)?;
///
/// let red = LedDescriptor::new(Hsv { hue: 0, sat: 255, val: 255 }, false);
/// let mut input = Vec::new();
/// input.extend_from_slice(&encode_handshake());
/// input.extend_from_slice(&encode_update_range_header(1));
/// input.extend_from_slice(&red.encode());
///
/// let mut reader = input.as_slice();
/// let first = block_on(session.receive(&mut reader))?;
/// session.apply(&first.ok_or(matrix_envoy::Error::UnexpectedEof)?, &mut store)?;
/// let second = block_on(session.receive(&mut reader))?;
/// session.apply(&second.ok_or(matrix_envoy::Error::UnexpectedEof)?, &mut store)?;
///
/// assert_eq!(store.get(Point::new(0, 0))?, (colors::RED, false));
/// assert_eq!(session.cursor(), Point::new(1, 0));
/// # Ok::<(), matrix_envoy::Error>(())
/// ```
pub struct Session<O = NoopObserver, const MAX_RANGE: usize = DEFAULT_MAX_RANGE> {
    state: SessionState,
    cursor: Point,
    // Set when an update filled the cursor's row through the last column.
    row_exhausted: bool,
    debug: bool,
    columns: usize,
    lines: usize,
    observer: O,
}

impl Session {
    /// Create a session for `layout` with no observer and the default range capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RangeCapacity`] if the canvas is wider than [`DEFAULT_MAX_RANGE`].
    pub fn new(layout: &PanelLayout) -> Result<Self> {
        Self::with_observer(layout, NoopObserver)
    }
}

impl<O: Observer, const MAX_RANGE: usize> Session<O, MAX_RANGE> {
    /// Create a session for `layout` that reports events to `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RangeCapacity`] if the canvas is wider than `MAX_RANGE`.
    pub fn with_observer(layout: &PanelLayout, observer: O) -> Result<Self> {
        let columns = layout.columns();
        if columns > MAX_RANGE {
            return Err(Error::RangeCapacity {
                columns,
                capacity: MAX_RANGE,
            });
        }
        Ok(Self {
            state: SessionState::AwaitingHandshake,
            cursor: Point::default(),
            row_exhausted: false,
            debug: false,
            columns,
            lines: layout.lines(),
            observer,
        })
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the handshake has been received.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready)
    }

    /// Current write cursor. Always on the canvas.
    ///
    /// After an update that writes the last column of a row, the cursor stays on that column
    /// and further pixels are rejected until the next `MoveCursor`.
    #[must_use]
    pub const fn cursor(&self) -> Point {
        self.cursor
    }

    /// Whether per-message diagnostics are enabled.
    #[must_use]
    pub const fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// The observer.
    #[must_use]
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Read and validate one message.
    ///
    /// Returns `Ok(None)` if the stream ends cleanly before a header.
    ///
    /// # Errors
    ///
    /// Any protocol or stream error. See the [module documentation](self) for which errors
    /// leave the stream aligned.
    pub async fn receive<R: Read>(&mut self, reader: &mut R) -> Result<Option<Message<MAX_RANGE>>> {
        let mut header = [0u8; HEADER_LEN];
        let read = reader.read(&mut header).await.map_err(Error::io)?;
        if read == 0 {
            return Ok(None);
        }
        reader.read_exact(&mut header[read..]).await?;
        let Header { id, length } = Header::decode(header);
        if self.debug {
            debug!("header: id {} length {}", id, length);
        }

        let Ok(command) = CommandId::try_from(id) else {
            drain(reader, length as usize).await?;
            if self.debug {
                debug!("skipped unknown command {}", id);
            }
            self.observer.event(Event::MessageParsed { id, length });
            return Ok(Some(Message::Unknown { id, length }));
        };

        let size = command.check_length(length)?;
        if command != CommandId::Handshake && !self.is_ready() {
            drain(reader, length as usize).await?;
            return Err(Error::HandshakeRequired {
                command: command.name(),
            });
        }

        let message = match command {
            CommandId::Handshake => {
                let mut payload = [0u8; HANDSHAKE_PAYLOAD.len()];
                reader.read_exact(&mut payload).await?;
                if payload != *HANDSHAKE_PAYLOAD {
                    return Err(Error::HandshakeMismatch);
                }
                Message::Handshake
            }
            CommandId::MoveCursor => {
                let mut payload = [0u8; MOVE_CURSOR_LEN];
                reader.read_exact(&mut payload).await?;
                let (column, line) = decode_cursor(payload);
                Message::MoveCursor(self.check_cursor(column, line)?)
            }
            CommandId::Configure => {
                let mut payload = [0u8; CONFIGURE_LEN];
                reader.read_exact(&mut payload).await?;
                Message::Configure {
                    debug: decode_configure(payload)?,
                }
            }
            CommandId::UpdateRange => {
                if let Err(error) = self.check_range(self.cursor, size) {
                    drain(reader, length as usize).await?;
                    return Err(error);
                }
                self.observer.event(Event::ArrayStarted {
                    element_count: size,
                });
                let mut pixels = Vec::new();
                for index in 0..size {
                    let mut element = [0u8; LED_DESCRIPTOR_LEN];
                    reader.read_exact(&mut element).await?;
                    let descriptor = match LedDescriptor::decode(element) {
                        Ok(descriptor) => descriptor,
                        Err(error) => {
                            drain(reader, (size - index - 1) * LED_DESCRIPTOR_LEN).await?;
                            return Err(error);
                        }
                    };
                    pixels.push(descriptor).map_err(|_| Error::RangeCapacity {
                        columns: self.columns,
                        capacity: MAX_RANGE,
                    })?;
                }
                Message::UpdateRange {
                    start: self.cursor,
                    pixels,
                }
            }
        };
        self.observer.event(Event::MessageParsed { id, length });
        Ok(Some(message))
    }

    /// Apply a validated message to this session and `store`.
    ///
    /// Checks are repeated so that a hand-built message cannot partially apply: either every
    /// effect happens or none does.
    ///
    /// # Errors
    ///
    /// Sequencing and bounds errors, as [`receive`](Self::receive) would report them.
    pub fn apply<const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize>(
        &mut self,
        message: &Message<MAX_RANGE>,
        store: &mut FrameStore<STRIPS, LEDS, BLINK_WORDS>,
    ) -> Result<()> {
        let command = match message {
            Message::Handshake => {
                if !self.is_ready() {
                    info!("handshake received, session ready");
                }
                self.state = SessionState::Ready;
                return Ok(());
            }
            Message::Unknown { .. } => return Ok(()),
            Message::UpdateRange { .. } => CommandId::UpdateRange,
            Message::MoveCursor(_) => CommandId::MoveCursor,
            Message::Configure { .. } => CommandId::Configure,
        };
        if !self.is_ready() {
            return Err(Error::HandshakeRequired {
                command: command.name(),
            });
        }

        match message {
            Message::UpdateRange { start, pixels } => {
                self.check_range(*start, pixels.len())?;
                for (index, descriptor) in pixels.iter().enumerate() {
                    let point = *start + Point::new(index, 0);
                    store.set(point, descriptor.color(), descriptor.blink)?;
                    if self.debug {
                        debug!(
                            "pixel ({}, {}) hsv {} {} {} blink {}",
                            point.column,
                            point.line,
                            descriptor.hue,
                            descriptor.saturation,
                            descriptor.value,
                            descriptor.blink
                        );
                    }
                    self.observer.event(Event::ElementApplied { index, point });
                }
                if !pixels.is_empty() {
                    let next_column = start.column + pixels.len();
                    self.row_exhausted = next_column >= self.columns;
                    self.cursor = Point::new(next_column.min(self.columns - 1), start.line);
                }
            }
            Message::MoveCursor(point) => {
                if !self.on_canvas(*point) {
                    return Err(Error::CursorOutOfBounds {
                        column: u32::try_from(point.column).unwrap_or(u32::MAX),
                        line: u32::try_from(point.line).unwrap_or(u32::MAX),
                        columns: self.columns,
                        lines: self.lines,
                    });
                }
                self.cursor = *point;
                self.row_exhausted = false;
                if self.debug {
                    debug!("cursor ({}, {})", point.column, point.line);
                }
            }
            Message::Configure { debug } => {
                self.debug = *debug;
                info!("debug diagnostics {}", if *debug { "on" } else { "off" });
            }
            Message::Handshake | Message::Unknown { .. } => {}
        }
        Ok(())
    }

    /// Receive, apply, and acknowledge one message.
    ///
    /// Returns `Ok(false)` if the stream ended cleanly before a header. No acknowledgment is
    /// written for a message that fails.
    ///
    /// # Errors
    ///
    /// Any error from [`receive`](Self::receive), [`apply`](Self::apply), or writing the
    /// acknowledgment.
    pub async fn process<T, const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize>(
        &mut self,
        stream: &mut T,
        store: &mut FrameStore<STRIPS, LEDS, BLINK_WORDS>,
    ) -> Result<bool>
    where
        T: Read + Write,
    {
        let Some(message) = self.receive(stream).await? else {
            return Ok(false);
        };
        self.apply(&message, store)?;
        self.acknowledge(stream).await?;
        Ok(true)
    }

    /// Process messages until the stream closes or an error occurs.
    ///
    /// # Errors
    ///
    /// The first error, after which the session should be dropped.
    pub async fn serve<T, const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize>(
        &mut self,
        stream: &mut T,
        store: &mut FrameStore<STRIPS, LEDS, BLINK_WORDS>,
    ) -> Result<()>
    where
        T: Read + Write,
    {
        loop {
            match self.process(stream, store).await {
                Ok(true) => {}
                Ok(false) => {
                    info!("stream closed");
                    return Ok(());
                }
                Err(error) => return Err(log_stop(error)),
            }
        }
    }

    /// [`serve`](Self::serve) against a store shared with a render task.
    ///
    /// Each message is read without holding the lock and applied while holding it.
    ///
    /// # Errors
    ///
    /// The first error, after which the session should be dropped.
    pub async fn serve_shared<T, const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize>(
        &mut self,
        stream: &mut T,
        store: &SharedFrameStore<STRIPS, LEDS, BLINK_WORDS>,
    ) -> Result<()>
    where
        T: Read + Write,
    {
        loop {
            let message = match self.receive(stream).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    info!("stream closed");
                    return Ok(());
                }
                Err(error) => return Err(log_stop(error)),
            };
            let applied = store.lock(|cell| {
                let mut guard = cell.borrow_mut();
                self.apply(&message, &mut *guard)
            });
            if let Err(error) = applied {
                return Err(log_stop(error));
            }
            if let Err(error) = self.acknowledge(stream).await {
                return Err(log_stop(error));
            }
        }
    }

    async fn acknowledge<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        writer.write_all(ACK).await.map_err(Error::io)?;
        writer.flush().await.map_err(Error::io)?;
        self.observer.event(Event::Acknowledged);
        Ok(())
    }

    fn check_cursor(&self, column: u32, line: u32) -> Result<Point> {
        let point = Point::new(column as usize, line as usize);
        if self.on_canvas(point) {
            Ok(point)
        } else {
            Err(Error::CursorOutOfBounds {
                column,
                line,
                columns: self.columns,
                lines: self.lines,
            })
        }
    }

    const fn on_canvas(&self, point: Point) -> bool {
        point.column < self.columns && point.line < self.lines
    }

    fn check_range(&self, start: Point, count: usize) -> Result<()> {
        let first_free = if self.row_exhausted && start == self.cursor {
            self.columns
        } else {
            start.column
        };
        if start.line < self.lines && first_free + count <= self.columns {
            Ok(())
        } else {
            Err(Error::RangeOutOfBounds {
                column: start.column,
                count,
                columns: self.columns,
            })
        }
    }
}

async fn drain<R: Read>(reader: &mut R, mut remaining: usize) -> Result<()> {
    let mut scratch = [0u8; DRAIN_CHUNK];
    while remaining > 0 {
        let chunk = remaining.min(DRAIN_CHUNK);
        reader.read_exact(&mut scratch[..chunk]).await?;
        remaining -= chunk;
    }
    Ok(())
}

fn log_stop(error: Error) -> Error {
    warn!("session stopped: {:?}", Debug2Format(&error));
    error
}
