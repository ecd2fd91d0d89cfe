//! Wire format of the host protocol.
//!
//! Every message is a 5-byte header followed by a payload:
//!
//! ```text
//! +------------+---------------------+-------------------+
//! | command ID | length (u32, LE)    | payload           |
//! | 1 byte     | 4 bytes             | `length` bytes    |
//! +------------+---------------------+-------------------+
//! ```
//!
//! | ID | command       | payload                                              |
//! |----|---------------|------------------------------------------------------|
//! | 1  | `Handshake`   | 4 bytes, literal `HELO`                              |
//! | 2  | `UpdateRange` | repeated 4-byte [`LedDescriptor`]s                   |
//! | 3  | `MoveCursor`  | column (u32 LE), line (u32 LE)                       |
//! | 4  | `Configure`   | 1 byte debug flag, 0 or 1                            |
//!
//! The device answers every complete message with [`ACK`].
//!
//! This module only encodes and decodes bytes. Validation against session state lives in
//! [`session`](crate::session).

use crate::color::{Hsv, RGB8, ToRgb8};
use crate::{Error, Result};

/// Bytes in a message header.
pub const HEADER_LEN: usize = 5;

/// Acknowledgment token written after each complete message.
pub const ACK: &[u8; 3] = b"ACK";

/// The only valid handshake payload.
pub const HANDSHAKE_PAYLOAD: &[u8; 4] = b"HELO";

/// Bytes in one [`LedDescriptor`].
pub const LED_DESCRIPTOR_LEN: usize = 4;

/// Bytes in a `MoveCursor` payload.
pub const MOVE_CURSOR_LEN: usize = 8;

/// Bytes in a `Configure` payload.
pub const CONFIGURE_LEN: usize = 1;

/// Command selected by the first header byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CommandId {
    /// Open the session.
    Handshake = 1,
    /// Write pixels starting at the cursor.
    UpdateRange = 2,
    /// Move the write cursor.
    MoveCursor = 3,
    /// Toggle debug diagnostics.
    Configure = 4,
}

/// Expected payload size of a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadShape {
    /// Exactly this many bytes.
    Fixed(usize),
    /// Any whole number of elements of this size, including zero.
    Array {
        /// Size of one element.
        element_size: usize,
    },
}

impl CommandId {
    /// Name used in errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Handshake => "Handshake",
            Self::UpdateRange => "UpdateRange",
            Self::MoveCursor => "MoveCursor",
            Self::Configure => "Configure",
        }
    }

    /// Payload size this command requires.
    #[must_use]
    pub const fn payload_shape(self) -> PayloadShape {
        match self {
            Self::Handshake => PayloadShape::Fixed(HANDSHAKE_PAYLOAD.len()),
            Self::UpdateRange => PayloadShape::Array {
                element_size: LED_DESCRIPTOR_LEN,
            },
            Self::MoveCursor => PayloadShape::Fixed(MOVE_CURSOR_LEN),
            Self::Configure => PayloadShape::Fixed(CONFIGURE_LEN),
        }
    }

    /// Check a header's length field against this command's payload shape.
    ///
    /// Returns the payload length for fixed commands and the element count for arrays.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FixedLengthMismatch`] or [`Error::ArrayLengthMismatch`].
    pub const fn check_length(self, length: u32) -> Result<usize> {
        match self.payload_shape() {
            PayloadShape::Fixed(expected) => {
                if length as usize == expected {
                    Ok(expected)
                } else {
                    Err(Error::FixedLengthMismatch {
                        command: self.name(),
                        expected,
                        length,
                    })
                }
            }
            PayloadShape::Array { element_size } => {
                if length as usize % element_size == 0 {
                    Ok(length as usize / element_size)
                } else {
                    Err(Error::ArrayLengthMismatch {
                        command: self.name(),
                        element_size,
                        length,
                    })
                }
            }
        }
    }
}

impl TryFrom<u8> for CommandId {
    /// The unrecognized ID.
    type Error = u8;

    fn try_from(id: u8) -> core::result::Result<Self, u8> {
        match id {
            1 => Ok(Self::Handshake),
            2 => Ok(Self::UpdateRange),
            3 => Ok(Self::MoveCursor),
            4 => Ok(Self::Configure),
            other => Err(other),
        }
    }
}

/// A decoded message header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    /// Raw command ID.
    pub id: u8,
    /// Payload length in bytes.
    pub length: u32,
}

impl Header {
    /// Decode a header.
    #[must_use]
    pub const fn decode(bytes: [u8; HEADER_LEN]) -> Self {
        Self {
            id: bytes[0],
            length: u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
        }
    }

    /// Encode this header.
    #[must_use]
    pub const fn encode(self) -> [u8; HEADER_LEN] {
        let [a, b, c, d] = self.length.to_le_bytes();
        [self.id, a, b, c, d]
    }

    /// The command this header selects, if the ID is recognized.
    #[must_use]
    pub fn command(self) -> Option<CommandId> {
        CommandId::try_from(self.id).ok()
    }
}

/// One pixel of an `UpdateRange` payload.
///
/// ```text
/// byte 0   byte 1       byte 2   byte 3
/// hue      saturation   value    blink (0 or 1)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedDescriptor {
    /// HSV hue.
    pub hue: u8,
    /// HSV saturation.
    pub saturation: u8,
    /// HSV value.
    pub value: u8,
    /// Whether the pixel blinks.
    pub blink: bool,
}

impl LedDescriptor {
    /// Create a descriptor from an HSV color.
    #[must_use]
    pub const fn new(hsv: Hsv, blink: bool) -> Self {
        Self {
            hue: hsv.hue,
            saturation: hsv.sat,
            value: hsv.val,
            blink,
        }
    }

    /// Decode a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBlinkFlag`] if the blink byte is not 0 or 1.
    pub const fn decode(bytes: [u8; LED_DESCRIPTOR_LEN]) -> Result<Self> {
        let blink = match bytes[3] {
            0 => false,
            1 => true,
            value => return Err(Error::InvalidBlinkFlag { value }),
        };
        Ok(Self {
            hue: bytes[0],
            saturation: bytes[1],
            value: bytes[2],
            blink,
        })
    }

    /// Encode this descriptor.
    #[must_use]
    pub const fn encode(self) -> [u8; LED_DESCRIPTOR_LEN] {
        [self.hue, self.saturation, self.value, self.blink as u8]
    }

    /// Color as HSV.
    #[must_use]
    pub const fn hsv(self) -> Hsv {
        Hsv {
            hue: self.hue,
            sat: self.saturation,
            val: self.value,
        }
    }

    /// Color as stored by a strip.
    #[must_use]
    pub fn color(self) -> RGB8 {
        self.hsv().to_rgb8()
    }
}

/// Decode a `MoveCursor` payload into `(column, line)`.
#[must_use]
pub const fn decode_cursor(bytes: [u8; MOVE_CURSOR_LEN]) -> (u32, u32) {
    (
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    )
}

/// Encode a `MoveCursor` payload.
#[must_use]
pub const fn encode_cursor(column: u32, line: u32) -> [u8; MOVE_CURSOR_LEN] {
    let [c0, c1, c2, c3] = column.to_le_bytes();
    let [l0, l1, l2, l3] = line.to_le_bytes();
    [c0, c1, c2, c3, l0, l1, l2, l3]
}

/// Decode a `Configure` payload into the debug flag.
///
/// # Errors
///
/// Returns [`Error::InvalidConfigureValue`] unless the byte is 0 or 1.
pub const fn decode_configure(bytes: [u8; CONFIGURE_LEN]) -> Result<bool> {
    match bytes[0] {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(Error::InvalidConfigureValue { value }),
    }
}

const fn header_for(command: CommandId, length: usize) -> [u8; HEADER_LEN] {
    Header {
        id: command as u8,
        length: length as u32,
    }
    .encode()
}

/// A complete `Handshake` message.
#[must_use]
pub const fn encode_handshake() -> [u8; HEADER_LEN + 4] {
    let [h0, h1, h2, h3, h4] = header_for(CommandId::Handshake, HANDSHAKE_PAYLOAD.len());
    let [p0, p1, p2, p3] = *HANDSHAKE_PAYLOAD;
    [h0, h1, h2, h3, h4, p0, p1, p2, p3]
}

/// A complete `MoveCursor` message.
#[must_use]
pub const fn encode_move_cursor(column: u32, line: u32) -> [u8; HEADER_LEN + MOVE_CURSOR_LEN] {
    let [h0, h1, h2, h3, h4] = header_for(CommandId::MoveCursor, MOVE_CURSOR_LEN);
    let [p0, p1, p2, p3, p4, p5, p6, p7] = encode_cursor(column, line);
    [h0, h1, h2, h3, h4, p0, p1, p2, p3, p4, p5, p6, p7]
}

/// A complete `Configure` message.
#[must_use]
pub const fn encode_configure(debug: bool) -> [u8; HEADER_LEN + CONFIGURE_LEN] {
    let [h0, h1, h2, h3, h4] = header_for(CommandId::Configure, CONFIGURE_LEN);
    [h0, h1, h2, h3, h4, debug as u8]
}

/// Header of an `UpdateRange` message carrying `pixel_count` descriptors.
///
/// Follow it with each descriptor's [`encode`](LedDescriptor::encode).
#[must_use]
pub const fn encode_update_range_header(pixel_count: usize) -> [u8; HEADER_LEN] {
    header_for(CommandId::UpdateRange, pixel_count * LED_DESCRIPTOR_LEN)
}
