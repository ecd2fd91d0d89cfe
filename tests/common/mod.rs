//! Shared helpers for protocol tests: an in-memory stream and message builders.
#![allow(dead_code, reason = "each test crate uses a different subset")]

use embedded_io_async::{ErrorKind, ErrorType, Read, Write};
use matrix_envoy::color::Hsv;
use matrix_envoy::frame_store::{RENDER_DEFAULT, ReferenceFrameStore};
use matrix_envoy::panel::PanelLayout;
use matrix_envoy::protocol::{
    Header, LedDescriptor, encode_handshake, encode_update_range_header,
};

/// Byte stream fed from a fixed input, recording everything written.
///
/// Reads return at most `chunk` bytes, to exercise short reads. Once the input is exhausted,
/// reads return 0 (end of stream), or `fail_with` if set.
pub struct MockStream {
    input: Vec<u8>,
    position: usize,
    chunk: usize,
    fail_with: Option<ErrorKind>,
    pub output: Vec<u8>,
    pub flushes: usize,
}

impl MockStream {
    pub fn new(input: Vec<u8>) -> Self {
        Self {
            input,
            position: 0,
            chunk: usize::MAX,
            fail_with: None,
            output: Vec::new(),
            flushes: 0,
        }
    }

    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }

    pub fn failing_at_end(mut self, kind: ErrorKind) -> Self {
        self.fail_with = Some(kind);
        self
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.position
    }
}

impl ErrorType for MockStream {
    type Error = ErrorKind;
}

impl Read for MockStream {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let count = buf.len().min(self.remaining()).min(self.chunk);
        if count == 0 && !buf.is_empty() {
            if let Some(kind) = self.fail_with {
                return Err(kind);
            }
        }
        buf[..count].copy_from_slice(&self.input[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }
}

impl Write for MockStream {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}

pub fn reference_store() -> ReferenceFrameStore {
    ReferenceFrameStore::new(reference_layout(), RENDER_DEFAULT).expect("reference store")
}

pub fn reference_layout() -> PanelLayout {
    PanelLayout::reference().expect("reference layout")
}

pub fn pixel(hue: u8, sat: u8, val: u8, blink: bool) -> LedDescriptor {
    LedDescriptor::new(Hsv { hue, sat, val }, blink)
}

pub fn red() -> LedDescriptor {
    pixel(0, 255, 255, false)
}

/// A message with an arbitrary ID and payload.
pub fn message(id: u8, payload: &[u8]) -> Vec<u8> {
    let length = u32::try_from(payload.len()).expect("payload fits u32");
    let mut bytes = Header { id, length }.encode().to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

pub fn update_range(pixels: &[LedDescriptor]) -> Vec<u8> {
    let mut bytes = encode_update_range_header(pixels.len()).to_vec();
    for pixel in pixels {
        bytes.extend_from_slice(&pixel.encode());
    }
    bytes
}

/// Concatenate messages into one input stream.
pub fn stream(messages: &[&[u8]]) -> MockStream {
    MockStream::new(messages.concat())
}

pub fn handshake() -> Vec<u8> {
    encode_handshake().to_vec()
}
