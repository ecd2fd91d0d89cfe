//! Drive an LED matrix built from serpentine-wired panels, fed by a small binary host
//! protocol.
//!
//! A host draws on a logical canvas of `(column, line)` points. The device maps each point to
//! the physical strip and offset of the LED drawn there, keeps a color and blink flag per LED,
//! and renders the frame, with blinking LEDs modulated by a triangle wave, once per tick.
//!
//! - [`panel`]: coordinates, panels, and the validated [`PanelLayout`](panel::PanelLayout)
//!   that maps logical points to LED addresses.
//! - [`color`]: 8-bit HSV and RGB conversions.
//! - [`led_strip`]: per-strip storage and output correction (gamma, current budget).
//! - [`frame_store`]: the [`FrameStore`](frame_store::FrameStore) and its render pipeline.
//! - [`protocol`]: wire format and host-side encoders.
//! - [`session`]: the per-connection [`Session`](session::Session) state machine.
//! - [`trace`]: optional observability hook.
//!
//! # Example
//!
//! ```rust
//! use embassy_futures::block_on;
//! use matrix_envoy::frame_store::{RENDER_DEFAULT, ReferenceFrameStore};
//! use matrix_envoy::panel::PanelLayout;
//! use matrix_envoy::protocol::{encode_handshake, encode_move_cursor};
//! use matrix_envoy::session::Session;
//!
//! // Host bytes in, acknowledgments out.
//! struct Link<'a> {
//!     input: &'a [u8],
//!     output: Vec<u8>,
//! }
//! impl embedded_io_async::ErrorType for Link<'_> {
//!     type Error = core::convert::Infallible;
//! }
//! impl embedded_io_async::Read for Link<'_> {
//!     async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
//!         embedded_io_async::Read::read(&mut self.input, buf).await
//!     }
//! }
//! impl embedded_io_async::Write for Link<'_> {
//!     async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
//!         self.output.extend_from_slice(buf);
//!         Ok(buf.len())
//!     }
//!     async fn flush(&mut self) -> Result<(), Self::Error> {
//!         Ok(())
//!     }
//! }
//!
//! let layout = PanelLayout::reference()?;
//! let mut store = ReferenceFrameStore::new(layout.clone(), RENDER_DEFAULT)?;
//! let mut session = Session::new(&layout)?;
//!
//! let mut input = Vec::new();
//! input.extend_from_slice(&encode_handshake());
//! input.extend_from_slice(&encode_move_cursor(10, 3));
//! let mut link = Link { input: &input, output: Vec::new() };
//!
//! block_on(session.serve(&mut link, &mut store))?;
//! assert_eq!(link.output, b"ACKACK");
//! # Ok::<(), matrix_envoy::Error>(())
//! ```
//!
//! # Features
//!
//! - `defmt`: log through `defmt`.
//! - `log`: log through the `log` facade.
//! - `host`: build with `std`, log through `log`, and enable [`to_png`] previews.
//!
//! # Glossary
//!
//! - **Panel:** a rectangular part of the canvas wired as one contiguous serpentine run on a
//!   strip.
//! - **Serpentine wiring:** physical LEDs change direction every row.
//! - **Start corner:** the panel corner holding its first physical LED.
//! - **Skip:** LEDs on a shared strip before a panel's first LED.
//! - **Write cursor:** where the next `UpdateRange` pixel lands.
//! - **Frame tick:** one render; blink modulation is a function of the tick count.
#![cfg_attr(not(feature = "host"), no_std)]

// Must come first so its macros are visible to every other module.
mod fmt;

pub mod color;
mod error;
pub mod frame_store;
pub mod led_strip;
pub mod panel;
pub mod protocol;
pub mod session;
#[cfg(feature = "host")]
pub mod to_png;
pub mod trace;

pub use crate::error::{Error, ErrorKind, Result};
