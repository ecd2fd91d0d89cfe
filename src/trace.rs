//! Optional observability hook at component boundaries.
//!
//! Sessions and frame stores report [`Event`]s to an [`Observer`]. The default observer,
//! [`NoopObserver`], ignores them. Any `FnMut(Event)` closure is also an observer, which is the
//! easiest way to collect events in tests.

use crate::panel::Point;

/// Something observable happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A message header and its whole payload were read and validated.
    MessageParsed {
        /// Raw command ID.
        id: u8,
        /// Payload length from the header.
        length: u32,
    },
    /// An array payload passed its pre-checks and its elements are about to be decoded.
    ArrayStarted {
        /// Number of elements in the payload.
        element_count: usize,
    },
    /// One array element was written to the frame store.
    ElementApplied {
        /// Position of the element in the payload.
        index: usize,
        /// Canvas point it was written to.
        point: Point,
    },
    /// A render pass started.
    RenderStarted {
        /// Frame tick being rendered.
        tick: u32,
    },
    /// One strip's buffer was handed to the render driver.
    StripRendered {
        /// Strip index.
        strip_index: usize,
        /// Bytes emitted.
        byte_count: usize,
    },
    /// The acknowledgment token was written and the output flushed.
    Acknowledged,
}

/// Receives [`Event`]s.
pub trait Observer {
    /// Called once per event. The default does nothing.
    fn event(&mut self, event: Event) {
        let _ = event;
    }
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

impl<F: FnMut(Event)> Observer for F {
    fn event(&mut self, event: Event) {
        self(event);
    }
}
