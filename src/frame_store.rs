//! Per-LED color and blink state for every strip, and the render pipeline that turns it into
//! output bytes.
//!
//! Drawing goes through the [`PanelLayout`]: [`FrameStore::set`] takes a logical [`Point`] and
//! writes the strip and offset the layout resolves. [`FrameStore::render`] then produces, per
//! strip and in strip order, a buffer of packed RGB triples and hands it to a
//! [`RenderDriver`].
//!
//! # Rendering
//!
//! For each LED in the active length:
//! 1. Steady LEDs keep their stored color.
//! 2. Blinking LEDs keep hue and saturation, and take their HSV value from a triangle wave of
//!    the frame tick ([`BlinkConfig::value_at`]).
//! 3. Each channel passes through the combined gamma and current lookup table
//!    ([`RenderConfig`]).
//!
//! Rendering never mutates stored colors, so rendering twice at the same tick with no writes
//! in between emits identical bytes.
//!
//! # Sharing with a render task
//!
//! When parsing and rendering run as separate tasks, wrap the store in a
//! [`SharedFrameStore`] and render with [`render_loop`]. Every message is applied, and every
//! frame rendered, under the same lock, so a frame never mixes old and new pixels of one
//! message.

use core::cell::RefCell;
use core::convert::Infallible;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Ticker};
use embedded_graphics::{
    Pixel,
    pixelcolor::Rgb888,
    prelude::{DrawTarget, OriginDimensions, Size},
};

use crate::color::{ToRgb8, with_value};
use crate::led_strip::{
    BYTES_PER_LED, Current, GAMMA_DEFAULT, Gamma, MAX_CURRENT_DEFAULT, Rgb, Strip, blink_words,
    generate_combo_table,
};
use crate::panel::{PanelLayout, Point};
use crate::trace::{Event, NoopObserver, Observer};
use crate::{Error, Result};

/// Number of strips in the reference build.
pub const REFERENCE_STRIPS: usize = 4;

/// LED capacity of each strip in the reference build: one 40×11 panel.
pub const REFERENCE_LEDS_PER_STRIP: usize = 440;

/// Frame store sized for [`PanelLayout::reference`].
pub type ReferenceFrameStore = FrameStore<
    REFERENCE_STRIPS,
    REFERENCE_LEDS_PER_STRIP,
    { blink_words(REFERENCE_LEDS_PER_STRIP) },
>;

/// Triangle-wave blink modulation of the HSV value channel.
///
/// Over `period_ticks` ticks the value ramps from `low` up to `high` and back down again,
/// spending the same number of ticks on each half:
///
/// ```text
/// period 20, low 0, high 9:
///   tick   0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20
///   value  0 1 2 3 4 5 6 7 8 9  9  8  7  6  5  4  3  2  1  0  0
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkConfig {
    /// Ticks in one full up-and-down cycle. Even and at least 4.
    pub period_ticks: u32,
    /// Value at the bottom of the wave.
    pub low: u8,
    /// Value at the top of the wave.
    pub high: u8,
}

/// Default blink: a 20-tick period ramping the value between 0 and 9.
pub const BLINK_DEFAULT: BlinkConfig = BlinkConfig {
    period_ticks: 20,
    low: 0,
    high: 9,
};

impl BlinkConfig {
    /// Validate and build a blink configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBlinkConfig`] if the period is odd or below 4, or `low > high`.
    /// A period of 4 is the shortest that reaches both `low` and `high`.
    pub const fn new(period_ticks: u32, low: u8, high: u8) -> Result<Self> {
        let config = Self {
            period_ticks,
            low,
            high,
        };
        match config.validate() {
            Ok(()) => Ok(config),
            Err(error) => Err(error),
        }
    }

    /// Check this configuration.
    ///
    /// # Errors
    ///
    /// See [`BlinkConfig::new`].
    pub const fn validate(&self) -> Result<()> {
        if self.period_ticks < 4 || self.period_ticks % 2 != 0 || self.low > self.high {
            return Err(Error::InvalidBlinkConfig {
                period_ticks: self.period_ticks,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }

    /// Value channel of a blinking LED at `tick`.
    ///
    /// A configuration that fails [`validate`](Self::validate) holds at `low`.
    #[must_use]
    pub const fn value_at(&self, tick: u32) -> u8 {
        if self.period_ticks < 4 || self.low >= self.high {
            return self.low;
        }
        let half = self.period_ticks / 2;
        let phase = tick % self.period_ticks;
        let position = if phase < half {
            phase
        } else {
            self.period_ticks - 1 - phase
        };
        let span = (self.high - self.low) as u32;
        self.low + (position * span / (half - 1)) as u8
    }

    /// Tick after `tick`, wrapped to stay inside one period.
    ///
    /// Counting this way never overflows, so the wave stays continuous however long a render
    /// loop runs.
    #[must_use]
    pub const fn next_tick(&self, tick: u32) -> u32 {
        if self.period_ticks == 0 {
            return 0;
        }
        (tick % self.period_ticks + 1) % self.period_ticks
    }
}

/// How stored state becomes output bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RenderConfig {
    /// Blink modulation.
    pub blink: BlinkConfig,
    /// Gamma curve applied after modulation.
    pub gamma: Gamma,
    /// Per-strip current budget applied after gamma.
    pub max_current: Current,
}

/// Default render configuration: [`BLINK_DEFAULT`], linear gamma, no current limit.
///
/// With these settings steady LEDs are emitted exactly as stored.
pub const RENDER_DEFAULT: RenderConfig = RenderConfig {
    blink: BLINK_DEFAULT,
    gamma: GAMMA_DEFAULT,
    max_current: MAX_CURRENT_DEFAULT,
};

impl Default for RenderConfig {
    fn default() -> Self {
        RENDER_DEFAULT
    }
}

/// Receives one finished byte buffer per strip on every render.
///
/// This is the boundary to the hardware that shifts bytes onto a strip's data line. Emission
/// is synchronous and treated as always successful.
///
/// Closures `FnMut(usize, &[u8])` are render drivers.
pub trait RenderDriver {
    /// Emit `bytes` (packed RGB triples) to strip `strip_index`.
    fn emit(&mut self, strip_index: usize, bytes: &[u8]);
}

impl<F: FnMut(usize, &[u8])> RenderDriver for F {
    fn emit(&mut self, strip_index: usize, bytes: &[u8]) {
        self(strip_index, bytes);
    }
}

/// Color and blink state of `STRIPS` strips of `LEDS` LEDs, addressed through a
/// [`PanelLayout`].
///
/// `BLINK_WORDS` must equal [`blink_words(LEDS)`](blink_words).
///
/// # Example
///
/// ```rust
/// use matrix_envoy::color::colors;
/// use matrix_envoy::frame_store::{RENDER_DEFAULT, ReferenceFrameStore};
/// use matrix_envoy::panel::{PanelLayout, Point};
///
/// let mut store = ReferenceFrameStore::new(PanelLayout::reference()?, RENDER_DEFAULT)?;
/// store.set(Point::new(79, 0), colors::RED, false)?;
///
/// let mut first_bytes = [[0u8; 3]; 4];
/// store.render(0, &mut |strip_index: usize, bytes: &[u8]| {
///     first_bytes[strip_index].copy_from_slice(&bytes[..3]);
/// });
/// assert_eq!(first_bytes[1], [255, 0, 0]);
/// # Ok::<(), matrix_envoy::Error>(())
/// ```
pub struct FrameStore<const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize> {
    layout: PanelLayout,
    strips: [Strip<LEDS, BLINK_WORDS>; STRIPS],
    active_len: usize,
    config: RenderConfig,
    combo_table: [u8; 256],
    frame_bytes: [[u8; BYTES_PER_LED]; LEDS],
}

impl<const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize>
    FrameStore<STRIPS, LEDS, BLINK_WORDS>
{
    /// Create a blank store for `layout`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if there are no strips, a panel does not fit on its
    /// strip, or the blink configuration is invalid.
    pub fn new(layout: PanelLayout, config: RenderConfig) -> Result<Self> {
        if STRIPS == 0 {
            return Err(Error::ZeroDimension {
                what: "strip count",
            });
        }
        layout.validate_strips(STRIPS, LEDS)?;
        config.blink.validate()?;
        let max_brightness = config.max_current.max_brightness(LEDS);
        info!(
            "frame store: {} strips x {} LEDs, canvas {}x{}, max brightness {}",
            STRIPS,
            LEDS,
            layout.columns(),
            layout.lines(),
            max_brightness
        );
        Ok(Self {
            layout,
            strips: [const { Strip::new() }; STRIPS],
            active_len: LEDS,
            config,
            combo_table: generate_combo_table(config.gamma, max_brightness),
            frame_bytes: [[0; BYTES_PER_LED]; LEDS],
        })
    }

    /// Layout used to address this store.
    #[must_use]
    pub const fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    /// Render configuration.
    #[must_use]
    pub const fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Number of strips.
    #[must_use]
    pub const fn strip_count(&self) -> usize {
        STRIPS
    }

    /// Strip at `strip_index`, if it exists.
    #[must_use]
    pub fn strip(&self, strip_index: usize) -> Option<&Strip<LEDS, BLINK_WORDS>> {
        self.strips.get(strip_index)
    }

    /// Active LEDs per strip: the prefix of each strip that is rendered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.active_len
    }

    /// Whether no LEDs are active.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.active_len == 0
    }

    /// LED capacity of each strip.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        LEDS
    }

    /// Store `color` and `blink` at the LED drawn at `point`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PointOutOfBounds`] if `point` is off the canvas.
    pub fn set(&mut self, point: Point, color: Rgb, blink: bool) -> Result<()> {
        let address = self.layout.try_locate(point)?;
        self.strips[address.strip_index].set(address.led_index, color, blink);
        Ok(())
    }

    /// Stored color and blink flag of the LED drawn at `point`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PointOutOfBounds`] if `point` is off the canvas.
    pub fn get(&self, point: Point) -> Result<(Rgb, bool)> {
        let address = self.layout.try_locate(point)?;
        let strip = &self.strips[address.strip_index];
        Ok((strip.color(address.led_index), strip.blinks(address.led_index)))
    }

    /// Change the active length of every strip.
    ///
    /// Shrinking blanks every LED from `new_len` to the end of the strip (black, steady).
    /// Growing exposes LEDs that were blanked by an earlier shrink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResizeBeyondCapacity`] if `new_len` exceeds the strip capacity.
    pub fn resize(&mut self, new_len: usize) -> Result<()> {
        if new_len > LEDS {
            return Err(Error::ResizeBeyondCapacity {
                requested: new_len,
                capacity: LEDS,
            });
        }
        if new_len < self.active_len {
            for strip in &mut self.strips {
                strip.blank_from(new_len);
            }
        }
        debug!("resize: {} -> {} LEDs", self.active_len, new_len);
        self.active_len = new_len;
        Ok(())
    }

    /// Blank every LED on every strip.
    pub fn clear(&mut self) {
        for strip in &mut self.strips {
            strip.blank_from(0);
        }
    }

    /// Render the frame at `tick` and emit each strip's bytes, in strip order.
    pub fn render<D: RenderDriver + ?Sized>(&mut self, tick: u32, driver: &mut D) {
        self.render_observed(tick, driver, &mut NoopObserver);
    }

    /// [`render`](Self::render), reporting [`Event::RenderStarted`] and one
    /// [`Event::StripRendered`] per strip to `observer`.
    pub fn render_observed<D, O>(&mut self, tick: u32, driver: &mut D, observer: &mut O)
    where
        D: RenderDriver + ?Sized,
        O: Observer + ?Sized,
    {
        observer.event(Event::RenderStarted { tick });
        let blink_value = self.config.blink.value_at(tick);
        let combo = &self.combo_table;
        let active = &mut self.frame_bytes[..self.active_len];

        for (strip_index, strip) in self.strips.iter().enumerate() {
            for (led_index, bytes) in active.iter_mut().enumerate() {
                *bytes = output_bytes(strip, led_index, blink_value, combo);
            }
            let bytes = active.as_flattened();
            driver.emit(strip_index, bytes);
            observer.event(Event::StripRendered {
                strip_index,
                byte_count: bytes.len(),
            });
        }
    }

    /// Bytes the LED drawn at `point` emits when the frame at `tick` is rendered.
    ///
    /// LEDs past the active length emit black.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PointOutOfBounds`] if `point` is off the canvas.
    pub fn rendered(&self, point: Point, tick: u32) -> Result<[u8; BYTES_PER_LED]> {
        let address = self.layout.try_locate(point)?;
        if address.led_index >= self.active_len {
            return Ok([0; BYTES_PER_LED]);
        }
        Ok(output_bytes(
            &self.strips[address.strip_index],
            address.led_index,
            self.config.blink.value_at(tick),
            &self.combo_table,
        ))
    }

    /// Move this store behind a lock for sharing between a session and a render task.
    #[must_use]
    pub fn into_shared(self) -> SharedFrameStore<STRIPS, LEDS, BLINK_WORDS> {
        Mutex::new(RefCell::new(self))
    }
}

fn output_bytes<const LEDS: usize, const BLINK_WORDS: usize>(
    strip: &Strip<LEDS, BLINK_WORDS>,
    led_index: usize,
    blink_value: u8,
    combo: &[u8; 256],
) -> [u8; BYTES_PER_LED] {
    let stored = strip.color(led_index);
    let color = if strip.blinks(led_index) {
        with_value(stored, blink_value)
    } else {
        stored
    };
    [
        combo[usize::from(color.r)],
        combo[usize::from(color.g)],
        combo[usize::from(color.b)],
    ]
}

impl<const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize> OriginDimensions
    for FrameStore<STRIPS, LEDS, BLINK_WORDS>
{
    fn size(&self) -> Size {
        Size::new(self.layout.columns() as u32, self.layout.lines() as u32)
    }
}

/// Drawing through `embedded-graphics` stores steady (non-blinking) pixels; pixels off the
/// canvas are ignored.
impl<const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize> DrawTarget
    for FrameStore<STRIPS, LEDS, BLINK_WORDS>
{
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (Ok(column), Ok(line)) = (usize::try_from(coord.x), usize::try_from(coord.y))
            else {
                continue;
            };
            let point = Point::new(column, line);
            if self.layout.contains(point) {
                let address = self.layout.locate(point);
                self.strips[address.strip_index].set(address.led_index, color.to_rgb8(), false);
            }
        }
        Ok(())
    }
}

/// A [`FrameStore`] behind a critical-section mutex, shared by a session and a render task.
pub type SharedFrameStore<const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize> =
    Mutex<CriticalSectionRawMutex, RefCell<FrameStore<STRIPS, LEDS, BLINK_WORDS>>>;

/// Render `store` once per `period`, forever.
///
/// The tick starts at 0 and advances by one per frame, wrapping at the blink period
/// ([`BlinkConfig::next_tick`]). The first frame is rendered immediately. Each frame is rendered
/// under the store's lock.
pub async fn render_loop<const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize, D>(
    store: &SharedFrameStore<STRIPS, LEDS, BLINK_WORDS>,
    period: Duration,
    driver: &mut D,
) -> !
where
    D: RenderDriver + ?Sized,
{
    let mut ticker = Ticker::every(period);
    let mut tick: u32 = 0;
    loop {
        tick = store.lock(|cell| {
            let mut frame_store = cell.borrow_mut();
            frame_store.render(tick, driver);
            frame_store.config.blink.next_tick(tick)
        });
        ticker.next().await;
    }
}
