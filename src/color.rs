//! 8-bit HSV and RGB colors, and conversions between them.
//!
//! Incoming pixels arrive as HSV; strips store and emit RGB. Blink modulation converts back
//! to HSV, replaces the value channel, and converts forward again.
//!
//! The conversions use 8-bit integer math with hue in `0..=255` split into six regions of
//! 43 steps, so they are cheap on a microcontroller and round-trip closely but not exactly.

/// Predefined RGB color constants from the `smart_leds` crate.
#[doc(inline)]
pub use smart_leds::colors;

/// 8-bit-per-channel HSV color from the `smart_leds` crate.
pub use smart_leds::hsv::Hsv;

/// 8-bit-per-channel RGB color used by strips and output buffers.
pub use smart_leds::RGB8;

/// 8-bit-per-channel RGB color from `embedded_graphics`.
#[doc(inline)]
pub use embedded_graphics::pixelcolor::Rgb888;

use embedded_graphics::pixelcolor::RgbColor;

/// Convert colors to [`RGB8`].
///
/// # Example
///
/// ```rust
/// use matrix_envoy::color::{Hsv, RGB8, ToRgb8};
///
/// let red = Hsv { hue: 0, sat: 255, val: 255 }.to_rgb8();
/// assert_eq!(red, RGB8::new(255, 0, 0));
/// ```
pub trait ToRgb8 {
    /// Convert this color to [`RGB8`].
    #[must_use]
    fn to_rgb8(self) -> RGB8;
}

impl ToRgb8 for RGB8 {
    #[inline(always)]
    fn to_rgb8(self) -> RGB8 {
        self
    }
}

impl ToRgb8 for Rgb888 {
    #[inline(always)]
    fn to_rgb8(self) -> RGB8 {
        RGB8::new(self.r(), self.g(), self.b())
    }
}

impl ToRgb8 for Hsv {
    fn to_rgb8(self) -> RGB8 {
        let value = self.val;
        if self.sat == 0 {
            return RGB8::new(value, value, value);
        }

        // widen to avoid overflow in the products below
        let hue = u32::from(self.hue);
        let saturation = u32::from(self.sat);
        let value_wide = u32::from(value);

        let region = hue / 43;
        let remainder = (hue - region * 43) * 6;

        let p = ((value_wide * (255 - saturation)) >> 8) as u8;
        let q = ((value_wide * (255 - ((saturation * remainder) >> 8))) >> 8) as u8;
        let t = ((value_wide * (255 - ((saturation * (255 - remainder)) >> 8))) >> 8) as u8;

        match region {
            0 => RGB8::new(value, t, p),
            1 => RGB8::new(q, value, p),
            2 => RGB8::new(p, value, t),
            3 => RGB8::new(p, q, value),
            4 => RGB8::new(t, p, value),
            _ => RGB8::new(value, p, q),
        }
    }
}

/// Convert colors to [`Hsv`].
pub trait ToHsv {
    /// Convert this color to [`Hsv`].
    #[must_use]
    fn to_hsv(self) -> Hsv;
}

impl ToHsv for Hsv {
    #[inline(always)]
    fn to_hsv(self) -> Hsv {
        self
    }
}

impl ToHsv for RGB8 {
    fn to_hsv(self) -> Hsv {
        let min = self.r.min(self.g).min(self.b);
        let max = self.r.max(self.g).max(self.b);

        if max == 0 {
            return Hsv {
                hue: 0,
                sat: 0,
                val: 0,
            };
        }

        let delta = i32::from(max - min);
        let sat = (255 * delta / i32::from(max)) as u8;
        if sat == 0 {
            return Hsv {
                hue: 0,
                sat: 0,
                val: max,
            };
        }

        let (red, green, blue) = (i32::from(self.r), i32::from(self.g), i32::from(self.b));
        // Negative hues wrap around the circle.
        let hue = if max == self.r {
            43 * (green - blue) / delta
        } else if max == self.g {
            85 + 43 * (blue - red) / delta
        } else {
            171 + 43 * (red - green) / delta
        };

        Hsv {
            hue: hue as u8,
            sat,
            val: max,
        }
    }
}

impl ToHsv for Rgb888 {
    fn to_hsv(self) -> Hsv {
        self.to_rgb8().to_hsv()
    }
}

/// Return `color` with its HSV value channel replaced by `value`, hue and saturation kept.
#[must_use]
pub fn with_value(color: RGB8, value: u8) -> RGB8 {
    let mut hsv = color.to_hsv();
    hsv.val = value;
    hsv.to_rgb8()
}
