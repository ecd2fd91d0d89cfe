//! Per-strip LED storage and output correction.
//!
//! A [`Strip`] holds one RGB color and one blink flag per LED. Blink flags are packed one bit
//! per LED into `u32` words, indexed identically to the colors.
//!
//! Output correction runs after blink modulation, as a single 256-entry lookup table per
//! channel value that folds together the [`Gamma`] curve and the [`Current`] budget
//! (see [`generate_combo_table`]).

use bitset_core::BitSet;

use crate::color::RGB8;

/// RGB color stored per LED.
pub type Rgb = RGB8;

/// Bytes emitted per LED: packed RGB.
pub const BYTES_PER_LED: usize = 3;

/// Estimated draw of one LED at full white, in milliamps.
pub const MILLIAMPS_PER_LED: u32 = 60;

/// Number of `u32` words needed to hold `led_count` blink bits.
#[must_use]
pub const fn blink_words(led_count: usize) -> usize {
    led_count.div_ceil(u32::BITS as usize)
}

/// Fixed-capacity sequence of LED colors with a parallel blink bitset.
///
/// `N` is the LED capacity; `BLINK_WORDS` must equal [`blink_words(N)`](blink_words), which is
/// checked when the strip is constructed.
///
/// ```rust
/// use matrix_envoy::led_strip::{Strip, blink_words};
/// use matrix_envoy::color::colors;
///
/// const N: usize = 40;
/// let mut strip = Strip::<N, { blink_words(N) }>::new();
/// strip.set(3, colors::RED, true);
/// assert_eq!(strip.color(3), colors::RED);
/// assert!(strip.blinks(3));
/// assert!(!strip.blinks(4));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strip<const N: usize, const BLINK_WORDS: usize> {
    colors: [Rgb; N],
    blink: [u32; BLINK_WORDS],
}

impl<const N: usize, const BLINK_WORDS: usize> Strip<N, BLINK_WORDS> {
    /// Number of LEDs this strip can hold.
    pub const CAPACITY: usize = N;

    /// Create a blank (all black, nothing blinking) strip.
    #[must_use]
    pub const fn new() -> Self {
        assert!(N > 0, "strip capacity must be positive");
        assert!(
            BLINK_WORDS == blink_words(N),
            "BLINK_WORDS must equal blink_words(N)"
        );
        Self {
            colors: [Rgb::new(0, 0, 0); N],
            blink: [0; BLINK_WORDS],
        }
    }

    /// Set the color and blink flag of the LED at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= N`.
    pub fn set(&mut self, index: usize, color: Rgb, blink: bool) {
        self.colors[index] = color;
        if blink {
            self.set_blinking(index);
        } else {
            self.clear_blinking(index);
        }
    }

    /// Stored color of the LED at `index`.
    #[must_use]
    pub fn color(&self, index: usize) -> Rgb {
        self.colors[index]
    }

    /// Whether the LED at `index` blinks.
    #[must_use]
    pub fn blinks(&self, index: usize) -> bool {
        self.blink.bit_test(index)
    }

    /// Mark the LED at `index` as blinking.
    pub fn set_blinking(&mut self, index: usize) {
        self.blink.bit_set(index);
    }

    /// Mark the LED at `index` as steady.
    pub fn clear_blinking(&mut self, index: usize) {
        self.blink.bit_reset(index);
    }

    /// Number of blinking LEDs.
    #[must_use]
    pub fn blinking_count(&self) -> usize {
        self.blink.bit_count()
    }

    /// Stored colors, in strip order.
    #[must_use]
    pub const fn colors(&self) -> &[Rgb; N] {
        &self.colors
    }

    /// Blank LEDs `start..N`: black and steady.
    pub fn blank_from(&mut self, start: usize) {
        for index in start..N {
            self.set(index, Rgb::new(0, 0, 0), false);
        }
    }
}

impl<const N: usize, const BLINK_WORDS: usize> Default for Strip<N, BLINK_WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Gamma correction mode applied to output bytes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gamma {
    /// No correction: output bytes equal stored channel values.
    #[default]
    Linear,
    /// Standard gamma 2.2 correction for perceived brightness.
    Gamma2_2,
}

/// Default gamma for rendering (`Gamma::Linear`), so output bytes match stored colors.
pub const GAMMA_DEFAULT: Gamma = Gamma::Linear;

/// Gamma 2.2 lookup table: `corrected = (value / 255)^2.2 * 255`, precomputed.
pub(crate) const GAMMA_2_2_TABLE: [u8; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2,
    3, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 6, 7, 7, 7, 8, 8, 8, 9, 9, 9, 10, 10, 11, 11,
    11, 12, 12, 13, 13, 13, 14, 14, 15, 15, 16, 16, 17, 17, 18, 18, 19, 19, 20, 20, 21, 22, 22, 23,
    23, 24, 25, 25, 26, 26, 27, 28, 28, 29, 30, 30, 31, 32, 33, 33, 34, 35, 35, 36, 37, 38, 39, 39,
    40, 41, 42, 43, 43, 44, 45, 46, 47, 48, 49, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61,
    62, 63, 64, 65, 66, 67, 68, 69, 70, 71, 73, 74, 75, 76, 77, 78, 79, 81, 82, 83, 84, 85, 87, 88,
    89, 90, 91, 93, 94, 95, 97, 98, 99, 100, 102, 103, 105, 106, 107, 109, 110, 111, 113, 114, 116,
    117, 119, 120, 121, 123, 124, 126, 127, 129, 130, 132, 133, 135, 137, 138, 140, 141, 143, 145,
    146, 148, 149, 151, 153, 154, 156, 158, 159, 161, 163, 165, 166, 168, 170, 172, 173, 175, 177,
    179, 181, 182, 184, 186, 188, 190, 192, 194, 196, 197, 199, 201, 203, 205, 207, 209, 211, 213,
    215, 217, 219, 221, 223, 225, 227, 229, 231, 234, 236, 238, 240, 242, 244, 246, 248, 251, 253,
    255,
];

/// Combined gamma and brightness lookup table: `table[value]` is the emitted byte.
///
/// Scaling is `gamma(value) * max_brightness / 255`, so with [`Gamma::Linear`] and a
/// brightness of 255 the table is the identity.
#[must_use]
pub const fn generate_combo_table(gamma: Gamma, max_brightness: u8) -> [u8; 256] {
    let mut result = [0u8; 256];
    let mut index = 0;
    while index < 256 {
        let corrected = match gamma {
            Gamma::Linear => index as u8,
            Gamma::Gamma2_2 => GAMMA_2_2_TABLE[index],
        };
        result[index] = ((corrected as u16 * max_brightness as u16) / 255) as u8;
        index += 1;
    }
    result
}

/// Current budget for one strip.
///
/// The budget caps brightness so that every LED at full white stays within it. A 440-LED
/// strip draws about 26 A at full white; with `Current::Milliamps(2000)` brightness is capped
/// at roughly 7%.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Current {
    /// Limit brightness to stay within this many milliamps.
    Milliamps(u16),
    /// No limit: brightness stays at 100%.
    #[default]
    Unlimited,
}

/// Default current budget for rendering (`Current::Unlimited`).
pub const MAX_CURRENT_DEFAULT: Current = Current::Unlimited;

impl Current {
    /// Maximum brightness (0..=255) that keeps `led_count` LEDs within this budget.
    #[must_use]
    pub const fn max_brightness(self, led_count: usize) -> u8 {
        let worst_case_ma = led_count as u32 * MILLIAMPS_PER_LED;
        match self {
            Self::Milliamps(_) if worst_case_ma == 0 => 255,
            Self::Milliamps(ma) => {
                let scale = (ma as u32 * 255) / worst_case_ma;
                if scale > 255 { 255 } else { scale as u8 }
            }
            Self::Unlimited => 255,
        }
    }
}
