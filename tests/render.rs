#![allow(missing_docs)]
//! Frame store writes, blink modulation, resize, and output correction.

use embedded_graphics::Drawable;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{OriginDimensions, Point as GfxPoint, Size};
use embedded_graphics::Pixel;
use matrix_envoy::color::{RGB8, colors};
use matrix_envoy::frame_store::{
    BLINK_DEFAULT, BlinkConfig, FrameStore, RENDER_DEFAULT, RenderConfig, RenderDriver,
};
use matrix_envoy::led_strip::{Current, Gamma, blink_words, generate_combo_table};
use matrix_envoy::panel::{Corner, Panel, PanelLayout, Point};
use matrix_envoy::trace::Event;
use matrix_envoy::{Error, Result};

const LEDS: usize = 12;
type SmallStore = FrameStore<2, LEDS, { blink_words(LEDS) }>;

/// Two 4x3 panels side by side, one strip each; canvas is 8x3.
fn small_layout() -> Result<PanelLayout> {
    PanelLayout::new(
        &[
            Panel::new(Corner::NorthWest, 0),
            Panel::new(Corner::NorthEast, 1),
        ],
        1,
        4,
        3,
    )
}

fn small_store(config: RenderConfig) -> Result<SmallStore> {
    SmallStore::new(small_layout()?, config)
}

#[derive(Default)]
struct RecordingDriver {
    emitted: Vec<(usize, Vec<u8>)>,
}

impl RenderDriver for RecordingDriver {
    fn emit(&mut self, strip_index: usize, bytes: &[u8]) {
        self.emitted.push((strip_index, bytes.to_vec()));
    }
}

fn render(store: &mut SmallStore, tick: u32) -> Vec<(usize, Vec<u8>)> {
    let mut driver = RecordingDriver::default();
    store.render(tick, &mut driver);
    driver.emitted
}

#[test]
fn steady_pixel_is_emitted_unchanged_in_strip_order() -> Result<()> {
    let mut store = small_store(RENDER_DEFAULT)?;
    store.set(Point::new(0, 0), colors::RED, false)?;
    store.set(Point::new(7, 0), RGB8::new(1, 2, 3), false)?;

    let emitted = render(&mut store, 0);
    assert_eq!(emitted.len(), 2);
    assert_eq!(emitted[0].0, 0);
    assert_eq!(emitted[1].0, 1);
    assert_eq!(emitted[0].1.len(), LEDS * 3);
    assert_eq!(&emitted[0].1[..3], &[255, 0, 0]);
    assert!(emitted[0].1[3..].iter().all(|byte| *byte == 0));
    assert_eq!(&emitted[1].1[..3], &[1, 2, 3]);
    Ok(())
}

#[test]
fn set_and_get_round_trip_through_layout() -> Result<()> {
    let mut store = small_store(RENDER_DEFAULT)?;
    store.set(Point::new(5, 2), colors::BLUE, true)?;
    assert_eq!(store.get(Point::new(5, 2))?, (colors::BLUE, true));
    assert_eq!(store.get(Point::new(4, 2))?, (RGB8::new(0, 0, 0), false));

    // (5, 2) on the NorthEast panel is wired at row 2, reversed: offset 8 + 2.
    let strip = store.strip(1).expect("strip 1 exists");
    assert_eq!(strip.color(10), colors::BLUE);
    assert!(strip.blinks(10));
    assert_eq!(strip.blinking_count(), 1);
    Ok(())
}

#[test]
fn set_off_canvas_is_rejected() -> Result<()> {
    let mut store = small_store(RENDER_DEFAULT)?;
    assert!(matches!(
        store.set(Point::new(8, 0), colors::RED, false),
        Err(Error::PointOutOfBounds { column: 8, .. })
    ));
    assert!(store.get(Point::new(0, 3)).is_err());
    Ok(())
}

#[test]
fn rendering_twice_at_same_tick_is_identical() -> Result<()> {
    let mut store = small_store(RENDER_DEFAULT)?;
    store.set(Point::new(0, 0), colors::RED, true)?;
    store.set(Point::new(1, 1), colors::GREEN, false)?;
    store.set(Point::new(6, 2), colors::WHITE, true)?;

    for tick in [0, 5, 13] {
        assert_eq!(render(&mut store, tick), render(&mut store, tick));
    }
    Ok(())
}

#[test]
fn blinking_pixel_follows_triangle_wave() -> Result<()> {
    let mut store = small_store(RENDER_DEFAULT)?;
    store.set(Point::new(0, 0), colors::RED, true)?;

    let reds: Vec<u8> = (0..=20)
        .map(|tick| render(&mut store, tick)[0].1[0])
        .collect();
    assert_eq!(
        reds,
        [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0]
    );

    // Stored color is untouched by modulation.
    assert_eq!(store.get(Point::new(0, 0))?, (colors::RED, true));
    Ok(())
}

#[test]
fn blink_value_is_periodic_symmetric_and_bounded() -> Result<()> {
    for config in [BLINK_DEFAULT, BlinkConfig::new(8, 10, 40)?, BlinkConfig::new(4, 3, 7)?] {
        let period = config.period_ticks;
        for tick in 0..period {
            let value = config.value_at(tick);
            assert!((config.low..=config.high).contains(&value));
            assert_eq!(value, config.value_at(tick + period));
            assert_eq!(value, config.value_at(period - 1 - tick));
        }
        assert_eq!(config.value_at(0), config.low);
        assert_eq!(config.value_at(period / 2 - 1), config.high);
    }

    let custom = BlinkConfig::new(8, 10, 40)?;
    let values: Vec<u8> = (0..8).map(|tick| custom.value_at(tick)).collect();
    assert_eq!(values, [10, 20, 30, 40, 40, 30, 20, 10]);
    Ok(())
}

#[test]
fn shortest_blink_period_reaches_both_bounds() -> Result<()> {
    let config = BlinkConfig::new(4, 0, 255)?;
    let values: Vec<u8> = (0..8).map(|tick| config.value_at(tick)).collect();
    assert_eq!(values, [0, 255, 255, 0, 0, 255, 255, 0]);

    assert!(BlinkConfig::new(2, 0, 255).is_err());
    Ok(())
}

#[test]
fn next_tick_wraps_at_the_blink_period() -> Result<()> {
    for config in [BLINK_DEFAULT, BlinkConfig::new(8, 10, 40)?] {
        let period = config.period_ticks;
        assert_eq!(config.next_tick(period - 1), 0);

        // Walking two periods with next_tick gives the same wave as counting directly.
        let mut tick = 0;
        for count in 0..period * 2 {
            assert!(tick < period);
            assert_eq!(config.value_at(tick), config.value_at(count));
            tick = config.next_tick(tick);
        }
    }

    // A counter that has run for a long time continues the wave without a jump.
    let tick = BLINK_DEFAULT.next_tick(u32::MAX);
    assert!(tick < BLINK_DEFAULT.period_ticks);
    assert_eq!(
        BLINK_DEFAULT.value_at(tick),
        BLINK_DEFAULT.value_at(u32::MAX % BLINK_DEFAULT.period_ticks + 1)
    );
    Ok(())
}

#[test]
fn shrinking_blanks_the_tail_and_shortens_output() -> Result<()> {
    let mut store = small_store(RENDER_DEFAULT)?;
    // (1, 1) is offset 6 on strip 0; (0, 0) is offset 0.
    store.set(Point::new(1, 1), colors::RED, true)?;
    store.set(Point::new(0, 0), colors::GREEN, false)?;

    store.resize(5)?;
    assert_eq!(store.len(), 5);
    assert_eq!(store.get(Point::new(1, 1))?, (RGB8::new(0, 0, 0), false));
    assert_eq!(store.get(Point::new(0, 0))?, (colors::GREEN, false));
    assert_eq!(store.rendered(Point::new(1, 1), 0)?, [0, 0, 0]);
    for (_, bytes) in render(&mut store, 0) {
        assert_eq!(bytes.len(), 15);
    }

    store.resize(LEDS)?;
    assert_eq!(store.len(), LEDS);
    let emitted = render(&mut store, 0);
    assert_eq!(emitted[0].1.len(), LEDS * 3);
    assert_eq!(&emitted[0].1[18..21], &[0, 0, 0]);
    Ok(())
}

#[test]
fn resize_beyond_capacity_is_rejected() -> Result<()> {
    let mut store = small_store(RENDER_DEFAULT)?;
    assert_eq!(
        store.resize(LEDS + 1),
        Err(Error::ResizeBeyondCapacity {
            requested: LEDS + 1,
            capacity: LEDS
        })
    );
    assert_eq!(store.len(), LEDS);
    Ok(())
}

#[test]
fn clear_blanks_every_strip() -> Result<()> {
    let mut store = small_store(RENDER_DEFAULT)?;
    store.set(Point::new(0, 0), colors::RED, true)?;
    store.set(Point::new(7, 2), colors::RED, true)?;
    store.clear();
    for (_, bytes) in render(&mut store, 9) {
        assert!(bytes.iter().all(|byte| *byte == 0));
    }
    Ok(())
}

#[test]
fn combo_table_folds_gamma_and_brightness() {
    let identity = generate_combo_table(Gamma::Linear, 255);
    assert!(identity.iter().enumerate().all(|(index, value)| usize::from(*value) == index));

    let half = generate_combo_table(Gamma::Linear, 128);
    assert_eq!(half[255], 128);
    assert_eq!(half[0], 0);

    let gamma = generate_combo_table(Gamma::Gamma2_2, 255);
    assert_eq!(gamma[0], 0);
    assert_eq!(gamma[255], 255);
    assert!(gamma[128] < 128);
    assert!(gamma.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn current_budget_caps_brightness() {
    assert_eq!(Current::Unlimited.max_brightness(440), 255);
    assert_eq!(Current::Milliamps(60).max_brightness(1), 255);
    assert_eq!(Current::Milliamps(30).max_brightness(1), 127);
    assert_eq!(Current::Milliamps(6000).max_brightness(440), 57);
    assert_eq!(Current::Milliamps(u16::MAX).max_brightness(1), 255);
}

#[test]
fn output_correction_applies_after_blink() -> Result<()> {
    let config = RenderConfig {
        max_current: Current::Milliamps(360),
        ..RENDER_DEFAULT
    };
    let mut store = small_store(config)?;
    store.set(Point::new(0, 0), colors::RED, false)?;
    // 12 LEDs at 60 mA is 720 mA worst case: brightness 127.
    assert_eq!(&render(&mut store, 0)[0].1[..3], &[127, 0, 0]);

    let gamma_config = RenderConfig {
        gamma: Gamma::Gamma2_2,
        ..RENDER_DEFAULT
    };
    let mut gamma_store = small_store(gamma_config)?;
    gamma_store.set(Point::new(0, 0), RGB8::new(255, 128, 0), false)?;
    let table = generate_combo_table(Gamma::Gamma2_2, 255);
    assert_eq!(
        &render(&mut gamma_store, 0)[0].1[..3],
        &[table[255], table[128], table[0]]
    );
    Ok(())
}

#[test]
fn render_reports_events_to_observer() -> Result<()> {
    let mut store = small_store(RENDER_DEFAULT)?;
    let mut events = Vec::new();
    let mut driver = RecordingDriver::default();
    store.render_observed(3, &mut driver, &mut |event: Event| events.push(event));
    assert_eq!(
        events,
        [
            Event::RenderStarted { tick: 3 },
            Event::StripRendered {
                strip_index: 0,
                byte_count: LEDS * 3
            },
            Event::StripRendered {
                strip_index: 1,
                byte_count: LEDS * 3
            },
        ]
    );
    Ok(())
}

#[test]
fn drawing_with_embedded_graphics_stores_steady_pixels() -> Result<()> {
    let mut store = small_store(RENDER_DEFAULT)?;
    assert_eq!(store.size(), Size::new(8, 3));

    let Ok(()) = Pixel(GfxPoint::new(7, 0), Rgb888::GREEN).draw(&mut store);
    let Ok(()) = Pixel(GfxPoint::new(-1, 0), Rgb888::RED).draw(&mut store);
    let Ok(()) = Pixel(GfxPoint::new(8, 0), Rgb888::RED).draw(&mut store);

    assert_eq!(store.get(Point::new(7, 0))?, (colors::LIME, false));
    assert_eq!(store.strip(1).map(|strip| strip.color(0)), Some(colors::LIME));
    assert_eq!(store.get(Point::new(0, 0))?, (RGB8::new(0, 0, 0), false));
    Ok(())
}
