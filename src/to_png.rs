#![cfg(feature = "host")]
//! PNG and APNG previews of a [`FrameStore`]'s logical canvas, for host-side inspection.
//!
//! Each LED is drawn as a soft disc in a square cell, using the bytes it would emit at the
//! given tick (blink modulation and output correction included). Pixels are laid out by
//! logical point, so the preview shows what the host drew rather than the wiring order.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use png::{BitDepth, ColorType, Encoder, ScaledFloat};

use crate::frame_store::FrameStore;
use crate::panel::Point;

const PREVIEW_INVERSE_GAMMA: f32 = 2.2;

/// Rendered bytes of every canvas point at `tick`, row-major.
///
/// # Errors
///
/// Never fails for points on the canvas; errors from the store propagate.
pub fn canvas_pixels<const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize>(
    store: &FrameStore<STRIPS, LEDS, BLINK_WORDS>,
    tick: u32,
) -> crate::Result<Vec<[u8; 3]>> {
    let layout = store.layout();
    let mut pixels = Vec::with_capacity(layout.cells());
    for line in 0..layout.lines() {
        for column in 0..layout.columns() {
            pixels.push(store.rendered(Point::new(column, line), tick)?);
        }
    }
    Ok(pixels)
}

/// Write the canvas at `tick` to a PNG no larger than `target_max_dimension` on either side.
///
/// # Errors
///
/// Returns an error if the file cannot be written or encoded.
pub fn write_canvas_png<const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize>(
    store: &FrameStore<STRIPS, LEDS, BLINK_WORDS>,
    tick: u32,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
) -> Result<(), Box<dyn Error>> {
    let output_path = output_path.as_ref();
    let (columns, lines) = canvas_size(store)?;
    let cell_size = select_cell_size(columns, lines, target_max_dimension);
    let canvas = canvas_pixels(store, tick)?;
    let (width, height, pixels) = preview_pixels(&canvas, columns, lines, cell_size);

    create_parent_dir(output_path)?;
    let file = File::create(output_path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Sixteen);
    encoder.set_source_gamma(ScaledFloat::new(1.0));
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    info!("wrote PNG to {}", output_path.display());
    Ok(())
}

/// Write one full blink period, one frame per tick from `0`, to a looping APNG.
///
/// # Errors
///
/// Returns an error if the file cannot be written or encoded, or if the blink period or
/// `frame_delay_ms` does not fit the APNG frame fields.
pub fn write_blink_apng<const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize>(
    store: &FrameStore<STRIPS, LEDS, BLINK_WORDS>,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
    frame_delay_ms: u16,
) -> Result<(), Box<dyn Error>> {
    let output_path = output_path.as_ref();
    let (columns, lines) = canvas_size(store)?;
    let cell_size = select_cell_size(columns, lines, target_max_dimension);
    let frame_count = store.config().blink.period_ticks;
    let delay_den = 1000u16;

    let mut frames = Vec::new();
    let mut size = (0, 0);
    for tick in 0..frame_count {
        let canvas = canvas_pixels(store, tick)?;
        let (width, height, pixels) = preview_pixels(&canvas, columns, lines, cell_size);
        size = (width, height);
        frames.push(pixels);
    }

    create_parent_dir(output_path)?;
    let file = File::create(output_path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), size.0, size.1);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Sixteen);
    encoder.set_source_gamma(ScaledFloat::new(1.0));
    encoder.set_animated(frame_count, 0)?;
    let mut writer = encoder.write_header()?;
    for pixels in frames {
        writer.set_frame_delay(frame_delay_ms, delay_den)?;
        writer.write_image_data(&pixels)?;
    }
    writer.finish()?;
    info!(
        "wrote {} frame APNG to {}",
        frame_count,
        output_path.display()
    );
    Ok(())
}

fn canvas_size<const STRIPS: usize, const LEDS: usize, const BLINK_WORDS: usize>(
    store: &FrameStore<STRIPS, LEDS, BLINK_WORDS>,
) -> Result<(u32, u32), Box<dyn Error>> {
    let layout = store.layout();
    Ok((
        u32::try_from(layout.columns())?,
        u32::try_from(layout.lines())?,
    ))
}

fn create_parent_dir(output_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Largest cell size whose preview, border included, fits `target_max_dimension`.
fn select_cell_size(columns: u32, lines: u32, target_max_dimension: u32) -> u32 {
    let mut cell_size = target_max_dimension.max(4);
    while cell_size > 4 {
        let border = led_radius(cell_size);
        let max_dimension = (columns.max(lines)) * cell_size + border * 2;
        if max_dimension <= target_max_dimension {
            break;
        }
        cell_size -= 1;
    }
    cell_size
}

fn led_radius(cell_size: u32) -> u32 {
    let led_margin = (cell_size / 8).max(1);
    (cell_size - led_margin * 2) / 2
}

/// 16-bit RGB preview image: `(width, height, big-endian samples)`.
fn preview_pixels(canvas: &[[u8; 3]], columns: u32, lines: u32, cell_size: u32) -> (u32, u32, Vec<u8>) {
    let led_radius = led_radius(cell_size);
    let fade_width = (led_radius / 3).max(1);
    let border = led_radius;
    let width = columns * cell_size + border * 2;
    let height = lines * cell_size + border * 2;
    let mut bytes = vec![0u8; (width * height * 3 * 2) as usize];
    let center = (cell_size - 1) as i32 / 2;
    let led_radius_f = led_radius as f32;
    let inner_radius_f = led_radius.saturating_sub(fade_width) as f32;
    let radius_sq = (led_radius as i32) * (led_radius as i32);

    for (cell_index, pixel) in canvas.iter().enumerate() {
        let cell_origin_x = (cell_index as u32 % columns) * cell_size;
        let cell_origin_y = (cell_index as u32 / columns) * cell_size;
        let channels = pixel.map(|channel| {
            inverse_gamma_to_linear(channel, PREVIEW_INVERSE_GAMMA)
        });

        for local_y in 0..cell_size {
            let delta_y = local_y as i32 - center;
            for local_x in 0..cell_size {
                let delta_x = local_x as i32 - center;
                let distance_sq = delta_x * delta_x + delta_y * delta_y;
                if distance_sq > radius_sq {
                    continue;
                }
                let distance = (distance_sq as f32).sqrt();
                let intensity = if distance <= inner_radius_f {
                    1.0
                } else {
                    let fade_span = led_radius_f - inner_radius_f;
                    (1.0 - (distance - inner_radius_f) / fade_span).max(0.0)
                };
                let x = border + cell_origin_x + local_x;
                let y = border + cell_origin_y + local_y;
                let pixel_index = ((y * width + x) * 3 * 2) as usize;
                for (offset, channel) in channels.iter().enumerate() {
                    let sample = linear_to_u16(channel * intensity).to_be_bytes();
                    bytes[pixel_index + offset * 2] = sample[0];
                    bytes[pixel_index + offset * 2 + 1] = sample[1];
                }
            }
        }
    }

    (width, height, bytes)
}

fn inverse_gamma_to_linear(channel: u8, preview_inverse_gamma: f32) -> f32 {
    let normalized = f32::from(channel) / 255.0;
    normalized.powf(preview_inverse_gamma)
}

fn linear_to_u16(value: f32) -> u16 {
    let clamped = value.clamp(0.0, 1.0);
    (clamped * 65535.0).round() as u16
}
