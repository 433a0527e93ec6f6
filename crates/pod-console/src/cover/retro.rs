//! Retro cover pipeline: 4-tone luminance quantization with two-neighbor
//! error diffusion, mapped through the theme palette and block-upscaled.
//! Pure and deterministic — same bytes + theme give byte-identical output.

use image::imageops::FilterType;
use image::RgbImage;
use pod_proto::now_playing::{CoverThumbnail, COVER_SIZE};
use pod_proto::theme::ThemeColor;

/// Working resolution before the block upscale.
pub const WORK_SIZE: u32 = 64;

/// Gray distance between quantization levels (255 / 3).
const LEVEL_STEP: f32 = 85.0;

/// Decode arbitrary image bytes and render the themed thumbnail.
/// Undecodable bytes yield None, shown as "no cover".
pub fn render_from_bytes(bytes: &[u8], theme: ThemeColor) -> Option<CoverThumbnail> {
    let decoded = image::load_from_memory(bytes).ok()?;
    Some(render_from_image(&decoded.to_rgb8(), theme))
}

pub fn render_from_image(source: &RgbImage, theme: ThemeColor) -> CoverThumbnail {
    // Unsmoothed downsample — the blocky look is the point.
    let small = image::imageops::resize(source, WORK_SIZE, WORK_SIZE, FilterType::Nearest);

    let mut luminance = vec![0.0f32; (WORK_SIZE * WORK_SIZE) as usize];
    for (i, pixel) in small.pixels().enumerate() {
        let [r, g, b] = pixel.0;
        luminance[i] = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    }

    let width = WORK_SIZE as usize;
    let levels = diffuse_quantize(&mut luminance, width, width);
    let palette = theme.palette();

    // Each working pixel becomes a scale x scale block; no smoothing.
    let out = COVER_SIZE as usize;
    let scale = (COVER_SIZE / WORK_SIZE) as usize;
    let mut rgb = vec![0u8; out * out * 3];
    for y in 0..out {
        let sy = y / scale;
        for x in 0..out {
            let sx = x / scale;
            let color = palette[levels[sy * width + sx] as usize];
            let at = (y * out + x) * 3;
            rgb[at..at + 3].copy_from_slice(&color);
        }
    }

    CoverThumbnail {
        width: COVER_SIZE,
        height: COVER_SIZE,
        rgb,
    }
}

/// Quantize a luminance buffer to levels 0..=3, pushing half of each
/// pixel's quantization error to the right neighbor and half to the one
/// below — in the luminance buffer only. Two neighbors instead of the
/// full Floyd-Steinberg kernel keeps it fast on the target hardware.
pub(crate) fn diffuse_quantize(luminance: &mut [f32], width: usize, height: usize) -> Vec<u8> {
    let mut levels = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let level = (luminance[i] / LEVEL_STEP).round().clamp(0.0, 3.0);
            levels[i] = level as u8;
            let error = luminance[i] - level * LEVEL_STEP;
            if x + 1 < width {
                luminance[i + 1] += error * 0.5;
            }
            if y + 1 < height {
                luminance[i + width] += error * 0.5;
            }
        }
    }
    levels
}
