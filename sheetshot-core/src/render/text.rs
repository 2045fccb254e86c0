//! Bitmap text drawing with the 8x8 public-domain font

use super::layout::Rect;
use font8x8::{BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, GREEK_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};

/// Glyph cell edge in unscaled pixels
pub const GLYPH_SIZE: u32 = 8;

pub fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| BOX_FONTS.get(ch))
        .or_else(|| BLOCK_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Width of `text` in pixels at the given scale
pub fn text_width(text: &str, scale: u32) -> u32 {
    let glyphs = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    glyphs.saturating_mul(GLYPH_SIZE.saturating_mul(scale))
}

/// Draw `text` with its top-left corner at (x, y), clipped to `clip`
pub fn draw_text(
    canvas: &mut RgbaImage,
    text: &str,
    x: i64,
    y: i64,
    clip: Rect,
    color: Rgba<u8>,
    scale: u32,
) {
    let scale = i64::from(scale);
    let advance = i64::from(GLYPH_SIZE) * scale;
    let clip_x0 = i64::from(clip.x);
    let clip_y0 = i64::from(clip.y);
    let clip_x1 = (clip_x0 + i64::from(clip.width)).min(i64::from(canvas.width()));
    let clip_y1 = (clip_y0 + i64::from(clip.height)).min(i64::from(canvas.height()));

    for (i, ch) in text.chars().enumerate() {
        let origin_x = x + i as i64 * advance;
        if origin_x >= clip_x1 {
            break;
        }
        if origin_x + advance <= clip_x0 {
            continue;
        }

        for (gy, bits) in glyph(ch).iter().enumerate() {
            for gx in 0..GLYPH_SIZE as usize {
                if bits & (1 << gx) == 0 {
                    continue;
                }
                let px = origin_x + gx as i64 * scale;
                let py = y + gy as i64 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let (px, py) = (px + dx, py + dy);
                        if px >= clip_x0 && px < clip_x1 && py >= clip_y0 && py < clip_y1 {
                            canvas.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}
