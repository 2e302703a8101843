use std::{fs, path::Path};

use color_eyre::{Result, eyre::eyre};
use image::{Rgb, RgbImage};
use rusttype::{Font, Point, Scale, point};

use super::builtin_font::{self, CELL_WIDTH, GLYPH_HEIGHT, GLYPH_WIDTH};

/// Size of a rendered line in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextSize {
    pub width: u32,
    pub height: u32,
}

pub enum Typeface {
    /// `scale` is the rusttype scale, i.e. the line height, derived from the em size
    Outline { font: Font<'static>, scale: Scale },
    /// Built-in bitmap glyphs, every glyph pixel becomes a `scale`-sized square
    Builtin { scale: u32 },
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Typeface::Outline { scale, .. } => {
                f.debug_struct("Outline").field("scale", &scale.y).finish()
            }
            Typeface::Builtin { scale } => f.debug_struct("Builtin").field("scale", scale).finish(),
        }
    }
}

impl Typeface {
    /// Loads a TrueType font whose em square is `px` pixels.
    pub fn load(path: &Path, px: u32) -> Result<Self> {
        let data = fs::read(path)?;
        let font = Font::try_from_vec(data).ok_or_else(|| eyre!("{path:?} is not a usable font"))?;
        let scale = Scale::uniform(em_to_line_height(&font, px));
        Ok(Typeface::Outline { font, scale })
    }

    /// Builtin face with glyphs roughly `px` pixels tall
    pub fn builtin(px: u32) -> Self {
        Typeface::Builtin {
            scale: (px / (GLYPH_HEIGHT + 1)).max(1),
        }
    }

    pub fn measure(&self, text: &str) -> TextSize {
        match self {
            Typeface::Outline { font, scale } => ink_bounds(font, *scale, text)
                .map(|(x0, y0, x1, y1)| TextSize {
                    width: (x1 - x0).max(0) as u32,
                    height: (y1 - y0).max(0) as u32,
                })
                .unwrap_or_default(),
            Typeface::Builtin { scale } => {
                let n = text.chars().count() as u32;
                if n == 0 {
                    return TextSize::default();
                }
                TextSize {
                    width: (n * CELL_WIDTH - 1) * scale,
                    height: GLYPH_HEIGHT * scale,
                }
            }
        }
    }

    /// Draws `text` so that its inked box, as returned by `measure`, starts at
    /// (`x`, `y`). Outline glyphs are blended by coverage.
    pub fn draw(&self, img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str) {
        match self {
            Typeface::Outline { font, scale } => {
                let Some((x0, y0, _, _)) = ink_bounds(font, *scale, text) else {
                    return;
                };
                for glyph in font.layout(text, *scale, baseline(font, *scale, x - x0, y - y0)) {
                    let Some(bb) = glyph.pixel_bounding_box() else {
                        continue;
                    };
                    glyph.draw(|gx, gy, v| {
                        blend(img, gx as i32 + bb.min.x, gy as i32 + bb.min.y, color, v);
                    });
                }
            }
            Typeface::Builtin { scale } => {
                let s = *scale as i32;
                for (i, c) in text.chars().enumerate() {
                    let rows = builtin_font::glyph(c);
                    let origin_x = x + i as i32 * CELL_WIDTH as i32 * s;
                    for row in 0..GLYPH_HEIGHT {
                        for col in 0..GLYPH_WIDTH {
                            if !builtin_font::is_set(&rows, col, row) {
                                continue;
                            }
                            let px0 = origin_x + col as i32 * s;
                            let py0 = y + row as i32 * s;
                            for dy in 0..s {
                                for dx in 0..s {
                                    blend(img, px0 + dx, py0 + dy, color, 1.0);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// rusttype scales by line height (ascent - descent), font sizes name the em square
fn em_to_line_height(font: &Font<'_>, px: u32) -> f32 {
    let vm = font.v_metrics_unscaled();
    px as f32 * (vm.ascent - vm.descent) / f32::from(font.units_per_em())
}

/// Pen position for a line whose top edge is at `y`
fn baseline(font: &Font<'static>, scale: Scale, x: i32, y: i32) -> Point<f32> {
    let ascent = font.v_metrics(scale).ascent;
    point(x as f32, y as f32 + ascent)
}

/// Union of the glyph pixel boxes for `text` laid out at the origin
fn ink_bounds(font: &Font<'static>, scale: Scale, text: &str) -> Option<(i32, i32, i32, i32)> {
    font.layout(text, scale, baseline(font, scale, 0, 0))
        .filter_map(|g| g.pixel_bounding_box())
        .map(|bb| (bb.min.x, bb.min.y, bb.max.x, bb.max.y))
        .reduce(|(x0, y0, x1, y1), (a0, b0, a1, b1)| {
            (x0.min(a0), y0.min(b0), x1.max(a1), y1.max(b1))
        })
}

fn blend(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let a = coverage.clamp(0.0, 1.0);
    if a == 0.0 {
        return;
    }
    let dst = img.get_pixel_mut(x as u32, y as u32);
    for (d, s) in dst.0.iter_mut().zip(color.0) {
        *d = (s as f32 * a + *d as f32 * (1.0 - a)).round() as u8;
    }
}
