//! Text rendering for the board labels.
//!
//! A TrueType pixel font (Press Start 2P and friends) gives the intended
//! look; when the file is missing, unreadable, or the `ttf` feature is off,
//! the built-in embedded-graphics bitmap fonts are used instead.

use std::path::Path;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_5X7, FONT_6X9},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text},
};
use log::{info, warn};

use crate::canvas::{infallible, Canvas};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Title,
    Label,
}

impl TextSize {
    /// Em size in pixels when drawing with a TrueType face.
    pub fn px(self) -> f32 {
        match self {
            TextSize::Title => 8.0,
            TextSize::Label => 7.0,
        }
    }

    fn bitmap(self) -> &'static MonoFont<'static> {
        match self {
            TextSize::Title => &FONT_6X9,
            TextSize::Label => &FONT_5X7,
        }
    }
}

pub enum Typeface {
    Bitmap,
    #[cfg(feature = "ttf")]
    TrueType(ab_glyph::FontVec),
}

impl Typeface {
    /// Loads the font at `path`, falling back to [`Typeface::Bitmap`].
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("font {} not found, using built-in bitmap font", path.display());
            return Typeface::Bitmap;
        }
        Self::load_file(path)
    }

    #[cfg(feature = "ttf")]
    fn load_file(path: &Path) -> Self {
        let parsed = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| ab_glyph::FontVec::try_from_vec(bytes).map_err(|e| e.to_string()));
        match parsed {
            Ok(font) => {
                info!("using font {}", path.display());
                Typeface::TrueType(font)
            }
            Err(e) => {
                warn!("failed to load font {}: {}", path.display(), e);
                Typeface::Bitmap
            }
        }
    }

    #[cfg(not(feature = "ttf"))]
    fn load_file(path: &Path) -> Self {
        warn!(
            "ignoring font {}: built without the `ttf` feature",
            path.display()
        );
        Typeface::Bitmap
    }

    /// Draws `text` with its top-left corner at `origin`.
    pub fn draw_text(
        &self,
        canvas: &mut Canvas,
        origin: Point,
        text: &str,
        size: TextSize,
        color: Rgb888,
    ) {
        match self {
            Typeface::Bitmap => {
                let style = MonoTextStyle::new(size.bitmap(), color);
                infallible(Text::with_baseline(text, origin, style, Baseline::Top).draw(canvas));
            }
            #[cfg(feature = "ttf")]
            Typeface::TrueType(font) => outline::draw(font, canvas, origin, text, size.px(), color),
        }
    }
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Typeface::Bitmap => f.write_str("Bitmap"),
            #[cfg(feature = "ttf")]
            Typeface::TrueType(_) => f.write_str("TrueType"),
        }
    }
}

#[cfg(feature = "ttf")]
mod outline {
    use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
    use embedded_graphics::{pixelcolor::Rgb888, prelude::Point};

    use crate::canvas::Canvas;

    // Pixel fonts rasterise to near-binary coverage; anything at least half
    // covered is lit so the output stays crisp and deterministic.
    const COVERAGE_THRESHOLD: f32 = 0.5;

    /// `px` is the em size, so the scale is stretched to the font's full
    /// line height.
    fn em_scale(font: &FontVec, px: f32) -> PxScale {
        match font.units_per_em() {
            Some(units) => PxScale::from(px * font.height_unscaled() / units),
            None => PxScale::from(px),
        }
    }

    pub(super) fn draw(
        font: &FontVec,
        canvas: &mut Canvas,
        origin: Point,
        text: &str,
        px: f32,
        color: Rgb888,
    ) {
        let scaled = font.as_scaled(em_scale(font, px));
        let mut caret = point(origin.x as f32, origin.y as f32 + scaled.ascent());
        let mut previous = None;

        for c in text.chars() {
            let mut glyph = scaled.scaled_glyph(c);
            if let Some(prev) = previous {
                caret.x += scaled.kern(prev, glyph.id);
            }
            glyph.position = caret;
            caret.x += scaled.h_advance(glyph.id);
            previous = Some(glyph.id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                if coverage >= COVERAGE_THRESHOLD {
                    canvas.set(
                        bounds.min.x as i32 + gx as i32,
                        bounds.min.y as i32 + gy as i32,
                        color,
                    );
                }
            });
        }
    }
}
