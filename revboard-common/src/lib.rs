//! Background artwork for the 64x64 revenue board.
//!
//! Everything here is pure: [`render`] paints the static layout (title,
//! divider, three icon rows) into an RGB buffer that the daemon pushes to the
//! display once per cycle. The numbers themselves are drawn by the device as
//! text overlays, so the image never changes while the process runs.

use std::fmt::{self, Debug};

use base64::Engine as _;
use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment},
};

pub mod canvas;
pub mod font;
mod sprites;

pub use canvas::Canvas;
pub use font::{TextSize, Typeface};

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 64;
pub const CHANNELS: usize = 3;

const DITHER_LIGHT: u8 = 12;
const DITHER_DARK: u8 = 10;
const OUTER_BORDER: Rgb888 = Rgb888::new(70, 70, 70);
const INNER_BORDER: Rgb888 = Rgb888::new(30, 30, 30);
const DIVIDER: Rgb888 = Rgb888::new(60, 60, 60);
const TITLE: Rgb888 = Rgb888::new(120, 180, 255);
const LABEL: Rgb888 = Rgb888::new(220, 220, 220);

/// A rendered frame: row-major RGB triples, `WIDTH * HEIGHT * CHANNELS` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelImage {
    rgb: Vec<u8>,
}

impl PixelImage {
    pub(crate) fn from_raw(rgb: Vec<u8>) -> Self {
        debug_assert_eq!(rgb.len(), WIDTH * HEIGHT * CHANNELS);
        Self { rgb }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.rgb
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= WIDTH || y >= HEIGHT {
            return None;
        }
        let i = (y * WIDTH + x) * CHANNELS;
        Some([self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]])
    }

    /// Standard padded base64 of the raw bytes, the form the display expects
    /// in `PicData`.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.rgb)
    }
}

impl Debug for PixelImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelImage")
            .field("width", &WIDTH)
            .field("height", &HEIGHT)
            .field("bytes", &self.rgb.len())
            .finish()
    }
}

/// Paints the board background. Deterministic for a given typeface.
pub fn render(typeface: &Typeface) -> PixelImage {
    let mut canvas = Canvas::new();

    draw_backdrop(&mut canvas);

    typeface.draw_text(&mut canvas, Point::new(6, 2), "SITE", TextSize::Title, TITLE);
    typeface.draw_text(&mut canvas, Point::new(6, 11), "REVENUE", TextSize::Title, TITLE);

    canvas::infallible(
        Line::new(Point::new(6, 22), Point::new(57, 22))
            .into_styled(PrimitiveStyle::with_stroke(DIVIDER, 1))
            .draw(&mut canvas),
    );

    sprites::draw_clock(&mut canvas, Point::new(6, 26));
    sprites::draw_calendar(&mut canvas, Point::new(6, 38));
    sprites::draw_coin(&mut canvas, Point::new(6, 51));

    typeface.draw_text(&mut canvas, Point::new(16, 24), "1D", TextSize::Label, LABEL);
    typeface.draw_text(&mut canvas, Point::new(16, 37), "7D", TextSize::Label, LABEL);
    typeface.draw_text(&mut canvas, Point::new(16, 49), "30D", TextSize::Label, LABEL);

    canvas.into_image()
}

fn draw_backdrop(canvas: &mut Canvas) {
    for y in 0..HEIGHT as i32 {
        for x in 0..WIDTH as i32 {
            let level = if (x / 4 + y / 4) % 2 == 0 {
                DITHER_LIGHT
            } else {
                DITHER_DARK
            };
            canvas.set(x, y, Rgb888::new(level, level, level));
        }
    }

    outline(canvas, Point::new(0, 0), Point::new(63, 63), OUTER_BORDER);
    outline(canvas, Point::new(2, 2), Point::new(61, 61), INNER_BORDER);
}

fn outline(canvas: &mut Canvas, top_left: Point, bottom_right: Point, color: Rgb888) {
    let style = PrimitiveStyleBuilder::new()
        .stroke_color(color)
        .stroke_width(1)
        .stroke_alignment(StrokeAlignment::Inside)
        .build();
    canvas::infallible(
        Rectangle::with_corners(top_left, bottom_right)
            .into_styled(style)
            .draw(canvas),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> PixelImage {
        render(&Typeface::Bitmap)
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(board(), board());
        assert_eq!(board().to_base64(), board().to_base64());
    }

    #[test]
    fn test_buffer_size() {
        let image = board();
        assert_eq!(image.as_bytes().len(), 64 * 64 * 3);
        // 12288 bytes encode to 16384 base64 characters, no padding needed
        assert_eq!(image.to_base64().len(), 16384);
    }

    #[test]
    fn test_borders_and_dither() {
        let image = board();
        assert_eq!(image.pixel(0, 0), Some([70, 70, 70]));
        assert_eq!(image.pixel(63, 63), Some([70, 70, 70]));
        assert_eq!(image.pixel(0, 40), Some([70, 70, 70]));
        assert_eq!(image.pixel(2, 2), Some([30, 30, 30]));
        assert_eq!(image.pixel(61, 30), Some([30, 30, 30]));
        // between the two borders only the dither shows
        assert_eq!(image.pixel(1, 1), Some([12, 12, 12]));
        assert_eq!(image.pixel(1, 4), Some([10, 10, 10]));
        assert_eq!(image.pixel(62, 62), Some([12, 12, 12]));
    }

    #[test]
    fn test_divider() {
        let image = board();
        assert_eq!(image.pixel(6, 22), Some([60, 60, 60]));
        assert_eq!(image.pixel(57, 22), Some([60, 60, 60]));
        assert_eq!(image.pixel(58, 22), Some([10, 10, 10]));
    }

    #[test]
    fn test_icons() {
        let image = board();
        // clock: outline corner, dark face, hand mark
        assert_eq!(image.pixel(6, 26), Some([160, 220, 255]));
        assert_eq!(image.pixel(7, 27), Some([30, 60, 70]));
        assert_eq!(image.pixel(10, 30), Some([160, 220, 255]));
        assert_eq!(image.pixel(10, 29), Some([160, 220, 255]));
        assert_eq!(image.pixel(11, 30), Some([160, 220, 255]));
        // calendar: first row is left empty, blue strip, grey body
        assert_eq!(image.pixel(6, 38), Some([12, 12, 12]));
        assert_eq!(image.pixel(6, 39), Some([120, 160, 255]));
        assert_eq!(image.pixel(13, 40), Some([120, 160, 255]));
        assert_eq!(image.pixel(6, 41), Some([220, 220, 220]));
        assert_eq!(image.pixel(8, 43), Some([70, 70, 70]));
        // coin: transparent corner, edge, face, highlight
        assert_eq!(image.pixel(6, 51), Some([10, 10, 10]));
        assert_eq!(image.pixel(8, 51), Some([120, 90, 0]));
        assert_eq!(image.pixel(8, 53), Some([255, 210, 0]));
        assert_eq!(image.pixel(9, 54), Some([255, 240, 150]));
    }

    #[test]
    fn test_title_uses_title_colour() {
        let image = board();
        let lit = (2..20)
            .flat_map(|y| (6..50).map(move |x| (x, y)))
            .filter(|&(x, y)| image.pixel(x, y) == Some([120, 180, 255]))
            .count();
        assert!(lit > 20, "expected title glyphs, got {lit} pixels");
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        assert_eq!(board().pixel(64, 0), None);
        assert_eq!(board().pixel(0, 64), None);
    }
}
