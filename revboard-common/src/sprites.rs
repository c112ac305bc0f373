//! 8x8 row icons.

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment},
};

use crate::canvas::{infallible, Canvas};

const COIN_EDGE: Rgb888 = Rgb888::new(120, 90, 0);
const COIN_FACE: Rgb888 = Rgb888::new(255, 210, 0);
const COIN_HIGHLIGHT: Rgb888 = Rgb888::new(255, 240, 150);

// `#` edge, `*` face, `+` highlight, `.` leaves the background alone
const COIN: [&str; 8] = [
    "..####..",
    ".######.",
    "##****##",
    "##*+**##",
    "##****##",
    "##****##",
    ".######.",
    "..####..",
];

fn boxed(canvas: &mut Canvas, top_left: Point, bottom_right: Point, stroke: Rgb888, fill: Rgb888) {
    let style = PrimitiveStyleBuilder::new()
        .stroke_color(stroke)
        .stroke_width(1)
        .stroke_alignment(StrokeAlignment::Inside)
        .fill_color(fill)
        .build();
    infallible(
        Rectangle::with_corners(top_left, bottom_right)
            .into_styled(style)
            .draw(canvas),
    );
}

pub(crate) fn draw_clock(canvas: &mut Canvas, at: Point) {
    let outline = Rgb888::new(160, 220, 255);
    let face = Rgb888::new(30, 60, 70);

    boxed(canvas, at, at + Point::new(7, 7), outline, face);
    for hand in [Point::new(4, 4), Point::new(4, 3), Point::new(5, 4)] {
        let p = at + hand;
        canvas.set(p.x, p.y, outline);
    }
}

pub(crate) fn draw_calendar(canvas: &mut Canvas, at: Point) {
    let outline = Rgb888::new(220, 220, 220);
    let page = Rgb888::new(70, 70, 70);
    let header = Rgb888::new(120, 160, 255);

    boxed(canvas, at + Point::new(0, 1), at + Point::new(7, 7), outline, page);
    infallible(
        Rectangle::with_corners(at + Point::new(0, 1), at + Point::new(7, 2))
            .into_styled(PrimitiveStyle::with_fill(header))
            .draw(canvas),
    );
}

pub(crate) fn draw_coin(canvas: &mut Canvas, at: Point) {
    for (dy, row) in COIN.iter().enumerate() {
        for (dx, symbol) in row.chars().enumerate() {
            let color = match symbol {
                '#' => COIN_EDGE,
                '*' => COIN_FACE,
                '+' => COIN_HIGHLIGHT,
                _ => continue,
            };
            canvas.set(at.x + dx as i32, at.y + dy as i32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_pattern_is_square() {
        assert!(COIN.iter().all(|row| row.chars().count() == 8));
    }

    #[test]
    fn test_coin_leaves_transparent_pixels() {
        let mut canvas = Canvas::new();
        canvas.set(0, 0, Rgb888::new(5, 5, 5));
        draw_coin(&mut canvas, Point::zero());
        let image = canvas.into_image();
        assert_eq!(image.pixel(0, 0), Some([5, 5, 5]));
        assert_eq!(image.pixel(0, 2), Some([120, 90, 0]));
        assert_eq!(image.pixel(3, 3), Some([255, 240, 150]));
    }
}
