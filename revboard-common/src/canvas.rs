use std::convert::Infallible;

use embedded_graphics::{pixelcolor::Rgb888, prelude::*};

use crate::{PixelImage, CHANNELS, HEIGHT, WIDTH};

/// Off-screen RGB888 framebuffer sized to the display.
///
/// Implements [`DrawTarget`] so embedded-graphics primitives and fonts can
/// paint straight into it. Writes outside the frame are dropped.
pub struct Canvas {
    rgb: Vec<u8>,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            rgb: vec![0; WIDTH * HEIGHT * CHANNELS],
        }
    }

    pub fn set(&mut self, x: i32, y: i32, color: Rgb888) {
        if x < 0 || y < 0 || x >= WIDTH as i32 || y >= HEIGHT as i32 {
            return;
        }
        let i = (y as usize * WIDTH + x as usize) * CHANNELS;
        self.rgb[i] = color.r();
        self.rgb[i + 1] = color.g();
        self.rgb[i + 2] = color.b();
    }

    pub fn into_image(self) -> PixelImage {
        PixelImage::from_raw(self.rgb)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set(point.x, point.y, color);
        }
        Ok(())
    }
}

/// Unwraps a draw result whose error type cannot be constructed.
pub(crate) fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
