//! Software framebuffer for the 176x176 round display.
//!
//! The panel takes 3-bit colour, stored here as 4 bits per pixel, two pixels
//! per byte, high nibble first. Alongside it lives a 1-bit [`Mask`] used as
//! scratch space for the day/night overlay.
//!
//! Both buffers implement `embedded_graphics::DrawTarget`, so circles,
//! triangles and text come from embedded-graphics primitives. The [`Canvas`]
//! trait is the narrow interface the face draws through; a hardware driver
//! only has to implement it to replace [`FrameBuffer`].

use crate::geometry;
use crate::orientation::Rotation;
use core::convert::Infallible;
use embedded_graphics::{
    pixelcolor::{raw::RawU4, BinaryColor, PixelColor},
    prelude::*,
    primitives::Rectangle,
};
use serde::{Deserialize, Serialize};

/// Display dimensions
pub const WIDTH: u32 = 176;
pub const HEIGHT: u32 = 176;

/// Panel palette, one bit per RGB channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Yellow = 6,
    White = 7,
}

impl Color {
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Self {
        match index & 0x07 {
            0 => Color::Black,
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Cyan,
            4 => Color::Red,
            5 => Color::Magenta,
            6 => Color::Yellow,
            _ => Color::White,
        }
    }

    /// Character used by the ASCII dump.
    pub fn glyph(self) -> char {
        match self {
            Color::Black => ' ',
            Color::Blue => 'b',
            Color::Green => 'g',
            Color::Cyan => 'c',
            Color::Red => 'r',
            Color::Magenta => 'm',
            Color::Yellow => 'y',
            Color::White => '#',
        }
    }
}

impl PixelColor for Color {
    type Raw = RawU4;
}

/// A rectangular block of pixels lifted off a canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sprite {
    size: Size,
    pixels: Vec<Color>,
}

impl Sprite {
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.pixels
            .get((y * self.size.width + x) as usize)
            .copied()
    }
}

/// The drawing surface the face renders onto.
pub trait Canvas: DrawTarget<Color = Color, Error = Infallible> + OriginDimensions {
    /// Read one pixel in logical (rotated) coordinates. Off-screen reads are black.
    fn pixel(&self, point: Point) -> Color;

    /// Write one pixel in logical coordinates. Off-screen writes are dropped.
    fn set_pixel(&mut self, point: Point, color: Color);

    /// Rotate subsequent drawing by whole quarter turns.
    fn set_rotation(&mut self, rotation: Rotation);

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        geometry::fill_polygon(self, points, color);
    }

    /// Copy the pixels under `area`.
    fn capture(&self, area: Rectangle) -> Sprite {
        let mut pixels = Vec::with_capacity((area.size.width * area.size.height) as usize);
        for y in 0..area.size.height as i32 {
            for x in 0..area.size.width as i32 {
                pixels.push(self.pixel(area.top_left + Point::new(x, y)));
            }
        }
        Sprite {
            size: area.size,
            pixels,
        }
    }

    /// Put a captured sprite back, pixel for pixel.
    fn blit(&mut self, sprite: &Sprite, origin: Point) {
        for y in 0..sprite.size.height {
            for x in 0..sprite.size.width {
                if let Some(color) = sprite.pixel(x, y) {
                    self.set_pixel(origin + Point::new(x as i32, y as i32), color);
                }
            }
        }
    }

    /// Paint `color` wherever the mask is set; clear mask bits are transparent.
    fn blit_mask(&mut self, mask: &Mask, color: Color) {
        let size = mask.size();
        for y in 0..size.height as i32 {
            for x in 0..size.width as i32 {
                let point = Point::new(x, y);
                if mask.is_set(point) {
                    self.set_pixel(point, color);
                }
            }
        }
    }
}

/// 4-bit packed framebuffer.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    rotation: Rotation,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        // Each row has (width+1)/2 bytes
        let bytes_per_row = width.div_ceil(2);
        Self {
            width,
            height,
            rotation: Rotation::Upright,
            pixels: vec![0x00; (bytes_per_row * height) as usize],
        }
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn raw(&self) -> &[u8] {
        &self.pixels
    }

    /// Number of pixels currently holding `color`.
    pub fn count(&self, color: Color) -> usize {
        let mut total = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.physical(x, y) == color {
                    total += 1;
                }
            }
        }
        total
    }

    /// Render the buffer as text, one character per 2x4 pixel cell.
    ///
    /// Each cell shows its top-left pixel, which is enough to eyeball the
    /// layout in a terminal.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(((self.width / 2 + 1) * self.height / 4) as usize);
        for y in (0..self.height).step_by(4) {
            for x in (0..self.width).step_by(2) {
                out.push(self.physical(x, y).glyph());
            }
            out.push('\n');
        }
        out
    }

    /// Logical to physical coordinates for the current rotation.
    fn to_physical(&self, point: Point) -> Option<(u32, u32)> {
        let (w, h) = (self.width as i32, self.height as i32);
        let (x, y) = match self.rotation {
            Rotation::Upright => (point.x, point.y),
            Rotation::Clockwise => (w - 1 - point.y, point.x),
            Rotation::Inverted => (w - 1 - point.x, h - 1 - point.y),
            Rotation::CounterClockwise => (point.y, h - 1 - point.x),
        };
        if x < 0 || y < 0 || x >= w || y >= h {
            return None;
        }
        Some((x as u32, y as u32))
    }

    fn physical(&self, x: u32, y: u32) -> Color {
        let bytes_per_row = self.width.div_ceil(2);
        let byte = self.pixels[(y * bytes_per_row + x / 2) as usize];
        let nibble = if x % 2 == 0 { byte >> 4 } else { byte & 0x0F };
        Color::from_index(nibble)
    }

    fn write_physical(&mut self, x: u32, y: u32, color: Color) {
        let bytes_per_row = self.width.div_ceil(2);
        let index = (y * bytes_per_row + x / 2) as usize;
        let value = color.index();
        if x % 2 == 0 {
            self.pixels[index] = (self.pixels[index] & 0x0F) | (value << 4);
        } else {
            self.pixels[index] = (self.pixels[index] & 0xF0) | value;
        }
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        match self.rotation {
            Rotation::Upright | Rotation::Inverted => Size::new(self.width, self.height),
            Rotation::Clockwise | Rotation::CounterClockwise => {
                Size::new(self.height, self.width)
            }
        }
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Color;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point, color);
        }
        Ok(())
    }
}

impl Canvas for FrameBuffer {
    fn pixel(&self, point: Point) -> Color {
        match self.to_physical(point) {
            Some((x, y)) => self.physical(x, y),
            None => Color::Black,
        }
    }

    fn set_pixel(&mut self, point: Point, color: Color) {
        if let Some((x, y)) = self.to_physical(point) {
            self.write_physical(x, y, color);
        }
    }

    fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }
}

/// 1-bit scratch buffer, MSB-first rows.
#[derive(Clone, Debug)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        let bytes_per_row = width.div_ceil(8);
        Self {
            width,
            height,
            bits: vec![0x00; (bytes_per_row * height) as usize],
        }
    }

    pub fn reset(&mut self) {
        self.bits.fill(0x00);
    }

    pub fn is_set(&self, point: Point) -> bool {
        match self.locate(point) {
            Some((index, bit)) => self.bits[index] & bit != 0,
            None => false,
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().map(|byte| byte.count_ones() as usize).sum()
    }

    fn locate(&self, point: Point) -> Option<(usize, u8)> {
        if point.x < 0 || point.y < 0 {
            return None;
        }
        let (x, y) = (point.x as u32, point.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        let bytes_per_row = self.width.div_ceil(8);
        Some(((y * bytes_per_row + x / 8) as usize, 0x80 >> (x % 8)))
    }
}

impl OriginDimensions for Mask {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Mask {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some((index, bit)) = self.locate(point) {
                match color {
                    BinaryColor::On => self.bits[index] |= bit,
                    BinaryColor::Off => self.bits[index] &= !bit,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Circle, PrimitiveStyle};

    #[test]
    fn pixels_round_trip_through_nibbles() {
        let mut fb = FrameBuffer::new(WIDTH, HEIGHT);
        fb.set_pixel(Point::new(0, 0), Color::White);
        fb.set_pixel(Point::new(1, 0), Color::Red);
        assert_eq!(fb.pixel(Point::new(0, 0)), Color::White);
        assert_eq!(fb.pixel(Point::new(1, 0)), Color::Red);
        assert_eq!(fb.raw()[0], 0x74);
    }

    #[test]
    fn off_screen_access_is_ignored() {
        let mut fb = FrameBuffer::new(WIDTH, HEIGHT);
        fb.set_pixel(Point::new(-1, 5), Color::White);
        fb.set_pixel(Point::new(176, 5), Color::White);
        assert_eq!(fb.count(Color::White), 0);
        assert_eq!(fb.pixel(Point::new(500, 500)), Color::Black);
    }

    #[test]
    fn rotation_maps_logical_corners() {
        let mut fb = FrameBuffer::new(WIDTH, HEIGHT);
        fb.set_rotation(Rotation::Clockwise);
        fb.set_pixel(Point::new(0, 0), Color::Green);
        fb.set_rotation(Rotation::Upright);
        assert_eq!(fb.pixel(Point::new(175, 0)), Color::Green);

        fb.set_rotation(Rotation::Inverted);
        fb.set_pixel(Point::new(0, 0), Color::Blue);
        fb.set_rotation(Rotation::Upright);
        assert_eq!(fb.pixel(Point::new(175, 175)), Color::Blue);
    }

    #[test]
    fn capture_and_blit_restore_exact_pixels() {
        let mut fb = FrameBuffer::new(WIDTH, HEIGHT);
        Circle::with_center(Point::new(40, 40), 15)
            .into_styled(PrimitiveStyle::with_fill(Color::Yellow))
            .draw(&mut fb)
            .ok();
        let area = Rectangle::new(Point::new(30, 30), Size::new(11, 11));
        let saved = fb.capture(area);
        let before = fb.raw().to_vec();

        fb.fill_solid(&area, Color::Magenta).ok();
        assert_ne!(fb.raw(), &before[..]);

        fb.blit(&saved, area.top_left);
        assert_eq!(fb.raw(), &before[..]);
    }

    #[test]
    fn mask_blit_is_transparent_where_clear() {
        let mut fb = FrameBuffer::new(WIDTH, HEIGHT);
        fb.clear(Color::Blue).ok();
        let mut mask = Mask::new(WIDTH, HEIGHT);
        mask.fill_solid(
            &Rectangle::new(Point::new(10, 10), Size::new(4, 3)),
            BinaryColor::On,
        )
        .ok();
        assert_eq!(mask.count(), 12);

        fb.blit_mask(&mask, Color::White);
        assert_eq!(fb.count(Color::White), 12);
        assert_eq!(fb.pixel(Point::new(9, 10)), Color::Blue);
    }

    #[test]
    fn ascii_dump_has_one_line_per_four_rows() {
        let fb = FrameBuffer::new(WIDTH, HEIGHT);
        let text = fb.to_ascii();
        assert_eq!(text.lines().count(), 44);
        assert!(text.lines().all(|line| line.chars().count() == 88));
    }
}
