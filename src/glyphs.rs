//! Status icons and text placement.
//!
//! Icons are drawn straight from pixel patterns, one string per row with `#`
//! for a set pixel. Clear pixels are transparent. Numbers and names use the
//! embedded-graphics mono fonts, whose glyphs all have the same advance, so a
//! field's footprint is known before it is drawn.

use crate::framebuffer::Color;
use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoFont, MonoTextStyle,
    },
    prelude::*,
    text::{Baseline, Text},
};

/// Large digits and names for the corner fields.
pub const LARGE: &MonoFont<'static> = &FONT_10X20;

/// Small digits for the status cluster.
pub const SMALL: &MonoFont<'static> = &FONT_6X10;

/// A one-colour pixel pattern.
#[derive(Clone, Copy, Debug)]
pub struct Icon {
    rows: &'static [&'static str],
}

impl Icon {
    pub const fn new(rows: &'static [&'static str]) -> Self {
        Self { rows }
    }

    pub fn width(&self) -> u32 {
        self.rows.first().map(|row| row.len() as u32).unwrap_or(0)
    }

    pub fn height(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.rows
            .get(y as usize)
            .and_then(|row| row.as_bytes().get(x as usize))
            .is_some_and(|&cell| cell == b'#')
    }

    /// Draw the set pixels with their top-left corner at `origin`.
    pub fn draw<D>(&self, target: &mut D, origin: Point, color: Color)
    where
        D: DrawTarget<Color = Color> + ?Sized,
    {
        let pixels = self.rows.iter().enumerate().flat_map(move |(y, row)| {
            row.bytes().enumerate().filter_map(move |(x, cell)| {
                (cell == b'#').then(|| Pixel(origin + Point::new(x as i32, y as i32), color))
            })
        });
        target.draw_iter(pixels).ok();
    }
}

pub const LOCK: Icon = Icon::new(&[
    "..#####..",
    ".#.....#.",
    ".#.....#.",
    ".#.....#.",
    ".#.....#.",
    "#########",
    "#########",
    "####.####",
    "####.####",
    "####.####",
    "#########",
    "#########",
]);

/// Stands in for the century digits when the watch is locked.
pub const LOCK_SMALL: Icon = Icon::new(&[
    ".#####.",
    "#.....#",
    "#.....#",
    "#######",
    "###.###",
    "###.###",
    "#######",
]);

pub const BATTERY: Icon = Icon::new(&[
    "..####..",
    "########",
    "#......#",
    "#......#",
    "#......#",
    "#......#",
    "#......#",
    "#......#",
    "#......#",
    "#......#",
    "#......#",
    "#......#",
    "#......#",
    "#......#",
    "#......#",
    "########",
]);

/// Drawn over the battery level bar, two rows below the battery's top.
pub const CHARGE: Icon = Icon::new(&[
    "....##..",
    "...##...",
    "..##....",
    ".######.",
    "...##...",
    "..##....",
    ".##.....",
    "##......",
]);

pub const HEART: Icon = Icon::new(&[
    ".##...##.",
    "####.####",
    "#########",
    "#########",
    ".#######.",
    "..#####..",
    "...###...",
    "....#....",
]);

/// Pixel width of `text` in `font`.
pub fn text_width(font: &MonoFont<'_>, text: &str) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    chars * font.character_size.width + (chars - 1) * font.character_spacing
}

/// Draw `text` with its top-left corner at `origin`; returns the pixel width.
pub fn draw_text<D>(target: &mut D, text: &str, origin: Point, font: &MonoFont<'_>, color: Color) -> u32
where
    D: DrawTarget<Color = Color>,
{
    let style = MonoTextStyle::new(font, color);
    Text::with_baseline(text, origin, style, Baseline::Top)
        .draw(target)
        .ok();
    text_width(font, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::{Canvas, FrameBuffer};

    #[test]
    fn icons_have_rectangular_patterns() {
        for icon in [LOCK, LOCK_SMALL, BATTERY, CHARGE, HEART] {
            let width = icon.width() as usize;
            assert!(width > 0);
            assert!(icon.rows.iter().all(|row| row.len() == width));
        }
    }

    #[test]
    fn icon_draws_only_set_pixels() {
        let mut fb = FrameBuffer::new(176, 176);
        HEART.draw(&mut fb, Point::new(10, 10), Color::Red);
        let set: usize = HEART
            .rows
            .iter()
            .map(|row| row.bytes().filter(|&c| c == b'#').count())
            .sum();
        assert_eq!(fb.count(Color::Red), set);
        assert_eq!(fb.pixel(Point::new(10, 10)), Color::Black);
        assert_eq!(fb.pixel(Point::new(11, 10)), Color::Red);
    }

    #[test]
    fn text_width_accounts_for_every_glyph() {
        assert_eq!(text_width(LARGE, "26"), 20);
        assert_eq!(text_width(SMALL, "2026"), 24);
        assert_eq!(text_width(SMALL, ""), 0);
    }

    #[test]
    fn text_lands_inside_its_footprint() {
        let mut fb = FrameBuffer::new(176, 176);
        let width = draw_text(&mut fb, "88", Point::new(100, 100), LARGE, Color::White);
        assert_eq!(width, 20);
        assert!(fb.count(Color::White) > 0);
        for y in 0..176 {
            for x in 0..176 {
                if fb.pixel(Point::new(x, y)) == Color::White {
                    assert!((100..120).contains(&x) && (100..120).contains(&y));
                }
            }
        }
    }
}
