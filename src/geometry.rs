//! # Day Arc Geometry
//!
//! The hour ring shows daylight as a slice of the dial. Instead of rasterising
//! a true circular sector, the slice is cut with a polygon that fans out from
//! the centre to the screen's bounding box: the two radii end where they hit
//! the box edge, and the box corners between them are inserted as vertices.
//! Masking that polygon against a filled disc yields an exact sector.
//!
//! ## Angle convention
//! Angles are fractions of a full turn, clockwise from 12 o'clock. A fraction
//! is assigned to the box edge it points at by rounding `a * 4` to the nearest
//! integer: 0 top, 1 right, 2 bottom, 3 left (mod 4). Exactly-diagonal angles
//! round up, so every angle lands on one edge only. Axis-aligned angles
//! (0, 3, 6 and 9 o'clock) sit in the middle of an edge and are never ambiguous.

use embedded_graphics::{prelude::*, primitives::Rectangle};
use std::f32::consts::TAU;

/// Vertices of the pie slice swept clockwise from `a0` to `a1`.
///
/// With `invert == false` the complementary slice is produced instead: the
/// ends swap and the new end moves one turn forward, which keeps the vertex
/// order clockwise and the polygon simple.
pub fn pie(size: Size, a0: f32, a1: f32, invert: bool) -> Vec<Point> {
    if !invert {
        return pie(size, a1, a0 + 1.0, true);
    }
    let i0 = edge_index(a0);
    let mut i1 = edge_index(a1);
    let centre = Point::new(size.width as i32 / 2, size.height as i32 / 2);

    let mut polygon = vec![edge_point(size, a1, i1), centre, edge_point(size, a0, i0)];
    // A full revolution never needs more than the four corners.
    if i1 - i0 > 4 {
        i1 = i0 + 4;
    }
    for index in (i0 + 1)..=i1 {
        polygon.push(corner(size, index));
    }
    polygon
}

/// Region to erase from the dial at `hour` (0 to 24).
///
/// Mornings erase what is left of the turn so daylight grows clockwise from
/// 12 o'clock; afternoons erase what has already passed so it shrinks away.
pub fn hour_arc(size: Size, hour: f32) -> Vec<Point> {
    let turn = hour / 12.0;
    if hour < 12.0 {
        pie(size, turn, 1.0, true)
    } else {
        pie(size, 1.0, turn, true)
    }
}

fn edge_index(turn: f32) -> i32 {
    (turn * 4.0 + 0.5).floor() as i32
}

/// Where the ray at `turn` leaves the bounding box.
fn edge_point(size: Size, turn: f32, index: i32) -> Point {
    let cx = size.width as f32 / 2.0;
    let cy = size.height as f32 / 2.0;
    let (sin, cos) = (turn * TAU).sin_cos();
    let (x, y) = match index.rem_euclid(4) {
        0 => (cx + cx * sin / cos, 0.0),
        1 => (2.0 * cx, cy - cy * cos / sin),
        2 => (cx - cx * sin / cos, 2.0 * cy),
        _ => (0.0, cy + cy * cos / sin),
    };
    Point::new(x.round() as i32, y.round() as i32)
}

/// Corner between edge `index - 1` and edge `index`.
fn corner(size: Size, index: i32) -> Point {
    let x = if (3 * index) & 2 != 0 { size.width as i32 } else { 0 };
    let y = if index & 2 != 0 { size.height as i32 } else { 0 };
    Point::new(x, y)
}

/// Even-odd scanline fill of a closed polygon.
///
/// A pixel is filled when its centre lies inside. Rows are emitted as
/// horizontal spans through `fill_solid`, so any draw target works.
pub fn fill_polygon<D>(target: &mut D, points: &[Point], color: D::Color)
where
    D: DrawTarget + ?Sized,
{
    if points.len() < 3 {
        return;
    }
    let bounds = target.bounding_box();
    let Some(bottom_right) = bounds.bottom_right() else {
        return;
    };
    let top = points.iter().map(|p| p.y).min().unwrap_or(0).max(bounds.top_left.y);
    let bottom = points
        .iter()
        .map(|p| p.y)
        .max()
        .unwrap_or(0)
        .min(bottom_right.y);

    let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
    for y in top..=bottom {
        let scan = y as f32 + 0.5;
        crossings.clear();
        for (index, a) in points.iter().enumerate() {
            let b = points[(index + 1) % points.len()];
            let (ay, by) = (a.y as f32, b.y as f32);
            if (ay <= scan) != (by <= scan) {
                let t = (scan - ay) / (by - ay);
                crossings.push(a.x as f32 + t * (b.x - a.x) as f32);
            }
        }
        crossings.sort_by(f32::total_cmp);
        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil() as i32;
            let end = (span[1] - 0.5).ceil() as i32;
            if end > start {
                target
                    .fill_solid(
                        &Rectangle::new(Point::new(start, y), Size::new((end - start) as u32, 1)),
                        color,
                    )
                    .ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::Mask;
    use embedded_graphics::{
        pixelcolor::BinaryColor,
        primitives::{Circle, PrimitiveStyle},
    };

    const SIZE: Size = Size::new(176, 176);

    fn cross(o: Point, a: Point, b: Point) -> i64 {
        let (ax, ay) = ((a.x - o.x) as i64, (a.y - o.y) as i64);
        let (bx, by) = ((b.x - o.x) as i64, (b.y - o.y) as i64);
        ax * by - ay * bx
    }

    /// Proper crossing: the segments cut through each other's interiors.
    fn properly_cross(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
        let d1 = cross(q1, q2, p1);
        let d2 = cross(q1, q2, p2);
        let d3 = cross(p1, p2, q1);
        let d4 = cross(p1, p2, q2);
        ((d1 > 0 && d2 < 0) || (d1 < 0 && d2 > 0)) && ((d3 > 0 && d4 < 0) || (d3 < 0 && d4 > 0))
    }

    fn assert_simple(polygon: &[Point]) {
        let n = polygon.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let adjacent = j == i + 1 || (i == 0 && j == n - 1);
                if adjacent {
                    continue;
                }
                assert!(
                    !properly_cross(polygon[i], polygon[(i + 1) % n], polygon[j], polygon[(j + 1) % n]),
                    "edges {i} and {j} cross in {polygon:?}"
                );
            }
        }
    }

    #[test]
    fn quarter_past_midnight_erases_three_quarters() {
        // 3 o'clock: edge point on the right edge at the centre line.
        let polygon = hour_arc(SIZE, 3.0);
        assert_eq!(polygon[0], Point::new(88, 0));
        assert_eq!(polygon[1], Point::new(88, 88));
        assert_eq!(polygon[2], Point::new(176, 88));
        assert_eq!(
            &polygon[3..],
            &[Point::new(176, 176), Point::new(0, 176), Point::new(0, 0)]
        );
    }

    #[test]
    fn diagonal_angles_round_to_one_edge() {
        // 1:30 is 45 degrees: rounds onto the right edge, at the corner.
        let polygon = hour_arc(SIZE, 1.5);
        assert_eq!(polygon[2], Point::new(176, 0));
        // Corners after the right edge only, never the top-right one again.
        assert_eq!(
            &polygon[3..],
            &[Point::new(176, 176), Point::new(0, 176), Point::new(0, 0)]
        );
    }

    #[test]
    fn corner_insertions_are_capped_at_four() {
        let polygon = pie(SIZE, 0.1, 3.0, true);
        assert_eq!(polygon.len(), 3 + 4);
    }

    #[test]
    fn non_inverted_pie_is_the_complement() {
        assert_eq!(pie(SIZE, 0.25, 0.5, false), pie(SIZE, 0.5, 1.25, true));
    }

    #[test]
    fn hour_arcs_are_simple_polygons() {
        let mut hour = 0.0f32;
        while hour < 24.0 {
            assert_simple(&hour_arc(SIZE, hour));
            hour += 0.1;
        }
        for hour in [0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 18.0, 21.0] {
            assert_simple(&hour_arc(SIZE, hour));
        }
    }

    #[test]
    fn fill_covers_pixel_centres_inside() {
        let mut mask = Mask::new(176, 176);
        let square = [
            Point::new(10, 10),
            Point::new(20, 10),
            Point::new(20, 20),
            Point::new(10, 20),
        ];
        fill_polygon(&mut mask, &square, BinaryColor::On);
        assert_eq!(mask.count(), 100);
        assert!(mask.is_set(Point::new(10, 10)));
        assert!(!mask.is_set(Point::new(20, 20)));
    }

    fn daylight_mask(hour: f32) -> (Mask, usize) {
        let mut mask = Mask::new(176, 176);
        Circle::with_center(Point::new(88, 88), 165)
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut mask)
            .ok();
        let disc = mask.count();
        fill_polygon(&mut mask, &hour_arc(SIZE, hour), BinaryColor::Off);
        (mask, disc)
    }

    #[test]
    fn daylight_at_quadrant_hours() {
        let (mask, disc) = daylight_mask(0.0);
        assert_eq!(mask.count(), 0, "midnight has no daylight ({disc} disc pixels)");

        let (mask, _) = daylight_mask(3.0);
        assert!(mask.is_set(Point::new(120, 50)));
        assert!(!mask.is_set(Point::new(120, 120)));
        assert!(!mask.is_set(Point::new(50, 50)));

        let (mask, disc) = daylight_mask(6.0);
        assert!(mask.is_set(Point::new(120, 120)));
        assert!(!mask.is_set(Point::new(50, 120)));
        let half = mask.count() as f32 / disc as f32;
        assert!((0.45..=0.55).contains(&half), "six o'clock lit {half}");

        let (mask, _) = daylight_mask(9.0);
        assert!(mask.is_set(Point::new(50, 120)));
        assert!(!mask.is_set(Point::new(50, 50)));

        let (mask, disc) = daylight_mask(12.0);
        assert_eq!(mask.count(), disc, "noon is all daylight");

        let (mask, _) = daylight_mask(18.0);
        assert!(!mask.is_set(Point::new(120, 120)));
        assert!(mask.is_set(Point::new(50, 120)));
    }

    #[test]
    fn daylight_grows_monotonically_through_the_morning() {
        let mut previous = 0;
        for step in 0..=24 {
            let (mask, _) = daylight_mask(step as f32 * 0.5);
            let lit = mask.count();
            assert!(lit >= previous, "daylight shrank at step {step}");
            previous = lit;
        }
    }
}
