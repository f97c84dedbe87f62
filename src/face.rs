//! # Dial Rendering
//!
//! The face is drawn incrementally. Every field remembers the value it last
//! put on screen, and a render only touches the fields whose value moved:
//!
//! | field        | region            | value                              |
//! |--------------|-------------------|------------------------------------|
//! | day of week  | top-left corner   | weekday, when calendar detail asks |
//! | status       | top-right corner  | year, lock, charge, battery, HRM   |
//! | month        | bottom-left       | month                              |
//! | date         | bottom-right      | day of month                       |
//! | hour arc     | the dial          | minute of the day                  |
//! | minute hand  | on the rim        | minute (plus second when shown)    |
//! | second hand  | on the rim        | second, and whether it is hollow   |
//!
//! Hands move around the rim over everything else, so each hand keeps a
//! save-under of the pixels it covered. The next frame that moves a hand puts
//! those pixels back first (second hand, then minute hand) and captures again
//! before drawing at the new position.

use crate::config::FaceOptions;
use crate::framebuffer::{Canvas, Color, Mask, Sprite};
use crate::geometry::{fill_polygon, hour_arc};
use crate::glyphs::{self, BATTERY, CHARGE, HEART, LARGE, LOCK, LOCK_SMALL, SMALL};
use crate::orientation::Rotation;
use crate::rates::{Rate, RateRequest};
use chrono::{Datelike, NaiveDateTime, Timelike};
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Circle, PrimitiveStyle, Rectangle, Triangle},
};
use log::debug;
use std::f32::consts::PI;

const DAYS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Corner regions, each erased as a whole before its field is redrawn.
const TOP_LEFT: [Point; 3] = [Point::new(0, 0), Point::new(58, 0), Point::new(0, 58)];
const TOP_RIGHT: [Point; 3] = [Point::new(176, 0), Point::new(176, 58), Point::new(119, 0)];
const BOTTOM_LEFT: [Point; 3] = [Point::new(0, 176), Point::new(0, 119), Point::new(58, 176)];
const BOTTOM_RIGHT: [Point; 3] = [
    Point::new(176, 176),
    Point::new(119, 176),
    Point::new(176, 119),
];

const MINUTE_RADIUS: i32 = 5;
const SECOND_RADIUS: i32 = 3;

/// Right edge of the status icon row.
const STATUS_RIGHT: i32 = 172;
const STATUS_TOP: i32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub fg: Color,
    pub bg: Color,
    /// Accent used for the second hand.
    pub fg2: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::White,
            bg: Color::Black,
            fg2: Color::Red,
        }
    }
}

/// Device state shown in the status cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceStatus {
    pub locked: bool,
    pub charging: bool,
    /// Percent, 0 to 100.
    pub battery: u8,
    pub hrm_on: bool,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            locked: false,
            charging: false,
            battery: 100,
            hrm_on: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    DayOfWeek,
    Status,
    Month,
    Date,
    HourArc,
    MinuteHand,
    SecondHand,
}

/// Last value drawn for one field.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Slot<T> {
    Unknown,
    Known(T),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Unknown
    }
}

impl<T: PartialEq> Slot<T> {
    fn differs(&self, value: &T) -> bool {
        match self {
            Slot::Known(known) => known != value,
            Slot::Unknown => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct StatusKey {
    year: Option<i32>,
    locked: bool,
    charging: bool,
    /// Rounded down to an even percentage.
    battery: u8,
    hrm_on: bool,
}

impl StatusKey {
    fn new(year: Option<i32>, status: &DeviceStatus) -> Self {
        Self {
            year,
            locked: status.locked,
            charging: status.charging,
            battery: status.battery - status.battery % 2,
            hrm_on: status.hrm_on,
        }
    }

    /// Battery jitter of a couple of percent is not worth a redraw.
    fn redraw_for(&self, next: &StatusKey, battery: u8) -> bool {
        self.year != next.year
            || self.locked != next.locked
            || self.charging != next.charging
            || self.hrm_on != next.hrm_on
            || (i16::from(battery) - i16::from(self.battery)).abs() > 2
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SecondKey {
    second: u32,
    hollow: bool,
}

/// Pixels under a hand, and where they go back.
#[derive(Clone, Debug)]
struct Overlay {
    sprite: Sprite,
    origin: Point,
}

#[derive(Debug, Default)]
struct RenderState {
    day_of_week: Slot<Option<usize>>,
    status: Slot<StatusKey>,
    month: Slot<Option<usize>>,
    date: Slot<Option<u32>>,
    /// Minute of the day.
    hour_arc: Slot<u32>,
    /// Second of the hour, or minute granularity when seconds are hidden.
    minute: Slot<Option<u32>>,
    second: Slot<Option<SecondKey>>,
    minute_under: Option<Overlay>,
    second_under: Option<Overlay>,
}

/// Values one frame wants on screen.
struct Frame {
    day_of_week: Option<usize>,
    seconds: Option<u32>,
    /// Fractional minute of the hour.
    minutes: Option<f32>,
    minute_of_day: u32,
    date: Option<u32>,
    month: Option<usize>,
    year: Option<i32>,
}

impl Frame {
    fn compute(now: NaiveDateTime, options: &FaceOptions, enhanced: bool) -> Self {
        let cal = options.calendric;
        let res = options.resolution;
        let seconds = (res < 2).then(|| now.second());
        let minutes = (enhanced || res < 3)
            .then(|| now.minute() as f32 + seconds.unwrap_or(0) as f32 / 60.0);
        Self {
            day_of_week: (enhanced || cal == 1 || cal > 2)
                .then(|| now.weekday().num_days_from_sunday() as usize),
            seconds,
            minutes,
            minute_of_day: now.hour() * 60 + now.minute(),
            date: (enhanced || cal > 1).then(|| now.day()),
            month: (enhanced || cal > 3).then(|| now.month0() as usize),
            year: (enhanced || cal > 4).then(|| now.year()),
        }
    }

    fn minute_key(&self) -> Option<u32> {
        self.minutes
            .map(|m| m.floor() as u32 * 60 + self.seconds.unwrap_or(0))
    }

    /// Rate this frame needs to stay accurate.
    fn rate_request(&self) -> RateRequest {
        if self.seconds.is_some() {
            RateRequest::paired(1_000, 60_000)
        } else if self.minutes.is_some() {
            RateRequest::fixed(60_000)
        } else {
            RateRequest::fixed(900_000)
        }
    }
}

/// The incremental watch face renderer.
pub struct Face<C> {
    canvas: C,
    mask: Mask,
    theme: Theme,
    state: RenderState,
    enhance_until: Option<NaiveDateTime>,
    redrawn: Vec<Field>,
}

impl<C: Canvas> Face<C> {
    pub fn new(canvas: C) -> Self {
        Self::with_theme(canvas, Theme::default())
    }

    pub fn with_theme(canvas: C, theme: Theme) -> Self {
        let size = canvas.size();
        Self {
            canvas,
            mask: Mask::new(size.width, size.height),
            theme,
            state: RenderState::default(),
            enhance_until: None,
            redrawn: Vec::new(),
        }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Fields drawn by the most recent render.
    pub fn last_redrawn(&self) -> &[Field] {
        &self.redrawn
    }

    /// Show every field, whatever the settings, until `deadline`.
    pub fn enhance_until(&mut self, deadline: NaiveDateTime) {
        self.enhance_until = Some(deadline);
    }

    pub fn is_enhanced(&self, now: NaiveDateTime) -> bool {
        self.enhance_until.is_some_and(|until| now < until)
    }

    /// Force `field` to be redrawn on the next render.
    pub fn invalidate(&mut self, field: Field) {
        match field {
            Field::DayOfWeek => self.state.day_of_week = Slot::Unknown,
            Field::Status => self.state.status = Slot::Unknown,
            Field::Month => self.state.month = Slot::Unknown,
            Field::Date => self.state.date = Slot::Unknown,
            Field::HourArc => self.state.hour_arc = Slot::Unknown,
            Field::MinuteHand => self.state.minute = Slot::Unknown,
            Field::SecondHand => self.state.second = Slot::Unknown,
        }
    }

    /// Forget everything drawn. With a rotation, also wipe the screen and
    /// rotate it; without one, hands are lifted off so they leave no trail.
    pub fn reset(&mut self, rotation: Option<Rotation>) {
        match rotation {
            Some(rotation) => {
                self.canvas.set_rotation(rotation);
                self.canvas.clear(self.theme.bg).ok();
            }
            None => {
                self.restore_second();
                self.restore_minute();
            }
        }
        self.state = RenderState::default();
    }

    /// Bring the screen up to date with `now`. Returns the rate the face
    /// needs to stay accurate until its next change.
    pub fn render(
        &mut self,
        now: NaiveDateTime,
        rate: Rate,
        options: &FaceOptions,
        status: &DeviceStatus,
    ) -> RateRequest {
        let frame = Frame::compute(now, options, self.is_enhanced(now));
        let status_key = StatusKey::new(frame.year, status);
        let second_key = frame.seconds.map(|second| SecondKey {
            second,
            hollow: rate.coarser_than_second(),
        });
        let minute_key = frame.minute_key();

        let dow_dirty = self.state.day_of_week.differs(&frame.day_of_week);
        let status_dirty = match &self.state.status {
            Slot::Known(cached) => cached.redraw_for(&status_key, status.battery),
            Slot::Unknown => true,
        };
        let month_dirty = self.state.month.differs(&frame.month);
        let date_dirty = self.state.date.differs(&frame.date);
        let arc_dirty = self.state.hour_arc.differs(&frame.minute_of_day);
        let below = dow_dirty || status_dirty || month_dirty || date_dirty || arc_dirty;
        let minute_dirty = below || self.state.minute.differs(&minute_key);
        let second_dirty = minute_dirty || self.state.second.differs(&second_key);

        self.redrawn.clear();
        if second_dirty {
            self.restore_second();
        }
        if minute_dirty {
            self.restore_minute();
        }

        if dow_dirty {
            self.erase(TOP_LEFT);
            if let Some(day) = frame.day_of_week {
                glyphs::draw_text(&mut self.canvas, DAYS[day], Point::new(4, 4), LARGE, self.theme.fg);
            }
            self.state.day_of_week = Slot::Known(frame.day_of_week);
            self.redrawn.push(Field::DayOfWeek);
        }
        if status_dirty {
            self.draw_status(frame.year, status);
            self.state.status = Slot::Known(status_key);
            self.redrawn.push(Field::Status);
        }
        if month_dirty {
            self.erase(BOTTOM_LEFT);
            if let Some(month) = frame.month {
                glyphs::draw_text(
                    &mut self.canvas,
                    MONTHS[month],
                    Point::new(4, 154),
                    LARGE,
                    self.theme.fg,
                );
            }
            self.state.month = Slot::Known(frame.month);
            self.redrawn.push(Field::Month);
        }
        if date_dirty {
            self.erase(BOTTOM_RIGHT);
            if let Some(date) = frame.date {
                let text = format!("{date:02}");
                glyphs::draw_text(&mut self.canvas, &text, Point::new(150, 152), LARGE, self.theme.fg);
            }
            self.state.date = Slot::Known(frame.date);
            self.redrawn.push(Field::Date);
        }
        if arc_dirty {
            self.draw_hour_arc(frame.minute_of_day, options);
            self.state.hour_arc = Slot::Known(frame.minute_of_day);
            self.redrawn.push(Field::HourArc);
        }
        let theme = self.theme;
        if minute_dirty {
            self.state.minute_under = frame.minutes.map(|minutes| {
                self.hand(minutes, MINUTE_RADIUS, theme.bg, Some((theme.fg, MINUTE_RADIUS - 1)))
            });
            self.state.minute = Slot::Known(minute_key);
            self.redrawn.push(Field::MinuteHand);
        }
        if second_dirty {
            self.state.second_under = second_key.map(|key| {
                let hollow = key.hollow.then_some((theme.bg, 2));
                self.hand(key.second as f32, SECOND_RADIUS, theme.fg2, hollow)
            });
            self.state.second = Slot::Known(second_key);
            self.redrawn.push(Field::SecondHand);
        }

        if !self.redrawn.is_empty() {
            debug!("redrew {:?}", self.redrawn);
        }
        frame.rate_request()
    }

    fn erase(&mut self, corner: [Point; 3]) {
        Triangle::new(corner[0], corner[1], corner[2])
            .into_styled(PrimitiveStyle::with_fill(self.theme.bg))
            .draw(&mut self.canvas)
            .ok();
    }

    fn restore_second(&mut self) {
        if let Some(overlay) = self.state.second_under.take() {
            self.canvas.blit(&overlay.sprite, overlay.origin);
        }
    }

    fn restore_minute(&mut self) {
        if let Some(overlay) = self.state.minute_under.take() {
            self.canvas.blit(&overlay.sprite, overlay.origin);
        }
    }

    fn draw_status(&mut self, year: Option<i32>, status: &DeviceStatus) {
        let fg = self.theme.fg;
        self.erase(TOP_RIGHT);
        let cluster = status.charging
            || status.battery < 50
            || status.hrm_on
            || (status.locked && year.is_none());

        if cluster {
            let mut x = STATUS_RIGHT;
            if status.locked {
                x -= LOCK.width() as i32;
                LOCK.draw(&mut self.canvas, Point::new(x, STATUS_TOP), fg);
                x -= 1;
            }
            if status.charging || status.battery <= 50 {
                x -= BATTERY.width() as i32;
                self.draw_battery(Point::new(x, STATUS_TOP), status);
                x -= 1;
            }
            if status.hrm_on {
                x -= HEART.width() as i32;
                HEART.draw(&mut self.canvas, Point::new(x, STATUS_TOP), fg);
            }
            if let Some(year) = year {
                let text = format!("{:04}", year.rem_euclid(10_000));
                glyphs::draw_text(&mut self.canvas, &text, Point::new(150, 22), SMALL, fg);
            }
        } else if let Some(year) = year {
            if status.locked {
                LOCK_SMALL.draw(&mut self.canvas, Point::new(140, 6), fg);
            } else {
                let century = format!("{:02}", year.div_euclid(100).rem_euclid(100));
                glyphs::draw_text(&mut self.canvas, &century, Point::new(136, 8), SMALL, fg);
            }
            let text = format!("{:02}", year.rem_euclid(100));
            glyphs::draw_text(&mut self.canvas, &text, Point::new(150, 4), LARGE, fg);
        }
    }

    fn draw_battery(&mut self, origin: Point, status: &DeviceStatus) {
        BATTERY.draw(&mut self.canvas, origin, self.theme.fg);
        let battery = i32::from(status.battery.min(100));
        let level = match battery {
            0..=10 => Color::Red,
            11..=30 => Color::Yellow,
            _ => Color::Green,
        };
        let empty = 13 * (100 - battery) / 100;
        let bar = Rectangle::with_corners(
            origin + Point::new(1, 2 + empty),
            origin + Point::new(6, 15),
        );
        self.canvas.fill_solid(&bar, level).ok();
        if status.charging {
            CHARGE.draw(&mut self.canvas, origin + Point::new(0, 2), self.theme.bg);
        }
    }

    /// Night disc, then the day share of it through the mask.
    fn draw_hour_arc(&mut self, minute_of_day: u32, options: &FaceOptions) {
        let size = self.canvas.size();
        let centre = Point::new(size.width as i32 / 2, size.height as i32 / 2);
        let radius = centre.x - MINUTE_RADIUS - 1;
        self.mask.reset();
        Circle::with_center(centre, (2 * radius + 1) as u32)
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut self.mask)
            .ok();
        self.canvas.blit_mask(&self.mask, options.night_fg);

        let hour = minute_of_day as f32 / 60.0;
        fill_polygon(&mut self.mask, &hour_arc(size, hour), BinaryColor::Off);
        self.canvas.blit_mask(&self.mask, options.day_fg);
    }

    /// Save under, then draw a hand at `position` (in sixtieths of a turn).
    fn hand(&mut self, position: f32, radius: i32, outer: Color, inner: Option<(Color, i32)>) -> Overlay {
        let size = self.canvas.size();
        let centre = Point::new(size.width as i32 / 2, size.height as i32 / 2);
        let rim = (centre.x - MINUTE_RADIUS) as f32;
        let (sin, cos) = (position * PI / 30.0).sin_cos();
        let at = centre + Point::new((rim * sin).round() as i32, -(rim * cos).round() as i32);

        let origin = at - Point::new(radius, radius);
        let side = (2 * radius + 1) as u32;
        let sprite = self.canvas.capture(Rectangle::new(origin, Size::new(side, side)));

        Circle::with_center(at, side)
            .into_styled(PrimitiveStyle::with_fill(outer))
            .draw(&mut self.canvas)
            .ok();
        if let Some((color, r)) = inner {
            Circle::with_center(at, (2 * r + 1) as u32)
                .into_styled(PrimitiveStyle::with_fill(color))
                .draw(&mut self.canvas)
                .ok();
        }
        Overlay { sprite, origin }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::{FrameBuffer, HEIGHT, WIDTH};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn face() -> Face<FrameBuffer> {
        Face::new(FrameBuffer::new(WIDTH, HEIGHT))
    }

    fn hand_centre(position: f32) -> Point {
        let (sin, cos) = (position * PI / 30.0).sin_cos();
        Point::new(88 + (83.0 * sin).round() as i32, 88 - (83.0 * cos).round() as i32)
    }

    #[test]
    fn first_render_draws_every_field() {
        let mut face = face();
        let options = FaceOptions::default();
        face.render(at(9, 30, 15), Rate::Every(1_000), &options, &DeviceStatus::default());
        assert_eq!(
            face.last_redrawn(),
            &[
                Field::DayOfWeek,
                Field::Status,
                Field::Month,
                Field::Date,
                Field::HourArc,
                Field::MinuteHand,
                Field::SecondHand,
            ]
        );
    }

    #[test]
    fn identical_render_does_no_work() {
        let mut face = face();
        let options = FaceOptions::default();
        let status = DeviceStatus::default();
        face.render(at(9, 30, 15), Rate::Every(1_000), &options, &status);
        let before = face.canvas().raw().to_vec();
        face.render(at(9, 30, 15), Rate::Every(1_000), &options, &status);
        assert!(face.last_redrawn().is_empty());
        assert_eq!(face.canvas().raw(), &before[..]);
    }

    #[test]
    fn ticking_second_only_moves_the_second_hand() {
        let mut face = face();
        let options = FaceOptions::default();
        let status = DeviceStatus::default();
        face.render(at(9, 30, 15), Rate::Every(1_000), &options, &status);
        face.render(at(9, 30, 16), Rate::Every(1_000), &options, &status);
        // Seconds feed the fractional minute, so the minute hand follows.
        assert_eq!(face.last_redrawn(), &[Field::MinuteHand, Field::SecondHand]);
    }

    #[test]
    fn hidden_seconds_leave_the_minute_hand_alone() {
        let mut face = face();
        let options = FaceOptions {
            resolution: 2,
            ..FaceOptions::default()
        };
        let status = DeviceStatus::default();
        let rate = face.render(at(9, 30, 15), Rate::Every(60_000), &options, &status);
        assert_eq!(rate, RateRequest::fixed(60_000));
        face.render(at(9, 30, 45), Rate::Every(60_000), &options, &status);
        assert!(face.last_redrawn().is_empty());
    }

    #[test]
    fn restoring_hands_leaves_no_trail() {
        let mut face = face();
        let options = FaceOptions::default();
        let status = DeviceStatus::default();
        face.render(at(9, 30, 15), Rate::Every(1_000), &options, &status);
        let old = hand_centre(15.0);
        assert_eq!(face.canvas().pixel(old), Color::Red);

        face.render(at(9, 30, 16), Rate::Every(1_000), &options, &status);
        assert_ne!(face.canvas().pixel(old), Color::Red);
        assert_eq!(face.canvas().pixel(hand_centre(16.0)), Color::Red);
    }

    #[test]
    fn restore_then_redraw_matches_a_fresh_frame() {
        let options = FaceOptions::default();
        let status = DeviceStatus::default();

        let mut incremental = face();
        incremental.render(at(9, 30, 15), Rate::Every(1_000), &options, &status);
        incremental.render(at(9, 30, 40), Rate::Every(1_000), &options, &status);

        let mut fresh = face();
        fresh.render(at(9, 30, 40), Rate::Every(1_000), &options, &status);
        assert_eq!(incremental.canvas().raw(), fresh.canvas().raw());
    }

    #[test]
    fn coarse_rate_hollows_the_second_hand() {
        let mut face = face();
        let options = FaceOptions::default();
        let status = DeviceStatus::default();
        face.render(at(9, 30, 15), Rate::Every(60_000), &options, &status);
        let centre = hand_centre(15.0);
        assert_eq!(face.canvas().pixel(centre), Color::Black);
        assert_eq!(face.canvas().pixel(centre + Point::new(3, 0)), Color::Red);

        face.render(at(9, 30, 15), Rate::Every(1_000), &options, &status);
        assert_eq!(face.last_redrawn(), &[Field::SecondHand]);
        assert_eq!(face.canvas().pixel(centre), Color::Red);
    }

    #[test]
    fn rate_request_follows_resolution() {
        let mut face = face();
        let status = DeviceStatus::default();
        let mut options = FaceOptions::default();
        for (resolution, expected) in [
            (0, RateRequest::paired(1_000, 60_000)),
            (1, RateRequest::paired(1_000, 60_000)),
            (2, RateRequest::fixed(60_000)),
            (3, RateRequest::fixed(900_000)),
        ] {
            options.resolution = resolution;
            let rate = face.render(at(9, 30, 15), Rate::Every(1_000), &options, &status);
            assert_eq!(rate, expected, "resolution {resolution}");
        }
    }

    #[test]
    fn enhanced_mode_shows_everything_until_its_deadline() {
        let mut face = face();
        let status = DeviceStatus::default();
        let options = FaceOptions {
            resolution: 3,
            calendric: 0,
            ..FaceOptions::default()
        };
        face.render(at(9, 30, 0), Rate::Every(900_000), &options, &status);
        let quiet = face.canvas().count(Color::White);

        face.enhance_until(at(9, 30, 30));
        let rate = face.render(at(9, 30, 1), Rate::Every(900_000), &options, &status);
        assert_eq!(rate, RateRequest::fixed(60_000));
        assert!(face.last_redrawn().contains(&Field::Date));
        assert!(face.last_redrawn().contains(&Field::MinuteHand));
        assert!(face.canvas().count(Color::White) > quiet);

        let rate = face.render(at(9, 30, 30), Rate::Every(60_000), &options, &status);
        assert_eq!(rate, RateRequest::fixed(900_000));
        assert!(face.last_redrawn().contains(&Field::Date));
    }

    #[test]
    fn battery_jitter_does_not_redraw_status() {
        let mut face = face();
        let options = FaceOptions::default();
        let mut status = DeviceStatus {
            battery: 41,
            ..DeviceStatus::default()
        };
        face.render(at(9, 30, 0), Rate::Every(1_000), &options, &status);
        status.battery = 42;
        face.render(at(9, 30, 0), Rate::Every(1_000), &options, &status);
        assert!(face.last_redrawn().is_empty());
        status.battery = 37;
        face.render(at(9, 30, 0), Rate::Every(1_000), &options, &status);
        assert!(face.last_redrawn().contains(&Field::Status));
    }

    #[test]
    fn low_battery_bar_is_red() {
        let mut face = face();
        let options = FaceOptions::default();
        let status = DeviceStatus {
            battery: 8,
            ..DeviceStatus::default()
        };
        face.render(at(9, 30, 0), Rate::Every(1_000), &options, &status);
        let x = STATUS_RIGHT - BATTERY.width() as i32;
        assert_eq!(face.canvas().pixel(Point::new(x + 3, STATUS_TOP + 15)), Color::Red);
    }

    #[test]
    fn invalidate_forces_a_single_field() {
        let mut face = face();
        let options = FaceOptions::default();
        let status = DeviceStatus::default();
        face.render(at(9, 30, 0), Rate::Every(1_000), &options, &status);
        face.invalidate(Field::Month);
        face.render(at(9, 30, 0), Rate::Every(1_000), &options, &status);
        // Hands sit on top of everything, so they follow.
        assert_eq!(
            face.last_redrawn(),
            &[Field::Month, Field::MinuteHand, Field::SecondHand]
        );
    }

    #[test]
    fn reset_with_rotation_clears_and_rotates() {
        let mut face = face();
        let options = FaceOptions::default();
        let status = DeviceStatus::default();
        face.render(at(9, 30, 0), Rate::Every(1_000), &options, &status);
        face.reset(Some(Rotation::Inverted));
        assert_eq!(face.canvas().count(Color::White), 0);
        assert_eq!(face.canvas().rotation(), Rotation::Inverted);
        face.render(at(9, 30, 0), Rate::Every(1_000), &options, &status);
        assert_eq!(face.last_redrawn().len(), 7);
    }

    #[test]
    fn reset_without_rotation_lifts_the_hands() {
        let mut face = face();
        let options = FaceOptions::default();
        let status = DeviceStatus::default();
        face.render(at(9, 30, 15), Rate::Every(1_000), &options, &status);
        face.reset(None);
        assert_ne!(face.canvas().pixel(hand_centre(15.0)), Color::Red);
    }
}
