//! Touch gesture classification.
//!
//! A press opens a session, every pressed sample widens its bounding box, and
//! the release classifies the whole drag exactly once. Nothing fires while the
//! finger is still down.

use log::debug;
use serde::{Deserialize, Serialize};

/// Box size (px) under which movement counts as finger jitter.
pub const JITTER_PX: i32 = 20;

/// Taps shorter than this are quick taps.
pub const QUICK_TAP_MS: i64 = 250;

/// Presses longer than this are long presses.
pub const LONG_PRESS_MS: i64 = 500;

/// Minimum net vertical travel (px) for a swipe.
pub const SWIPE_PX: i32 = 50;

/// One raw touch sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: i32,
    pub y: i32,
    /// Finger down. The release sample has this false.
    pub pressed: bool,
}

impl PointerEvent {
    pub fn down(x: i32, y: i32) -> Self {
        Self { x, y, pressed: true }
    }

    pub fn up(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            pressed: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gesture {
    QuickTap,
    LongPress,
    /// Finger moved up the screen.
    SwipeUp,
    /// Finger moved down the screen.
    SwipeDown,
}

#[derive(Clone, Copy, Debug)]
struct Session {
    started: i64,
    origin: (i32, i32),
    min: (i32, i32),
    max: (i32, i32),
}

impl Session {
    fn open(now: i64, x: i32, y: i32) -> Self {
        Self {
            started: now,
            origin: (x, y),
            min: (x, y),
            max: (x, y),
        }
    }

    fn extend(&mut self, x: i32, y: i32) {
        self.min = (self.min.0.min(x), self.min.1.min(y));
        self.max = (self.max.0.max(x), self.max.1.max(y));
    }

    fn width(&self) -> i32 {
        self.max.0 - self.min.0
    }

    fn height(&self) -> i32 {
        self.max.1 - self.min.1
    }
}

#[derive(Debug, Default)]
pub struct GestureRecognizer {
    session: Option<Session>,
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a press is being tracked.
    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    /// Drop any session in progress.
    pub fn cancel(&mut self) {
        self.session = None;
    }

    /// Feed one sample. Returns a gesture only on release.
    pub fn feed(&mut self, event: PointerEvent, now: i64) -> Option<Gesture> {
        let Some(session) = self.session.as_mut() else {
            if event.pressed {
                self.session = Some(Session::open(now, event.x, event.y));
            }
            return None;
        };
        if event.pressed {
            session.extend(event.x, event.y);
            return None;
        }

        let session = *session;
        self.session = None;
        let gesture = classify(&session, event, now);
        debug!(
            "drag {}x{} dy={} over {}ms -> {:?}",
            session.width(),
            session.height(),
            event.y - session.origin.1,
            now - session.started,
            gesture
        );
        gesture
    }
}

fn classify(session: &Session, release: PointerEvent, now: i64) -> Option<Gesture> {
    if session.width() >= JITTER_PX {
        return None;
    }
    let dy = release.y - session.origin.1;
    if dy < -SWIPE_PX {
        return Some(Gesture::SwipeUp);
    }
    if dy > SWIPE_PX {
        return Some(Gesture::SwipeDown);
    }
    if session.height() >= JITTER_PX {
        return None;
    }
    let held = now - session.started;
    if held < QUICK_TAP_MS {
        Some(Gesture::QuickTap)
    } else if held > LONG_PRESS_MS {
        Some(Gesture::LongPress)
    } else {
        None
    }
}
