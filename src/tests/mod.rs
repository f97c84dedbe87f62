//! # Scenario Test Suite
//!
//! Cross-module tests that drive a whole [`Watch`] through events and timers
//! with a synthetic clock. Unit tests for each module live next to the code.


use crate::config::{ConfigError, FaceOptions, Options, Persist};
use crate::framebuffer::{FrameBuffer, HEIGHT, WIDTH};
use crate::watch::{Host, Watch};
use chrono::{FixedOffset, NaiveDate};

/// Records every request the watch makes of the device.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub buzzes: Vec<u32>,
    pub display_power: Vec<bool>,
}

impl Host for RecordingHost {
    fn buzz(&mut self, ms: u32) {
        self.buzzes.push(ms);
    }

    fn set_display_power(&mut self, on: bool) {
        self.display_power.push(on);
    }
}

/// Keeps persisted options in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub saved: Vec<FaceOptions>,
}

impl Persist for MemoryStore {
    fn persist(&mut self, options: &FaceOptions) -> Result<(), ConfigError> {
        self.saved.push(options.clone());
        Ok(())
    }
}

pub type TestWatch = Watch<FrameBuffer, RecordingHost, MemoryStore>;

/// 2026-10-19 09:30:00.250 UTC, in epoch milliseconds.
pub fn t0() -> i64 {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_milli_opt(9, 30, 0, 250)
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

pub fn watch_with(options: FaceOptions) -> TestWatch {
    Watch::new(
        FrameBuffer::new(WIDTH, HEIGHT),
        RecordingHost::default(),
        Options::new(options, MemoryStore::default()),
        utc(),
    )
}

/// Fire the watch's timers until nothing is due before `until`.
pub fn run_until(watch: &mut TestWatch, until: i64) {
    while let Some(deadline) = watch.next_deadline() {
        if deadline > until {
            break;
        }
        watch.on_timer(deadline);
    }
}
