//! # Face Options
//!
//! This module handles the user-facing options of the watch face: tick
//! resolution, calendar detail, day/night colours and the rotation and
//! backlight toggles. Options load from `round-face.toml`, fall back to
//! defaults when the file is missing or malformed, and are written back after
//! a quiet period so that rolling a value up and down does not hammer flash.
//!
//! The module also owns the settings session: the hook through which a menu
//! takes over the screen and later hands it back to the clock.

use crate::framebuffer::Color;
use crate::rates::MAX_RESOLUTION;
use crate::timers::TimerTable;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default options file, relative to the working directory.
pub const OPTIONS_FILE: &str = "round-face.toml";

/// Highest calendar detail level (`none, day, date, both, month, full`).
pub const MAX_CALENDRIC: u8 = 5;

/// Quiet period before changed options are written back.
pub const WRITE_BACK_DELAY_MS: i64 = 10_000;

/// A settings session ends on its own after this long without input.
pub const SETTINGS_IDLE_MS: i64 = 15_000;

/// Errors that can occur while persisting options.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Options file could not be read or written
    #[error("options IO: {0}")]
    Io(#[from] io::Error),

    /// Options could not be encoded as TOML
    #[error("options encode: {0}")]
    Encode(#[from] toml::ser::Error),

    /// Options file is not valid TOML for this schema
    #[error("options decode: {0}")]
    Decode(#[from] toml::de::Error),
}

/// Face options as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FaceOptions {
    /// Tick resolution: 0 seconds, 1 seconds while face up, 2 minutes, 3 hours
    pub resolution: u8,
    /// Calendar detail: 0 none, 1 day, 2 date, 3 both, 4 month, 5 full
    pub calendric: u8,
    /// Colour of the daylight part of the hour ring
    pub day_fg: Color,
    /// Colour of the night part of the hour ring
    pub night_fg: Color,
    /// Follow the accelerometer while on the charger
    pub autorotate: bool,
    /// Light the screen on a wrist twist
    pub autolight: bool,
}

impl Default for FaceOptions {
    fn default() -> Self {
        FaceOptions {
            resolution: 1,
            calendric: 5,
            day_fg: Color::White,
            night_fg: Color::Black,
            autorotate: true,
            autolight: false,
        }
    }
}

impl FaceOptions {
    /// Pull out-of-range values back to the nearest valid bound.
    pub fn clamped(mut self) -> Self {
        self.resolution = self.resolution.min(MAX_RESOLUTION);
        self.calendric = self.calendric.min(MAX_CALENDRIC);
        self
    }

    /// Load options from round-face.toml
    /// Falls back to default options if the file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(OPTIONS_FILE)
    }

    /// Load options from the specified path
    /// Falls back to default options if the file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load(&path) {
            Ok(options) => {
                info!("Loaded face options from {}", path.as_ref().display());
                options
            }
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!("No options file found, using defaults");
                Self::default()
            }
            Err(ConfigError::Io(e)) => {
                warn!(
                    "Could not read options from {}: {e}; using defaults",
                    path.as_ref().display()
                );
                Self::default()
            }
            Err(e) => {
                warn!("Invalid options file: {e}; using defaults");
                Self::default()
            }
        }
    }

    fn try_load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let options: FaceOptions = toml::from_str(&contents)?;
        Ok(options.clamped())
    }

    /// Save options to the specified path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

/// Where options go when they are written back.
pub trait Persist {
    fn persist(&mut self, options: &FaceOptions) -> Result<(), ConfigError>;
}

/// Persist options as a TOML file.
#[derive(Debug, Clone)]
pub struct TomlFile {
    path: PathBuf,
}

impl TomlFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persist for TomlFile {
    fn persist(&mut self, options: &FaceOptions) -> Result<(), ConfigError> {
        options.save_to_path(&self.path)?;
        info!("Options saved to {}", self.path.display());
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OptionsTimer {
    WriteBack,
    Idle,
}

/// Outcome of an options timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionsEvent {
    Saved,
    SaveFailed,
    /// The settings session timed out and the clock should resume.
    SettingsDone,
}

/// Live options with debounced write-back and the settings session.
#[derive(Debug)]
pub struct Options<P> {
    values: FaceOptions,
    persist: P,
    timers: TimerTable<OptionsTimer>,
    interacting: bool,
}

impl<P: Persist> Options<P> {
    pub fn new(values: FaceOptions, persist: P) -> Self {
        Self {
            values: values.clamped(),
            persist,
            timers: TimerTable::new(),
            interacting: false,
        }
    }

    pub fn values(&self) -> &FaceOptions {
        &self.values
    }

    pub fn persist_target(&self) -> &P {
        &self.persist
    }

    pub fn resolution(&self) -> u8 {
        self.values.resolution
    }

    pub fn calendric(&self) -> u8 {
        self.values.calendric
    }

    pub fn set_resolution(&mut self, resolution: u8, now: i64) {
        self.update(now, |options| options.resolution = resolution);
    }

    pub fn set_calendric(&mut self, calendric: u8, now: i64) {
        self.update(now, |options| options.calendric = calendric);
    }

    pub fn set_autorotate(&mut self, autorotate: bool, now: i64) {
        self.update(now, |options| options.autorotate = autorotate);
    }

    pub fn set_colors(&mut self, day_fg: Color, night_fg: Color, now: i64) {
        self.update(now, |options| {
            options.day_fg = day_fg;
            options.night_fg = night_fg;
        });
    }

    /// Apply a change, clamp it, and (re)start the write-back countdown.
    pub fn update(&mut self, now: i64, change: impl FnOnce(&mut FaceOptions)) {
        let mut next = self.values.clone();
        change(&mut next);
        let next = next.clamped();
        if next == self.values {
            return;
        }
        debug!("options changed: {:?}", next);
        self.values = next;
        self.timers
            .arm_once(OptionsTimer::WriteBack, now + WRITE_BACK_DELAY_MS);
    }

    /// Restore defaults and write them back right away.
    pub fn reset(&mut self, now: i64) {
        self.values = FaceOptions::default();
        self.timers.arm_once(OptionsTimer::WriteBack, now);
    }

    pub fn write_back_pending(&self) -> bool {
        self.timers.is_armed(OptionsTimer::WriteBack)
    }

    /// Write pending changes immediately.
    pub fn flush(&mut self) -> Result<(), ConfigError> {
        if self.timers.cancel(OptionsTimer::WriteBack) {
            self.persist.persist(&self.values)?;
        }
        Ok(())
    }

    /// Hand the screen to the settings menu.
    pub fn interact(&mut self, now: i64) {
        info!("settings session started");
        self.interacting = true;
        self.timers
            .arm_once(OptionsTimer::Idle, now + SETTINGS_IDLE_MS);
    }

    /// Any input during the session pushes the idle timeout back.
    pub fn touch(&mut self, now: i64) {
        if self.interacting {
            self.timers
                .arm_once(OptionsTimer::Idle, now + SETTINGS_IDLE_MS);
        }
    }

    /// End the session. Returns false if none was running.
    pub fn finish(&mut self) -> bool {
        self.timers.cancel(OptionsTimer::Idle);
        let was = self.interacting;
        self.interacting = false;
        if was {
            info!("settings session finished");
        }
        was
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn next_deadline(&self) -> Option<i64> {
        self.timers.next_deadline()
    }

    /// Run due option timers. Persist failures are logged and not retried.
    pub fn on_timer(&mut self, now: i64) -> Vec<OptionsEvent> {
        let mut events = Vec::new();
        while let Some(fired) = self.timers.pop_due(now) {
            match fired.key {
                OptionsTimer::WriteBack => match self.persist.persist(&self.values) {
                    Ok(()) => events.push(OptionsEvent::Saved),
                    Err(e) => {
                        warn!("options write-back failed: {e}");
                        events.push(OptionsEvent::SaveFailed);
                    }
                },
                OptionsTimer::Idle => {
                    if self.finish() {
                        events.push(OptionsEvent::SettingsDone);
                    }
                }
            }
        }
        events
    }
}
