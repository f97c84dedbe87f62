//! # Watch Assembly
//!
//! [`Watch`] owns one of everything: the face, the scheduler, the rate
//! registry, the gesture recognizer, the orientation policy and the options.
//! Hosts feed it events through [`Watch::handle`] and wake it at
//! [`Watch::next_deadline`] through [`Watch::on_timer`]. Each call runs to
//! completion before the next one starts.
//!
//! ## Modes
//! - `Clock`: subscribed to device events, scheduler running.
//! - `Settings`: the settings menu owns the screen; the clock is stopped and
//!   resumes when the session finishes or times out. Device status events are
//!   still recorded so the clock comes back showing the current state.
//! - `Stopped`: nothing subscribed, nothing armed.

use crate::config::{FaceOptions, Options, OptionsEvent, Persist};
use crate::events::{Event, EventKind, Subscriptions, CLOCK_EVENTS};
use crate::face::{DeviceStatus, Face, Field};
use crate::framebuffer::Canvas;
use crate::gesture::{Gesture, GestureRecognizer};
use crate::orientation::{AccelSample, OrientationPolicy};
use crate::rates::{timescale, Rate, RateRegistry, RateRequest, CLOCK, MAX_RESOLUTION};
use crate::scheduler::{WakeScheduler, WakeTarget};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use log::{debug, info};

/// Length of the acknowledgement buzz.
pub const BUZZ_MS: u32 = 33;

/// How long a quick tap shows every field.
pub const ENHANCE_MS: i64 = 30_000;

/// What the watch can ask of the device.
pub trait Host {
    /// Short haptic acknowledgement.
    fn buzz(&mut self, ms: u32);

    fn set_display_power(&mut self, on: bool);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Clock,
    Settings,
    Stopped,
}

/// Local wall-clock time for epoch milliseconds.
pub fn local_time(now: i64, offset: FixedOffset) -> NaiveDateTime {
    DateTime::<Utc>::from_timestamp_millis(now)
        .unwrap_or_default()
        .with_timezone(&offset)
        .naive_local()
}

/// The face as the scheduler sees it.
struct Screen<'a, C> {
    face: &'a mut Face<C>,
    orientation: &'a mut OrientationPolicy,
    options: &'a FaceOptions,
    status: &'a DeviceStatus,
    accel: AccelSample,
    offset: FixedOffset,
}

impl<C: Canvas> WakeTarget for Screen<'_, C> {
    fn redraw(&mut self, now: i64, rate: Rate, refresh: bool) -> RateRequest {
        if refresh {
            let rotation = self.orientation.rotation(self.accel);
            self.orientation.set_attitude(rotation);
            self.face.reset(Some(rotation));
        }
        self.face
            .render(local_time(now, self.offset), rate, self.options, self.status)
    }

    fn reset(&mut self) {
        self.face.reset(None);
    }
}

pub struct Watch<C, H, P> {
    face: Face<C>,
    scheduler: WakeScheduler,
    rates: RateRegistry,
    gestures: GestureRecognizer,
    orientation: OrientationPolicy,
    options: Options<P>,
    subscriptions: Subscriptions,
    status: DeviceStatus,
    accel: AccelSample,
    host: H,
    offset: FixedOffset,
    mode: Mode,
}

impl<C: Canvas, H: Host, P: Persist> Watch<C, H, P> {
    pub fn new(canvas: C, host: H, options: Options<P>, offset: FixedOffset) -> Self {
        let orientation = OrientationPolicy::new(options.values().autorotate);
        Self {
            face: Face::new(canvas),
            scheduler: WakeScheduler::new(),
            rates: RateRegistry::new(),
            gestures: GestureRecognizer::new(),
            orientation,
            options,
            subscriptions: Subscriptions::new(),
            status: DeviceStatus::default(),
            // Lying flat until the accelerometer reports otherwise.
            accel: AccelSample::new(0.0, 0.0, -1.0),
            host,
            offset,
            mode: Mode::Stopped,
        }
    }

    /// Subscribe to device events and start ticking at the chosen resolution.
    pub fn start(&mut self, now: i64) {
        self.deactivate();
        self.orientation.face_up(true);
        self.orientation
            .set_autorotate(self.options.values().autorotate);
        self.rates.set_conservative(false);
        self.rates
            .set_rate(CLOCK, timescale(self.options.resolution()));
        for kind in CLOCK_EVENTS {
            self.subscriptions.subscribe(kind);
        }
        if self.orientation.wants_accel() {
            self.subscriptions.subscribe(EventKind::Accel);
        }
        self.mode = Mode::Clock;
        info!("clock started at resolution {}", self.options.resolution());
        self.activate(now);
    }

    /// Cancel every timer and drop every subscription.
    pub fn stop(&mut self) {
        self.deactivate();
        self.subscriptions.clear();
        self.gestures.cancel();
        self.mode = Mode::Stopped;
        info!("clock stopped");
    }

    pub fn handle(&mut self, event: Event, now: i64) {
        if self.mode == Mode::Settings {
            // The menu owns the screen, but device status must not go stale.
            match event {
                Event::Pointer(_) => self.options.touch(now),
                other => self.note_status(other),
            }
            return;
        }
        if !self.subscriptions.is_subscribed(event.kind()) {
            debug!("dropped {:?}", event.kind());
            return;
        }
        match event {
            Event::DisplayPower(on) => {
                if on {
                    self.activate(now);
                } else {
                    self.deactivate();
                }
            }
            Event::ChargingState(charging) => {
                self.note_status(event);
                if charging {
                    self.subscriptions.subscribe(EventKind::Accel);
                } else {
                    self.subscriptions.unsubscribe(EventKind::Accel);
                }
                self.activate(now);
            }
            Event::LockState(_) => {
                self.note_status(event);
                self.activate(now);
            }
            Event::FaceUp(up) => {
                self.orientation.face_up(up);
                self.rates
                    .set_conservative(self.orientation.is_conservative());
                self.activate(now);
            }
            Event::Twist => {
                if self.options.values().autolight {
                    self.host.set_display_power(true);
                }
            }
            Event::Pointer(pointer) => {
                if let Some(gesture) = self.gestures.feed(pointer, now) {
                    self.on_gesture(gesture, now);
                }
            }
            Event::Accel(sample) => {
                self.accel = sample;
                if self.orientation.observe(sample) {
                    self.activate(now);
                }
            }
            Event::Battery(_) | Event::HrmPower(_) => self.note_status(event),
        }
    }

    /// Cache whatever device status `event` carries.
    fn note_status(&mut self, event: Event) {
        match event {
            Event::LockState(locked) => {
                self.status.locked = locked;
                self.face.invalidate(Field::Status);
            }
            Event::ChargingState(charging) => {
                self.status.charging = charging;
                self.orientation.set_charging(charging);
                self.face.invalidate(Field::Status);
            }
            Event::Battery(percent) => self.status.battery = percent.min(100),
            Event::HrmPower(on) => self.status.hrm_on = on,
            _ => {}
        }
    }

    fn on_gesture(&mut self, gesture: Gesture, now: i64) {
        info!("gesture {:?}", gesture);
        match gesture {
            Gesture::QuickTap => {
                self.host.buzz(BUZZ_MS);
                self.face
                    .enhance_until(local_time(now + ENHANCE_MS, self.offset));
                self.activate(now);
            }
            Gesture::LongPress => {
                self.stop();
                self.host.buzz(BUZZ_MS);
                self.options.interact(now);
                self.mode = Mode::Settings;
            }
            Gesture::SwipeUp => {
                let resolution = self.options.resolution().saturating_sub(1);
                self.set_resolution(resolution, now);
            }
            Gesture::SwipeDown => {
                let resolution = (self.options.resolution() + 1).min(MAX_RESOLUTION);
                self.set_resolution(resolution, now);
            }
        }
    }

    fn set_resolution(&mut self, resolution: u8, now: i64) {
        self.options.set_resolution(resolution, now);
        self.rates
            .set_rate(CLOCK, timescale(self.options.resolution()));
        self.host.buzz(BUZZ_MS);
        self.activate(now);
    }

    /// End the settings session and go back to the clock.
    pub fn finish_settings(&mut self, now: i64) {
        if self.options.finish() {
            self.start(now);
        }
    }

    /// Run everything due at `now`.
    pub fn on_timer(&mut self, now: i64) {
        for event in self.options.on_timer(now) {
            if event == OptionsEvent::SettingsDone {
                self.start(now);
            }
        }
        self.fire_due(now);
    }

    pub fn next_deadline(&self) -> Option<i64> {
        match (self.scheduler.next_deadline(), self.options.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn face(&self) -> &Face<C> {
        &self.face
    }

    pub fn canvas(&self) -> &C {
        self.face.canvas()
    }

    pub fn scheduler(&self) -> &WakeScheduler {
        &self.scheduler
    }

    pub fn rates(&self) -> &RateRegistry {
        &self.rates
    }

    pub fn options(&self) -> &Options<P> {
        &self.options
    }

    /// Settings access for the menu.
    pub fn options_mut(&mut self) -> &mut Options<P> {
        &mut self.options
    }

    pub fn status(&self) -> &DeviceStatus {
        &self.status
    }

    pub fn orientation(&self) -> &OrientationPolicy {
        &self.orientation
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn activate(&mut self, now: i64) {
        self.drive(|scheduler, rates, screen| scheduler.activate(rates, screen, now));
    }

    fn fire_due(&mut self, now: i64) {
        self.drive(|scheduler, rates, screen| scheduler.fire_due(rates, screen, now));
    }

    fn deactivate(&mut self) {
        self.drive(|scheduler, _, screen| scheduler.deactivate(screen));
    }

    /// Lend the scheduler the face, with everything a frame needs.
    fn drive<R>(
        &mut self,
        f: impl FnOnce(&mut WakeScheduler, &mut RateRegistry, &mut Screen<'_, C>) -> R,
    ) -> R {
        let mut screen = Screen {
            face: &mut self.face,
            orientation: &mut self.orientation,
            options: self.options.values(),
            status: &self.status,
            accel: self.accel,
            offset: self.offset,
        };
        f(&mut self.scheduler, &mut self.rates, &mut screen)
    }
}
