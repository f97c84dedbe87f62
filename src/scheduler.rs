//! # Wake Scheduler
//!
//! Turns the registry's effective rate into a wake-up schedule aligned to
//! wall-clock multiples of that rate, so the second hand moves when the real
//! second rolls over rather than at some phase offset from when the schedule
//! started.
//!
//! ## States
//! - `Idle`: nothing armed.
//! - `Aligning`: one one-shot waiting for the first boundary.
//! - `Running`: a periodic tick at the agreed rate.
//! - `CatchUp`: the last tick arrived a full period late; the missed frames
//!   were coalesced into one and the tick re-armed on the next boundary. The
//!   next on-time tick returns to `Running`.
//!
//! Every redraw hands back the rate the face needs. When that differs from the
//! registered `face` source the registry is updated and the schedule is
//! re-derived, which can in turn redraw again; the loop settles in at most a
//! couple of rounds because the face's answer depends only on the settings.

use crate::rates::{Rate, RateRegistry, RateRequest, FACE};
use crate::timers::TimerTable;
use log::{debug, warn};

/// Rates at or above this are treated as never waking. One leap year.
pub const ONE_YEAR_MS: u64 = 31_622_400_000;

/// A corrective tick is scheduled this long after the last redraw.
const CORRECTIVE_DELAY_MS: i64 = 1_000;

/// Bound on redraw feedback rounds within one activation.
const SETTLE_ROUNDS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Aligning,
    Running,
    CatchUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WakeTimer {
    Align,
    Tick,
    Corrective,
}

/// What the scheduler drives.
pub trait WakeTarget {
    /// Draw one frame. `refresh` asks for a full repaint from scratch.
    /// Returns the rate the face needs to stay accurate.
    fn redraw(&mut self, now: i64, rate: Rate, refresh: bool) -> RateRequest;

    /// Drop any incremental render bookkeeping.
    fn reset(&mut self);
}

#[derive(Clone, Copy, Debug)]
struct Alignment {
    period: u64,
    delay: u64,
}

#[derive(Debug)]
pub struct WakeScheduler {
    state: SchedulerState,
    running: Option<Rate>,
    timers: TimerTable<WakeTimer>,
    alignment: Option<Alignment>,
    last_redraw: Option<i64>,
    refresh: bool,
    redraws: u64,
}

impl Default for WakeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Delay from `now` to one millisecond past the next multiple of `period`.
pub fn alignment_delay(now: i64, period: u64) -> u64 {
    let period = period.max(1);
    period - now.rem_euclid(period as i64) as u64 + 1
}

impl WakeScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            running: None,
            timers: TimerTable::new(),
            alignment: None,
            last_redraw: None,
            refresh: false,
            redraws: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Rate of the periodic tick, once aligned.
    pub fn running_rate(&self) -> Option<Rate> {
        self.running
    }

    pub fn next_deadline(&self) -> Option<i64> {
        self.timers.next_deadline()
    }

    pub fn last_redraw(&self) -> Option<i64> {
        self.last_redraw
    }

    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    pub fn has_corrective(&self) -> bool {
        self.timers.is_armed(WakeTimer::Corrective)
    }

    /// Re-read the effective rate and (re)build the schedule around it.
    pub fn activate<T: WakeTarget>(&mut self, registry: &mut RateRegistry, target: &mut T, now: i64) {
        for _ in 0..SETTLE_ROUNDS {
            if !self.activate_once(registry, target, now) {
                return;
            }
        }
        let rate = registry.effective_rate();
        warn!("face rate did not settle after {SETTLE_ROUNDS} rounds; aligning to {rate:?}");
        self.align(rate, now);
    }

    /// Returns true if the redraw moved the face rate and another round is due.
    fn activate_once<T: WakeTarget>(
        &mut self,
        registry: &mut RateRegistry,
        target: &mut T,
        now: i64,
    ) -> bool {
        let rate = registry.effective_rate();
        self.refresh = true;

        if self.running == Some(rate) {
            if rate.coarser_than_second() && !self.timers.is_armed(WakeTimer::Corrective) {
                let at = self.last_redraw.unwrap_or(now) + CORRECTIVE_DELAY_MS;
                debug!("corrective tick at {at}");
                self.timers.arm_once(WakeTimer::Corrective, at);
            }
            return false;
        }

        debug!("rate {:?} -> {:?}", self.running, rate);
        self.deactivate(target);
        if self.redraw(registry, target, now, rate) {
            return true;
        }
        self.align(rate, now);
        false
    }

    /// Arm the one-shot that lands just past the next boundary of `rate`.
    fn align(&mut self, rate: Rate, now: i64) {
        if let Rate::Every(period) = rate {
            if period < ONE_YEAR_MS {
                let delay = alignment_delay(now, period);
                self.timers.arm_once(WakeTimer::Align, now + delay as i64);
                self.alignment = Some(Alignment { period, delay });
                self.state = SchedulerState::Aligning;
            }
        }
    }

    /// Cancel every timer and reset the target's bookkeeping. Idempotent.
    pub fn deactivate<T: WakeTarget>(&mut self, target: &mut T) {
        self.cancel();
        target.reset();
    }

    /// Cancel every timer, leaving the screen and its save-unders alone.
    fn cancel(&mut self) {
        if self.state != SchedulerState::Idle {
            debug!("scheduler idle (was {:?})", self.state);
        }
        self.timers.cancel_all();
        self.running = None;
        self.alignment = None;
        self.state = SchedulerState::Idle;
    }

    /// Process every timer due at `now`, earliest first.
    pub fn fire_due<T: WakeTarget>(&mut self, registry: &mut RateRegistry, target: &mut T, now: i64) {
        while let Some(fired) = self.timers.pop_due(now) {
            let moved = match fired.key {
                WakeTimer::Align => {
                    let Some(alignment) = self.alignment else {
                        continue;
                    };
                    // The hands stay up until the first tick moves them.
                    self.cancel();
                    let rate = Rate::Every(alignment.period);
                    self.timers.arm_every(
                        WakeTimer::Tick,
                        fired.deadline + alignment.period as i64,
                        alignment.period,
                    );
                    self.running = Some(rate);
                    self.state = SchedulerState::Running;
                    debug!("aligned at {} every {}ms", fired.deadline, alignment.period);
                    alignment.delay > 1_000 && self.redraw(registry, target, now, rate)
                }
                WakeTimer::Tick => {
                    let (Some(rate), Some(period)) = (self.running, fired.period) else {
                        continue;
                    };
                    let lag = now - fired.deadline;
                    if lag >= period as i64 {
                        let missed = lag / period as i64;
                        let next = fired.deadline + (missed + 1) * period as i64;
                        debug!("tick {lag}ms late, skipping {missed} frames, next at {next}");
                        self.timers.arm_every(WakeTimer::Tick, next, period);
                        self.state = SchedulerState::CatchUp;
                    } else {
                        self.state = SchedulerState::Running;
                    }
                    self.redraw(registry, target, now, rate)
                }
                WakeTimer::Corrective => {
                    let Some(rate) = self.running else {
                        continue;
                    };
                    self.redraw(registry, target, now, rate)
                }
            };
            if moved {
                self.activate(registry, target, now);
            }
        }
    }

    /// Redraw and feed the face's rate back. True if the registry changed.
    fn redraw<T: WakeTarget>(
        &mut self,
        registry: &mut RateRegistry,
        target: &mut T,
        now: i64,
        rate: Rate,
    ) -> bool {
        let refresh = std::mem::take(&mut self.refresh);
        let wanted = target.redraw(now, rate, refresh);
        self.last_redraw = Some(now);
        self.redraws += 1;
        if registry.get(FACE) == Some(wanted) {
            return false;
        }
        registry.set_rate(FACE, wanted);
        true
    }
}
