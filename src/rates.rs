//! # Rate Registry
//!
//! Every part of the watch that needs the screen refreshed registers a named
//! rate request here. The registry folds them into one effective wake interval:
//! the smallest period currently in force.
//!
//! A request is either a single period or a `[normal, conservative]` pair.
//! Pairs follow the registry's conservative flag (set while the watch lies face
//! down), which lets a source slow itself down without touching sources that
//! have no conservative variant.
//!
//! The effective rate is cached and recomputed on every mutation, so reading it
//! is free and never stale.

use log::{debug, warn};
use std::collections::BTreeMap;

/// Source name for the user's chosen tick resolution.
pub const CLOCK: &str = "clock";

/// Source name for the rate the face itself asks for after each frame.
pub const FACE: &str = "face";

/// One rate request, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateRequest {
    /// The same period regardless of power mode.
    Fixed(u64),
    /// Separate periods for normal and conservative operation.
    Paired { normal: u64, conservative: u64 },
}

impl RateRequest {
    pub const fn fixed(ms: u64) -> Self {
        RateRequest::Fixed(ms)
    }

    pub const fn paired(normal: u64, conservative: u64) -> Self {
        RateRequest::Paired {
            normal,
            conservative,
        }
    }

    /// Pick the period that applies under the given power mode.
    pub fn resolve(self, conservative: bool) -> u64 {
        match self {
            RateRequest::Fixed(ms) => ms,
            RateRequest::Paired {
                normal,
                conservative: slow,
            } => {
                if conservative {
                    slow
                } else {
                    normal
                }
            }
        }
    }

    /// Zero periods would spin the scheduler; raise them to one millisecond.
    fn sanitized(self) -> Self {
        match self {
            RateRequest::Fixed(ms) => RateRequest::Fixed(ms.max(1)),
            RateRequest::Paired {
                normal,
                conservative,
            } => RateRequest::Paired {
                normal: normal.max(1),
                conservative: conservative.max(1),
            },
        }
    }
}

/// Tick resolutions selectable by the user, finest first:
/// seconds, seconds while face up, minutes, quarter hours.
pub const TIMESCALES: [RateRequest; 4] = [
    RateRequest::fixed(1_000),
    RateRequest::paired(1_000, 60_000),
    RateRequest::fixed(60_000),
    RateRequest::fixed(900_000),
];

/// Highest valid resolution index.
pub const MAX_RESOLUTION: u8 = (TIMESCALES.len() - 1) as u8;

/// Rate request for a resolution index, clamped into range.
pub fn timescale(resolution: u8) -> RateRequest {
    TIMESCALES[resolution.min(MAX_RESOLUTION) as usize]
}

/// The effective wake interval.
///
/// `Every` sorts before `Never`, so `min` over rates does the right thing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rate {
    Every(u64),
    Never,
}

impl Rate {
    pub fn millis(self) -> Option<u64> {
        match self {
            Rate::Every(ms) => Some(ms),
            Rate::Never => None,
        }
    }

    /// True when this rate is slower than one tick per second.
    pub fn coarser_than_second(self) -> bool {
        self > Rate::Every(1_000)
    }
}

/// Named rate requests and their cached minimum.
#[derive(Debug, Clone)]
pub struct RateRegistry {
    requests: BTreeMap<String, RateRequest>,
    conservative: bool,
    effective: Rate,
}

impl Default for RateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RateRegistry {
    pub fn new() -> Self {
        Self {
            requests: BTreeMap::new(),
            conservative: false,
            effective: Rate::Never,
        }
    }

    /// Insert or replace the request registered under `name`.
    pub fn set_rate(&mut self, name: impl Into<String>, request: RateRequest) {
        let name = name.into();
        let sanitized = request.sanitized();
        if sanitized != request {
            warn!("rate source {name} asked for a zero period, using 1 ms");
        }
        self.requests.insert(name, sanitized);
        self.recompute();
    }

    /// Drop the request registered under `name`, if any.
    pub fn clear_rate(&mut self, name: &str) {
        if self.requests.remove(name).is_some() {
            self.recompute();
        }
    }

    pub fn get(&self, name: &str) -> Option<RateRequest> {
        self.requests.get(name).copied()
    }

    pub fn is_conservative(&self) -> bool {
        self.conservative
    }

    /// Switch between normal and conservative resolution of paired requests.
    pub fn set_conservative(&mut self, conservative: bool) {
        if self.conservative != conservative {
            self.conservative = conservative;
            self.recompute();
        }
    }

    pub fn effective_rate(&self) -> Rate {
        self.effective
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    fn recompute(&mut self) {
        let effective = self
            .requests
            .values()
            .map(|request| Rate::Every(request.resolve(self.conservative)))
            .min()
            .unwrap_or(Rate::Never);
        if effective != self.effective {
            debug!(
                "effective rate {:?} -> {:?} (conservative={})",
                self.effective, effective, self.conservative
            );
        }
        self.effective = effective;
    }
}
