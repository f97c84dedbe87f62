//! Screen rotation and conservative power mode from motion sensors.
//!
//! Rotation only matters while the watch sits on its charger, where it may be
//! propped up at any angle. Off the charger the face stays upright.

use log::debug;
use serde::{Deserialize, Serialize};

/// Below this |z| (in g) the watch is standing on an edge rather than lying flat.
pub const FLAT_THRESHOLD_G: f32 = 0.85;

/// Quarter-turn screen rotations, clockwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Upright,
    Clockwise,
    Inverted,
    CounterClockwise,
}

impl Rotation {
    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::Upright => 0,
            Rotation::Clockwise => 1,
            Rotation::Inverted => 2,
            Rotation::CounterClockwise => 3,
        }
    }
}

/// One accelerometer reading, in g.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccelSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AccelSample {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Map a reading to the rotation that keeps the dial upright for the viewer.
pub fn rotation_for(sample: AccelSample) -> Rotation {
    if sample.z.abs() >= FLAT_THRESHOLD_G {
        return Rotation::Upright;
    }
    if sample.y.abs() > sample.x.abs() {
        if sample.y < 0.0 {
            Rotation::Upright
        } else {
            Rotation::Inverted
        }
    } else if sample.x > 0.0 {
        Rotation::Clockwise
    } else {
        Rotation::CounterClockwise
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrientationPolicy {
    charging: bool,
    autorotate: bool,
    attitude: Rotation,
    conservative: bool,
}

impl OrientationPolicy {
    pub fn new(autorotate: bool) -> Self {
        Self {
            autorotate,
            ..Self::default()
        }
    }

    pub fn set_charging(&mut self, charging: bool) {
        self.charging = charging;
    }

    pub fn is_charging(&self) -> bool {
        self.charging
    }

    pub fn set_autorotate(&mut self, autorotate: bool) {
        self.autorotate = autorotate;
    }

    /// The accelerometer is only worth listening to while rotation can apply.
    pub fn wants_accel(&self) -> bool {
        self.charging
    }

    /// Rotation to apply for this reading, honouring charging and auto-rotate.
    pub fn rotation(&self, sample: AccelSample) -> Rotation {
        if self.autorotate && self.charging {
            rotation_for(sample)
        } else {
            Rotation::Upright
        }
    }

    /// Rotation applied at the last full refresh.
    pub fn attitude(&self) -> Rotation {
        self.attitude
    }

    pub fn set_attitude(&mut self, attitude: Rotation) {
        self.attitude = attitude;
    }

    /// True when the reading calls for a different rotation than the screen has.
    pub fn observe(&self, sample: AccelSample) -> bool {
        self.rotation(sample) != self.attitude
    }

    /// Face-down means conservative. Returns true if the flag flipped.
    pub fn face_up(&mut self, up: bool) -> bool {
        let conservative = !up;
        let changed = conservative != self.conservative;
        if changed {
            debug!("conservative mode {}", conservative);
        }
        self.conservative = conservative;
        changed
    }

    pub fn is_conservative(&self) -> bool {
        self.conservative
    }
}
