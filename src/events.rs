//! Hardware event payloads and the subscription set.
//!
//! Events arrive from the host (or from a script in the simulator) and are
//! routed through `Watch::handle`. A subscription only gates delivery: an
//! event whose kind is not subscribed is dropped before any handler runs.

use crate::gesture::PointerEvent;
use crate::orientation::AccelSample;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    LockState,
    ChargingState,
    FaceUp,
    Twist,
    Pointer,
    DisplayPower,
    Accel,
    Battery,
    HrmPower,
}

/// An event from the device.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "camelCase")]
pub enum Event {
    LockState(bool),
    ChargingState(bool),
    /// True while the screen faces up.
    FaceUp(bool),
    Twist,
    Pointer(PointerEvent),
    DisplayPower(bool),
    Accel(AccelSample),
    /// Battery charge in percent.
    Battery(u8),
    HrmPower(bool),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::LockState(_) => EventKind::LockState,
            Event::ChargingState(_) => EventKind::ChargingState,
            Event::FaceUp(_) => EventKind::FaceUp,
            Event::Twist => EventKind::Twist,
            Event::Pointer(_) => EventKind::Pointer,
            Event::DisplayPower(_) => EventKind::DisplayPower,
            Event::Accel(_) => EventKind::Accel,
            Event::Battery(_) => EventKind::Battery,
            Event::HrmPower(_) => EventKind::HrmPower,
        }
    }
}

/// Event kinds the clock listens to while running.
pub const CLOCK_EVENTS: [EventKind; 8] = [
    EventKind::LockState,
    EventKind::ChargingState,
    EventKind::FaceUp,
    EventKind::Twist,
    EventKind::Pointer,
    EventKind::DisplayPower,
    EventKind::Battery,
    EventKind::HrmPower,
];

#[derive(Clone, Debug, Default)]
pub struct Subscriptions {
    kinds: BTreeSet<EventKind>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if already subscribed.
    pub fn subscribe(&mut self, kind: EventKind) -> bool {
        self.kinds.insert(kind)
    }

    /// Returns false if not subscribed.
    pub fn unsubscribe(&mut self, kind: EventKind) -> bool {
        self.kinds.remove(&kind)
    }

    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn clear(&mut self) {
        self.kinds.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.kinds.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_use_adjacent_tagging() {
        let json = serde_json::to_string(&Event::FaceUp(false)).unwrap();
        assert_eq!(json, r#"{"type":"faceUp","content":false}"#);

        let parsed: Event =
            serde_json::from_str(r#"{"type":"pointer","content":{"x":90,"y":20,"pressed":true}}"#)
                .unwrap();
        assert_eq!(parsed, Event::Pointer(PointerEvent::down(90, 20)));

        let twist: Event = serde_json::from_str(r#"{"type":"twist"}"#).unwrap();
        assert_eq!(twist.kind(), EventKind::Twist);
    }

    #[test]
    fn subscriptions_track_membership() {
        let mut subs = Subscriptions::new();
        assert!(subs.subscribe(EventKind::Accel));
        assert!(!subs.subscribe(EventKind::Accel));
        assert!(subs.is_subscribed(EventKind::Accel));
        assert!(subs.unsubscribe(EventKind::Accel));
        assert!(!subs.unsubscribe(EventKind::Accel));

        for kind in CLOCK_EVENTS {
            subs.subscribe(kind);
        }
        assert_eq!(subs.iter().count(), CLOCK_EVENTS.len());
        subs.clear();
        assert_eq!(subs.iter().count(), 0);
    }
}
