//! Virtual one-shot and periodic timers keyed by wall-clock milliseconds.
//!
//! The watch runs a single cooperative event loop, so timers are plain data:
//! the owner asks for the next deadline, sleeps until then, and drains the due
//! entries with [`TimerTable::pop_due`]. Tests drive the same table with a
//! synthetic clock.

/// A timer that came due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fired<K> {
    pub key: K,
    /// When the timer was scheduled to fire (not when it was observed).
    pub deadline: i64,
    /// Repeat period for periodic timers.
    pub period: Option<u64>,
}

#[derive(Clone, Copy, Debug)]
struct Armed<K> {
    key: K,
    deadline: i64,
    period: Option<u64>,
}

/// At most one armed timer per key.
#[derive(Debug, Clone)]
pub struct TimerTable<K> {
    armed: Vec<Armed<K>>,
}

impl<K> Default for TimerTable<K> {
    fn default() -> Self {
        Self { armed: Vec::new() }
    }
}

impl<K: Copy + Eq> TimerTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot timer, replacing any timer with the same key.
    pub fn arm_once(&mut self, key: K, deadline: i64) {
        self.arm(Armed {
            key,
            deadline,
            period: None,
        });
    }

    /// Arm a periodic timer whose first deadline is `first`.
    pub fn arm_every(&mut self, key: K, first: i64, period: u64) {
        self.arm(Armed {
            key,
            deadline: first,
            period: Some(period.max(1)),
        });
    }

    fn arm(&mut self, timer: Armed<K>) {
        self.cancel(timer.key);
        self.armed.push(timer);
    }

    /// Returns true if a timer was armed under `key`.
    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.armed.len();
        self.armed.retain(|timer| timer.key != key);
        self.armed.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.armed.clear();
    }

    pub fn is_armed(&self, key: K) -> bool {
        self.armed.iter().any(|timer| timer.key == key)
    }

    pub fn deadline_of(&self, key: K) -> Option<i64> {
        self.armed
            .iter()
            .find(|timer| timer.key == key)
            .map(|timer| timer.deadline)
    }

    pub fn next_deadline(&self) -> Option<i64> {
        self.armed.iter().map(|timer| timer.deadline).min()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    /// Take the earliest timer due at `now`.
    ///
    /// One-shot timers are removed; periodic timers advance by one period from
    /// their previous deadline so they do not accumulate phase drift.
    pub fn pop_due(&mut self, now: i64) -> Option<Fired<K>> {
        let index = self
            .armed
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.deadline <= now)
            .min_by_key(|(_, timer)| timer.deadline)
            .map(|(index, _)| index)?;

        let timer = self.armed[index];
        match timer.period {
            Some(period) => self.armed[index].deadline += period as i64,
            None => {
                self.armed.swap_remove(index);
            }
        }
        Some(Fired {
            key: timer.key,
            deadline: timer.deadline,
            period: timer.period,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Key {
        A,
        B,
    }

    #[test]
    fn one_shot_fires_once() {
        let mut timers = TimerTable::new();
        timers.arm_once(Key::A, 100);
        assert_eq!(timers.pop_due(99), None);
        let fired = timers.pop_due(150).unwrap();
        assert_eq!(fired.key, Key::A);
        assert_eq!(fired.deadline, 100);
        assert_eq!(timers.pop_due(1_000), None);
        assert!(timers.is_empty());
    }

    #[test]
    fn periodic_advances_from_deadline_not_from_now() {
        let mut timers = TimerTable::new();
        timers.arm_every(Key::A, 1_000, 1_000);
        let fired = timers.pop_due(1_037).unwrap();
        assert_eq!(fired.deadline, 1_000);
        assert_eq!(timers.deadline_of(Key::A), Some(2_000));
    }

    #[test]
    fn earliest_timer_pops_first() {
        let mut timers = TimerTable::new();
        timers.arm_once(Key::B, 300);
        timers.arm_once(Key::A, 200);
        assert_eq!(timers.next_deadline(), Some(200));
        assert_eq!(timers.pop_due(500).unwrap().key, Key::A);
        assert_eq!(timers.pop_due(500).unwrap().key, Key::B);
    }

    #[test]
    fn rearming_replaces_existing_key() {
        let mut timers = TimerTable::new();
        timers.arm_once(Key::A, 100);
        timers.arm_once(Key::A, 400);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.deadline_of(Key::A), Some(400));
        assert!(timers.cancel(Key::A));
        assert!(!timers.cancel(Key::A));
    }
}
