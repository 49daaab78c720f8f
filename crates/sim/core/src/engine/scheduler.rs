//! Time-ordered callback queue.
//!
//! The scheduler knows nothing about auras or spells; it stores opaque
//! payloads keyed by `(time, sequence)`. The sequence number is assigned at
//! registration, so payloads sharing a timestamp pop in the order they were
//! scheduled.

use std::collections::BTreeMap;

use crate::types::SimTime;

/// Handle to a scheduled payload, used for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventHandle {
    at: SimTime,
    seq: u64,
}

impl EventHandle {
    /// Time at which the payload is (or was) due.
    pub fn at(&self) -> SimTime {
        self.at
    }
}

/// Ordered queue driving simulated time forward.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: SimTime,
    next_seq: u64,
    queue: BTreeMap<(SimTime, u64), T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: SimTime::ZERO,
            next_seq: 0,
            queue: BTreeMap::new(),
        }
    }

    /// Current simulated time: the timestamp of the last popped payload.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Queues `payload` at `at`. Times in the past are clamped to `now`.
    pub fn schedule(&mut self, at: SimTime, payload: T) -> EventHandle {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((at, seq), payload);
        EventHandle { at, seq }
    }

    /// Removes a pending payload. Fired or already-cancelled handles are a no-op.
    pub fn cancel(&mut self, handle: EventHandle) -> Option<T> {
        self.queue.remove(&(handle.at, handle.seq))
    }

    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.queue.contains_key(&(handle.at, handle.seq))
    }

    /// Timestamp of the next payload without consuming it.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.first_key_value().map(|(&(at, _), _)| at)
    }

    /// Pops the earliest payload and advances `now` to its timestamp.
    pub fn pop_next(&mut self) -> Option<(SimTime, T)> {
        let ((at, _), payload) = self.queue.pop_first()?;
        self.now = at;
        Some((at, payload))
    }

    /// Moves `now` forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, at: SimTime) {
        self.now = self.now.max(at);
    }

    /// Drops every pending payload and rewinds the clock.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.now = SimTime::ZERO;
        self.next_seq = 0;
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pops_in_time_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(SimTime::from_millis(300), "c");
        scheduler.schedule(SimTime::from_millis(100), "a");
        scheduler.schedule(SimTime::from_millis(200), "b");

        let order: Vec<_> = std::iter::from_fn(|| scheduler.pop_next().map(|(_, p)| p)).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(scheduler.now(), SimTime::from_millis(300));
    }

    #[test]
    fn same_timestamp_keeps_registration_order() {
        let mut scheduler = Scheduler::new();
        let at = SimTime::from_millis(1000);
        for i in 0..5 {
            scheduler.schedule(at, i);
        }
        let order: Vec<_> = std::iter::from_fn(|| scheduler.pop_next().map(|(_, p)| p)).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(SimTime::from_millis(10), ());
        assert!(scheduler.is_pending(handle));
        assert_eq!(scheduler.cancel(handle), Some(()));
        assert_eq!(scheduler.cancel(handle), None);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancelling_fired_handle_is_noop() {
        let mut scheduler = Scheduler::new();
        let fired = scheduler.schedule(SimTime::from_millis(10), 1);
        let pending = scheduler.schedule(SimTime::from_millis(20), 2);
        scheduler.pop_next();
        assert_eq!(scheduler.cancel(fired), None);
        assert!(scheduler.is_pending(pending));
    }

    #[test]
    fn past_times_clamp_to_now() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(SimTime::from_millis(500), "first");
        scheduler.pop_next();
        let handle = scheduler.schedule(SimTime::from_millis(100), "late");
        assert_eq!(handle.at(), SimTime::from_millis(500));
    }

    proptest! {
        #[test]
        fn pop_order_is_sorted_and_stable(times in proptest::collection::vec(0u64..50, 1..64)) {
            let mut scheduler = Scheduler::new();
            for (i, t) in times.iter().enumerate() {
                scheduler.schedule(SimTime::from_millis(*t), i);
            }
            let mut popped = Vec::new();
            while let Some((at, i)) = scheduler.pop_next() {
                popped.push((at, i));
            }
            let mut expected: Vec<_> = times
                .iter()
                .enumerate()
                .map(|(i, t)| (SimTime::from_millis(*t), i))
                .collect();
            expected.sort();
            prop_assert_eq!(popped, expected);
        }
    }
}
