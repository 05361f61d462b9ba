//! The event list (calendar) and the virtual clock it drives.
//!
//! Entries are ordered by `(atime ASC, prio DESC)`. Ties in both fields
//! preserve insertion order ("new goes after old"), matching the source's
//! ordering predicate so that priority-tied, time-tied scenarios stay
//! deterministic (see the facility-contention scenario in the test suite).
//!
//! Unlike the source, which walks a linked list and skips a successor with
//! a duplicate `idx`, this implementation enforces "at most one entry per
//! `idx`" directly: `add_elem` removes any existing entry for `idx` before
//! inserting the new one. This is the re-architecture the design notes
//! suggest rather than a literal port of the skip-during-traversal logic.

use crate::process::ProcessId;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SimState {
    Start,
    Initialized,
    Terminated,
}

#[derive(Debug)]
pub(crate) struct Clock {
    pub start: f64,
    pub end: f64,
    pub now: f64,
    pub state: SimState,
}

impl Clock {
    pub fn new() -> Self {
        Self { start: 0.0, end: 0.0, now: 0.0, state: SimState::Start }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CalendarEntry {
    pub idx: ProcessId,
    pub atime: f64,
    pub prio: i32,
}

#[derive(Debug, Default)]
pub(crate) struct Calendar {
    entries: VecDeque<CalendarEntry>,
}

impl Calendar {
    pub fn new() -> Self {
        Self { entries: VecDeque::new() }
    }

    /// Insert (or re-insert) `idx` at the position that keeps the sequence
    /// ordered by `(atime ASC, prio DESC)`, ties broken in favor of whatever
    /// was already there.
    pub fn add_elem(&mut self, idx: ProcessId, atime: f64, prio: i32) {
        if let Some(pos) = self.entries.iter().position(|e| e.idx == idx) {
            self.entries.remove(pos);
        }
        let pos = self
            .entries
            .iter()
            .position(|act| atime < act.atime || (atime == act.atime && prio > act.prio));
        let entry = CalendarEntry { idx, atime, prio };
        match pos {
            Some(i) => self.entries.insert(i, entry),
            None => self.entries.push_back(entry),
        }
    }

    pub fn get_head(&self) -> Option<&CalendarEntry> {
        self.entries.front()
    }

    pub fn del_head(&mut self) -> Option<CalendarEntry> {
        self.entries.pop_front()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn entries(&self) -> impl Iterator<Item = &CalendarEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_atime_then_priority() {
        let mut cal = Calendar::new();
        cal.add_elem(0, 5.0, 0);
        cal.add_elem(1, 3.0, 0);
        cal.add_elem(2, 3.0, 5);
        // atime=3 entries come first; among them prio=5 outranks prio=0
        let order: Vec<_> = cal.entries().map(|e| e.idx).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn equal_atime_and_priority_keeps_insertion_order() {
        let mut cal = Calendar::new();
        cal.add_elem(0, 1.0, 0);
        cal.add_elem(1, 1.0, 0);
        let order: Vec<_> = cal.entries().map(|e| e.idx).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn re_adding_an_idx_replaces_its_old_entry() {
        let mut cal = Calendar::new();
        cal.add_elem(0, 1.0, 0);
        cal.add_elem(0, 10.0, 0);
        assert_eq!(cal.size(), 1);
        assert_eq!(cal.get_head().unwrap().atime, 10.0);
    }

    #[test]
    fn del_head_removes_and_returns_the_earliest_entry() {
        let mut cal = Calendar::new();
        cal.add_elem(0, 2.0, 0);
        cal.add_elem(1, 1.0, 0);
        let head = cal.del_head().unwrap();
        assert_eq!(head.idx, 1);
        assert_eq!(cal.size(), 1);
    }

    #[test]
    fn adjacent_pair_invariant_holds_after_many_inserts() {
        let mut cal = Calendar::new();
        for (idx, (atime, prio)) in
            [(4.0, 1), (2.0, 3), (2.0, 1), (4.0, 0), (0.0, 0)].into_iter().enumerate()
        {
            cal.add_elem(idx, atime, prio);
        }
        let entries: Vec<_> = cal.entries().cloned().collect();
        for w in entries.windows(2) {
            let (a, b) = (w[0], w[1]);
            assert!(a.atime < b.atime || (a.atime == b.atime && a.prio >= b.prio));
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// For any sequence of insertions (each against a fresh idx, so no
        /// replacement occurs), every adjacent pair in the resulting calendar
        /// satisfies atime strictly increasing, or equal atime with
        /// non-increasing priority.
        #[test]
        fn adjacent_pair_invariant(
            inserts in prop::collection::vec((0.0f64..50.0, -10i32..10), 0..64)
        ) {
            let mut cal = Calendar::new();
            for (idx, (atime, prio)) in inserts.iter().enumerate() {
                cal.add_elem(idx, *atime, *prio);
            }
            let entries: Vec<_> = cal.entries().cloned().collect();
            for w in entries.windows(2) {
                let (a, b) = (w[0], w[1]);
                prop_assert!(a.atime < b.atime || (a.atime == b.atime && a.prio >= b.prio));
            }
            prop_assert_eq!(entries.len(), inserts.len());
        }

        /// Re-inserting an already-present idx never grows the calendar and
        /// always leaves exactly the most recent (atime, prio) for that idx.
        #[test]
        fn reinsertion_keeps_one_entry_per_idx(
            atime1 in 0.0f64..50.0, prio1 in -10i32..10,
            atime2 in 0.0f64..50.0, prio2 in -10i32..10,
        ) {
            let mut cal = Calendar::new();
            cal.add_elem(0, atime1, prio1);
            cal.add_elem(0, atime2, prio2);
            prop_assert_eq!(cal.size(), 1);
            let head = cal.get_head().unwrap();
            prop_assert_eq!(head.atime, atime2);
            prop_assert_eq!(head.prio, prio2);
        }
    }
}
