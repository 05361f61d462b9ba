//! The facility primitive: a single-server, mutually-exclusive resource
//! with a priority wait queue.

use std::sync::Mutex;

use crate::process::{Process, ProcessId};
use crate::queue::WaitQueue;

struct FacilityInner {
    busy: bool,
    holder: Option<ProcessId>,
    queue: WaitQueue,
}

/// A single-server resource. Create one per distinct resource in the
/// simulated system (e.g. a teller, a machine, a checkout lane).
pub struct Facility {
    name: String,
    inner: Mutex<FacilityInner>,
}

impl Facility {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(FacilityInner { busy: false, holder: None, queue: WaitQueue::new() }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_busy(&self) -> bool {
        self.inner.lock().unwrap().busy
    }

    pub fn holder(&self) -> Option<ProcessId> {
        self.inner.lock().unwrap().holder
    }

    pub fn queue_len(&self) -> usize {
        self.inner.lock().unwrap().queue.size()
    }

    /// If free, claim the facility and return immediately so the caller
    /// keeps running. Otherwise enqueue by priority and park until elected
    /// by a future `Release`.
    pub(crate) fn seize(&self, p: &Process) {
        {
            let mut inner = self.inner.lock().unwrap();
            if !inner.busy {
                inner.busy = true;
                inner.holder = Some(p.idx);
                return;
            }
            inner.queue.push(p.idx, p.prio);
        }
        p.park_until_rescheduled();
    }

    /// Release the facility. The caller is not suspended. If waiters are
    /// pending, the highest-priority one (FIFO among equals) is elected and
    /// re-scheduled into the calendar at the current virtual time; it does
    /// not resume inline, only when the dispatcher later gives it its turn.
    pub(crate) fn release(&self, p: &Process) {
        let elected = {
            let mut inner = self.inner.lock().unwrap();
            assert_eq!(
                inner.holder,
                Some(p.idx),
                "Release: process {} does not hold facility {:?}",
                p.idx,
                self.name
            );
            inner.busy = false;
            inner.holder = None;
            match inner.queue.pop() {
                Some(w) => {
                    inner.holder = Some(w.idx);
                    inner.busy = true;
                    Some(w)
                }
                None => None,
            }
        };
        if let Some(w) = elected {
            let now = p.sim.now();
            p.sim.schedule(w.idx, now, w.prio);
        }
    }
}
