//! Process records and the rendezvous protocol that lets the dispatcher and
//! a process's behavior ping-pong control back and forth.
//!
//! The source recovers the currently-executing process by scanning the
//! process table for a matching thread handle (`CURRENT()`). We instead pass
//! an explicit context handle — [`Process`] — into every behavior and
//! resource operation, per the design notes' preferred alternative.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use crate::facility::Facility;
use crate::kernel::Simulation;
use crate::store::Store;

/// Stable index assigned at process creation, never reused while the
/// process is live.
pub type ProcessId = usize;

/// A process's behavior: the function it runs once activated, given a
/// handle through which it can call back into the kernel.
pub(crate) type Behavior = Box<dyn FnOnce(&Process) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcState {
    Waking,
    Running,
    Stopped,
    Dead,
}

pub(crate) struct Rendezvous {
    state: ProcState,
    join: Option<JoinHandle<()>>,
}

/// One per simulated process, living for the lifetime of the `Simulation`
/// in a dense, append-only table indexed by `idx` (arena + index pattern,
/// so the calendar and resource queues can refer to a process without
/// sharing ownership of it).
pub(crate) struct ProcessRecord {
    pub idx: ProcessId,
    pub prio: i32,
    behavior: Mutex<Option<Behavior>>,
    rendez: Mutex<Rendezvous>,
    cond: Condvar,
}

impl ProcessRecord {
    pub fn new(idx: ProcessId, prio: i32, behavior: Behavior) -> Self {
        Self {
            idx,
            prio,
            behavior: Mutex::new(Some(behavior)),
            rendez: Mutex::new(Rendezvous { state: ProcState::Waking, join: None }),
            cond: Condvar::new(),
        }
    }

    pub fn take_behavior(&self) -> Behavior {
        self.behavior
            .lock()
            .unwrap()
            .take()
            .expect("dispatcher tried to start a process with no behavior left to run")
    }

    pub fn state(&self) -> ProcState {
        self.rendez.lock().unwrap().state
    }

    pub fn set_running_and_signal(&self) {
        let mut r = self.rendez.lock().unwrap();
        r.state = ProcState::Running;
        self.cond.notify_one();
    }

    pub fn set_join_handle(&self, handle: JoinHandle<()>) {
        self.rendez.lock().unwrap().join = Some(handle);
    }

    /// Block until the behavior yields (`Stopped`) or terminates (`Dead`).
    /// If it terminated, join its thread and return `true`.
    pub fn wait_for_yield(&self) -> bool {
        let rendez = self.rendez.lock().unwrap();
        let mut rendez = self.cond.wait_while(rendez, |r| r.state == ProcState::Running).unwrap();
        if rendez.state == ProcState::Dead {
            if let Some(handle) = rendez.join.take() {
                drop(rendez);
                let _ = handle.join();
            }
            true
        } else {
            false
        }
    }

    /// Suspend the current process's behavior: mark it `Stopped`, wake the
    /// dispatcher, then park until the dispatcher marks it `Running` again.
    /// Used by `Wait`, a blocking `Seize`, and a blocking `Enter`.
    pub fn park_until_rescheduled(&self) {
        let rendez = self.rendez.lock().unwrap();
        let mut rendez = rendez;
        rendez.state = ProcState::Stopped;
        self.cond.notify_one();
        let rendez = self.cond.wait_while(rendez, |r| r.state != ProcState::Running).unwrap();
        drop(rendez);
    }

    /// Mark this process `Dead` and wake the dispatcher. Idempotent.
    pub fn mark_dead_and_signal(&self) {
        let mut rendez = self.rendez.lock().unwrap();
        if rendez.state == ProcState::Dead {
            return;
        }
        rendez.state = ProcState::Dead;
        self.cond.notify_one();
    }
}

/// The handle a behavior uses to talk to the kernel: request a timed wait,
/// seize/release a facility, enter/leave a store, or quit.
pub struct Process {
    pub(crate) sim: Arc<Simulation>,
    pub(crate) idx: ProcessId,
    pub(crate) prio: i32,
}

impl Process {
    /// This process's stable index.
    pub fn id(&self) -> ProcessId {
        self.idx
    }

    /// This process's priority.
    pub fn prio(&self) -> i32 {
        self.prio
    }

    /// The current virtual clock value.
    pub fn now(&self) -> f64 {
        self.sim.now()
    }

    /// Suspend for `dt` units of virtual time. `dt` must be non-negative.
    pub fn wait(&self, dt: f64) {
        assert!(dt >= 0.0, "Wait: dt must be non-negative, got {dt}");
        let record = self.sim.process_record(self.idx);
        let new_atime = self.sim.now() + dt;
        self.sim.schedule(self.idx, new_atime, self.prio);
        record.park_until_rescheduled();
    }

    /// Terminate this process. Safe to call more than once; the dispatcher
    /// also calls this automatically after a behavior returns without
    /// calling it explicitly, so no thread is ever leaked by omission.
    pub fn quit(&self) {
        self.sim.process_record(self.idx).mark_dead_and_signal();
    }

    /// Seize `fac`, blocking until it becomes available.
    pub fn seize(&self, fac: &Facility) {
        fac.seize(self);
    }

    /// Release `fac`, which this process must currently hold.
    pub fn release(&self, fac: &Facility) {
        fac.release(self);
    }

    /// Request `cap` units from `store`, blocking until they are granted.
    pub fn enter(&self, store: &Store, cap: u32) {
        store.enter(self, cap);
    }

    /// Return `cap` units to `store`.
    pub fn leave(&self, store: &Store, cap: u32) {
        store.leave(self, cap);
    }

    pub(crate) fn park_until_rescheduled(&self) {
        self.sim.process_record(self.idx).park_until_rescheduled();
    }
}
