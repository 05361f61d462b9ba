//! The simulation facade: clock, calendar, process table, and the dispatch
//! loop (`Run`) that ties them together.

use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, info, instrument, warn};

use crate::calendar::{Calendar, Clock, SimState};
use crate::error::{SimError, SimResult};
use crate::process::{Behavior, ProcState, Process, ProcessId, ProcessRecord};

/// A discrete-event simulation: owns the clock, the calendar, and the
/// process table. Behaviors run on their own OS threads and are driven
/// entirely by [`Simulation::run`].
pub struct Simulation {
    clock: Mutex<Clock>,
    calendar: Mutex<Calendar>,
    processes: Mutex<Vec<Arc<ProcessRecord>>>,
}

impl Simulation {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            clock: Mutex::new(Clock::new()),
            calendar: Mutex::new(Calendar::new()),
            processes: Mutex::new(Vec::new()),
        })
    }

    /// Validate and set `start`/`now`/`end`. Must be called exactly once,
    /// before `run`.
    #[instrument(skip(self))]
    pub fn init(&self, t0: f64, t1: f64) -> SimResult<()> {
        if t0 < 0.0 || t1 < 0.0 || t0 > t1 {
            return Err(SimError::InvalidArgs { t0, t1 });
        }
        let mut clock = self.clock.lock().unwrap();
        clock.start = t0;
        clock.now = t0;
        clock.end = t1;
        clock.state = SimState::Initialized;
        info!(t0, t1, "simulation initialized");
        Ok(())
    }

    pub fn now(&self) -> f64 {
        self.clock.lock().unwrap().now
    }

    pub fn start(&self) -> f64 {
        self.clock.lock().unwrap().start
    }

    pub fn end(&self) -> f64 {
        self.clock.lock().unwrap().end
    }

    /// Create a process with the given priority and behavior. The behavior
    /// is not started until the dispatcher reaches its first calendar
    /// entry. Returns the new process's stable `idx`.
    #[instrument(skip(self, behavior))]
    pub fn create_process<F>(self: &Arc<Self>, prio: i32, behavior: F) -> ProcessId
    where
        F: FnOnce(&Process) + Send + 'static,
    {
        let now = self.now();
        let mut table = self.processes.lock().unwrap();
        let idx = table.len();
        let record: Behavior = Box::new(behavior);
        table.push(Arc::new(ProcessRecord::new(idx, prio, record)));
        drop(table);
        self.schedule(idx, now, prio);
        debug!(idx, prio, atime = now, "process created");
        idx
    }

    pub(crate) fn process_record(&self, idx: ProcessId) -> Arc<ProcessRecord> {
        Arc::clone(&self.processes.lock().unwrap()[idx])
    }

    /// Insert (or re-insert) `idx` into the calendar at `atime`.
    pub(crate) fn schedule(&self, idx: ProcessId, atime: f64, prio: i32) {
        self.calendar.lock().unwrap().add_elem(idx, atime, prio);
    }

    /// The dispatch loop. Repeatedly removes the calendar head, advances
    /// `now` to its activation time, and hands control to that process
    /// until it yields or terminates. Terminates when the calendar empties
    /// or the next activation would be at or past `end`.
    #[instrument(skip(self))]
    pub fn run(self: &Arc<Self>) -> SimResult<()> {
        {
            let clock = self.clock.lock().unwrap();
            if clock.state != SimState::Initialized {
                return Err(SimError::NotInitialized);
            }
        }

        loop {
            let entry = { self.calendar.lock().unwrap().del_head() };
            let entry = match entry {
                Some(e) => e,
                None => break,
            };

            {
                let mut clock = self.clock.lock().unwrap();
                if entry.atime >= clock.end {
                    break;
                }
                clock.now = entry.atime;
            }

            let record = self.process_record(entry.idx);
            match record.state() {
                ProcState::Waking => {
                    record.set_running_and_signal();
                    let behavior = record.take_behavior();
                    let sim = Arc::clone(self);
                    let idx = entry.idx;
                    let prio = entry.prio;
                    let handle = thread::Builder::new()
                        .name(format!("sim-process-{idx}"))
                        .spawn(move || {
                            let ctx = Process { sim: Arc::clone(&sim), idx, prio };
                            behavior(&ctx);
                            ctx.quit();
                        })
                        .expect("failed to spawn process thread");
                    record.set_join_handle(handle);
                }
                ProcState::Stopped => {
                    record.set_running_and_signal();
                }
                ProcState::Dead => {
                    continue;
                }
                ProcState::Running => {
                    warn!(idx = entry.idx, "calendar entry for an already-running process");
                    continue;
                }
            }

            record.wait_for_yield();
        }

        {
            let mut clock = self.clock.lock().unwrap();
            clock.state = SimState::Terminated;
        }
        info!(now = self.now(), "simulation terminated");
        Ok(())
    }
}
