//! A discrete-event, process-oriented simulation kernel in the tradition of
//! SIMULA/SIMSCRIPT.
//!
//! The kernel advances a virtual clock by repeatedly selecting the process
//! whose next scheduled activation is earliest, running it until it
//! voluntarily yields (by blocking on a resource or requesting a timed
//! delay), and repeating until the clock reaches a configured horizon or
//! the schedule empties. Four pieces make this work: the [`calendar`]
//! (internal) event list, the [`process`] runtime's rendezvous protocol, the
//! [`facility`] single-server resource, and the [`store`] multi-unit
//! capacity resource.
//!
//! ```
//! use simkernel::Simulation;
//!
//! let sim = Simulation::new();
//! sim.init(0.0, 10.0).unwrap();
//! sim.create_process(0, |ctx| {
//!     ctx.wait(3.0);
//!     ctx.quit();
//! });
//! sim.run().unwrap();
//! assert_eq!(sim.now(), 3.0);
//! ```

mod calendar;
pub mod error;
pub mod facility;
mod kernel;
pub mod process;
mod queue;
pub mod store;

pub use error::{SimError, SimResult};
pub use facility::Facility;
pub use kernel::Simulation;
pub use process::{Process, ProcessId};
pub use store::Store;

use tracing::{info, instrument};

/// Install a process-wide tracing subscriber that reads `RUST_LOG` and
/// writes to stderr. Convenience for binaries embedding this kernel; the
/// library itself never initializes a subscriber on its own.
#[instrument]
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("simkernel tracing initialized");
}
