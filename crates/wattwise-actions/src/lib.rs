//! Action lifecycle engine: persistence, execution, revert, and the
//! savings ledger.
//!
//! Proposals accepted by the optimizer are stored as action documents and
//! driven through the propose → execute → revert state machine. The store
//! is an abstract trait with redb (persistent) and in-memory
//! implementations chosen once at startup; the status guard is an atomic
//! compare-and-set on the store, never a read-then-write pair.

pub mod error;
pub mod executor;
pub mod service;
pub mod store;

pub use error::{Error, Result};
pub use executor::{CommandOutcome, DeviceCommander, SimulatedCommander};
pub use service::{ActionSavings, ActionService, ExecutionOutcome, RevertOutcome};
pub use store::{ActionStore, StatusUpdate};

#[cfg(feature = "memory")]
pub use store::memory::MemoryActionStore;

#[cfg(feature = "redb")]
pub use store::redb::RedbActionStore;
