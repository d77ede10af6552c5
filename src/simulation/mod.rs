// src/simulation/mod.rs

//! Entanglement bookkeeping for a measurement program.
//!
//! [`QuantumMemory`] owns every live [`Tangle`] in a slot table and keeps the
//! invariant that each qubit id appears in exactly one group. Measurement
//! outcomes go into a [`SignalStore`]; [`MemorySnapshot`] is the read-only
//! view handed to callers after a run.

pub mod engine;
mod results;
mod signals;
pub mod tangle;

pub use engine::{QuantumMemory, SlotId};
pub use results::{MemorySnapshot, TangleSnapshot};
pub use signals::SignalStore;
pub use tangle::Tangle;
