// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod state;
pub mod permutation;
pub mod tensor;

pub use error::{QvmError, QubitId, Result};
pub use state::QuantumState;
pub use tensor::combine;

pub mod constants;
pub use constants::mbqc_constants::PI;
