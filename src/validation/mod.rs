// src/validation/mod.rs

//! Structural checks over states and quantum memory.
//!
//! None of these run on the hot path unless the VM is configured to validate
//! after each command.

use crate::core::{QuantumState, QvmError, Result};
use crate::simulation::QuantumMemory;
use std::collections::HashSet;

// Default tolerance values (can be overridden by caller)
const DEFAULT_NORM_TOLERANCE: f64 = 1e-9;

/// Checks if the state vector is normalized (sum of squared amplitudes ≈ 1.0).
///
/// Only meaningful after normalization; states are unnormalized while a
/// program runs.
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(QvmError::InvariantViolation)` otherwise.
pub fn check_normalization(state: &QuantumState, tolerance: Option<f64>) -> Result<()> {
    let effective_tolerance = tolerance.unwrap_or(DEFAULT_NORM_TOLERANCE);
    let norm_sq = state.norm_sqr();
    if (norm_sq - 1.0).abs() > effective_tolerance {
        Err(QvmError::invariant(format!(
            "state normalization failed: sum(|c_i|^2) = {} (deviation > {})",
            norm_sq, effective_tolerance
        )))
    } else {
        Ok(())
    }
}

/// Checks one state's buffer and offset against its qubit count.
pub fn check_state_shape(state: &QuantumState) -> Result<()> {
    let expected = 1usize << state.qubit_count();
    if state.dim() != expected {
        return Err(QvmError::DimensionMismatch { expected, actual: state.dim() });
    }
    let offset_ok = match state.qubit_count() {
        0 => state.cyclic_offset() == 0,
        n => state.cyclic_offset() < n,
    };
    if !offset_ok {
        return Err(QvmError::invariant(format!(
            "cyclic offset {} out of range for {} qubits",
            state.cyclic_offset(),
            state.qubit_count()
        )));
    }
    Ok(())
}

/// Checks the bookkeeping of a whole memory.
///
/// * every active group has as many ids as tensor factors and is non-empty
/// * no id appears twice, within or across groups
/// * the active count matches the occupied slots
pub fn check_memory(memory: &QuantumMemory) -> Result<()> {
    let mut seen = HashSet::new();
    let mut occupied = 0;
    for (slot, tangle) in memory.tangles() {
        occupied += 1;
        check_state_shape(tangle.state())?;
        if tangle.is_empty() {
            return Err(QvmError::invariant(format!("slot {} holds an empty tangle", slot.0)));
        }
        if tangle.len() != tangle.state().qubit_count() {
            return Err(QvmError::invariant(format!(
                "slot {} lists {} qubits for a {}-qubit state",
                slot.0,
                tangle.len(),
                tangle.state().qubit_count()
            )));
        }
        for &qubit in tangle.qubits() {
            if !seen.insert(qubit) {
                return Err(QvmError::DuplicateQubit { qubit });
            }
        }
    }
    if occupied != memory.active_count() {
        return Err(QvmError::invariant(format!(
            "active count {} but {} occupied slots",
            memory.active_count(),
            occupied
        )));
    }
    Ok(())
}
