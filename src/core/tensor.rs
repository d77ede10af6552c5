// src/core/tensor.rs

//! Kronecker product of two independent states.

use super::constants::mbqc_constants::PARALLEL_MIN_LEN;
use super::error::{QvmError, Result};
use super::state::QuantumState;
use num_complex::Complex;
use num_traits::Zero;
use rayon::prelude::*;

/// Joins two states into `a ⊗ b`.
///
/// Both inputs must be aligned (cyclic offset 0). The factors of `a` become
/// the high-order factors of the result, so the joint qubit ordering is `a`'s
/// ordering followed by `b`'s. Block `i` of the output is `b` scaled by
/// `a[i]`; blocks are filled in parallel.
pub fn combine(a: &QuantumState, b: &QuantumState) -> Result<QuantumState> {
    if a.cyclic_offset() != 0 || b.cyclic_offset() != 0 {
        return Err(QvmError::invariant(format!(
            "tensor product needs aligned inputs, got offsets {} and {}",
            a.cyclic_offset(),
            b.cyclic_offset()
        )));
    }
    let block = b.dim();
    let mut joint = vec![Complex::zero(); a.dim() * block];
    let rhs = b.amplitudes();
    joint
        .par_chunks_mut(block)
        .with_min_len((PARALLEL_MIN_LEN / block).max(1))
        .zip(a.amplitudes().par_iter())
        .for_each(|(out, &scale)| {
            for (o, &amp) in out.iter_mut().zip(rhs) {
                *o = scale * amp;
            }
        });
    QuantumState::from_amplitudes(a.qubit_count() + b.qubit_count(), joint)
}
