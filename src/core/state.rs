// src/core/state.rs

use super::constants::mbqc_constants::{PARALLEL_MIN_LEN, PLUS_STATE, CZ_PLUS_PLUS_STATE};
use super::error::{QvmError, Result};
use super::permutation::{inverse_rotation, rotated_index, rotation_to_back};
use num_complex::Complex;
use num_traits::Zero;
use rayon::prelude::*;
use std::fmt;

/// Dense amplitude buffer of one entanglement group.
///
/// Holds `2^qubit_count` complex amplitudes. Tensor factor 0 is the most
/// significant bit of an index. `cyclic_offset` records how far the physical
/// factor order is right-rotated from the order the group was built in, so
/// the group can be brought back to that order before it is combined with
/// another one.
///
/// Amplitudes are left unnormalized while the program runs; call
/// [`QuantumState::normalize`] once at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantumState {
    qubit_count: usize,
    cyclic_offset: usize,
    amplitudes: Vec<Complex<f64>>,
}

impl QuantumState {
    /// Allocates a zero-filled state over `qubit_count` qubits.
    pub fn zeroed(qubit_count: usize) -> Self {
        Self {
            qubit_count,
            cyclic_offset: 0,
            amplitudes: vec![Complex::zero(); 1usize << qubit_count],
        }
    }

    /// Wraps an existing amplitude vector, checking its length.
    pub fn from_amplitudes(qubit_count: usize, amplitudes: Vec<Complex<f64>>) -> Result<Self> {
        let expected = 1usize << qubit_count;
        if amplitudes.len() != expected {
            return Err(QvmError::DimensionMismatch { expected, actual: amplitudes.len() });
        }
        Ok(Self { qubit_count, cyclic_offset: 0, amplitudes })
    }

    /// A single qubit in `|+⟩`.
    pub fn plus() -> Self {
        Self { qubit_count: 1, cyclic_offset: 0, amplitudes: PLUS_STATE.to_vec() }
    }

    /// Two qubits in `CZ|+⟩|+⟩`.
    pub fn cz_plus_plus() -> Self {
        Self { qubit_count: 2, cyclic_offset: 0, amplitudes: CZ_PLUS_PLUS_STATE.to_vec() }
    }

    /// Number of tensor factors.
    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    pub fn cyclic_offset(&self) -> usize {
        self.cyclic_offset
    }

    /// Read-only view of the amplitude buffer.
    pub fn amplitudes(&self) -> &[Complex<f64>] {
        &self.amplitudes
    }

    pub(crate) fn amplitudes_mut(&mut self) -> &mut [Complex<f64>] {
        &mut self.amplitudes
    }

    /// Number of amplitudes, always `2^qubit_count`.
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// Sum of squared amplitude magnitudes.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.par_iter().with_min_len(PARALLEL_MIN_LEN).map(|a| a.norm_sqr()).sum()
    }

    /// Rescales the buffer to unit norm. A zero buffer is left as is.
    pub fn normalize(&mut self) {
        let norm = self.norm_sqr().sqrt();
        if norm > 0.0 {
            self.amplitudes
                .par_iter_mut()
                .with_min_len(PARALLEL_MIN_LEN)
                .for_each(|a| *a /= norm);
        }
    }

    /// Rotates the factor order right by `r`.
    ///
    /// A rotation that is a multiple of `qubit_count` returns `self`
    /// untouched, without allocating. Otherwise a new buffer is filled and
    /// the old one is dropped.
    pub fn rotate(self, r: usize) -> Self {
        let n = self.qubit_count;
        if n == 0 || r % n == 0 {
            return self;
        }
        let r = r % n;
        let back = inverse_rotation(r, n);
        let old = self.amplitudes;
        let mut rotated = vec![Complex::zero(); old.len()];
        // gather: new[rotated_index(i, r)] = old[i]
        rotated
            .par_iter_mut()
            .with_min_len(PARALLEL_MIN_LEN)
            .enumerate()
            .for_each(|(j, amp)| *amp = old[rotated_index(j, back, n)]);
        Self {
            qubit_count: n,
            cyclic_offset: (self.cyclic_offset + r) % n,
            amplitudes: rotated,
        }
    }

    /// Brings physical factor `position` to the least significant bit.
    ///
    /// Returns the rotation that was applied so the owner can rotate its
    /// qubit ordering by the same amount.
    pub fn shift_to_back(self, position: usize) -> Result<(Self, usize)> {
        if position >= self.qubit_count {
            return Err(QvmError::invariant(format!(
                "factor {} does not exist in a {}-qubit state",
                position, self.qubit_count
            )));
        }
        let r = rotation_to_back(self.qubit_count, position);
        Ok((self.rotate(r), r))
    }

    /// Rotates back to the construction order (offset 0).
    pub fn align(self) -> (Self, usize) {
        let r = inverse_rotation(self.cyclic_offset, self.qubit_count);
        (self.rotate(r), r)
    }

    /// Replaces the buffer after the last factor was projected out.
    ///
    /// The measured factor sat at the back, so the remaining factors keep
    /// their cyclic order and only the offset needs folding into the smaller
    /// ring.
    pub(crate) fn with_back_factor_removed(&self, amplitudes: Vec<Complex<f64>>) -> Result<Self> {
        if self.qubit_count == 0 {
            return Err(QvmError::invariant("cannot remove a factor from an empty state"));
        }
        let qubit_count = self.qubit_count - 1;
        let expected = 1usize << qubit_count;
        if amplitudes.len() != expected {
            return Err(QvmError::DimensionMismatch { expected, actual: amplitudes.len() });
        }
        let cyclic_offset = if qubit_count == 0 { 0 } else { self.cyclic_offset % qubit_count };
        Ok(Self { qubit_count, cyclic_offset, amplitudes })
    }
}

impl fmt::Display for QuantumState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, amp) in self.amplitudes.iter().enumerate() {
            writeln!(
                f,
                " {:.6} {:+.6}i|{:0width$b}> ({:e})",
                amp.re,
                amp.im,
                index,
                amp.norm(),
                width = self.qubit_count.max(1)
            )?;
        }
        Ok(())
    }
}
