// src/operations/mod.rs

//! Amplitude kernels for the three MBQC primitives.
//!
//! Single-qubit kernels and the measurement fold expect their target at the
//! least significant bit; the owning group rotates it there first with
//! [`QuantumState::shift_to_back`]. Controlled-Z works on any two factors
//! in place. Every kernel is a map over disjoint amplitude indices and runs
//! on the rayon pool.

use crate::core::constants::mbqc_constants::PARALLEL_MIN_LEN;
use crate::core::permutation::factor_bit;
use crate::core::{QuantumState, QubitId, QvmError, Result};
use num_complex::Complex;
use rand::RngExt;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

/// Pauli corrections a program can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pauli {
    /// Computational-basis bit flip.
    X,
    /// Phase flip of the `|1⟩` component.
    Z,
}

impl Pauli {
    /// Applies the correction to the least significant factor of `state`.
    pub fn apply_at_back(self, state: &mut QuantumState) {
        if state.qubit_count() == 0 {
            return;
        }
        let pairs = state.amplitudes_mut().par_chunks_mut(2).with_min_len(PARALLEL_MIN_LEN / 2);
        match self {
            Pauli::X => pairs.for_each(|pair| pair.swap(0, 1)),
            Pauli::Z => pairs.for_each(|pair| pair[1] = -pair[1]),
        }
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pauli::X => write!(f, "X"),
            Pauli::Z => write!(f, "Z"),
        }
    }
}

/// Controlled-Z between physical factors `first` and `second`.
///
/// Negates every amplitude whose index has both factor bits set. When the
/// pair occupies the two lowest bits that is every fourth amplitude, which
/// is handled without inspecting indices.
pub fn controlled_z(state: &mut QuantumState, first: usize, second: usize) -> Result<()> {
    let n = state.qubit_count();
    if first == second || first >= n || second >= n {
        return Err(QvmError::invariant(format!(
            "controlled-Z needs two distinct factors of a {}-qubit state, got {} and {}",
            n, first, second
        )));
    }
    let amps = state.amplitudes_mut();
    if first.min(second) == n - 2 && first.max(second) == n - 1 {
        amps.par_chunks_mut(4)
            .with_min_len(PARALLEL_MIN_LEN / 4)
            .for_each(|quad| quad[3] = -quad[3]);
    } else {
        let mask = factor_bit(n, first) | factor_bit(n, second);
        amps.par_iter_mut()
            .with_min_len(PARALLEL_MIN_LEN)
            .enumerate()
            .filter(|(index, _)| index & mask == mask)
            .for_each(|(_, amp)| *amp = -*amp);
    }
    Ok(())
}

/// Projection of one amplitude pair onto `|0⟩ + (−1)^s e^{iθ}|1⟩`.
#[inline]
fn fold(pair: &[Complex<f64>], phase: Complex<f64>, outcome: bool) -> Complex<f64> {
    let rotated = phase * pair[1];
    let projected = if outcome { pair[0] - rotated } else { pair[0] + rotated };
    projected * FRAC_1_SQRT_2
}

/// Measures the least significant factor of `state` in the basis rotated by
/// `angle` from the computational basis and projects it out.
///
/// The outcome is sampled by Born rule over the two branch weights, which
/// need not sum to one since states stay unnormalized during a run. Outcome
/// `false` is the `|+_θ⟩` branch. The returned state has one qubit fewer;
/// `state` itself is left untouched, also when sampling fails.
pub fn measure_at_back(
    state: &QuantumState,
    angle: f64,
    qubit: QubitId,
    rng: &mut StdRng,
) -> Result<(bool, QuantumState)> {
    if state.qubit_count() == 0 {
        return Err(QvmError::invariant(format!("{} has no amplitude factor to measure", qubit)));
    }
    let phase = Complex::from_polar(1.0, -angle);
    let (weight_plus, weight_minus) = state
        .amplitudes()
        .par_chunks(2)
        .with_min_len(PARALLEL_MIN_LEN / 2)
        .map(|pair| (fold(pair, phase, false).norm_sqr(), fold(pair, phase, true).norm_sqr()))
        .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));

    let total = weight_plus + weight_minus;
    if !total.is_finite() || total <= 0.0 {
        return Err(QvmError::ZeroProbability { qubit });
    }
    let sample = rng.random::<f64>() * total;
    let outcome = sample >= weight_plus;

    let collapsed: Vec<Complex<f64>> = state
        .amplitudes()
        .par_chunks(2)
        .with_min_len(PARALLEL_MIN_LEN / 2)
        .map(|pair| fold(pair, phase, outcome))
        .collect();
    let state = state.with_back_factor_removed(collapsed)?;
    Ok((outcome, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::mbqc_constants::PI;
    use num_traits::Zero;
    use rand::SeedableRng;

    const TEST_TOLERANCE: f64 = 1e-9;

    fn real_state(n: usize, values: &[f64]) -> QuantumState {
        QuantumState::from_amplitudes(n, values.iter().map(|&v| Complex::new(v, 0.0)).collect())
            .unwrap()
    }

    fn assert_complex_vec_approx_equal(
        actual: &[Complex<f64>],
        expected: &[Complex<f64>],
        context: &str,
    ) {
        assert_eq!(actual.len(), expected.len(), "Vector length mismatch - {}", context);
        for i in 0..actual.len() {
            let dist_sq = (actual[i] - expected[i]).norm_sqr();
            assert!(
                dist_sq < TEST_TOLERANCE * TEST_TOLERANCE,
                "Vector mismatch at index {} - Actual: {}, Expected: {}, Context: {}",
                i, actual[i], expected[i], context
            );
        }
    }

    #[test]
    fn test_pauli_x_swaps_pairs() {
        let mut state = real_state(2, &[1.0, 2.0, 3.0, 4.0]);
        Pauli::X.apply_at_back(&mut state);
        assert_eq!(state, real_state(2, &[2.0, 1.0, 4.0, 3.0]));
    }

    #[test]
    fn test_pauli_z_negates_odd_indices() {
        let mut state = real_state(2, &[1.0, 2.0, 3.0, 4.0]);
        Pauli::Z.apply_at_back(&mut state);
        assert_eq!(state, real_state(2, &[1.0, -2.0, 3.0, -4.0]));
    }

    #[test]
    fn test_controlled_z_adjacent_fast_path() {
        let mut state = real_state(3, &[1.0; 8]);
        controlled_z(&mut state, 2, 1).unwrap();
        assert_eq!(state, real_state(3, &[1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, -1.0]));
    }

    #[test]
    fn test_controlled_z_general_positions() {
        let mut state = real_state(3, &[1.0; 8]);
        // factors 0 and 2 -> bits 2 and 0
        controlled_z(&mut state, 0, 2).unwrap();
        assert_eq!(state, real_state(3, &[1.0, 1.0, 1.0, 1.0, 1.0, -1.0, 1.0, -1.0]));
    }

    #[test]
    fn test_controlled_z_on_plus_plus_matches_prototype() {
        let mut state = real_state(2, &[0.5; 4]);
        controlled_z(&mut state, 0, 1).unwrap();
        assert_eq!(state, QuantumState::cz_plus_plus());
    }

    #[test]
    fn test_controlled_z_rejects_same_factor() {
        let mut state = real_state(2, &[0.5; 4]);
        assert!(controlled_z(&mut state, 1, 1).is_err());
    }

    #[test]
    fn test_measure_plus_at_zero_angle_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let (outcome, rest) =
                measure_at_back(&QuantumState::plus(), 0.0, QubitId(1), &mut rng).unwrap();
            assert!(!outcome, "|+> measured at angle 0 must give the + branch");
            assert_eq!(rest.qubit_count(), 0);
            assert!((rest.norm_sqr() - 1.0).abs() < TEST_TOLERANCE);
        }
    }

    #[test]
    fn test_measure_minus_at_zero_angle_gives_one() {
        let mut rng = StdRng::seed_from_u64(7);
        let minus = real_state(1, &[FRAC_1_SQRT_2, -FRAC_1_SQRT_2]);
        let (outcome, _) = measure_at_back(&minus, 0.0, QubitId(1), &mut rng).unwrap();
        assert!(outcome);
    }

    #[test]
    fn test_measure_is_not_biased_to_one_branch() {
        // |0> is an equal mixture of both diagonal branches
        let mut rng = StdRng::seed_from_u64(42);
        let mut ones = 0;
        for _ in 0..400 {
            let zero = real_state(1, &[1.0, 0.0]);
            let (outcome, _) = measure_at_back(&zero, PI / 4.0, QubitId(0), &mut rng).unwrap();
            if outcome {
                ones += 1;
            }
        }
        assert!(ones > 100 && ones < 300, "outcome 1 drawn {} times out of 400", ones);
    }

    #[test]
    fn test_measure_folds_cluster_pair() {
        // CZ|++> with qubit 1 moved to the back: pairs (q2=0) = (.5,.5), (q2=1) = (.5,-.5)
        let state = real_state(2, &[0.5, 0.5, 0.5, -0.5]);
        let mut rng = StdRng::seed_from_u64(3);
        let (outcome, rest) = measure_at_back(&state, 0.0, QubitId(1), &mut rng).unwrap();
        let expected = if outcome {
            vec![Complex::zero(), Complex::new(FRAC_1_SQRT_2, 0.0)]
        } else {
            vec![Complex::new(FRAC_1_SQRT_2, 0.0), Complex::zero()]
        };
        assert_complex_vec_approx_equal(rest.amplitudes(), &expected, "cluster pair fold");
    }

    #[test]
    fn test_measure_zero_state_fails() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = measure_at_back(&QuantumState::zeroed(1), 0.0, QubitId(9), &mut rng).unwrap_err();
        assert_eq!(err, QvmError::ZeroProbability { qubit: QubitId(9) });
    }
}
