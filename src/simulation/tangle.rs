// src/simulation/tangle.rs

use crate::core::{combine, QuantumState, QubitId, QvmError, Result};
use crate::operations::{self, Pauli};
use rand::rngs::StdRng;
use std::fmt;

/// A set of mutually entangled qubits sharing one amplitude vector.
///
/// `qubits[i]` names physical tensor factor `i` of `state`. Whenever the
/// state is rotated, the id list is rotated by the same amount, so ids never
/// need renumbering.
#[derive(Debug, Clone, PartialEq)]
pub struct Tangle {
    qubits: Vec<QubitId>,
    state: QuantumState,
}

impl Tangle {
    /// A fresh qubit in `|+⟩`.
    pub fn single(qubit: QubitId) -> Self {
        Self { qubits: vec![qubit], state: QuantumState::plus() }
    }

    /// Two fresh qubits already entangled, `CZ|+⟩|+⟩`.
    pub fn pair(first: QubitId, second: QubitId) -> Self {
        Self { qubits: vec![first, second], state: QuantumState::cz_plus_plus() }
    }

    /// Installs an explicit state for the given qubit ordering.
    pub fn from_state(qubits: Vec<QubitId>, state: QuantumState) -> Result<Self> {
        if qubits.len() != state.qubit_count() {
            return Err(QvmError::invariant(format!(
                "{} qubit ids for a {}-qubit state",
                qubits.len(),
                state.qubit_count()
            )));
        }
        Ok(Self { qubits, state })
    }

    /// Qubit ids in physical factor order.
    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    pub fn state(&self) -> &QuantumState {
        &self.state
    }

    pub fn len(&self) -> usize {
        self.qubits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qubits.is_empty()
    }

    /// Physical factor currently holding `qubit`.
    pub fn position(&self, qubit: QubitId) -> Option<usize> {
        self.qubits.iter().position(|&q| q == qubit)
    }

    pub fn contains(&self, qubit: QubitId) -> bool {
        self.position(qubit).is_some()
    }

    fn require_position(&self, qubit: QubitId) -> Result<usize> {
        self.position(qubit).ok_or_else(|| {
            QvmError::invariant(format!("{} is not part of tangle {:?}", qubit, self.qubits))
        })
    }

    /// Swaps in a rotated state and mirrors the rotation on the id list.
    fn replace_state(
        &mut self,
        rotate: impl FnOnce(QuantumState) -> Result<(QuantumState, usize)>,
    ) -> Result<()> {
        let state = std::mem::replace(&mut self.state, QuantumState::zeroed(0));
        let (state, r) = rotate(state)?;
        self.state = state;
        self.qubits.rotate_right(r);
        Ok(())
    }

    /// Rotates `qubit` to the least significant bit.
    pub fn bring_to_back(&mut self, qubit: QubitId) -> Result<()> {
        let position = self.require_position(qubit)?;
        self.replace_state(|state| state.shift_to_back(position))
    }

    /// Returns to the construction order (cyclic offset 0).
    pub fn align(&mut self) {
        let state = std::mem::replace(&mut self.state, QuantumState::zeroed(0));
        let (state, r) = state.align();
        self.state = state;
        self.qubits.rotate_right(r);
    }

    /// Tensors a fresh `|+⟩` ancilla behind the current factors.
    pub fn add_qubit(&mut self, qubit: QubitId) -> Result<()> {
        if self.contains(qubit) {
            return Err(QvmError::DuplicateQubit { qubit });
        }
        self.align();
        self.state = combine(&self.state, &QuantumState::plus())?;
        self.qubits.push(qubit);
        Ok(())
    }

    /// Absorbs `other`, placing its qubits after this tangle's qubits.
    pub fn merge(&mut self, mut other: Tangle) -> Result<()> {
        self.align();
        other.align();
        self.state = combine(&self.state, &other.state)?;
        self.qubits.append(&mut other.qubits);
        Ok(())
    }

    /// Applies a Pauli correction to `qubit`.
    pub fn apply_pauli(&mut self, qubit: QubitId, pauli: Pauli) -> Result<()> {
        self.bring_to_back(qubit)?;
        pauli.apply_at_back(&mut self.state);
        Ok(())
    }

    /// Applies controlled-Z between two qubits of this tangle.
    pub fn apply_cz(&mut self, first: QubitId, second: QubitId) -> Result<()> {
        let p1 = self.require_position(first)?;
        let p2 = self.require_position(second)?;
        operations::controlled_z(&mut self.state, p1, p2)
    }

    /// Measures `qubit` at `angle`, projects its factor out and splices it
    /// from the ordering. Returns the sampled outcome.
    pub fn measure(&mut self, qubit: QubitId, angle: f64, rng: &mut StdRng) -> Result<bool> {
        self.bring_to_back(qubit)?;
        let (outcome, state) = operations::measure_at_back(&self.state, angle, qubit, rng)?;
        self.state = state;
        self.remove_qubit(qubit)?;
        Ok(outcome)
    }

    /// Splices `qubit` out of the ordering once its factor is gone from the state.
    pub fn remove_qubit(&mut self, qubit: QubitId) -> Result<()> {
        let position = self.require_position(qubit)?;
        if self.qubits.len() != self.state.qubit_count() + 1 {
            return Err(QvmError::invariant(format!(
                "removing {} from {:?} but the state still holds {} factors",
                qubit,
                self.qubits,
                self.state.qubit_count()
            )));
        }
        self.qubits.remove(position);
        Ok(())
    }

    /// Rescales the amplitudes to unit norm.
    pub fn normalize(&mut self) {
        self.state.normalize();
    }
}

impl fmt::Display for Tangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.qubits.iter().map(|q| q.0.to_string()).collect();
        writeln!(f, "[{}] ,", ids.join(", "))?;
        writeln!(f, "    {{")?;
        write!(f, "{}", self.state)?;
        write!(f, "    }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::mbqc_constants::CZ_PLUS_PLUS_STATE;
    use num_complex::Complex;
    use rand::SeedableRng;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn qid(id: u64) -> QubitId {
        QubitId(id)
    }

    fn approx(actual: &[Complex<f64>], expected: &[Complex<f64>]) -> bool {
        actual.len() == expected.len()
            && actual.iter().zip(expected).all(|(a, e)| (a - e).norm() < 1e-9)
    }

    #[test]
    fn test_pair_is_canonical_cluster_state() {
        let tangle = Tangle::pair(qid(1), qid(2));
        assert_eq!(tangle.qubits(), &[qid(1), qid(2)]);
        assert_eq!(tangle.state().amplitudes(), &CZ_PLUS_PLUS_STATE);
    }

    #[test]
    fn test_add_qubit_then_cz_matches_pair_prototype() {
        let mut tangle = Tangle::single(qid(1));
        tangle.add_qubit(qid(2)).unwrap();
        tangle.apply_cz(qid(1), qid(2)).unwrap();
        assert!(approx(tangle.state().amplitudes(), &CZ_PLUS_PLUS_STATE));
        assert_eq!(tangle.qubits(), &[qid(1), qid(2)]);
    }

    #[test]
    fn test_rotation_is_mirrored_on_ids() {
        let mut tangle = Tangle::single(qid(1));
        tangle.add_qubit(qid(2)).unwrap();
        tangle.add_qubit(qid(3)).unwrap();
        tangle.bring_to_back(qid(1)).unwrap();
        assert_eq!(tangle.qubits(), &[qid(2), qid(3), qid(1)]);
        assert_eq!(tangle.state().cyclic_offset(), 2);
        tangle.align();
        assert_eq!(tangle.qubits(), &[qid(1), qid(2), qid(3)]);
        assert_eq!(tangle.state().cyclic_offset(), 0);
    }

    #[test]
    fn test_pauli_x_targets_the_named_qubit() {
        // qubit 1 in |0>, qubit 2 in |+>: X on qubit 1 gives |1>|+>
        let state = QuantumState::from_amplitudes(
            2,
            vec![
                Complex::new(FRAC_1_SQRT_2, 0.0),
                Complex::new(FRAC_1_SQRT_2, 0.0),
                Complex::new(0.0, 0.0),
                Complex::new(0.0, 0.0),
            ],
        )
        .unwrap();
        let mut tangle = Tangle::from_state(vec![qid(1), qid(2)], state).unwrap();
        tangle.apply_pauli(qid(1), Pauli::X).unwrap();
        tangle.align();
        let h = Complex::new(FRAC_1_SQRT_2, 0.0);
        let z = Complex::new(0.0, 0.0);
        assert!(approx(tangle.state().amplitudes(), &[z, z, h, h]));
    }

    #[test]
    fn test_merge_concatenates_orderings() {
        let mut left = Tangle::pair(qid(1), qid(2));
        left.bring_to_back(qid(1)).unwrap();
        let right = Tangle::single(qid(7));
        left.merge(right).unwrap();
        assert_eq!(left.qubits(), &[qid(1), qid(2), qid(7)]);
        assert_eq!(left.state().qubit_count(), 3);
        let expected: Vec<Complex<f64>> = CZ_PLUS_PLUS_STATE
            .iter()
            .flat_map(|&a| [a * FRAC_1_SQRT_2, a * FRAC_1_SQRT_2])
            .collect();
        assert!(approx(left.state().amplitudes(), &expected));
    }

    #[test]
    fn test_measure_removes_qubit() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut tangle = Tangle::pair(qid(1), qid(2));
        tangle.measure(qid(1), 0.0, &mut rng).unwrap();
        assert_eq!(tangle.qubits(), &[qid(2)]);
        assert_eq!(tangle.state().qubit_count(), 1);
        tangle.measure(qid(2), 0.0, &mut rng).unwrap();
        assert!(tangle.is_empty());
        assert_eq!(tangle.state().dim(), 1);
    }

    #[test]
    fn test_failed_measure_keeps_group_intact() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut tangle =
            Tangle::from_state(vec![qid(1), qid(2)], QuantumState::zeroed(2)).unwrap();
        assert_eq!(
            tangle.measure(qid(1), 0.0, &mut rng),
            Err(QvmError::ZeroProbability { qubit: qid(1) })
        );
        assert_eq!(tangle.len(), 2);
        assert_eq!(tangle.state().qubit_count(), 2);
        assert!(tangle.contains(qid(1)));
        tangle.apply_pauli(qid(2), Pauli::X).unwrap();
    }

    #[test]
    fn test_remove_qubit_requires_collapsed_state() {
        let mut tangle = Tangle::pair(qid(1), qid(2));
        assert!(matches!(tangle.remove_qubit(qid(1)), Err(QvmError::InvariantViolation { .. })));
        assert!(matches!(tangle.remove_qubit(qid(5)), Err(QvmError::InvariantViolation { .. })));
    }

    #[test]
    fn test_add_existing_qubit_is_rejected() {
        let mut tangle = Tangle::single(qid(4));
        assert_eq!(tangle.add_qubit(qid(4)), Err(QvmError::DuplicateQubit { qubit: qid(4) }));
    }
}
