// src/simulation/engine.rs

use super::tangle::Tangle;
use crate::core::{QuantumState, QubitId, QvmError, Result};
use crate::operations::Pauli;
use num_complex::Complex;
use rand::rngs::StdRng;
use std::fmt;
use tracing::trace;

/// Stable index of a slot in [`QuantumMemory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

/// Fixed-capacity registry of active entanglement groups.
///
/// Slots are handed out from a free-list and keep their identity for the
/// whole life of a group; a slot is reused only after its group has been
/// retired. The table grows lazily up to `capacity`.
#[derive(Debug, Clone)]
pub struct QuantumMemory {
    slots: Vec<Option<Tangle>>,
    free: Vec<usize>,
    capacity: usize,
    active: usize,
}

impl QuantumMemory {
    /// Creates an empty memory able to hold `capacity` groups at once.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { slots: Vec::new(), free: Vec::new(), capacity, active: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots.
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Active groups with their slots, in slot order.
    pub fn tangles(&self) -> impl Iterator<Item = (SlotId, &Tangle)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|t| (SlotId(i), t)))
    }

    pub fn tangle(&self, slot: SlotId) -> Option<&Tangle> {
        self.slots.get(slot.0).and_then(Option::as_ref)
    }

    fn tangle_mut(&mut self, slot: SlotId) -> Result<&mut Tangle> {
        self.slots
            .get_mut(slot.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| QvmError::invariant(format!("slot {} is not occupied", slot.0)))
    }

    /// Reserves a free slot. Running out of slots is fatal for the run.
    pub fn allocate_slot(&mut self) -> Result<SlotId> {
        if let Some(index) = self.free.pop() {
            return Ok(SlotId(index));
        }
        if self.slots.len() < self.capacity {
            self.slots.push(None);
            return Ok(SlotId(self.slots.len() - 1));
        }
        Err(QvmError::CapacityExhausted { capacity: self.capacity })
    }

    fn install(&mut self, tangle: Tangle) -> Result<SlotId> {
        let slot = self.allocate_slot()?;
        trace!(slot = slot.0, qubits = ?tangle.qubits(), "tangle allocated");
        self.slots[slot.0] = Some(tangle);
        self.active += 1;
        Ok(slot)
    }

    /// Removes a group from memory and frees its slot.
    pub fn retire(&mut self, slot: SlotId) -> Result<Tangle> {
        let tangle = self
            .slots
            .get_mut(slot.0)
            .and_then(Option::take)
            .ok_or_else(|| {
                QvmError::invariant(format!("asked to retire unknown slot {}", slot.0))
            })?;
        self.free.push(slot.0);
        self.active -= 1;
        trace!(slot = slot.0, "tangle retired");
        Ok(tangle)
    }

    /// Locates the group and physical factor holding `qubit`.
    ///
    /// Linear in the number of active groups times their size, which stays
    /// small for cluster programs.
    pub fn find_qubit(&self, qubit: QubitId) -> Option<(SlotId, usize)> {
        self.tangles()
            .find_map(|(slot, tangle)| tangle.position(qubit).map(|position| (slot, position)))
    }

    fn slot_of(&self, qubit: QubitId) -> Option<SlotId> {
        self.find_qubit(qubit).map(|(slot, _)| slot)
    }

    /// Slot of `qubit`, creating a fresh `|+⟩` group for a qubit never seen before.
    fn slot_or_create(&mut self, qubit: QubitId) -> Result<SlotId> {
        match self.slot_of(qubit) {
            Some(slot) => Ok(slot),
            None => self.install(Tangle::single(qubit)),
        }
    }

    /// Adds a controlled-Z edge between two qubits, joining their groups.
    pub fn entangle(&mut self, first: QubitId, second: QubitId) -> Result<()> {
        if first == second {
            return Err(QvmError::InvalidOperation {
                message: format!("cannot entangle {} with itself", first),
            });
        }
        match (self.slot_of(first), self.slot_of(second)) {
            (None, None) => {
                self.install(Tangle::pair(first, second))?;
            }
            (Some(slot), None) => {
                let tangle = self.tangle_mut(slot)?;
                tangle.add_qubit(second)?;
                tangle.apply_cz(first, second)?;
            }
            (None, Some(slot)) => {
                let tangle = self.tangle_mut(slot)?;
                tangle.add_qubit(first)?;
                tangle.apply_cz(first, second)?;
            }
            (Some(a), Some(b)) if a == b => {
                self.tangle_mut(a)?.apply_cz(first, second)?;
            }
            (Some(a), Some(b)) => {
                let absorbed = self.retire(b)?;
                trace!(into = a.0, from = b.0, "merging tangles");
                let tangle = self.tangle_mut(a)?;
                tangle.merge(absorbed)?;
                tangle.apply_cz(first, second)?;
            }
        }
        Ok(())
    }

    /// Applies a Pauli correction, creating the qubit if it is new.
    pub fn apply_pauli(&mut self, qubit: QubitId, pauli: Pauli) -> Result<()> {
        let slot = self.slot_or_create(qubit)?;
        self.tangle_mut(slot)?.apply_pauli(qubit, pauli)
    }

    /// Measures `qubit` at `angle` and removes it from memory.
    ///
    /// A qubit never seen before is measured as a fresh `|+⟩`. The group is
    /// retired once its last qubit is gone.
    pub fn measure(&mut self, qubit: QubitId, angle: f64, rng: &mut StdRng) -> Result<bool> {
        let slot = self.slot_or_create(qubit)?;
        let tangle = self.tangle_mut(slot)?;
        let outcome = tangle.measure(qubit, angle, rng)?;
        if tangle.is_empty() {
            self.retire(slot)?;
        }
        Ok(outcome)
    }

    /// Installs a group from `(basis index, amplitude)` entries.
    ///
    /// Indices are read in the order of `qubits`, first qubit most
    /// significant. Unlisted indices are zero.
    pub fn insert_tangle<I>(&mut self, qubits: Vec<QubitId>, entries: I) -> Result<SlotId>
    where
        I: IntoIterator<Item = (usize, Complex<f64>)>,
    {
        if qubits.is_empty() {
            return Err(QvmError::InvalidOperation {
                message: "a tangle needs at least one qubit".to_string(),
            });
        }
        for (i, &qubit) in qubits.iter().enumerate() {
            if qubits[..i].contains(&qubit) || self.slot_of(qubit).is_some() {
                return Err(QvmError::DuplicateQubit { qubit });
            }
        }
        let mut state = QuantumState::zeroed(qubits.len());
        let dim = state.dim();
        let amplitudes = state.amplitudes_mut();
        for (index, amp) in entries {
            if index >= dim {
                return Err(QvmError::DimensionMismatch { expected: dim, actual: index + 1 });
            }
            amplitudes[index] = amp;
        }
        let norm = state.norm_sqr();
        if !norm.is_finite() || norm <= 0.0 {
            return Err(QvmError::InvalidOperation {
                message: format!("amplitude table for {:?} has no weight", qubits),
            });
        }
        self.install(Tangle::from_state(qubits, state)?)
    }

    /// Rescales every active group to unit norm.
    pub fn normalize_all(&mut self) {
        for tangle in self.slots.iter_mut().flatten() {
            tangle.normalize();
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.active = 0;
    }
}

impl fmt::Display for QuantumMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "qmem has {} tangles:\n  {{", self.active)?;
        for (i, (_, tangle)) in self.tangles().enumerate() {
            if i > 0 {
                write!(f, ",\n   ")?;
            }
            write!(f, "{}", tangle)?;
        }
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::mbqc_constants::CZ_PLUS_PLUS_STATE;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn qid(id: u64) -> QubitId {
        QubitId(id)
    }

    fn assert_consistent(memory: &QuantumMemory) {
        let mut seen = HashSet::new();
        let mut count = 0;
        for (_, tangle) in memory.tangles() {
            count += 1;
            assert_eq!(tangle.len(), tangle.state().qubit_count());
            for q in tangle.qubits() {
                assert!(seen.insert(*q), "{} appears in two tangles", q);
            }
        }
        assert_eq!(count, memory.active_count());
    }

    #[test]
    fn test_entangle_two_fresh_qubits() {
        let mut memory = QuantumMemory::with_capacity(4);
        memory.entangle(qid(1), qid(2)).unwrap();
        assert_eq!(memory.active_count(), 1);
        let (slot, _) = memory.find_qubit(qid(2)).unwrap();
        assert_eq!(memory.tangle(slot).unwrap().state().amplitudes(), &CZ_PLUS_PLUS_STATE);
        assert_consistent(&memory);
    }

    #[test]
    fn test_entangle_extends_known_group() {
        let mut memory = QuantumMemory::with_capacity(4);
        memory.entangle(qid(1), qid(2)).unwrap();
        memory.entangle(qid(3), qid(2)).unwrap();
        assert_eq!(memory.active_count(), 1);
        let (slot, _) = memory.find_qubit(qid(3)).unwrap();
        assert_eq!(memory.tangle(slot).unwrap().qubits(), &[qid(1), qid(2), qid(3)]);
        assert_consistent(&memory);
    }

    #[test]
    fn test_entangle_merges_groups_and_frees_slot() {
        let mut memory = QuantumMemory::with_capacity(4);
        memory.entangle(qid(1), qid(2)).unwrap();
        memory.entangle(qid(3), qid(4)).unwrap();
        assert_eq!(memory.active_count(), 2);
        memory.entangle(qid(2), qid(3)).unwrap();
        assert_eq!(memory.active_count(), 1);
        let (slot, _) = memory.find_qubit(qid(4)).unwrap();
        assert_eq!(memory.tangle(slot).unwrap().qubits(), &[qid(1), qid(2), qid(3), qid(4)]);
        assert_consistent(&memory);
        // the freed slot is handed out again
        memory.entangle(qid(8), qid(9)).unwrap();
        assert_eq!(memory.active_count(), 2);
        assert_consistent(&memory);
    }

    #[test]
    fn test_entangle_same_group_applies_cz_in_place() {
        let mut memory = QuantumMemory::with_capacity(2);
        memory.entangle(qid(1), qid(2)).unwrap();
        memory.entangle(qid(1), qid(2)).unwrap();
        let (slot, _) = memory.find_qubit(qid(1)).unwrap();
        // CZ twice is the identity on |++>
        for amp in memory.tangle(slot).unwrap().state().amplitudes() {
            assert!((amp.re - 0.5).abs() < 1e-12 && amp.im.abs() < 1e-12);
        }
    }

    #[test]
    fn test_self_entangle_rejected() {
        let mut memory = QuantumMemory::with_capacity(2);
        assert!(matches!(memory.entangle(qid(1), qid(1)), Err(QvmError::InvalidOperation { .. })));
    }

    #[test]
    fn test_capacity_exhaustion() {
        let mut memory = QuantumMemory::with_capacity(2);
        memory.entangle(qid(1), qid(2)).unwrap();
        memory.entangle(qid(3), qid(4)).unwrap();
        assert_eq!(
            memory.entangle(qid(5), qid(6)),
            Err(QvmError::CapacityExhausted { capacity: 2 })
        );
    }

    #[test]
    fn test_measuring_every_qubit_frees_the_slot() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut memory = QuantumMemory::with_capacity(1);
        memory.entangle(qid(1), qid(2)).unwrap();
        memory.entangle(qid(2), qid(3)).unwrap();
        for q in [2, 1, 3] {
            memory.measure(qid(q), 0.0, &mut rng).unwrap();
            assert_consistent(&memory);
        }
        assert_eq!(memory.active_count(), 0);
        assert!(memory.find_qubit(qid(1)).is_none());
        // the single slot is reusable
        memory.entangle(qid(4), qid(5)).unwrap();
        assert_eq!(memory.active_count(), 1);
    }

    #[test]
    fn test_measure_unknown_qubit_creates_and_retires() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut memory = QuantumMemory::with_capacity(1);
        let outcome = memory.measure(qid(9), 0.0, &mut rng).unwrap();
        assert!(!outcome);
        assert_eq!(memory.active_count(), 0);
    }

    #[test]
    fn test_insert_tangle() {
        let mut memory = QuantumMemory::with_capacity(2);
        let slot = memory
            .insert_tangle(vec![qid(1), qid(2)], [(3, Complex::new(1.0, 0.0))])
            .unwrap();
        let tangle = memory.tangle(slot).unwrap();
        assert_eq!(tangle.state().amplitudes()[3], Complex::new(1.0, 0.0));
        assert_eq!(
            memory.insert_tangle(vec![qid(2)], [(0, Complex::new(1.0, 0.0))]),
            Err(QvmError::DuplicateQubit { qubit: qid(2) })
        );
        assert!(matches!(
            memory.insert_tangle(vec![qid(5)], [(2, Complex::new(1.0, 0.0))]),
            Err(QvmError::DimensionMismatch { .. })
        ));
        assert_eq!(memory.active_count(), 1);
    }

    #[test]
    fn test_insert_tangle_rejects_zero_table() {
        let mut memory = QuantumMemory::with_capacity(2);
        let zero = Complex::new(0.0, 0.0);
        assert!(matches!(
            memory.insert_tangle(vec![qid(1), qid(2)], [(0, zero)]),
            Err(QvmError::InvalidOperation { .. })
        ));
        assert!(matches!(
            memory.insert_tangle(vec![qid(3)], [(1, Complex::new(f64::NAN, 0.0))]),
            Err(QvmError::InvalidOperation { .. })
        ));
        assert_eq!(memory.active_count(), 0);
        assert!(memory.find_qubit(qid(1)).is_none());
    }
}
