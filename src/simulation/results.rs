// src/simulation/results.rs
use super::engine::QuantumMemory;
use super::signals::SignalStore;
use crate::core::QubitId;
use std::fmt;

/// Read-only copy of one entanglement group.
#[derive(Debug, Clone, PartialEq)]
pub struct TangleSnapshot {
    /// Qubit ids in physical factor order; the first id is the most
    /// significant bit of `basis`.
    pub qubits: Vec<QubitId>,
    /// `(basis, re, im)` for every amplitude of the group.
    pub amplitudes: Vec<(usize, f64, f64)>,
}

impl TangleSnapshot {
    /// Amplitude of `basis`, if it is in range.
    pub fn amplitude(&self, basis: usize) -> Option<(f64, f64)> {
        self.amplitudes.get(basis).map(|&(_, re, im)| (re, im))
    }

    /// Bit value of `qubit` within `basis`.
    pub fn bit_of(&self, qubit: QubitId, basis: usize) -> Option<bool> {
        let n = self.qubits.len();
        self.qubits
            .iter()
            .position(|&q| q == qubit)
            .map(|position| (basis >> (n - 1 - position)) & 1 == 1)
    }

    /// Probability of reading `qubit` as 1 in the computational basis.
    pub fn probability_of_one(&self, qubit: QubitId) -> Option<f64> {
        let total: f64 = self.amplitudes.iter().map(|&(_, re, im)| re * re + im * im).sum();
        if total <= 0.0 {
            return None;
        }
        let mut ones = 0.0;
        for &(basis, re, im) in &self.amplitudes {
            if self.bit_of(qubit, basis)? {
                ones += re * re + im * im;
            }
        }
        Some(ones / total)
    }
}

/// State of a VM after a run: every active group plus the signal map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemorySnapshot {
    pub tangles: Vec<TangleSnapshot>,
    /// Recorded measurement outcomes, ascending by qubit.
    pub signals: Vec<(QubitId, bool)>,
}

impl MemorySnapshot {
    pub(crate) fn capture(memory: &QuantumMemory, signals: &SignalStore) -> Self {
        let tangles = memory
            .tangles()
            .map(|(_, tangle)| TangleSnapshot {
                qubits: tangle.qubits().to_vec(),
                amplitudes: tangle
                    .state()
                    .amplitudes()
                    .iter()
                    .enumerate()
                    .map(|(basis, amp)| (basis, amp.re, amp.im))
                    .collect(),
            })
            .collect();
        Self { tangles, signals: signals.iter().collect() }
    }

    /// The group holding `qubit`, if it is still unmeasured.
    pub fn tangle_of(&self, qubit: QubitId) -> Option<&TangleSnapshot> {
        self.tangles.iter().find(|t| t.qubits.contains(&qubit))
    }

    pub fn signal(&self, qubit: QubitId) -> Option<bool> {
        self.signals.iter().find(|(q, _)| *q == qubit).map(|&(_, value)| value)
    }
}

impl fmt::Display for MemorySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "qmem has {} tangles:", self.tangles.len())?;
        for tangle in &self.tangles {
            let ids: Vec<String> = tangle.qubits.iter().map(|q| q.0.to_string()).collect();
            writeln!(f, "  [{}]", ids.join(", "))?;
            for &(basis, re, im) in &tangle.amplitudes {
                writeln!(
                    f,
                    "    {:0width$b}  {:+.6} {:+.6}i",
                    basis,
                    re,
                    im,
                    width = tangle.qubits.len().max(1)
                )?;
            }
        }
        writeln!(f, "signals:")?;
        if self.signals.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (qubit, value) in &self.signals {
            writeln!(f, "  {} -> {}", qubit.0, u8::from(*value))?;
        }
        Ok(())
    }
}
