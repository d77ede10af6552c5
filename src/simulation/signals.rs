// src/simulation/signals.rs

use crate::core::{QubitId, QvmError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Write-once record of measurement outcomes, keyed by qubit.
///
/// A qubit is measured at most once in a valid program, so setting an
/// existing entry and reading a missing one are both protocol violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalStore {
    entries: BTreeMap<QubitId, bool>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of measuring `qubit`.
    pub fn set(&mut self, qubit: QubitId, value: bool) -> Result<()> {
        if self.entries.contains_key(&qubit) {
            return Err(QvmError::SignalAlreadySet { qubit });
        }
        self.entries.insert(qubit, value);
        Ok(())
    }

    /// Reads a previously recorded outcome.
    pub fn get(&self, qubit: QubitId) -> Result<bool> {
        self.entries.get(&qubit).copied().ok_or(QvmError::SignalMissing { qubit })
    }

    pub fn contains(&self, qubit: QubitId) -> bool {
        self.entries.contains_key(&qubit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending qubit order.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, bool)> + '_ {
        self.entries.iter().map(|(&q, &v)| (q, v))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Display for SignalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " {{")?;
        for (qubit, value) in self.iter() {
            writeln!(f, "  {} -> {},", qubit.0, u8::from(value))?;
        }
        writeln!(f, " }}")
    }
}
