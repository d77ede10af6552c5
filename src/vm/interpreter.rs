// src/vm/interpreter.rs

//! Defines the measurement-program interpreter.

use super::angles::AngleTable;
use super::program::{Command, Condition, Program};
use crate::config::QvmConfig;
use crate::core::{PI, QubitId, QvmError, Result};
use crate::operations::Pauli;
use crate::simulation::{MemorySnapshot, QuantumMemory, SignalStore, SlotId};
use crate::validation;
use num_complex::Complex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

/// The measurement-based quantum VM.
///
/// Executes [`Program`] commands strictly in order against a
/// [`QuantumMemory`] and records every measurement outcome in a
/// [`SignalStore`] that later corrections read from. Memory and signals
/// outlive a single [`run`](QuantumVm::run): feeding a program in several
/// pieces behaves like running it in one go.
///
/// # Examples
///
/// ```
/// # use mbqc::{QubitId, QvmConfig, QvmError};
/// # use mbqc::vm::{Command, Condition, ProgramBuilder, QuantumVm};
/// # fn qid(id: u64) -> QubitId { QubitId(id) }
/// // E(1,2) M(1,0) X(2, s1): teleports |+> from qubit 1 to qubit 2 as |0>
/// let program = ProgramBuilder::new()
///     .pb_add(Command::Entangle { first: qid(1), second: qid(2) })
///     .pb_add(Command::Measure { qubit: qid(1), angle: None, sign: None, shift: None })
///     .pb_add(Command::XCorrect { qubit: qid(2), condition: Some(Condition::Signal(qid(1))) })
///     .build()?;
///
/// let mut vm = QuantumVm::with_config(QvmConfig::new().with_seed(7));
/// vm.run(&program)?;
///
/// let snapshot = vm.snapshot();
/// assert!(snapshot.signal(qid(1)).is_some());
/// let tangle = snapshot.tangle_of(qid(2)).unwrap();
/// assert!(tangle.probability_of_one(qid(2)).unwrap() < 1e-9);
/// # Ok::<(), QvmError>(())
/// ```
#[derive(Debug)]
pub struct QuantumVm {
    memory: QuantumMemory,
    signals: SignalStore,
    angles: AngleTable,
    rng: StdRng,
    seed: u64,
    config: QvmConfig,
}

impl QuantumVm {
    /// Creates a VM with the default configuration and a random seed.
    pub fn new() -> Self {
        Self::with_config(QvmConfig::default())
    }

    pub fn with_config(config: QvmConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random::<u64>);
        debug!(seed, "measurement rng seeded");
        Self {
            memory: QuantumMemory::with_capacity(config.max_tangles),
            signals: SignalStore::new(),
            angles: AngleTable::new().use_process_env(config.read_env_angles),
            rng: StdRng::seed_from_u64(seed),
            seed,
            config,
        }
    }

    /// Replaces the angle table, e.g. to install a prompt for unknown names.
    pub fn with_angle_table(mut self, angles: AngleTable) -> Self {
        self.angles = angles;
        self
    }

    pub fn angles_mut(&mut self) -> &mut AngleTable {
        &mut self.angles
    }

    /// Seed the measurement sampler was started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &QvmConfig {
        &self.config
    }

    pub fn memory(&self) -> &QuantumMemory {
        &self.memory
    }

    pub fn signals(&self) -> &SignalStore {
        &self.signals
    }

    /// Installs an explicit initial state for qubits not yet in memory.
    ///
    /// See [`QuantumMemory::insert_tangle`] for the index convention.
    pub fn load_tangle<I>(&mut self, qubits: Vec<QubitId>, entries: I) -> Result<SlotId>
    where
        I: IntoIterator<Item = (usize, Complex<f64>)>,
    {
        self.memory.insert_tangle(qubits, entries)
    }

    /// Drops all groups and signals and re-seeds the sampler from the same seed.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.signals.clear();
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    /// Runs every command of `program` in order.
    ///
    /// The first failing command aborts the run; state left behind by the
    /// commands before it is kept. Unknown opcodes are logged and skipped.
    pub fn run(&mut self, program: &Program) -> Result<()> {
        info!(commands = program.len(), seed = self.seed, "run start");

        for (pc, command) in program.commands().iter().enumerate() {
            debug!(pc, %command, "executing");
            self.execute(command)?;
            if self.config.trace_memory {
                debug!(pc, "memory after command:\n{}", self.memory);
            }
            if self.config.validate_each_step {
                validation::check_memory(&self.memory)?;
            }
        }

        if self.config.normalize_on_finish {
            self.memory.normalize_all();
        }
        info!(
            tangles = self.memory.active_count(),
            signals = self.signals.len(),
            "run finished"
        );
        Ok(())
    }

    /// Executes a single command.
    pub fn execute(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Entangle { first, second } => self.memory.entangle(*first, *second),
            Command::Measure { qubit, angle, sign, shift } => {
                if self.signals.contains(*qubit) {
                    return Err(QvmError::SignalAlreadySet { qubit: *qubit });
                }
                let mut theta = match angle {
                    Some(angle) => self.angles.resolve(angle)?,
                    None => 0.0,
                };
                if self.holds(sign.as_ref(), false)? {
                    theta = -theta;
                }
                if self.holds(shift.as_ref(), false)? {
                    theta += PI;
                }
                let outcome = self.memory.measure(*qubit, theta, &mut self.rng)?;
                debug!(%qubit, angle = theta, outcome, "measured");
                self.signals.set(*qubit, outcome)
            }
            Command::XCorrect { qubit, condition } => {
                self.correct(*qubit, Pauli::X, condition.as_ref())
            }
            Command::ZCorrect { qubit, condition } => {
                self.correct(*qubit, Pauli::Z, condition.as_ref())
            }
            Command::Unknown { opcode } => {
                warn!(opcode = %opcode, "unknown command, skipping");
                Ok(())
            }
        }
    }

    fn correct(
        &mut self,
        qubit: QubitId,
        pauli: Pauli,
        condition: Option<&Condition>,
    ) -> Result<()> {
        if !self.holds(condition, true)? {
            debug!(%qubit, %pauli, "correction not required");
            return Ok(());
        }
        self.memory.apply_pauli(qubit, pauli)
    }

    /// Evaluates an optional condition; `absent` is the value of a missing one.
    fn holds(&self, condition: Option<&Condition>, absent: bool) -> Result<bool> {
        condition.map_or(Ok(absent), |condition| condition.evaluate(&self.signals))
    }

    /// Copies out every active group and the signal map.
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot::capture(&self.memory, &self.signals)
    }
}

// Default implementation
impl Default for QuantumVm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::{AngleExpr, ProgramBuilder};
    use std::f64::consts::FRAC_1_SQRT_2;

    fn qid(id: u64) -> QubitId {
        QubitId(id)
    }

    fn vm() -> QuantumVm {
        QuantumVm::with_config(QvmConfig::new().with_seed(1234).with_env_angles(false))
    }

    #[test]
    fn test_measure_twice_is_rejected_before_touching_memory() {
        let mut vm = vm();
        let twice = Command::Measure { qubit: qid(1), angle: None, sign: None, shift: None };
        vm.execute(&twice).unwrap();
        let err = vm
            .execute(&Command::Measure { qubit: qid(1), angle: None, sign: None, shift: None })
            .unwrap_err();
        assert_eq!(err, QvmError::SignalAlreadySet { qubit: qid(1) });
        assert_eq!(vm.memory().active_count(), 0);
    }

    #[test]
    fn test_false_condition_does_not_create_qubit() {
        let mut vm = vm();
        vm.execute(&Command::XCorrect { qubit: qid(5), condition: Some(Condition::Literal(false)) })
            .unwrap();
        assert!(vm.memory().find_qubit(qid(5)).is_none());
        vm.execute(&Command::ZCorrect { qubit: qid(5), condition: None }).unwrap();
        assert!(vm.memory().find_qubit(qid(5)).is_some());
    }

    #[test]
    fn test_sign_condition_negates_angle() {
        // |+_{pi/2}> measured at +pi/2 always gives 0, at -pi/2 always gives 1
        let mut vm = vm();
        vm.load_tangle(
            vec![qid(1)],
            [(0, Complex::new(FRAC_1_SQRT_2, 0.0)), (1, Complex::new(0.0, FRAC_1_SQRT_2))],
        )
        .unwrap();
        vm.execute(&Command::Measure {
            qubit: qid(1),
            angle: Some(AngleExpr::named("PI/2")),
            sign: Some(Condition::Literal(true)),
            shift: None,
        })
        .unwrap();
        assert_eq!(vm.signals().get(qid(1)), Ok(true));
    }

    #[test]
    fn test_shift_condition_adds_pi() {
        // |+> measured at 0 + pi lands in the second branch
        let mut vm = vm();
        vm.execute(&Command::Measure {
            qubit: qid(1),
            angle: None,
            sign: None,
            shift: Some(Condition::Literal(true)),
        })
        .unwrap();
        assert_eq!(vm.signals().get(qid(1)), Ok(true));
    }

    #[test]
    fn test_unknown_opcode_continues() {
        let program = ProgramBuilder::new()
            .pb_add(Command::Unknown { opcode: "H".to_string() })
            .pb_add(Command::Entangle { first: qid(1), second: qid(2) })
            .build()
            .unwrap();
        let mut vm = vm();
        vm.run(&program).unwrap();
        assert_eq!(vm.memory().active_count(), 1);
    }

    #[test]
    fn test_reset_replays_same_outcomes() {
        let program = ProgramBuilder::new()
            .pb_add(Command::Entangle { first: qid(1), second: qid(2) })
            .pb_add(Command::Measure {
                qubit: qid(1),
                angle: Some(AngleExpr::Literal(0.7)),
                sign: None,
                shift: None,
            })
            .pb_add(Command::Measure {
                qubit: qid(2),
                angle: Some(AngleExpr::Literal(0.3)),
                sign: None,
                shift: None,
            })
            .build()
            .unwrap();
        let mut vm = vm();
        vm.run(&program).unwrap();
        let first = vm.snapshot();
        vm.reset();
        assert!(vm.signals().is_empty());
        vm.run(&program).unwrap();
        assert_eq!(vm.snapshot(), first);
    }
}
