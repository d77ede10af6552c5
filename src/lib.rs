// src/lib.rs

//! `mbqc` - A virtual machine for measurement-based quantum computation
//!
//! A program is a sequence of three primitives: entangle two qubits, measure
//! a qubit at an angle, and conditionally apply a Pauli correction. Qubits
//! live in entanglement groups, each holding one dense amplitude vector;
//! groups are merged when an entangling command joins them and shrink as
//! their qubits are measured out. Measurement outcomes are kept as signals
//! that later commands can condition on.

pub mod config;
pub mod core;
pub mod operations;
pub mod simulation;
pub mod telemetry;
pub mod validation;
pub mod vm;

// Re-export the most common types for easier top-level use
pub use config::QvmConfig;
pub use core::{QuantumState, QubitId, QvmError, Result};
pub use operations::Pauli;
pub use simulation::{MemorySnapshot, QuantumMemory, SignalStore, Tangle, TangleSnapshot};
pub use validation::{check_memory, check_normalization};
pub use vm::{Command, Condition, Expr, Program, ProgramBuilder, QuantumVm};

// Example 1: Teleporting |+> through a two-qubit cluster
// The measured qubit hands its state over to its neighbour; the X
// correction, gated on the recorded signal, removes the random byproduct.
/// ```
/// use mbqc::{Command, Condition, ProgramBuilder, QuantumVm, QubitId, QvmConfig, QvmError};
///
/// // Helper for creating QubitId
/// fn qid(id: u64) -> QubitId { QubitId(id) }
///
/// let program = ProgramBuilder::new()
///     .pb_add(Command::Entangle { first: qid(1), second: qid(2) })
///     .pb_add(Command::Measure { qubit: qid(1), angle: None, sign: None, shift: None })
///     .pb_add(Command::XCorrect { qubit: qid(2), condition: Some(Condition::Signal(qid(1))) })
///     .build()?;
///
/// for seed in 0..8 {
///     let mut vm = QuantumVm::with_config(QvmConfig::new().with_seed(seed));
///     vm.run(&program)?;
///     let snapshot = vm.snapshot();
///     println!("{}", snapshot);
///
///     // One group is left, holding only qubit 2, always in |0>
///     assert_eq!(snapshot.tangles.len(), 1);
///     assert_eq!(snapshot.tangles[0].qubits, vec![qid(2)]);
///     let (re, im) = snapshot.tangles[0].amplitude(0).unwrap();
///     assert!((re * re + im * im - 1.0).abs() < 1e-9);
/// }
/// # Ok::<(), QvmError>(())
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: Lowering command trees
// A parser hands over nested lists; the VM lowers and runs them. Measuring
// the middle of a three-qubit line merges everything into one group first.
/// ```
/// use mbqc::{Expr, Program, QuantumVm, QubitId, QvmConfig, QvmError};
///
/// fn cmd(parts: &[&str]) -> Expr { Expr::list(parts.iter().map(|p| Expr::atom(*p))) }
///
/// let trees = [cmd(&["E", "1", "2"]), cmd(&["E", "2", "3"]), cmd(&["M", "2", "PI/2"])];
/// let program = Program::from_exprs(&trees)?;
///
/// let mut vm = QuantumVm::with_config(QvmConfig::new().with_seed(3));
/// vm.run(&program)?;
///
/// assert_eq!(vm.memory().active_count(), 1);
/// let snapshot = vm.snapshot();
/// let mut qubits = snapshot.tangles[0].qubits.clone();
/// qubits.sort();
/// assert_eq!(qubits, vec![QubitId(1), QubitId(3)]);
/// assert!(snapshot.signal(QubitId(2)).is_some());
/// # Ok::<(), QvmError>(())
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item
