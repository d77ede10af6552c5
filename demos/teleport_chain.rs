//! Example: walking |+> down a one-dimensional cluster.
//!
//! Each step entangles the next qubit, measures the current one at angle 0
//! and corrects the byproduct on its neighbour. Every step applies a
//! Hadamard, so the last qubit ends in |0> after an odd number of steps and
//! in |+> after an even number.
//!
//! Usage: `cargo run --example teleport_chain -- [length] [seed]`

use mbqc::telemetry::init_tracing;
use mbqc::{Command, Condition, ProgramBuilder, QuantumVm, QubitId, QvmConfig, QvmError};

// Helper for QubitId creation
fn qid(id: u64) -> QubitId { QubitId(id) }

fn main() -> Result<(), QvmError> {
    init_tracing("mbqc=info")?;

    let mut args = std::env::args().skip(1);
    let length: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(6).max(2);
    let mut config = QvmConfig::from_env()?;
    if let Some(seed) = args.next().and_then(|a| a.parse().ok()) {
        config = config.with_seed(seed);
    }

    println!("--- mbqc Example: teleporting |+> along {} qubits ---", length);

    let mut builder = ProgramBuilder::new();
    for i in 1..length {
        builder = builder
            .pb_add(Command::Entangle { first: qid(i), second: qid(i + 1) })
            .pb_add(Command::Measure { qubit: qid(i), angle: None, sign: None, shift: None })
            .pb_add(Command::XCorrect {
                qubit: qid(i + 1),
                condition: Some(Condition::Signal(qid(i))),
            });
    }
    let program = builder.build()?;
    println!("\n{}", program);

    let mut vm = QuantumVm::with_config(config);
    vm.run(&program)?;
    println!("seed: {}", vm.seed());

    let snapshot = vm.snapshot();
    println!("\n{}", snapshot);

    let last = qid(length);
    let tangle = snapshot
        .tangle_of(last)
        .ok_or_else(|| QvmError::InvalidOperation { message: format!("{} was measured", last) })?;
    let p1 = tangle.probability_of_one(last).unwrap_or(f64::NAN);
    let expected = if (length - 1) % 2 == 1 { "|0>" } else { "|+>" };
    println!("P({} = 1) = {:.6}, expected state {}", last, p1, expected);

    let outcomes: Vec<String> =
        snapshot.signals.iter().map(|(q, s)| format!("{}={}", q, u8::from(*s))).collect();
    println!("signals: {}", outcomes.join(" "));
    Ok(())
}
