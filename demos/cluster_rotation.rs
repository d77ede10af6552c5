//! Example: a phase rotation driven purely by measurements.
//!
//! On the line 1 - 2 - 3 with qubit 1 in |+>, measuring qubit 1 at angle
//! `alpha` and qubit 2 at 0 leaves qubit 3 in `(|0> + e^{-i alpha}|1>)/√2`
//! once the byproducts `X^s2 Z^s1` are corrected.
//!
//! Angles are read as command trees, so named constants and environment
//! overrides (e.g. `ALPHA=0.3`) work as they would for a parsed program.

use mbqc::telemetry::init_tracing;
use mbqc::vm::AngleTable;
use mbqc::{Expr, Program, QuantumVm, QubitId, QvmConfig, QvmError};

fn atom(value: &str) -> Expr { Expr::atom(value) }

fn signal(id: &str) -> Expr { Expr::list([atom("q"), atom(id)]) }

fn program_for(angle: &str) -> Result<Program, QvmError> {
    let trees = [
        Expr::list([atom("E"), atom("1"), atom("2")]),
        Expr::list([atom("E"), atom("2"), atom("3")]),
        Expr::list([atom("M"), atom("1"), atom(angle)]),
        Expr::list([atom("M"), atom("2"), atom("0"), signal("1")]),
        Expr::list([atom("X"), atom("3"), signal("2")]),
        Expr::list([atom("Z"), atom("3"), signal("1")]),
    ];
    Program::from_exprs(&trees)
}

fn main() -> Result<(), QvmError> {
    init_tracing("mbqc=warn")?;
    println!("--- mbqc Example: measurement-driven phase rotation ---");

    for angle in ["PI/8", "PI/4", "PI/2", "-PI/4", "0.3", "ALPHA"] {
        let program = program_for(angle)?;
        let angles = AngleTable::new().with_prompt(|name: &str| {
            println!(" angle \"{}\" is not a recognised constant, using 1.0", name);
            Some(1.0)
        });
        let mut vm = QuantumVm::with_config(QvmConfig::from_env()?).with_angle_table(angles);
        vm.run(&program)?;

        let snapshot = vm.snapshot();
        let tangle = snapshot
            .tangle_of(QubitId(3))
            .ok_or_else(|| QvmError::InvalidOperation {
                message: "qubit 3 was measured".to_string(),
            })?;
        let (re0, im0) = tangle.amplitude(0).unwrap_or((0.0, 0.0));
        let (re1, im1) = tangle.amplitude(1).unwrap_or((0.0, 0.0));
        let a0 = num_complex::Complex::new(re0, im0);
        let a1 = num_complex::Complex::new(re1, im1);
        let phase = (a1 / a0).arg();
        println!(
            "alpha = {:>6}  signals s1={} s2={}  relative phase of qubit 3 = {:+.6}",
            angle,
            snapshot.signal(QubitId(1)).map_or(0, u8::from),
            snapshot.signal(QubitId(2)).map_or(0, u8::from),
            phase
        );
    }
    Ok(())
}
