// src/vm/mod.rs

//! Measurement programs and the VM that executes them.

mod angles;
mod interpreter;
pub mod program;

pub use angles::{AnglePrompt, AngleTable};
pub use interpreter::QuantumVm;
pub use program::{AngleExpr, Command, Condition, Expr, Program, ProgramBuilder};
