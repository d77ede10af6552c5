// src/vm/program.rs

//! Commands of a measurement program and their lowering from command trees.

use crate::core::{QubitId, QvmError, Result};
use crate::simulation::SignalStore;
use std::fmt;

// --- Command trees ---

/// Nested list handed over by the program parser.
///
/// `(M 1 PI/4 (q 0))` arrives as a `List` of four elements whose last
/// element is itself a `List`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Atom(String),
    List(Vec<Expr>),
}

impl Expr {
    pub fn atom(value: impl Into<String>) -> Self {
        Expr::Atom(value.into())
    }

    pub fn list<I: IntoIterator<Item = Expr>>(items: I) -> Self {
        Expr::List(items.into_iter().collect())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Atom(value) => write!(f, "{}", value),
            Expr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

// --- Operands ---

/// Measurement angle before resolution against the angle table.
#[derive(Debug, Clone, PartialEq)]
pub enum AngleExpr {
    /// A float literal in radians.
    Literal(f64),
    /// A named constant, stored upper-cased.
    Named(String),
    /// `(- angle)`
    Negate(Box<AngleExpr>),
}

impl AngleExpr {
    pub fn named(name: impl AsRef<str>) -> Self {
        AngleExpr::Named(name.as_ref().to_uppercase())
    }

    fn from_expr(expr: &Expr) -> Result<Self> {
        match expr {
            Expr::Atom(value) => Ok(match value.parse::<f64>() {
                Ok(angle) => AngleExpr::Literal(angle),
                Err(_) => AngleExpr::named(value),
            }),
            Expr::List(items) => match items.as_slice() {
                [Expr::Atom(op), inner] if op == "-" => {
                    Ok(AngleExpr::Negate(Box::new(Self::from_expr(inner)?)))
                }
                _ => Err(QvmError::malformed(format!(
                    "expected (- <angle>) while reading an angle, got {}",
                    expr
                ))),
            },
        }
    }
}

impl fmt::Display for AngleExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AngleExpr::Literal(value) => write!(f, "{}", value),
            AngleExpr::Named(name) => write!(f, "{}", name),
            AngleExpr::Negate(inner) => write!(f, "(- {})", inner),
        }
    }
}

/// Classical condition over recorded measurement outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Literal(bool),
    /// The recorded outcome of a qubit.
    Signal(QubitId),
    /// Parity of two or more sub-conditions.
    Xor(Vec<Condition>),
}

impl Condition {
    /// Evaluates the condition. Every referenced signal must already be set.
    pub fn evaluate(&self, signals: &SignalStore) -> Result<bool> {
        match self {
            Condition::Literal(value) => Ok(*value),
            Condition::Signal(qubit) => signals.get(*qubit),
            Condition::Xor(terms) => terms
                .iter()
                .try_fold(false, |acc, term| Ok(acc ^ term.evaluate(signals)?)),
        }
    }

    fn from_expr(expr: &Expr) -> Result<Self> {
        match expr {
            Expr::Atom(value) if value == "0" => Ok(Condition::Literal(false)),
            Expr::Atom(value) if value == "1" => Ok(Condition::Literal(true)),
            Expr::List(items) => match items.as_slice() {
                [Expr::Atom(head), id] if matches!(head.as_str(), "q" | "Q" | "s" | "S") => {
                    Ok(Condition::Signal(qubit_operand(id)?))
                }
                [Expr::Atom(head), terms @ ..] if head == "+" && terms.len() >= 2 => {
                    Ok(Condition::Xor(terms.iter().map(Self::from_expr).collect::<Result<_>>()?))
                }
                _ => Err(Self::syntax_error(expr)),
            },
            _ => Err(Self::syntax_error(expr)),
        }
    }

    fn syntax_error(expr: &Expr) -> QvmError {
        QvmError::malformed(format!(
            "cannot read signal {}; expected 0 | 1 | (q <qubit>) | (+ <signal> <signal>...)",
            expr
        ))
    }

    /// Checks nesting built by hand rather than by lowering.
    fn check(&self) -> Result<()> {
        match self {
            Condition::Xor(terms) if terms.len() < 2 => {
                Err(QvmError::malformed("an xor condition needs at least two operands"))
            }
            Condition::Xor(terms) => terms.iter().try_for_each(Condition::check),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Literal(value) => write!(f, "{}", u8::from(*value)),
            Condition::Signal(qubit) => write!(f, "(q {})", qubit.0),
            Condition::Xor(terms) => {
                write!(f, "(+")?;
                for term in terms {
                    write!(f, " {}", term)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn qubit_operand(expr: &Expr) -> Result<QubitId> {
    match expr {
        Expr::Atom(value) => value
            .parse::<u64>()
            .map(QubitId)
            .map_err(|_| QvmError::malformed(format!("expected a qubit id, got \"{}\"", value))),
        Expr::List(_) => Err(QvmError::malformed(format!("expected a qubit id, got {}", expr))),
    }
}

// --- Commands ---

/// A single step of a measurement program.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Controlled-Z between two qubits, joining their groups.
    Entangle { first: QubitId, second: QubitId },
    /// Measurement in the basis rotated by `angle`.
    ///
    /// The angle is negated when `sign` holds and shifted by π when `shift`
    /// holds. A missing angle measures at 0.
    Measure {
        qubit: QubitId,
        angle: Option<AngleExpr>,
        sign: Option<Condition>,
        shift: Option<Condition>,
    },
    /// Pauli X, applied only when `condition` holds (always if absent).
    XCorrect { qubit: QubitId, condition: Option<Condition> },
    /// Pauli Z, applied only when `condition` holds (always if absent).
    ZCorrect { qubit: QubitId, condition: Option<Condition> },
    /// An opcode the interpreter does not know. Reported and skipped.
    Unknown { opcode: String },
}

impl Command {
    /// Lowers one command tree.
    ///
    /// The first character of the head atom selects the command, so `E`,
    /// `Entangle` and `E12` all mean entangle.
    pub fn from_expr(expr: &Expr) -> Result<Self> {
        let (head, args): (&str, &[Expr]) = match expr {
            Expr::Atom(op) => (op.as_str(), [].as_slice()),
            Expr::List(items) => match items.split_first() {
                Some((Expr::Atom(op), rest)) => (op.as_str(), rest),
                Some((other, _)) => {
                    return Err(QvmError::malformed(format!(
                        "command name must be an atom, got {}",
                        other
                    )));
                }
                None => return Err(QvmError::malformed("empty command")),
            },
        };

        let operand = |index: usize, what: &str| {
            args.get(index)
                .ok_or_else(|| QvmError::malformed(format!("{} is missing its {}", expr, what)))
        };
        let condition = |index: usize| args.get(index).map(Condition::from_expr).transpose();

        let command = match head.chars().next() {
            Some('E') => Command::Entangle {
                first: qubit_operand(operand(0, "first qubit")?)?,
                second: qubit_operand(operand(1, "second qubit")?)?,
            },
            Some('M') => Command::Measure {
                qubit: qubit_operand(operand(0, "target qubit")?)?,
                angle: args.get(1).map(AngleExpr::from_expr).transpose()?,
                sign: condition(2)?,
                shift: condition(3)?,
            },
            Some('X') => Command::XCorrect {
                qubit: qubit_operand(operand(0, "target qubit")?)?,
                condition: condition(1)?,
            },
            Some('Z') => Command::ZCorrect {
                qubit: qubit_operand(operand(0, "target qubit")?)?,
                condition: condition(1)?,
            },
            _ => Command::Unknown { opcode: head.to_string() },
        };
        Ok(command)
    }

    fn conditions(&self) -> impl Iterator<Item = &Condition> {
        let (a, b) = match self {
            Command::Measure { sign, shift, .. } => (sign.as_ref(), shift.as_ref()),
            Command::XCorrect { condition, .. } | Command::ZCorrect { condition, .. } => {
                (condition.as_ref(), None)
            }
            _ => (None, None),
        };
        a.into_iter().chain(b)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Entangle { first, second } => write!(f, "(E {} {})", first.0, second.0),
            Command::Measure { qubit, angle, sign, shift } => {
                write!(f, "(M {}", qubit.0)?;
                // operands are positional, so later ones need placeholders
                match angle {
                    Some(angle) => write!(f, " {}", angle)?,
                    None if sign.is_some() || shift.is_some() => write!(f, " 0")?,
                    None => {}
                }
                match sign {
                    Some(sign) => write!(f, " {}", sign)?,
                    None if shift.is_some() => write!(f, " 0")?,
                    None => {}
                }
                if let Some(shift) = shift {
                    write!(f, " {}", shift)?;
                }
                write!(f, ")")
            }
            Command::XCorrect { qubit, condition } | Command::ZCorrect { qubit, condition } => {
                let op = if matches!(self, Command::XCorrect { .. }) { "X" } else { "Z" };
                write!(f, "({} {}", op, qubit.0)?;
                if let Some(condition) = condition {
                    write!(f, " {}", condition)?;
                }
                write!(f, ")")
            }
            Command::Unknown { opcode } => write!(f, "({})", opcode),
        }
    }
}

// --- Program Structure ---

/// An ordered, immutable command sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    commands: Vec<Command>,
}

impl Program {
    /// Lowers a sequence of command trees.
    pub fn from_exprs<'a, I>(exprs: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Expr>,
    {
        exprs
            .into_iter()
            .fold(ProgramBuilder::new(), |builder, expr| builder.add_expr(expr))
            .build()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MBQC Program ({} commands)", self.len())?;
        for (pc, command) in self.commands.iter().enumerate() {
            writeln!(f, "  {:04}: {}", pc, command)?;
        }
        Ok(())
    }
}

// --- Program Builder ---

/// Facilitates the construction of [`Program`] instances using a fluent API.
///
/// # Examples
/// ```
/// # use mbqc::vm::{Command, Condition, Expr, ProgramBuilder};
/// # use mbqc::QubitId;
/// let program = ProgramBuilder::new()
///     .pb_add(Command::Entangle { first: QubitId(1), second: QubitId(2) })
///     .add_expr(&Expr::list([Expr::atom("M"), Expr::atom("1"), Expr::atom("PI/4")]))
///     .pb_add(Command::XCorrect {
///         qubit: QubitId(2),
///         condition: Some(Condition::Signal(QubitId(1))),
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(program.len(), 3);
/// println!("{}", program);
/// ```
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    commands: Vec<Command>,
    error: Option<QvmError>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command to the program sequence.
    pub fn pb_add(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Adds multiple commands from an iterator.
    pub fn add_many<I>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = Command>,
    {
        self.commands.extend(commands);
        self
    }

    /// Lowers a command tree and adds it. A lowering failure is kept and
    /// reported by [`ProgramBuilder::build`].
    pub fn add_expr(mut self, expr: &Expr) -> Self {
        if self.error.is_none() {
            match Command::from_expr(expr) {
                Ok(command) => self.commands.push(command),
                Err(err) => self.error = Some(err),
            }
        }
        self
    }

    /// Builds the final `Program`.
    ///
    /// Returns the first lowering error, or `MalformedCommand` if a
    /// hand-built xor condition has fewer than two operands.
    pub fn build(self) -> Result<Program> {
        if let Some(err) = self.error {
            return Err(err);
        }
        for command in &self.commands {
            command.conditions().try_for_each(Condition::check)?;
        }
        Ok(Program { commands: self.commands })
    }
}
