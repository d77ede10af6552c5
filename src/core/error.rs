//! Error handling logic

use std::fmt;

/// External identifier of one logical qubit.
///
/// The id is independent of where the qubit currently sits inside the tensor
/// product of its entanglement group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QubitId(pub u64);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, QvmError>;

/// Failures raised while lowering or executing a measurement program.
///
/// Every variant except the ones produced while reading configuration is
/// fatal for the run in progress: the program must be fixed and re-run from
/// scratch, there is no retry at this layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QvmError {
    /// A command is missing an operand or an operand has the wrong shape.
    #[error("malformed command: {message}")]
    MalformedCommand {
        /// What was wrong with the command
        message: String,
    },

    /// A condition referenced a signal that has not been recorded yet.
    #[error("signal for {qubit} was read before it was recorded")]
    SignalMissing {
        /// The qubit whose outcome was requested
        qubit: QubitId,
    },

    /// A qubit was measured a second time.
    #[error("signal for {qubit} was already recorded")]
    SignalAlreadySet {
        /// The qubit whose outcome already exists
        qubit: QubitId,
    },

    /// The slot table of the quantum memory is full.
    #[error("quantum memory exhausted: more than {capacity} entanglement groups")]
    CapacityExhausted {
        /// Configured number of slots
        capacity: usize,
    },

    /// Internal bookkeeping no longer matches the amplitude data.
    #[error("invariant violated: {message}")]
    InvariantViolation {
        /// Description of the broken invariant
        message: String,
    },

    /// A qubit was installed while already present in memory.
    #[error("{qubit} already exists in quantum memory")]
    DuplicateQubit {
        /// The offending qubit
        qubit: QubitId,
    },

    /// An amplitude buffer does not have `2^n` entries.
    #[error("amplitude buffer has {actual} entries, expected {expected}")]
    DimensionMismatch {
        /// Required length
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// An angle name could not be resolved and no value was supplied for it.
    #[error("angle \"{name}\" is not a recognised constant")]
    UnknownAngle {
        /// Upper-cased constant name
        name: String,
    },

    /// Both measurement branches have zero weight.
    #[error("measurement of {qubit} has no outcome with non-zero probability")]
    ZeroProbability {
        /// The measured qubit
        qubit: QubitId,
    },

    /// An operation that is well-formed but not allowed.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Why the operation was rejected
        message: String,
    },

    /// Configuration could not be read.
    #[error("configuration error: {message}")]
    Config {
        /// What failed to parse
        message: String,
    },
}

impl QvmError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        QvmError::MalformedCommand { message: message.into() }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        QvmError::InvariantViolation { message: message.into() }
    }
}
