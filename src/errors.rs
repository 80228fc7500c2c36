use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum SimulatorError {
    // Decode errors
    MalformedInstruction { line: usize, text: String },
    ImmediateOutOfRange { line: usize, text: String, low: i32, high: i32 },

    // Configuration errors
    MalformedConfiguration(String),

    // Memory image errors
    MissingMemoryInitLine { line: usize, text: String },
    IllegalMemoryAccess(i64),

    // System errors
    Io(std::io::Error),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::MalformedInstruction { line, text } => {
                write!(f, "malformed instruction at line {line}: {text:?}")
            },
            SimulatorError::ImmediateOutOfRange { line, text, low, high } => {
                write!(
                    f,
                    "immediate out of range [{low}, {high}] at line {line}: {text:?}"
                )
            },
            SimulatorError::MalformedConfiguration(detail) => {
                write!(f, "malformed hardware configuration: {detail}")
            },
            SimulatorError::MissingMemoryInitLine { line, text } => {
                write!(f, "malformed memory init line {line}: {text:?}")
            },
            SimulatorError::IllegalMemoryAccess(addr) => {
                write!(f, "illegal memory access at address {addr} (valid range is [0, 65535])")
            },
            SimulatorError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl Error for SimulatorError {}

impl From<std::io::Error> for SimulatorError {
    fn from(error: std::io::Error) -> Self {
        SimulatorError::Io(error)
    }
}
