use crate::core::state::Pid;
use std::fmt;

// Structural precondition violations, reported before simulation begins.
// Once the input validates, the run is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    InvalidAlgorithm { code: u32 },
    InvalidProcess { pid: Pid },
    InvalidQuantum,
    InvalidMlqQueue { pid: Pid, queue: u32 },
    DuplicatePid { pid: Pid },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAlgorithm { code } => {
                write!(f, "unknown algorithm code {code} (expected 0..7)")
            }
            Self::InvalidProcess { pid } => {
                write!(f, "process {pid} has a zero burst or a priority below 1")
            }
            Self::InvalidQuantum => write!(f, "round robin requires a quantum of at least 1"),
            Self::InvalidMlqQueue { pid, queue } => {
                write!(f, "process {pid} names MLQ queue {queue} (expected 1..3)")
            }
            Self::DuplicatePid { pid } => write!(f, "pid {pid} appears more than once"),
        }
    }
}

impl std::error::Error for SimError {}
