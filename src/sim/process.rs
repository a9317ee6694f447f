use crate::core::state::{Pid, Ticks};

// Caller-facing descriptor: identity and demands in, timing metrics out.
// `burst` is never mutated; remaining time lives in the simulation state.
// Priority is smaller-is-more-urgent and must be >= 1; under MLQ it names
// the fixed queue assignment (1..3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub pid: Pid,
    pub arrival: Ticks,
    pub burst: Ticks,
    pub priority: u32,

    pub completion: Option<Ticks>,
    pub turnaround: Option<Ticks>,
    pub waiting: Option<Ticks>,
    pub first_run: Option<Ticks>,
}

impl Process {
    pub fn new(pid: Pid, arrival: Ticks, burst: Ticks, priority: u32) -> Self {
        Self {
            pid,
            arrival,
            burst,
            priority,
            completion: None,
            turnaround: None,
            waiting: None,
            first_run: None,
        }
    }
}
