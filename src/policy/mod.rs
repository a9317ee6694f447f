pub mod fcfs;
pub mod mlfq;
pub mod mlq;
pub mod priority;
pub mod rr;
pub mod shortest;

use crate::core::state::{SimCtx, TaskId, Ticks};
use crate::sim::SimError;
use std::fmt;

pub use fcfs::Fcfs;
pub use mlfq::Mlfq;
pub use mlq::Mlq;
pub use priority::PriorityPolicy;
pub use rr::RoundRobin;
pub use shortest::ShortestJob;

// Ticks of wait per one-step priority drop under the aging disciplines
pub const AGING_RATE: Ticks = 5;

pub const MLFQ_Q1_SLICE: Ticks = 8;
pub const MLFQ_Q2_SLICE: Ticks = 16;
// Q3 residence time after which MLFQ promotes back to Q2
pub const MLFQ_PROMOTE_AFTER: Ticks = 50;

pub const MLQ_Q2_SLICE: Ticks = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Fcfs,
    SjfNp,
    Srtf,
    PrioNp,
    PrioP,
    RoundRobin,
    Mlfq,
    Mlq,
}

impl Algorithm {
    pub fn from_code(code: u32) -> Result<Self, SimError> {
        match code {
            0 => Ok(Self::Fcfs),
            1 => Ok(Self::SjfNp),
            2 => Ok(Self::Srtf),
            3 => Ok(Self::PrioNp),
            4 => Ok(Self::PrioP),
            5 => Ok(Self::RoundRobin),
            6 => Ok(Self::Mlfq),
            7 => Ok(Self::Mlq),
            _ => Err(SimError::InvalidAlgorithm { code }),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Fcfs => 0,
            Self::SjfNp => 1,
            Self::Srtf => 2,
            Self::PrioNp => 3,
            Self::PrioP => 4,
            Self::RoundRobin => 5,
            Self::Mlfq => 6,
            Self::Mlq => 7,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fcfs => "FCFS",
            Self::SjfNp => "SJF (non-preemptive)",
            Self::Srtf => "SRTF",
            Self::PrioNp => "Priority (non-preemptive)",
            Self::PrioP => "Priority (preemptive)",
            Self::RoundRobin => "Round Robin",
            Self::Mlfq => "MLFQ",
            Self::Mlq => "MLQ",
        };
        f.write_str(name)
    }
}

// Hook order per driver iteration: admit, prepare (aging, promotion),
// select, plan, then requeue for an unfinished runner. select peeks;
// plan is called with the winner still at the head of its queue.
pub trait Policy {
    fn admit(&mut self, ctx: &mut SimCtx, task: TaskId);

    fn prepare(&mut self, _ctx: &mut SimCtx) {}

    fn select(&self, ctx: &SimCtx) -> Option<TaskId>;

    fn plan(&self, ctx: &SimCtx, task: TaskId) -> Ticks;

    fn requeue(&mut self, ctx: &mut SimCtx, task: TaskId);
}

// End the segment at the next arrival if one falls strictly inside
// (now, now+run).
pub(crate) fn shrink_to_next_arrival(ctx: &SimCtx, run: Ticks) -> Ticks {
    let t = ctx.now;
    match ctx.next_arrival_after(t) {
        Some(at) if at < t + run => at - t,
        _ => run,
    }
}
