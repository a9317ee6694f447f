use super::{shrink_to_next_arrival, Policy, MLQ_Q2_SLICE};
use crate::core::state::{QueueId, Rank, SimCtx, TaskId, Ticks};

// Fixed assignment from the input priority field (1..3), no migration.
// Q1 is ranked and preempts everything; a Q2/Q3 run truncated by a Q1
// arrival resumes from the head of its own queue.
pub struct Mlq {
    q1: QueueId,
    q2: QueueId,
    q3: QueueId,
}

impl Mlq {
    pub fn new(ctx: &mut SimCtx) -> Self {
        Self {
            q1: ctx.create_queue_ranked(),
            q2: ctx.create_queue_fifo(),
            q3: ctx.create_queue_fifo(),
        }
    }

    fn q1_rank(ctx: &SimCtx, task: TaskId) -> Rank {
        let t = ctx.task(task);
        Rank {
            key: u64::from(t.base_priority),
            at: t.arrival,
            pid: t.pid,
        }
    }

    fn shrink_to_q1_arrival(ctx: &SimCtx, mut run: Ticks) -> Ticks {
        let t = ctx.now;
        for other in ctx.tasks.iter() {
            if other.remaining > 0
                && other.level == 1
                && other.arrival > t
                && other.arrival < t + run
            {
                run = other.arrival - t;
            }
        }
        run
    }
}

impl Policy for Mlq {
    fn admit(&mut self, ctx: &mut SimCtx, task: TaskId) {
        match ctx.task(task).level {
            1 => {
                let rank = Self::q1_rank(ctx, task);
                ctx.queue_push_ranked(self.q1, task, rank);
            }
            2 => ctx.queue_push_back(self.q2, task),
            _ => ctx.queue_push_back(self.q3, task),
        }
    }

    fn select(&self, ctx: &SimCtx) -> Option<TaskId> {
        ctx.queue_head(self.q1)
            .or_else(|| ctx.queue_head(self.q2))
            .or_else(|| ctx.queue_head(self.q3))
    }

    fn plan(&self, ctx: &SimCtx, task: TaskId) -> Ticks {
        let t = ctx.task(task);
        match t.level {
            // A better-ranked Q1 arrival takes over at its arrival
            // instant; recheck at every arrival boundary.
            1 => shrink_to_next_arrival(ctx, t.remaining),
            2 => {
                debug_assert!(t.consumed_slice < MLQ_Q2_SLICE);
                let run = t.remaining.min(MLQ_Q2_SLICE - t.consumed_slice);
                Self::shrink_to_q1_arrival(ctx, run)
            }
            _ => Self::shrink_to_q1_arrival(ctx, t.remaining),
        }
    }

    fn requeue(&mut self, ctx: &mut SimCtx, task: TaskId) {
        match ctx.task(task).level {
            1 => {
                let rank = Self::q1_rank(ctx, task);
                ctx.queue_push_ranked(self.q1, task, rank);
            }
            2 => {
                if ctx.task(task).consumed_slice >= MLQ_Q2_SLICE {
                    ctx.task_mut(task).consumed_slice = 0;
                    ctx.queue_push_back(self.q2, task);
                } else {
                    // Preempted by Q1 mid-slice: head, slice intact.
                    ctx.queue_push_front(self.q2, task);
                }
            }
            _ => ctx.queue_push_front(self.q3, task),
        }
    }
}
