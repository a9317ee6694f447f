use super::Policy;
use crate::core::state::{QueueId, Rank, SimCtx, TaskId, Ticks};

// SJF runs the smallest remaining time to completion; SRTF additionally
// yields to arrivals with less remaining time than the runner.
pub struct ShortestJob {
    queue: QueueId,
    preemptive: bool,
}

impl ShortestJob {
    pub fn non_preemptive(ctx: &mut SimCtx) -> Self {
        Self {
            queue: ctx.create_queue_ranked(),
            preemptive: false,
        }
    }

    pub fn preemptive(ctx: &mut SimCtx) -> Self {
        Self {
            queue: ctx.create_queue_ranked(),
            preemptive: true,
        }
    }

    fn rank(ctx: &SimCtx, task: TaskId) -> Rank {
        let t = ctx.task(task);
        Rank {
            key: t.remaining,
            at: t.arrival,
            pid: t.pid,
        }
    }
}

impl Policy for ShortestJob {
    fn admit(&mut self, ctx: &mut SimCtx, task: TaskId) {
        let rank = Self::rank(ctx, task);
        ctx.queue_push_ranked(self.queue, task, rank);
    }

    fn select(&self, ctx: &SimCtx) -> Option<TaskId> {
        ctx.queue_head(self.queue)
    }

    fn plan(&self, ctx: &SimCtx, task: TaskId) -> Ticks {
        let remaining = ctx.task(task).remaining;
        let mut run = remaining;
        if !self.preemptive {
            return run;
        }

        // Yield at the earliest future arrival that would outrank the
        // runner. Folding the shrink keeps the earliest qualifying one.
        let t = ctx.now;
        for other in ctx.tasks.iter() {
            if other.remaining > 0
                && other.arrival > t
                && other.arrival < t + run
                && other.remaining < remaining
            {
                run = other.arrival - t;
            }
        }
        run
    }

    fn requeue(&mut self, ctx: &mut SimCtx, task: TaskId) {
        debug_assert!(self.preemptive, "SJF requeued task {task}");
        let rank = Self::rank(ctx, task);
        ctx.queue_push_ranked(self.queue, task, rank);
    }
}
