use super::{shrink_to_next_arrival, Policy};
use crate::core::state::{QueueId, SimCtx, TaskId, Ticks};

// An arrival-truncated segment does not end the runner's turn: the
// newcomer joins the tail and the runner resumes from the head with the
// rest of its slice. Only quantum expiry sends it to the back.
pub struct RoundRobin {
    queue: QueueId,
    quantum: Ticks,
}

impl RoundRobin {
    pub fn new(ctx: &mut SimCtx, quantum: Ticks) -> Self {
        assert!(quantum > 0, "round robin requires a positive quantum");
        Self {
            queue: ctx.create_queue_fifo(),
            quantum,
        }
    }
}

impl Policy for RoundRobin {
    fn admit(&mut self, ctx: &mut SimCtx, task: TaskId) {
        ctx.queue_push_back(self.queue, task);
    }

    fn select(&self, ctx: &SimCtx) -> Option<TaskId> {
        ctx.queue_head(self.queue)
    }

    fn plan(&self, ctx: &SimCtx, task: TaskId) -> Ticks {
        let t = ctx.task(task);
        debug_assert!(t.consumed_slice < self.quantum);
        let run = t.remaining.min(self.quantum - t.consumed_slice);
        shrink_to_next_arrival(ctx, run)
    }

    fn requeue(&mut self, ctx: &mut SimCtx, task: TaskId) {
        if ctx.task(task).consumed_slice >= self.quantum {
            ctx.task_mut(task).consumed_slice = 0;
            ctx.queue_push_back(self.queue, task);
        } else {
            // Arrival-split turn: resume ahead of the newcomers.
            ctx.queue_push_front(self.queue, task);
        }
    }
}
