use super::Policy;
use crate::core::state::{QueueId, SimCtx, TaskId, Ticks};

pub struct Fcfs {
    queue: QueueId,
}

impl Fcfs {
    pub fn new(ctx: &mut SimCtx) -> Self {
        Self {
            queue: ctx.create_queue_fifo(),
        }
    }
}

impl Policy for Fcfs {
    fn admit(&mut self, ctx: &mut SimCtx, task: TaskId) {
        ctx.queue_push_back(self.queue, task);
    }

    fn select(&self, ctx: &SimCtx) -> Option<TaskId> {
        ctx.queue_head(self.queue)
    }

    fn plan(&self, ctx: &SimCtx, task: TaskId) -> Ticks {
        ctx.task(task).remaining
    }

    fn requeue(&mut self, ctx: &mut SimCtx, task: TaskId) {
        // Non-preemptive runs always complete; nothing should come back.
        debug_assert!(false, "FCFS requeued task {task}");
        ctx.queue_push_back(self.queue, task);
    }
}
