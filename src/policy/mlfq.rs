use super::{shrink_to_next_arrival, Policy, MLFQ_PROMOTE_AFTER, MLFQ_Q1_SLICE, MLFQ_Q2_SLICE};
use crate::core::state::{QueueId, ReadyQueue, SimCtx, TaskId, Ticks};

// Strict priority Q1 > Q2 > Q3, everyone admitted to Q1. Arrivals
// truncate the current segment so the newcomer is ordered ahead of the
// yielding runner; slices are consumed cumulatively across the splits.
pub struct Mlfq {
    queues: [QueueId; 3],
}

impl Mlfq {
    pub fn new(ctx: &mut SimCtx) -> Self {
        Self {
            queues: [
                ctx.create_queue_fifo(),
                ctx.create_queue_fifo(),
                ctx.create_queue_fifo(),
            ],
        }
    }

    fn slice_for(&self, ctx: &SimCtx, task: TaskId) -> Ticks {
        let t = ctx.task(task);
        match t.level {
            1 => MLFQ_Q1_SLICE - t.consumed_slice,
            2 => MLFQ_Q2_SLICE - t.consumed_slice,
            _ => t.remaining,
        }
    }
}

impl Policy for Mlfq {
    fn admit(&mut self, ctx: &mut SimCtx, task: TaskId) {
        ctx.task_mut(task).level = 1;
        ctx.queue_push_back(self.queues[0], task);
    }

    // Anti-starvation promotion out of Q3, in queue order.
    fn prepare(&mut self, ctx: &mut SimCtx) {
        let now = ctx.now;
        let due: Vec<TaskId> = match &ctx.queues[self.queues[2]] {
            ReadyQueue::Fifo { tasks } => tasks
                .iter()
                .copied()
                .filter(|&id| {
                    ctx.task(id)
                        .last_q3_entry
                        .is_some_and(|entered| now - entered >= MLFQ_PROMOTE_AFTER)
                })
                .collect(),
            ReadyQueue::Ranked { .. } => unreachable!("MLFQ queues are FIFOs"),
        };

        for task_id in due {
            ctx.queue_remove(task_id);
            let task = ctx.task_mut(task_id);
            task.level = 2;
            task.last_q3_entry = None;
            task.consumed_slice = 0;
            ctx.queue_push_back(self.queues[1], task_id);
        }
    }

    fn select(&self, ctx: &SimCtx) -> Option<TaskId> {
        self.queues.iter().find_map(|&q| ctx.queue_head(q))
    }

    fn plan(&self, ctx: &SimCtx, task: TaskId) -> Ticks {
        let run = ctx.task(task).remaining.min(self.slice_for(ctx, task));
        shrink_to_next_arrival(ctx, run)
    }

    fn requeue(&mut self, ctx: &mut SimCtx, task: TaskId) {
        let now = ctx.now;
        let (level, consumed) = {
            let t = ctx.task(task);
            (t.level, t.consumed_slice)
        };

        let expired = match level {
            1 => consumed >= MLFQ_Q1_SLICE,
            2 => consumed >= MLFQ_Q2_SLICE,
            _ => false,
        };

        if expired {
            let task_state = ctx.task_mut(task);
            task_state.level = level + 1;
            task_state.consumed_slice = 0;
            if task_state.level == 3 {
                task_state.last_q3_entry = Some(now);
            }
            ctx.queue_push_back(self.queues[level], task);
        } else {
            // Early yield: back of the same queue, slice intact.
            if level == 3 {
                ctx.task_mut(task).last_q3_entry = Some(now);
            }
            ctx.queue_push_back(self.queues[level - 1], task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Task;

    fn task(pid: u32, burst: Ticks) -> Task {
        Task {
            pid,
            arrival: 0,
            burst,
            base_priority: 1,
            remaining: burst,
            current_priority: 1,
            first_run: None,
            completion: None,
            consumed_slice: 0,
            level: 1,
            last_q3_entry: None,
        }
    }

    #[test]
    fn starved_q3_resident_promotes_to_q2_tail() {
        let mut ctx = SimCtx::new(vec![task(1, 10), task(2, 10)]);
        let mut policy = Mlfq::new(&mut ctx);

        for (id, entered) in [(0, 0), (1, 40)] {
            let t = ctx.task_mut(id);
            t.level = 3;
            t.consumed_slice = 5;
            t.last_q3_entry = Some(entered);
            ctx.queue_push_back(policy.queues[2], id);
        }

        ctx.advance_time(60);
        policy.prepare(&mut ctx);

        // 60 ticks of Q3 residence crosses the threshold; 20 does not.
        assert_eq!(ctx.task(0).level, 2);
        assert_eq!(ctx.task(0).last_q3_entry, None);
        assert_eq!(ctx.task(0).consumed_slice, 0);
        assert_eq!(ctx.queue_head(policy.queues[1]), Some(0));

        assert_eq!(ctx.task(1).level, 3);
        assert_eq!(ctx.queue_head(policy.queues[2]), Some(1));
    }
}
