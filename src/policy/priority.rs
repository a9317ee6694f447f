use super::{shrink_to_next_arrival, Policy, AGING_RATE};
use crate::core::state::{QueueId, Rank, SimCtx, TaskId, Ticks};

// Smaller numbers are more urgent. A never-run waiter drops one priority
// step per AGING_RATE ticks of wait, clamped at 1, and freezes at its
// current value the first time it runs.
pub struct PriorityPolicy {
    queue: QueueId,
    preemptive: bool,
}

impl PriorityPolicy {
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
            key: u64::from(t.current_priority),
            at: t.arrival,
            pid: t.pid,
        }
    }

    fn aged_priority(base: u32, waited: Ticks) -> u32 {
        base.saturating_sub((waited / AGING_RATE) as u32).max(1)
    }
}

impl Policy for PriorityPolicy {
    fn admit(&mut self, ctx: &mut SimCtx, task: TaskId) {
        let rank = Self::rank(ctx, task);
        ctx.queue_push_ranked(self.queue, task, rank);
    }

    fn prepare(&mut self, ctx: &mut SimCtx) {
        let now = ctx.now;
        for task_id in 0..ctx.tasks.len() {
            let task = ctx.task(task_id);
            if !task.available_at(now) || task.first_run.is_some() {
                continue;
            }
            let aged = Self::aged_priority(task.base_priority, now - task.arrival);
            if aged != task.current_priority {
                ctx.task_mut(task_id).current_priority = aged;
                let rank = Self::rank(ctx, task_id);
                ctx.queue_update_rank(task_id, rank);
            }
        }
    }

    fn select(&self, ctx: &SimCtx) -> Option<TaskId> {
        ctx.queue_head(self.queue)
    }

    fn plan(&self, ctx: &SimCtx, task: TaskId) -> Ticks {
        let me = ctx.task(task);
        let mut run = me.remaining;
        if !self.preemptive {
            return run;
        }

        let t = ctx.now;
        let urgency = me.current_priority;

        // A candidate that already outranks the runner means the plan was
        // re-entered after an intermediate event; fall back to one tick so
        // selection happens again immediately.
        for (other_id, other) in ctx.tasks.iter().enumerate() {
            if other_id != task && other.available_at(t) && other.current_priority < urgency {
                return 1;
            }
        }

        // Every arrival is a recheck boundary: the newcomer may outrank
        // the runner at its arrival instant, and even one that does not
        // starts aging from there.
        run = shrink_to_next_arrival(ctx, run);

        // A waiting, never-run process overtakes the runner once aging has
        // dropped it below the runner's urgency; yield at that instant.
        if urgency > 1 {
            for (other_id, other) in ctx.tasks.iter().enumerate() {
                if other_id == task || !other.available_at(t) || other.first_run.is_some() {
                    continue;
                }
                let drops_needed = i64::from(other.base_priority) - i64::from(urgency) + 1;
                if drops_needed <= 0 {
                    continue;
                }
                let crossing = other.arrival + AGING_RATE * drops_needed as Ticks;
                if crossing > t && crossing < t + run {
                    run = crossing - t;
                }
            }
        }

        run
    }

    fn requeue(&mut self, ctx: &mut SimCtx, task: TaskId) {
        debug_assert!(self.preemptive, "non-preemptive priority requeued task {task}");
        let rank = Self::rank(ctx, task);
        ctx.queue_push_ranked(self.queue, task, rank);
    }
}
