use super::log::{GanttLog, GanttOwner};
use super::observer::Observer;
use super::state::SimCtx;
use crate::policy::Policy;

// Time advances in variable-length steps; the planner guarantees no
// policy event falls inside a segment.
pub struct SimCore<P: Policy> {
    pub ctx: SimCtx,
    pub policy: P,
    pub log: GanttLog,
    observer: Observer,
}

impl<P: Policy> SimCore<P> {
    pub fn new(ctx: SimCtx, policy: P) -> Self {
        Self {
            ctx,
            policy,
            log: GanttLog::new(),
            observer: Observer::new(),
        }
    }

    pub fn run(&mut self) {
        while !self.ctx.all_done() {
            self.step();
        }
    }

    fn admit_due(&mut self) {
        while let Some(task) = self.ctx.pop_due_arrival() {
            self.policy.admit(&mut self.ctx, task);
        }
    }

    fn step(&mut self) {
        self.admit_due();
        self.policy.prepare(&mut self.ctx);

        let Some(winner) = self.policy.select(&self.ctx) else {
            // Nothing ready: the whole gap to the next arrival is one
            // idle segment.
            let now = self.ctx.now;
            let Some(next) = self.ctx.next_arrival_after(now) else {
                debug_assert!(self.ctx.all_done(), "no candidate, no arrival, not done");
                return;
            };
            self.log.append(GanttOwner::Idle, now, next);
            self.ctx.advance_time(next - now);
            return;
        };

        let run = self.policy.plan(&self.ctx, winner);
        if run == 0 {
            // Degenerate plan: burn one tick and reselect. The candidate
            // stays enqueued.
            let now = self.ctx.now;
            self.log.append(GanttOwner::Idle, now, now + 1);
            self.ctx.advance_time(1);
            return;
        }

        self.ctx.queue_take(winner);
        let start = self.ctx.now;
        let pid = self.ctx.task(winner).pid;
        self.ctx.run_task(winner, run);
        self.log.append(GanttOwner::Task(pid), start, start + run);
        self.ctx.advance_time(run);

        // Arrivals that landed during the segment enter the ready
        // structures before the runner is reinserted.
        self.admit_due();
        if !self.ctx.task(winner).is_done() {
            self.policy.requeue(&mut self.ctx, winner);
        }

        self.observer.observe(&self.ctx, &self.log);
    }

    pub fn into_parts(self) -> (SimCtx, GanttLog) {
        (self.ctx, self.log)
    }
}
