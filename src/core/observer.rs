use super::log::{GanttLog, GanttOwner};
use super::state::SimCtx;

// Debug-build invariant checks, consulted after every driver iteration
#[derive(Debug)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn observe(&mut self, ctx: &SimCtx, log: &GanttLog) {
        self.step += 1;

        for (&task_id, &queue_id) in &ctx.task_to_queue {
            let task = ctx.task(task_id);
            debug_assert!(
                !task.is_done(),
                "complete task {task_id} still present in queue {queue_id:?}"
            );
            if let Some(queue) = ctx.queues.get(queue_id) {
                debug_assert!(
                    queue.contains(task_id),
                    "task_to_queue claims task {task_id} in {queue_id:?}, but queue does not contain it"
                );
            } else {
                debug_assert!(false, "task_to_queue references unknown queue {queue_id:?}");
            }
        }

        let enqueued: usize = ctx.queues.values().map(|q| q.len()).sum();
        debug_assert_eq!(
            enqueued,
            ctx.task_to_queue.len(),
            "queue contents and membership map disagree"
        );

        let mut executed = 0;
        for window in log.segments().windows(2) {
            debug_assert_eq!(
                window[0].finish, window[1].start,
                "log segments must be contiguous"
            );
            debug_assert_ne!(
                window[0].owner, window[1].owner,
                "adjacent log segments must have distinct owners"
            );
        }
        for segment in log.segments() {
            debug_assert!(segment.start < segment.finish, "empty log segment");
            if segment.owner != GanttOwner::Idle {
                executed += segment.finish - segment.start;
            }
        }

        let consumed: u64 = ctx.tasks.iter().map(|t| t.burst - t.remaining).sum();
        debug_assert_eq!(
            executed, consumed,
            "logged execution time and consumed burst time disagree"
        );
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::new()
    }
}
