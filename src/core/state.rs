use keyed_priority_queue::KeyedPriorityQueue;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::collections::VecDeque;

// Index into the task Vec
pub type TaskId = usize;
pub type Ticks = u64;
pub type Pid = u32;

new_key_type! {
    pub struct QueueId;
}

// Ranked-queue key: the policy's ordering criterion, with ties falling to
// arrival time, then pid.
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub struct Rank {
    pub key: u64,
    pub at: Ticks,
    pub pid: Pid,
}

// KeyedPriorityQueue is a max-heap, so Rank's Ord is flipped to pop the
// smallest (key, at, pid) triple first.
impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (other.key, other.at, other.pid).cmp(&(self.key, self.at, self.pid))
    }
}

#[derive(Debug)]
pub struct Task {
    pub pid: Pid,
    pub arrival: Ticks,
    pub burst: Ticks,
    pub base_priority: u32,

    pub remaining: Ticks,
    pub current_priority: u32,
    pub first_run: Option<Ticks>,
    pub completion: Option<Ticks>,

    // Quantum accounting: ticks consumed of the current slice. Survives
    // arrival-split segments; reset only on slice expiry or level change.
    pub consumed_slice: Ticks,

    // Multilevel state (1-based levels, matching MLQ queue ids)
    pub level: usize,
    pub last_q3_entry: Option<Ticks>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }

    pub fn available_at(&self, t: Ticks) -> bool {
        self.remaining > 0 && self.arrival <= t
    }
}

#[derive(Debug)]
pub enum ReadyQueue {
    Fifo { tasks: VecDeque<TaskId> },
    Ranked { tasks: KeyedPriorityQueue<TaskId, Rank> },
}

impl ReadyQueue {
    pub fn new_fifo() -> Self {
        Self::Fifo {
            tasks: VecDeque::new(),
        }
    }

    pub fn new_ranked() -> Self {
        Self::Ranked {
            tasks: KeyedPriorityQueue::new(),
        }
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        match self {
            Self::Fifo { tasks } => tasks.contains(&task_id),
            Self::Ranked { tasks } => tasks.iter().any(|t| *t.0 == task_id),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fifo { tasks } => tasks.len(),
            Self::Ranked { tasks } => tasks.len(),
        }
    }

    fn head(&self) -> Option<TaskId> {
        match self {
            Self::Fifo { tasks } => tasks.front().copied(),
            Self::Ranked { tasks } => tasks.peek().map(|t| *t.0),
        }
    }

    fn pop_head(&mut self) -> Option<TaskId> {
        match self {
            Self::Fifo { tasks } => tasks.pop_front(),
            Self::Ranked { tasks } => tasks.pop().map(|t| t.0),
        }
    }
}

#[derive(Debug)]
pub struct SimCtx {
    pub now: Ticks,
    pub tasks: Vec<Task>,
    pub queues: SlotMap<QueueId, ReadyQueue>,
    pub task_to_queue: FxHashMap<TaskId, QueueId>,

    // Task ids sorted by (arrival, pid); admissions pop from the cursor.
    admit_order: Vec<TaskId>,
    admit_cursor: usize,
    completed: usize,
}

impl SimCtx {
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut admit_order: Vec<TaskId> = (0..tasks.len()).collect();
        admit_order.sort_by_key(|&i| (tasks[i].arrival, tasks[i].pid));

        Self {
            now: 0,
            tasks,
            queues: SlotMap::with_key(),
            task_to_queue: FxHashMap::default(),
            admit_order,
            admit_cursor: 0,
            completed: 0,
        }
    }

    pub fn create_queue_fifo(&mut self) -> QueueId {
        self.queues.insert(ReadyQueue::new_fifo())
    }

    pub fn create_queue_ranked(&mut self) -> QueueId {
        self.queues.insert(ReadyQueue::new_ranked())
    }

    pub fn pop_due_arrival(&mut self) -> Option<TaskId> {
        let &task_id = self.admit_order.get(self.admit_cursor)?;
        if self.tasks[task_id].arrival > self.now {
            return None;
        }
        self.admit_cursor += 1;
        Some(task_id)
    }

    pub fn next_arrival_after(&self, t: Ticks) -> Option<Ticks> {
        self.admit_order[self.admit_cursor..]
            .iter()
            .map(|&i| self.tasks[i].arrival)
            .find(|&at| at > t)
    }

    fn queue_insert(&mut self, queue_id: QueueId, task_id: TaskId) -> &mut ReadyQueue {
        assert!(
            !self.task_to_queue.contains_key(&task_id),
            "task {task_id} already present in some ready queue"
        );
        debug_assert!(
            !self.tasks[task_id].is_done(),
            "task {task_id} must not be complete when enqueued"
        );

        self.task_to_queue.insert(task_id, queue_id);
        self.queues.get_mut(queue_id).expect("unknown ready queue")
    }

    pub fn queue_push_back(&mut self, queue_id: QueueId, task_id: TaskId) {
        match self.queue_insert(queue_id, task_id) {
            ReadyQueue::Fifo { tasks } => tasks.push_back(task_id),
            ReadyQueue::Ranked { .. } => panic!("push_back on a ranked queue"),
        }
    }

    pub fn queue_push_front(&mut self, queue_id: QueueId, task_id: TaskId) {
        match self.queue_insert(queue_id, task_id) {
            ReadyQueue::Fifo { tasks } => tasks.push_front(task_id),
            ReadyQueue::Ranked { .. } => panic!("push_front on a ranked queue"),
        }
    }

    pub fn queue_push_ranked(&mut self, queue_id: QueueId, task_id: TaskId, rank: Rank) {
        match self.queue_insert(queue_id, task_id) {
            ReadyQueue::Fifo { .. } => panic!("ranked push on a FIFO queue"),
            ReadyQueue::Ranked { tasks } => {
                tasks.push(task_id, rank);
            }
        }
    }

    // Re-key an enqueued task in place (aging).
    pub fn queue_update_rank(&mut self, task_id: TaskId, rank: Rank) {
        let queue_id = *self
            .task_to_queue
            .get(&task_id)
            .expect("rank update for a task in no queue");
        match self.queues.get_mut(queue_id).expect("unknown ready queue") {
            ReadyQueue::Fifo { .. } => panic!("rank update on a FIFO queue"),
            ReadyQueue::Ranked { tasks } => {
                tasks.push(task_id, rank);
            }
        }
    }

    pub fn queue_head(&self, queue_id: QueueId) -> Option<TaskId> {
        self.queues[queue_id].head()
    }

    // The winner is always the head of whichever queue it sits in.
    pub fn queue_take(&mut self, task_id: TaskId) {
        let queue_id = self
            .task_to_queue
            .remove(&task_id)
            .expect("taking a task that is in no queue");
        let popped = self.queues[queue_id].pop_head();
        debug_assert_eq!(popped, Some(task_id), "selected task was not at the head");
    }

    // Mid-queue removal (MLFQ promotion).
    pub fn queue_remove(&mut self, task_id: TaskId) {
        let queue_id = self
            .task_to_queue
            .remove(&task_id)
            .expect("removing a task that is in no queue");
        match &mut self.queues[queue_id] {
            ReadyQueue::Fifo { tasks } => tasks.retain(|&t| t != task_id),
            ReadyQueue::Ranked { .. } => panic!("mid-queue removal from a ranked queue"),
        }
    }

    pub fn task(&self, task_id: TaskId) -> &Task {
        &self.tasks[task_id]
    }

    pub fn task_mut(&mut self, task_id: TaskId) -> &mut Task {
        &mut self.tasks[task_id]
    }

    pub fn run_task(&mut self, task_id: TaskId, run: Ticks) {
        let now = self.now;
        let task = &mut self.tasks[task_id];
        debug_assert!(run > 0, "zero-length run for task {task_id}");
        debug_assert!(
            run <= task.remaining,
            "task {task_id} overran its remaining time"
        );

        if task.first_run.is_none() {
            task.first_run = Some(now);
        }
        task.remaining -= run;
        task.consumed_slice += run;
        if task.remaining == 0 {
            task.completion = Some(now + run);
            self.completed += 1;
        }
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn all_done(&self) -> bool {
        self.completed == self.tasks.len()
    }
}
