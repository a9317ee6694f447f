pub mod driver;
pub mod log;
pub mod observer;
pub mod state;

pub use driver::SimCore;
pub use log::{GanttLog, GanttOwner, GanttSegment};
pub use state::{Pid, QueueId, Rank, ReadyQueue, SimCtx, Task, TaskId, Ticks};
