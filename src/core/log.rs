use super::state::{Pid, Ticks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GanttOwner {
    Task(Pid),
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GanttSegment {
    pub owner: GanttOwner,
    pub start: Ticks,
    pub finish: Ticks,
}

// One look-back slot: an append either extends the last segment or pushes
// a new one, so adjacent segments never share an owner.
#[derive(Debug, Default)]
pub struct GanttLog {
    segments: Vec<GanttSegment>,
}

impl GanttLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, owner: GanttOwner, start: Ticks, finish: Ticks) {
        assert!(start < finish, "empty or inverted segment");

        if let Some(last) = self.segments.last_mut() {
            if last.owner == owner && last.finish == start {
                last.finish = finish;
                return;
            }
        }
        self.segments.push(GanttSegment {
            owner,
            start,
            finish,
        });
    }

    // Applied once on emission; a result of exactly `max` segments may
    // have been truncated.
    pub fn truncate_to(&mut self, max: usize) {
        self.segments.truncate(max);
    }

    pub fn segments(&self) -> &[GanttSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn into_segments(self) -> Vec<GanttSegment> {
        self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_same_owner_appends_coalesce() {
        let mut log = GanttLog::new();
        log.append(GanttOwner::Task(1), 0, 2);
        log.append(GanttOwner::Task(1), 2, 5);

        assert_eq!(
            log.segments(),
            &[GanttSegment {
                owner: GanttOwner::Task(1),
                start: 0,
                finish: 5,
            }]
        );
    }

    #[test]
    fn owner_change_starts_a_new_segment() {
        let mut log = GanttLog::new();
        log.append(GanttOwner::Idle, 0, 3);
        log.append(GanttOwner::Task(7), 3, 4);
        log.append(GanttOwner::Idle, 4, 6);

        assert_eq!(log.len(), 3);
        assert_eq!(log.segments()[1].owner, GanttOwner::Task(7));
    }

    #[test]
    fn idle_units_merge_into_one_gap() {
        let mut log = GanttLog::new();
        log.append(GanttOwner::Idle, 0, 1);
        log.append(GanttOwner::Idle, 1, 2);
        log.append(GanttOwner::Idle, 2, 3);

        assert_eq!(log.len(), 1);
        assert_eq!(log.segments()[0].finish, 3);
    }

    #[test]
    fn truncate_drops_the_tail() {
        let mut log = GanttLog::new();
        log.append(GanttOwner::Task(1), 0, 1);
        log.append(GanttOwner::Task(2), 1, 2);
        log.append(GanttOwner::Task(3), 2, 3);

        log.truncate_to(2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.segments()[1].owner, GanttOwner::Task(2));
    }
}
