use super::error::SimError;
use super::process::Process;
use crate::core::driver::SimCore;
use crate::core::log::{GanttLog, GanttSegment};
use crate::core::state::{SimCtx, Task, Ticks};
use crate::policy::{
    Algorithm, Fcfs, Mlfq, Mlq, Policy, PriorityPolicy, RoundRobin, ShortestJob,
};
use rustc_hash::FxHashSet;

// Metrics are written back into `procs` in place; the returned trace is
// truncated to at most `max_logs` segments, so a result of exactly
// `max_logs` may have been cut short. `quantum` is consulted only by
// round robin.
pub fn simulate(
    procs: &mut [Process],
    algorithm: Algorithm,
    quantum: Ticks,
    max_logs: usize,
) -> Result<Vec<GanttSegment>, SimError> {
    validate(procs, algorithm, quantum)?;

    let tasks = procs
        .iter()
        .map(|p| Task {
            pid: p.pid,
            arrival: p.arrival,
            burst: p.burst,
            base_priority: p.priority,
            remaining: p.burst,
            current_priority: p.priority,
            first_run: None,
            completion: None,
            consumed_slice: 0,
            level: if algorithm == Algorithm::Mlq {
                p.priority as usize
            } else {
                1
            },
            last_q3_entry: None,
        })
        .collect();
    let mut ctx = SimCtx::new(tasks);

    let (ctx, mut log) = match algorithm {
        Algorithm::Fcfs => {
            let policy = Fcfs::new(&mut ctx);
            exec(ctx, policy)
        }
        Algorithm::SjfNp => {
            let policy = ShortestJob::non_preemptive(&mut ctx);
            exec(ctx, policy)
        }
        Algorithm::Srtf => {
            let policy = ShortestJob::preemptive(&mut ctx);
            exec(ctx, policy)
        }
        Algorithm::PrioNp => {
            let policy = PriorityPolicy::non_preemptive(&mut ctx);
            exec(ctx, policy)
        }
        Algorithm::PrioP => {
            let policy = PriorityPolicy::preemptive(&mut ctx);
            exec(ctx, policy)
        }
        Algorithm::RoundRobin => {
            let policy = RoundRobin::new(&mut ctx, quantum);
            exec(ctx, policy)
        }
        Algorithm::Mlfq => {
            let policy = Mlfq::new(&mut ctx);
            exec(ctx, policy)
        }
        Algorithm::Mlq => {
            let policy = Mlq::new(&mut ctx);
            exec(ctx, policy)
        }
    };

    for (task, proc) in ctx.tasks.iter().zip(procs.iter_mut()) {
        let ct = task
            .completion
            .expect("simulation finished with an incomplete task");
        proc.completion = Some(ct);
        proc.turnaround = Some(ct - proc.arrival);
        proc.waiting = Some(ct - proc.arrival - proc.burst);
        proc.first_run = task.first_run;
    }

    log.truncate_to(max_logs);
    Ok(log.into_segments())
}

fn exec<P: Policy>(ctx: SimCtx, policy: P) -> (SimCtx, GanttLog) {
    let mut core = SimCore::new(ctx, policy);
    core.run();
    core.into_parts()
}

fn validate(procs: &[Process], algorithm: Algorithm, quantum: Ticks) -> Result<(), SimError> {
    let mut seen = FxHashSet::default();
    for p in procs {
        if p.burst == 0 || p.priority < 1 {
            return Err(SimError::InvalidProcess { pid: p.pid });
        }
        if !seen.insert(p.pid) {
            return Err(SimError::DuplicatePid { pid: p.pid });
        }
        if algorithm == Algorithm::Mlq && !(1..=3).contains(&p.priority) {
            return Err(SimError::InvalidMlqQueue {
                pid: p.pid,
                queue: p.priority,
            });
        }
    }
    if algorithm == Algorithm::RoundRobin && quantum == 0 {
        return Err(SimError::InvalidQuantum);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log::GanttOwner;
    use crate::core::state::Pid;

    fn procs(inputs: &[(Pid, Ticks, Ticks, u32)]) -> Vec<Process> {
        inputs
            .iter()
            .map(|&(pid, at, bt, prio)| Process::new(pid, at, bt, prio))
            .collect()
    }

    fn seg(pid: Pid, start: Ticks, finish: Ticks) -> GanttSegment {
        GanttSegment {
            owner: GanttOwner::Task(pid),
            start,
            finish,
        }
    }

    fn idle(start: Ticks, finish: Ticks) -> GanttSegment {
        GanttSegment {
            owner: GanttOwner::Idle,
            start,
            finish,
        }
    }

    fn metrics(p: &Process) -> (Ticks, Ticks, Ticks) {
        (
            p.completion.unwrap(),
            p.turnaround.unwrap(),
            p.waiting.unwrap(),
        )
    }

    // The invariants every valid run must satisfy regardless of policy
    fn check_invariants(procs: &[Process], segments: &[GanttSegment]) {
        let horizon = procs.iter().map(|p| p.completion.unwrap()).max().unwrap();

        // Segments partition [0, horizon) with alternating owners.
        assert_eq!(segments.first().unwrap().start, 0);
        assert_eq!(segments.last().unwrap().finish, horizon);
        for window in segments.windows(2) {
            assert_eq!(window[0].finish, window[1].start);
            assert_ne!(window[0].owner, window[1].owner);
        }

        for p in procs {
            let executed: Ticks = segments
                .iter()
                .filter(|s| s.owner == GanttOwner::Task(p.pid))
                .map(|s| s.finish - s.start)
                .sum();
            assert_eq!(executed, p.burst, "pid {} executed time", p.pid);

            let (ct, tat, wt) = metrics(p);
            assert!(ct >= p.arrival + p.burst);
            assert_eq!(tat, ct - p.arrival);
            assert_eq!(wt, tat - p.burst);

            let first = p.first_run.unwrap();
            assert!(first >= p.arrival);
            assert!(first < ct);
        }
    }

    #[test]
    fn fcfs_runs_in_arrival_order() {
        let mut ps = procs(&[(1, 0, 5, 1), (2, 1, 3, 1), (3, 2, 1, 1)]);
        let segs = simulate(&mut ps, Algorithm::Fcfs, 0, 1000).unwrap();

        assert_eq!(segs, vec![seg(1, 0, 5), seg(2, 5, 8), seg(3, 8, 9)]);
        assert_eq!(metrics(&ps[0]), (5, 5, 0));
        assert_eq!(metrics(&ps[1]), (8, 7, 4));
        assert_eq!(metrics(&ps[2]), (9, 7, 6));
        check_invariants(&ps, &segs);
    }

    #[test]
    fn srtf_preempts_on_shorter_arrivals() {
        let mut ps = procs(&[(1, 0, 7, 1), (2, 2, 4, 1), (3, 4, 1, 1)]);
        let segs = simulate(&mut ps, Algorithm::Srtf, 0, 1000).unwrap();

        assert_eq!(
            segs,
            vec![
                seg(1, 0, 2),
                seg(2, 2, 4),
                seg(3, 4, 5),
                seg(2, 5, 7),
                seg(1, 7, 12),
            ]
        );
        assert_eq!(ps[2].completion, Some(5));
        assert_eq!(ps[1].completion, Some(7));
        assert_eq!(ps[0].completion, Some(12));
        check_invariants(&ps, &segs);
    }

    #[test]
    fn round_robin_rotates_on_quantum_expiry() {
        let mut ps = procs(&[(1, 0, 5, 1), (2, 1, 4, 1), (3, 2, 2, 1)]);
        let segs = simulate(&mut ps, Algorithm::RoundRobin, 2, 1000).unwrap();

        assert_eq!(
            segs,
            vec![
                seg(1, 0, 2),
                seg(2, 2, 4),
                seg(3, 4, 6),
                seg(1, 6, 8),
                seg(2, 8, 10),
                seg(1, 10, 11),
            ]
        );
        assert_eq!(ps[2].completion, Some(6));
        assert_eq!(ps[1].completion, Some(10));
        assert_eq!(ps[0].completion, Some(11));
        check_invariants(&ps, &segs);
    }

    #[test]
    fn round_robin_alternates_equal_arrivals() {
        let mut ps = procs(&[(1, 0, 10, 1), (2, 0, 10, 1)]);
        let segs = simulate(&mut ps, Algorithm::RoundRobin, 3, 1000).unwrap();

        assert_eq!(
            segs,
            vec![
                seg(1, 0, 3),
                seg(2, 3, 6),
                seg(1, 6, 9),
                seg(2, 9, 12),
                seg(1, 12, 15),
                seg(2, 15, 18),
                seg(1, 18, 19),
                seg(2, 19, 20),
            ]
        );
        check_invariants(&ps, &segs);
    }

    #[test]
    fn sjf_runs_each_process_in_one_piece() {
        let mut ps = procs(&[(1, 0, 8, 1), (2, 1, 4, 1), (3, 2, 1, 1)]);
        let segs = simulate(&mut ps, Algorithm::SjfNp, 0, 1000).unwrap();

        assert_eq!(segs, vec![seg(1, 0, 8), seg(3, 8, 9), seg(2, 9, 13)]);
        for p in &ps {
            let owned = segs
                .iter()
                .filter(|s| s.owner == GanttOwner::Task(p.pid))
                .count();
            assert_eq!(owned, 1, "pid {} must run in one piece", p.pid);
        }
        check_invariants(&ps, &segs);
    }

    #[test]
    fn priority_np_picks_most_urgent_at_each_completion() {
        let mut ps = procs(&[(1, 0, 4, 2), (2, 1, 3, 1), (3, 2, 2, 3)]);
        let segs = simulate(&mut ps, Algorithm::PrioNp, 0, 1000).unwrap();

        assert_eq!(segs, vec![seg(1, 0, 4), seg(2, 4, 7), seg(3, 7, 9)]);
        check_invariants(&ps, &segs);
    }

    #[test]
    fn priority_p_urgent_short_job_first() {
        let mut ps = procs(&[(1, 0, 10, 3), (2, 0, 1, 1)]);
        let segs = simulate(&mut ps, Algorithm::PrioP, 0, 1000).unwrap();

        assert_eq!(segs, vec![seg(2, 0, 1), seg(1, 1, 11)]);
        check_invariants(&ps, &segs);
    }

    #[test]
    fn priority_p_aging_preempts_a_long_runner() {
        // P2 (base 8) ages one step per 5 ticks while it waits; it crosses
        // below the running P1 (frozen at 2) at t = 35.
        let mut ps = procs(&[(1, 0, 100, 2), (2, 0, 5, 8)]);
        let segs = simulate(&mut ps, Algorithm::PrioP, 0, 1000).unwrap();

        assert_eq!(segs, vec![seg(1, 0, 35), seg(2, 35, 40), seg(1, 40, 105)]);
        assert_eq!(ps[1].first_run, Some(35));
        check_invariants(&ps, &segs);
    }

    #[test]
    fn priority_p_late_arrival_ages_past_the_runner() {
        // P2 lands at t = 10 with base 3, behind the running P1 (frozen
        // at 2), and crosses below it after 10 ticks of waiting.
        let mut ps = procs(&[(1, 0, 40, 2), (2, 10, 5, 3)]);
        let segs = simulate(&mut ps, Algorithm::PrioP, 0, 1000).unwrap();

        assert_eq!(segs, vec![seg(1, 0, 20), seg(2, 20, 25), seg(1, 25, 45)]);
        check_invariants(&ps, &segs);
    }

    #[test]
    fn mlfq_demotes_after_cumulative_slice() {
        // P1's Q1 slice of 8 is split 1 + 7 by P2's arrival; the demotion
        // to Q2 lands at t = 12 and the trailing run coalesces.
        let mut ps = procs(&[(1, 0, 20, 1), (2, 1, 4, 1)]);
        let segs = simulate(&mut ps, Algorithm::Mlfq, 0, 1000).unwrap();

        assert_eq!(segs, vec![seg(1, 0, 1), seg(2, 1, 5), seg(1, 5, 24)]);
        assert_eq!(ps[1].completion, Some(5));
        assert_eq!(ps[0].completion, Some(24));
        check_invariants(&ps, &segs);
    }

    #[test]
    fn mlq_strict_queue_priority() {
        let mut ps = procs(&[(1, 0, 5, 2), (2, 2, 3, 1), (3, 2, 4, 3), (4, 4, 2, 1)]);
        let segs = simulate(&mut ps, Algorithm::Mlq, 0, 1000).unwrap();

        assert_eq!(
            segs,
            vec![
                seg(1, 0, 2),
                seg(2, 2, 5),
                seg(4, 5, 7),
                seg(1, 7, 10),
                seg(3, 10, 14),
            ]
        );
        check_invariants(&ps, &segs);
    }

    #[test]
    fn mlq_q2_round_robin_quantum() {
        let mut ps = procs(&[(1, 0, 12, 2), (2, 0, 12, 2)]);
        let segs = simulate(&mut ps, Algorithm::Mlq, 0, 1000).unwrap();

        assert_eq!(
            segs,
            vec![
                seg(1, 0, 10),
                seg(2, 10, 20),
                seg(1, 20, 22),
                seg(2, 22, 24),
            ]
        );
        check_invariants(&ps, &segs);
    }

    #[test]
    fn late_arrival_leaves_an_idle_gap() {
        let mut ps = procs(&[(1, 5, 3, 1)]);
        let segs = simulate(&mut ps, Algorithm::Fcfs, 0, 1000).unwrap();

        assert_eq!(segs, vec![idle(0, 5), seg(1, 5, 8)]);
        assert_eq!(ps[0].completion, Some(8));
    }

    #[test]
    fn arrival_gap_mid_schedule_is_idle() {
        let mut ps = procs(&[(1, 0, 2, 1), (2, 6, 1, 1)]);
        let segs = simulate(&mut ps, Algorithm::Srtf, 0, 1000).unwrap();

        assert_eq!(segs, vec![seg(1, 0, 2), idle(2, 6), seg(2, 6, 7)]);
        check_invariants(&ps, &segs);
    }

    #[test]
    fn identical_inputs_produce_identical_outputs() {
        let inputs = [(1, 0, 7, 2), (2, 2, 4, 1), (3, 4, 1, 3), (4, 4, 6, 2)];
        for algorithm in [
            Algorithm::Fcfs,
            Algorithm::SjfNp,
            Algorithm::Srtf,
            Algorithm::PrioNp,
            Algorithm::PrioP,
            Algorithm::RoundRobin,
            Algorithm::Mlfq,
            Algorithm::Mlq,
        ] {
            let mut a = procs(&inputs);
            let mut b = procs(&inputs);
            let segs_a = simulate(&mut a, algorithm, 2, 1000).unwrap();
            let segs_b = simulate(&mut b, algorithm, 2, 1000).unwrap();
            assert_eq!(segs_a, segs_b, "{algorithm} log must be reproducible");
            assert_eq!(a, b, "{algorithm} metrics must be reproducible");
            check_invariants(&a, &segs_a);
        }
    }

    #[test]
    fn arrival_ties_fall_to_smaller_pid() {
        let mut ps = procs(&[(9, 0, 2, 1), (4, 0, 2, 1), (7, 0, 2, 1)]);
        let segs = simulate(&mut ps, Algorithm::Fcfs, 0, 1000).unwrap();

        assert_eq!(segs, vec![seg(4, 0, 2), seg(7, 2, 4), seg(9, 4, 6)]);
    }

    #[test]
    fn log_is_truncated_to_the_requested_bound() {
        let mut ps = procs(&[(1, 0, 5, 1), (2, 1, 4, 1), (3, 2, 2, 1)]);
        let segs = simulate(&mut ps, Algorithm::RoundRobin, 2, 4).unwrap();

        assert_eq!(segs.len(), 4);
        assert_eq!(segs[3], seg(1, 6, 8));
        // Metrics are still complete even when the log is cut short.
        assert_eq!(ps[0].completion, Some(11));
    }

    #[test]
    fn empty_input_yields_an_empty_log() {
        let mut ps: Vec<Process> = Vec::new();
        let segs = simulate(&mut ps, Algorithm::RoundRobin, 2, 1000).unwrap();
        assert!(segs.is_empty());
    }

    #[test]
    fn validation_rejects_bad_inputs() {
        assert_eq!(
            Algorithm::from_code(8),
            Err(SimError::InvalidAlgorithm { code: 8 })
        );

        let mut zero_burst = procs(&[(1, 0, 0, 1)]);
        assert_eq!(
            simulate(&mut zero_burst, Algorithm::Fcfs, 0, 10),
            Err(SimError::InvalidProcess { pid: 1 })
        );

        let mut zero_priority = procs(&[(1, 0, 5, 0)]);
        assert_eq!(
            simulate(&mut zero_priority, Algorithm::Fcfs, 0, 10),
            Err(SimError::InvalidProcess { pid: 1 })
        );

        let mut duplicated = procs(&[(1, 0, 5, 1), (1, 2, 3, 1)]);
        assert_eq!(
            simulate(&mut duplicated, Algorithm::Fcfs, 0, 10),
            Err(SimError::DuplicatePid { pid: 1 })
        );

        let mut ok = procs(&[(1, 0, 5, 1)]);
        assert_eq!(
            simulate(&mut ok, Algorithm::RoundRobin, 0, 10),
            Err(SimError::InvalidQuantum)
        );

        let mut bad_queue = procs(&[(1, 0, 5, 4)]);
        assert_eq!(
            simulate(&mut bad_queue, Algorithm::Mlq, 0, 10),
            Err(SimError::InvalidMlqQueue { pid: 1, queue: 4 })
        );
    }

    #[test]
    fn burst_fields_survive_the_run() {
        let mut ps = procs(&[(1, 0, 7, 2), (2, 2, 4, 1)]);
        simulate(&mut ps, Algorithm::Srtf, 0, 1000).unwrap();
        assert_eq!(ps[0].burst, 7);
        assert_eq!(ps[1].burst, 4);
    }
}
