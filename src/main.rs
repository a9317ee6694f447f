use average::Estimate;
use rand::prelude::*;
use sched_sim::{simulate, Algorithm, GanttOwner, Process};

fn main() {
    let algorithms = [
        Algorithm::Fcfs,
        Algorithm::SjfNp,
        Algorithm::Srtf,
        Algorithm::PrioNp,
        Algorithm::PrioP,
        Algorithm::RoundRobin,
        Algorithm::Mlfq,
        Algorithm::Mlq,
    ];

    for algorithm in algorithms {
        // MLQ reads the priority slot as a queue id, so keep it in 1..3.
        let max_priority = if algorithm == Algorithm::Mlq { 3 } else { 9 };
        let mut procs = bernoulli_procs(40, 0.3, 1, 8, max_priority, 7);
        let segments =
            simulate(&mut procs, algorithm, 2, 1000).expect("generated workload is valid");

        println!("=== {algorithm} ({} processes) ===", procs.len());
        for segment in &segments {
            match segment.owner {
                GanttOwner::Task(pid) => print!(" P{pid}[{}..{})", segment.start, segment.finish),
                GanttOwner::Idle => print!(" idle[{}..{})", segment.start, segment.finish),
            }
        }
        println!();

        let turnaround = avg(procs.iter().map(|p| p.turnaround.unwrap() as f64));
        let waiting = avg(procs.iter().map(|p| p.waiting.unwrap() as f64));
        let response = avg(
            procs
                .iter()
                .map(|p| (p.first_run.unwrap() - p.arrival) as f64),
        );
        println!("Average turnaround time: {turnaround:.2} ticks");
        println!("Average waiting time: {waiting:.2} ticks");
        println!("Average response time: {response:.2} ticks");
    }
}

fn bernoulli_procs(
    ticks: u64,
    p_arrival: f64,
    short_burst: u64,
    long_burst: u64,
    max_priority: u32,
    seed: u64,
) -> Vec<Process> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut procs = Vec::new();

    for t in 0..ticks {
        if rng.random::<f64>() < p_arrival {
            let burst = rng.random_range(short_burst..=long_burst);
            let priority = rng.random_range(1..=max_priority);
            procs.push(Process::new(procs.len() as u32 + 1, t, burst, priority));
        }
    }

    procs
}

fn avg(iter: impl Iterator<Item = f64>) -> f64 {
    iter.collect::<average::Mean>().estimate()
}
