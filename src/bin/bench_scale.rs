use std::time::Instant;
use torus_life::torus::{Grid, Schedule, TorusConfig, TorusLife};

const DENSITY: f64 = 0.42;
const SEED: u64 = 0x5EED_1234_ABCD_EF01;

fn bench(side: usize, units: usize, schedule: Schedule, iterations: u64) -> (f64, u64) {
    let grid = Grid::random(side, DENSITY, SEED);
    let config = TorusConfig::default().units(units).schedule(schedule);
    let mut engine = TorusLife::new(grid, config)
        .unwrap_or_else(|e| panic!("{side}x{side} on {units} units: {e}"));

    let start = Instant::now();
    engine
        .step_n(iterations)
        .unwrap_or_else(|e| panic!("{side}x{side} on {units} units: {e}"));
    let duration = start.elapsed();

    (duration.as_secs_f64() * 1000.0, engine.population())
}

fn main() {
    env_logger::init();

    let scales: &[(usize, u64)] = &[
        (240, 200),
        (480, 100),
        (960, 50),
        (1920, 20),
    ];
    let partitions = [1usize, 4, 9, 16, 36, 64];

    println!(
        "{:<10} {:>6} {:>8} {:>8} {:>12} {:>10} {:>10}",
        "Grid", "Units", "Sched", "Iters", "Total(ms)", "Avg(ms)", "Pop"
    );
    println!("{}", "-".repeat(70));

    for &(side, iters) in scales {
        for &units in &partitions {
            for schedule in [Schedule::Threads, Schedule::Pool] {
                let (total_ms, pop) = bench(side, units, schedule, iters);
                let avg_ms = total_ms / iters as f64;
                println!(
                    "{:<10} {:>6} {:>8} {:>8} {:>12.1} {:>10.4} {:>10}",
                    format!("{}x{}", side, side),
                    units,
                    format!("{:?}", schedule),
                    iters,
                    total_ms,
                    avg_ms,
                    pop
                );
            }
        }
    }
}
