#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use log::{error, info};
use torus_life::torus::{
    AnsiRenderer, Delivery, Grid, LedPrinter, NullRenderer, Palette, Renderer, Schedule,
    TorusConfig, TorusLife,
};

const DEFAULT_DELAY_MS: u64 = 100;
const DEFAULT_DENSITY: f64 = 0.5;
const DEFAULT_RNG_SEED: u64 = 0x5EED_1234_ABCD_EF01;
const CLEAR_SCREEN: &str = "\x1b[2J";

#[derive(Clone, Copy)]
enum Seed {
    Random,
    Glider,
}

struct MainArgs {
    config: TorusConfig,
    seed: Seed,
    density: f64,
    rng_seed: u64,
    palette: Palette,
}

const USAGE: &str = "usage: torus-life [--side N] [--units P] [--generations G] [--delay-ms D] \
[--schedule threads|pool] [--threads N] [--delivery gathered|per-unit|none] \
[--seed random|glider] [--density F] [--rng-seed S] [--color|--mono]";

fn parse_args() -> MainArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut config = TorusConfig::default().frame_delay(Duration::from_millis(DEFAULT_DELAY_MS));
    let mut seed = Seed::Random;
    let mut density = DEFAULT_DENSITY;
    let mut rng_seed = DEFAULT_RNG_SEED;
    let mut palette = Palette::UnitTint;

    let next_arg = |i: usize, flag: &str| -> &str {
        args.get(i)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("{flag} requires a value\n{USAGE}"))
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--side" => {
                i += 1;
                let n: usize = next_arg(i, "--side")
                    .parse()
                    .expect("--side requires a positive integer");
                config = config.side(n);
            }
            "--units" => {
                i += 1;
                let n: usize = next_arg(i, "--units")
                    .parse()
                    .expect("--units requires a positive integer");
                config = config.units(n);
            }
            "--generations" => {
                i += 1;
                let n: u64 = next_arg(i, "--generations")
                    .parse()
                    .expect("--generations requires a non-negative integer");
                config = config.generations(n);
            }
            "--delay-ms" => {
                i += 1;
                let ms: u64 = next_arg(i, "--delay-ms")
                    .parse()
                    .expect("--delay-ms requires a non-negative integer");
                config = config.frame_delay(Duration::from_millis(ms));
            }
            "--schedule" => {
                i += 1;
                let schedule = match next_arg(i, "--schedule").to_ascii_lowercase().as_str() {
                    "threads" => Schedule::Threads,
                    "pool" => Schedule::Pool,
                    other => panic!("unknown schedule: {other} (expected threads or pool)"),
                };
                config = config.schedule(schedule);
            }
            "--threads" => {
                i += 1;
                let n: usize = next_arg(i, "--threads")
                    .parse()
                    .expect("--threads requires a positive integer");
                config = config.thread_count(n);
            }
            "--delivery" => {
                i += 1;
                let delivery = match next_arg(i, "--delivery").to_ascii_lowercase().as_str() {
                    "gathered" => Delivery::Gathered,
                    "per-unit" => Delivery::PerUnit,
                    "none" => Delivery::Silent,
                    other => panic!(
                        "unknown delivery: {other} (expected gathered, per-unit, or none)"
                    ),
                };
                config = config.delivery(delivery);
            }
            "--seed" => {
                i += 1;
                seed = match next_arg(i, "--seed").to_ascii_lowercase().as_str() {
                    "random" => Seed::Random,
                    "glider" => Seed::Glider,
                    other => panic!("unknown seed: {other} (expected random or glider)"),
                };
            }
            "--density" => {
                i += 1;
                density = next_arg(i, "--density")
                    .parse()
                    .expect("--density requires a number in [0, 1]");
            }
            "--rng-seed" => {
                i += 1;
                rng_seed = next_arg(i, "--rng-seed")
                    .parse()
                    .expect("--rng-seed requires an unsigned integer");
            }
            "--color" => palette = Palette::UnitTint,
            "--mono" => palette = Palette::Mono,
            other => panic!("unknown argument: {other}\n{USAGE}"),
        }
        i += 1;
    }
    MainArgs {
        config,
        seed,
        density,
        rng_seed,
        palette,
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = parse_args();
    let side = args.config.side;

    let grid = match args.seed {
        Seed::Random => Ok(Grid::random(side, args.density, args.rng_seed)),
        Seed::Glider => Grid::with_glider(side),
    };

    let mut engine = match grid.and_then(|grid| TorusLife::new(grid, args.config)) {
        Ok(engine) => engine,
        Err(e) => {
            error!("invalid configuration: {e}");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let renderer: Box<dyn Renderer> = match engine.config().delivery {
        Delivery::Gathered => {
            print!("{CLEAR_SCREEN}");
            let mut renderer = AnsiRenderer::new(io::stdout(), args.palette);
            if let Some(last) = engine.config().generations.checked_sub(1) {
                renderer = renderer.with_last_generation(last);
            }
            Box::new(renderer)
        }
        Delivery::PerUnit => Box::new(LedPrinter::new(io::stdout())),
        Delivery::Silent => Box::new(NullRenderer),
    };

    if let Err(e) = engine.run(renderer.as_ref()) {
        error!("run failed at generation {}: {e}", engine.generation());
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    info!(
        "finished {} generations, population {}",
        engine.generation(),
        engine.population()
    );
    ExitCode::SUCCESS
}
