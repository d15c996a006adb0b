//! Backwards-induction solver binary.
//!
//! Usage:
//!   cargo run --release --bin solve -- [OPTIONS]
//!
//! Options:
//!   --samples <N>        Hand pairs per evaluation (default: 10000)
//!   --threads <N>        Number of threads (default: auto)
//!   --seed <N>           Random seed (optional)
//!   --data-dir <DIR>     Output directory (default: data)
//!   --fast               Use fast testing configuration
//!   --solve-self-loops   Solve self-transitions as a fixed point

use std::env;
use std::process;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use flip7_solver::games::flip7::{Flip7, StrategyFile, DATA_DIR};
use flip7_solver::induction::{GameState, InductionSolver, SelfLoopPolicy, SolverConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    let mut samples: Option<usize> = None;
    let mut threads: usize = 0;
    let mut seed: Option<u64> = None;
    let mut data_dir = DATA_DIR.to_string();
    let mut fast_mode = false;
    let mut fixed_point = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--samples" | "-n" => {
                i += 1;
                if i < args.len() {
                    samples = args[i].parse().ok();
                }
            }
            "--threads" | "-t" => {
                i += 1;
                if i < args.len() {
                    threads = args[i].parse().unwrap_or(0);
                }
            }
            "--seed" | "-s" => {
                i += 1;
                if i < args.len() {
                    seed = args[i].parse().ok();
                }
            }
            "--data-dir" | "-d" => {
                i += 1;
                if i < args.len() {
                    data_dir = args[i].clone();
                }
            }
            "--fast" | "-f" => {
                fast_mode = true;
            }
            "--solve-self-loops" => {
                fixed_point = true;
            }
            "--help" | "-h" => {
                print_help();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                process::exit(2);
            }
        }
        i += 1;
    }

    let mut config = if fast_mode {
        SolverConfig::fast()
    } else {
        SolverConfig::default()
    };
    if let Some(n) = samples {
        config = config.with_samples(n);
    }
    if threads > 0 {
        config = config.with_threads(threads);
    }
    if let Some(s) = seed {
        config = config.with_seed(s);
    }
    if fixed_point {
        config = config.with_self_loop_policy(SelfLoopPolicy::FixedPoint);
    }

    println!("Flip7 Multi-Player Strategy Optimizer");
    println!("==================================================");
    println!(
        "Testing {} strategy values with {} simulations each",
        config.thresholds.len(),
        config.samples_per_strategy
    );

    let start = Instant::now();
    let total_states = config.score_steps().len().pow(2) as u64;
    let mut solver = InductionSolver::new(Flip7, config);

    let pb = ProgressBar::new(total_states);
    pb.set_style(
        ProgressStyle::with_template(
            "Backwards induction [{bar:40}] {pos}/{len} states ({elapsed} / {eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let result = solver.solve_with_callback(|progress| {
        pb.set_position(progress.solved as u64);
        pb.set_message(format!(
            "({}) -> X={}",
            progress.state, progress.entry.threshold
        ));
    });

    let stats = match result {
        Ok(stats) => stats.clone(),
        Err(e) => {
            pb.abandon();
            eprintln!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };
    pb.finish_and_clear();

    println!(
        "Solved {} states in {:.2}s ({:.1} states/s, {} hand pairs, {} unresolved lookups)",
        stats.states_solved,
        start.elapsed().as_secs_f64(),
        stats.states_per_second,
        stats.samples,
        stats.unresolved_lookups
    );

    let path = StrategyFile::path_in(&data_dir);
    if let Err(e) = StrategyFile::from_solver(&solver).save(&path) {
        eprintln!("Error saving results: {}", e);
        process::exit(1);
    }
    println!("\nResults saved to {}", path.display());

    println!("\nSample optimal strategies:");
    let sample_states = [(0, 0), (100, 100), (150, 100), (100, 150), (190, 190)];
    for (p1, p2) in sample_states {
        let state = GameState::new(p1, p2);
        if let Some(entry) = solver.table().get(&state) {
            println!(
                "  State ({}): STRAT({}), P1 win prob: {:.2}%",
                state,
                entry.threshold,
                entry.win_probability * 100.0
            );
        }
    }
}

fn print_help() {
    println!("Flip 7 Backwards-Induction Solver");
    println!();
    println!("Usage: solve [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -n, --samples <N>    Hand pairs per evaluation (default: 10000)");
    println!("  -t, --threads <N>    Number of threads (default: auto)");
    println!("  -s, --seed <N>       Random seed (optional)");
    println!("  -d, --data-dir <DIR> Output directory (default: data)");
    println!("  -f, --fast           Use fast testing configuration");
    println!("      --solve-self-loops");
    println!("                       Solve self-transitions as a fixed point");
    println!("  -h, --help           Print this help message");
}
