//! Text summary of simulation samples and the solved strategy table.
//!
//! Usage:
//!   cargo run --release --bin summarize -- [--data-dir <DIR>]

use std::env;
use std::process;

use flip7_solver::games::flip7::{SampleStore, SampleSummary, StrategyFile, DATA_DIR};
use flip7_solver::induction::GameState;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let mut data_dir = DATA_DIR.to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" | "-d" => {
                i += 1;
                if i < args.len() {
                    data_dir = args[i].clone();
                }
            }
            "--help" | "-h" => {
                println!("Usage: summarize [--data-dir <DIR>]");
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                process::exit(2);
            }
        }
        i += 1;
    }

    print_samples(&SampleStore::new(&data_dir));
    println!();
    print_strategies(&data_dir);
}

fn print_samples(store: &SampleStore) {
    let thresholds = match store.available_thresholds() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error reading {}: {}", store.dir().display(), e);
            process::exit(1);
        }
    };

    if thresholds.is_empty() {
        println!(
            "No simulation data found in {}/. Run simulate first.",
            store.dir().display()
        );
        return;
    }

    println!("=== Single-hand results ===");
    println!("{:>5} {:>9} {:>8} {:>8} {:>7} {:>7}", "X", "hands", "mean", "median", "bust%", "flip7%");

    for x in thresholds {
        let load = match store.load(x) {
            Ok(load) => load,
            Err(e) => {
                eprintln!("Skipping X={}: {}", x, e);
                continue;
            }
        };
        if load.skipped > 0 {
            eprintln!("X={}: skipped {} malformed records", x, load.skipped);
        }

        if let Some(s) = SampleSummary::from_records(x, &load.records) {
            println!(
                "{:>5} {:>9} {:>8.2} {:>8.1} {:>7.1} {:>7.1}",
                s.threshold,
                s.hands,
                s.mean,
                s.median,
                s.bust_rate * 100.0,
                s.flip_seven_rate * 100.0
            );
        }
    }
}

fn print_strategies(data_dir: &str) {
    let path = StrategyFile::path_in(data_dir);
    let file = match StrategyFile::load(&path) {
        Ok(file) => file,
        Err(e) if e.is_not_found() => {
            println!("No multisim results found. Run solve first.");
            return;
        }
        Err(e) => {
            eprintln!("Error reading strategy table: {}", e);
            process::exit(1);
        }
    };

    let steps = file.parameters.score_steps.clone();
    println!(
        "=== Optimal threshold by state ({} sims per strategy) ===",
        file.parameters.sims_per_strategy
    );
    println!("rows: player score, columns: opponent score");

    print!("{:>5}", "");
    for p2 in &steps {
        print!("{:>4}", p2);
    }
    println!();

    for &p1 in &steps {
        print!("{:>5}", p1);
        for &p2 in &steps {
            match file.threshold_at(GameState::new(p1, p2)) {
                Some(x) => print!("{:>4}", x),
                None => print!("{:>4}", "-"),
            }
        }
        println!();
    }

    let loaded = file.into_loaded();
    if !loaded.skipped.is_empty() {
        eprintln!("Skipped {} malformed strategy entries", loaded.skipped.len());
    }
    if let Some(even) = loaded.table.get(&GameState::new(0, 0)) {
        println!(
            "\nOpening position: STRAT({}), P1 win prob {:.2}%",
            even.threshold,
            even.win_probability * 100.0
        );
    }
}
