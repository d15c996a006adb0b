//! Single-hand simulation binary.
//!
//! Usage:
//!   cargo run --release --bin simulate -- <X> <N> [OPTIONS]
//!
//! Plays N hands with the "hit until score >= X" strategy and appends them
//! to `<data-dir>/sim_results_<X>.jsonl`.
//!
//! Options:
//!   --seed <N>           Random seed (optional)
//!   --data-dir <DIR>     Data directory (default: data)

use std::env;
use std::process;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use flip7_solver::games::flip7::{simulate_batch, SampleStore, SampleSummary, DATA_DIR};

/// Hands simulated and written per batch.
const BATCH_SIZE: usize = 100_000;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();

    let mut positional: Vec<String> = Vec::new();
    let mut seed: Option<u64> = None;
    let mut data_dir = DATA_DIR.to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
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
            "--help" | "-h" => {
                print_help();
                return;
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let (threshold, hands) = match positional.as_slice() {
        [x, n] => match (x.parse::<u32>(), n.parse::<usize>()) {
            (Ok(x), Ok(n)) => (x, n),
            _ => {
                eprintln!("X and N must be non-negative integers");
                print_help();
                process::exit(2);
            }
        },
        _ => {
            print_help();
            process::exit(2);
        }
    };

    let seed = seed.unwrap_or_else(rand::random);
    let store = SampleStore::new(&data_dir);
    let start = Instant::now();

    let pb = ProgressBar::new(hands as u64);
    pb.set_style(
        ProgressStyle::with_template("Strategy X={msg} [{bar:40}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(threshold.to_string());

    let mut done = 0usize;
    let mut batch_index = 0u64;
    let mut path = store.sample_path(threshold);

    while done < hands {
        let count = BATCH_SIZE.min(hands - done);
        // Streams inside a batch use consecutive seeds; keep batches apart.
        let batch_seed = seed.wrapping_add(batch_index << 32);
        let records = simulate_batch(threshold, count, batch_seed);

        path = match store.append(threshold, &records) {
            Ok(path) => path,
            Err(e) => {
                pb.abandon();
                eprintln!("Error writing samples: {}", e);
                process::exit(1);
            }
        };

        done += count;
        batch_index += 1;
        pb.inc(count as u64);
    }
    pb.finish_and_clear();

    println!(
        "Ran {} simulations with Strategy X={} in {:.2}s (seed {}). Results appended to {}",
        hands,
        threshold,
        start.elapsed().as_secs_f64(),
        seed,
        path.display()
    );

    match store.load(threshold) {
        Ok(load) => {
            if let Some(summary) = SampleSummary::from_records(threshold, &load.records) {
                println!(
                    "All {} hands at X={}: mean {:.2}, median {:.1}, bust {:.1}%, Flip 7 {:.1}%",
                    summary.hands,
                    threshold,
                    summary.mean,
                    summary.median,
                    summary.bust_rate * 100.0,
                    summary.flip_seven_rate * 100.0
                );
            }
        }
        Err(e) => eprintln!("Could not re-read samples: {}", e),
    }
}

fn print_help() {
    println!("Flip 7 Hand Simulator");
    println!();
    println!("Usage: simulate <X> <N> [OPTIONS]");
    println!();
    println!("Arguments:");
    println!("  <X>                  Stand once the hand scores at least X");
    println!("  <N>                  Number of hands to simulate");
    println!();
    println!("Options:");
    println!("  -s, --seed <N>       Random seed (optional)");
    println!("  -d, --data-dir <DIR> Data directory (default: data)");
    println!("  -h, --help           Print this help message");
}
