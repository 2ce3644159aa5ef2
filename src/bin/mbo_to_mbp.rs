//! CLI tool converting an MBO event log to MBP-10 snapshots.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin mbo_to_mbp -- data/mbo.csv
//! ```
//!
//! Snapshots are written to `mbp_output.csv` in the working directory.
//! Set `RUST_LOG=debug` for per-line diagnostics.

use std::env;
use std::process;
use std::time::Instant;

use mbo_mbp_reconstructor::{CsvSource, MbpReconstructor, MBP_DEPTH};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        let program = args.first().map(String::as_str).unwrap_or("mbo_to_mbp");
        eprintln!("Usage: {program} <mbo.csv>");
        process::exit(1);
    }

    let source = match CsvSource::open(&args[1]) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let start_time = Instant::now();
    let mut mbp = MbpReconstructor::new(MBP_DEPTH);

    if let Err(e) = mbp.process_source(source) {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    let stats = mbp.stats();
    log::info!(
        "{} messages, {} snapshots, {} clears skipped, {} correlated cancels in {:.2}s",
        stats.messages_processed,
        stats.snapshots_emitted,
        stats.clears_skipped,
        stats.correlated_cancels,
        start_time.elapsed().as_secs_f64()
    );

    let summary = mbp.warnings().summary();
    if summary.total > 0 {
        log::info!("Warnings: {} total", summary.total);
        for (category, count) in &summary.by_category {
            log::info!("  {category}: {count}");
        }
    }

    // Output failure is reported but does not change the exit status.
    match mbp.write_output() {
        Ok(()) => println!("Output written to {}", mbp.config().output_path.display()),
        Err(e) => log::error!("{e}"),
    }
}
