//! CLI tool for reelscroll - replays a scripted scroll session and outputs JSON
//!
//! Usage:
//!   reelscroll_cli <script.json>              # Output report to stdout
//!   reelscroll_cli <script.json> -o out.json  # Output report to file
//!
//! Set `RUST_LOG=reelscroll=debug` to trace mounts, triggers and inputs.

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};

use reelscroll::replay::{run_replay, ReplayScript};
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: reelscroll_cli <script.json> [-o output.json]");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = if args.len() > 3 && args[2] == "-o" {
        Some(&args[3])
    } else {
        None
    };

    let source = match fs::read_to_string(input_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    let script = match ReplayScript::from_json(&source) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Error loading script: {}", e);
            std::process::exit(1);
        }
    };

    let report = match run_replay(&script) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error running replay: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        frames = report.stats.frames,
        events = report.events.len(),
        writes = report.stats.writes,
        "replay finished"
    );

    let json = match serde_json::to_string_pretty(&report) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("Written: {}", path);
        }
        None => {
            io::stdout().write_all(json.as_bytes()).unwrap();
            println!();
        }
    }
}
