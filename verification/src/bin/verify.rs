//! `verify` binary: runs the gate-schedule and conservation-lattice checks.
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0    | PASS, every sub-check passed |
//! | 1    | FAIL, at least one sub-check missed its reference |
//! | 2    | ERROR, invalid configuration |
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin verify
//! cargo run --release --bin verify -- --json
//! cargo run --release --bin verify -- --config lattice.json --skip-3d
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use ilg_verification::config::VerifyConfig;
use ilg_verification::report::VerificationReport;

#[derive(Parser, Debug)]
#[command(
    name = "verify",
    version,
    about = "Gate-schedule combinatorics and discrete conservation-law checks",
    long_about = None,
)]
struct Args {
    /// JSON file with a `VerifyConfig`; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the full report as JSON instead of the summary.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Skip the 3D lattice run.
    #[arg(long, default_value_t = false)]
    skip_3d: bool,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(
            args.log_level
                .parse::<tracing_subscriber::filter::LevelFilter>()
                .unwrap_or(tracing_subscriber::filter::LevelFilter::WARN),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => match VerifyConfig::from_json_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("ERROR: {e}");
                return ExitCode::from(2);
            }
        },
        None => VerifyConfig::default(),
    };
    if args.skip_3d {
        config.lattice_3d = None;
    }

    let report = match VerificationReport::collect(&config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::from(2);
        }
    };

    if args.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("ERROR: {e}");
                return ExitCode::from(2);
            }
        }
    } else {
        for line in report.summary() {
            println!("{line}");
        }
        println!();
        println!("{}", if report.passed { "PASS" } else { "FAIL" });
    }

    if report.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
