//! Wallet Engine CLI
//!
//! Replays a CSV file of wallet operations through the engine and prints the
//! resulting balances.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > balances.csv
//! cargo run -- --lane-capacity 500 --enqueue-timeout-ms 0 operations.csv > balances.csv
//! WALLET_BALANCE_CACHE_TTL=30 cargo run -- --verbose operations.csv > balances.csv
//! ```
//!
//! Input columns are `wallet_id,operation,amount` with `operation` one of
//! `DEPOSIT` / `WITHDRAW`. Output columns are `wallet_id,balance`. Logs go to
//! stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use std::process;
use wallet_engine::cli;
use wallet_engine::replay::ReplayRunner;

fn main() {
    let args = cli::parse_args();
    cli::init_logging(args.verbose);

    let runner = ReplayRunner::new(args.to_replay_config());

    let mut output = std::io::stdout();
    if let Err(e) = runner.run(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
