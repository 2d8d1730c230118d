use clap::Parser;
use runpod_stem_splitter::{run_client, telemetry, ClientArgs};
use std::process;

fn main() {
    let args = ClientArgs::parse();
    telemetry::init(args.verbose);

    match run_client(&args) {
        Ok(summary) => {
            eprintln!(
                "Decoded {} stems to {}",
                summary.written.len(),
                summary.destination.display()
            );
            process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(if e.is_usage() { 2 } else { 1 });
        }
    }
}
