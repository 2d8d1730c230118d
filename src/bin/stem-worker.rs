use clap::Parser;
use runpod_stem_splitter::{
    telemetry, DemucsCli, JobRuntime, LocalRuntime, QueueRuntime, StemJobHandler,
};
use std::{path::PathBuf, process, time::Duration};

#[derive(Parser)]
#[command(name = "stem-worker")]
#[command(about = "RunPod serverless worker running Demucs stem separation", long_about = None)]
#[command(version)]
struct Cli {
    /// Run one job from this JSON document (`{"input": {...}}`) and exit
    #[arg(long, conflicts_with = "test_input_file")]
    test_input: Option<String>,

    /// Same as --test-input, read from a file
    #[arg(long)]
    test_input_file: Option<PathBuf>,

    /// Separation tool to run (default: $DEMUCS_BIN or `demucs`)
    #[arg(long)]
    demucs_bin: Option<String>,

    /// Directory for per-job scratch space (default: system temp dir)
    #[arg(long)]
    temp_root: Option<PathBuf>,

    /// Exit after handling this many queued jobs
    #[arg(long)]
    max_jobs: Option<usize>,

    /// Delay between job-take polls when the queue is empty
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> runpod_stem_splitter::Result<()> {
    let separator = match cli.demucs_bin {
        Some(bin) => DemucsCli::new(bin),
        None => DemucsCli::from_env(),
    };
    let mut handler = StemJobHandler::new(separator);
    if let Some(root) = cli.temp_root {
        handler = handler.with_temp_root(root);
    }

    let test_input = match (cli.test_input, cli.test_input_file) {
        (Some(text), _) => Some(text),
        (None, Some(path)) => Some(std::fs::read_to_string(path)?),
        (None, None) => None,
    };

    if let Some(text) = test_input {
        return LocalRuntime::from_json(&text)?.run(&handler);
    }

    let mut runtime = QueueRuntime::from_env()?
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms));
    if let Some(max) = cli.max_jobs {
        runtime = runtime.with_max_jobs(max);
    }
    runtime.run(&handler)
}
