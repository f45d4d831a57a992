use std::path::PathBuf;

use clap::Parser;
use nestegg::{Command, DataDirectory, init_logging, run};

#[derive(Parser, Debug)]
#[command(name = "nestegg")]
#[command(about = "Retirement and portfolio projections from a YAML plan")]
struct Args {
    /// Path to the data directory (default: ~/.nestegg/)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Plan file to use instead of plan.yaml in the data directory
    #[arg(short, long)]
    plan: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let data_dir = DataDirectory::new(args.data_dir.unwrap_or_else(DataDirectory::default_path));

    init_logging(data_dir.root(), &args.log_level)?;

    let output = run(&args.command, &data_dir, args.plan.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    tracing::info!("nestegg finished");
    Ok(())
}
