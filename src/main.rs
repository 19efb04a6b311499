mod cli;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;

#[derive(Parser)]
#[command(version, about = "Snapshot of the running process table")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[clap(flatten)]
    verbose: Verbosity,
}

#[derive(Subcommand)]
enum Commands {
    /// List every running process
    #[command(alias = "ls")]
    List {
        #[arg(long, help = "format output (default, json, raw)")]
        format: Option<String>,
    },
    /// Show a single process
    #[command(alias = "info")]
    Find {
        pid: i32,
        #[arg(long, help = "format output (default, json, raw)")]
        format: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new().filter_level(cli.verbose.log_level_filter()).init();

    match &cli.command {
        Commands::List { format } => cli::list(format),
        Commands::Find { pid, format } => cli::find(*pid, format),
    }
}
