// main.rs
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;

use clap::AppSettings;
use structopt::StructOpt;

use dfs_backlog::output::Format;
use dfs_backlog::runner::{self, Command, Outcome};

/// Discover and check DFS replication backlogs from agent output.
#[derive(StructOpt)]
#[structopt(setting = AppSettings::SubcommandRequiredElseHelp)]
struct Args {
    /// Agent output to read. Reads stdin if omitted.
    #[structopt(long, parse(from_os_str))]
    input: Option<PathBuf>,

    /// Output format (`text` or `json`).
    #[structopt(long, default_value = "text")]
    format: Format,

    #[structopt(subcommand)]
    command: Command,
}

fn main() {
    env_logger::init();

    let args = Args::from_args();
    let outcome = match &args.input {
        Some(path) => match File::open(path) {
            Ok(file) => runner::run(BufReader::new(file), &args.command, args.format),
            Err(error) => Outcome::failure(&error),
        },
        None => runner::run(io::stdin().lock(), &args.command, args.format),
    };

    println!("{}", outcome.output);
    process::exit(outcome.exit_code());
}
