mod report;
mod script;


use std::fs;
use std::io::{self, Read};

use clap::{Parser, Subcommand};
use planner::PlannerError;
use planner::codec;
use planner::doc::Design;
use planner::engine::Engine;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error(transparent)]
    Script(#[from] script::ScriptError),
    #[error("no `data` parameter in {0:?}")]
    MissingToken(String),
}

#[derive(Parser, Debug)]
#[command(name = "yardplan", about = "Yard planner share-token and gesture-replay CLI")]
struct Cli {
    /// Page the share URLs point at.
    #[arg(long, env = "YARDPLAN_BASE_URL", default_value = "http://localhost:5173/")]
    base_url: String,

    /// Log more (`-v` for debug). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the design in a token or share URL as JSON.
    Decode {
        /// Token, share URL, or query string.
        input: String,
        /// Print the empty design instead of failing on a bad token.
        #[arg(long)]
        lenient: bool,
    },
    /// Encode a design JSON file into a token.
    Encode {
        #[arg(default_value = "-", help = "Input file path, or - for stdin")]
        file: String,
    },
    /// Build a share URL from a design JSON file.
    Share {
        #[arg(default_value = "-", help = "Input file path, or - for stdin")]
        file: String,
    },
    /// Summarize the design in a token or share URL.
    Inspect { input: String },
    /// Replay a gesture script and print the resulting token.
    Replay {
        #[arg(default_value = "-", help = "Script file path, or - for stdin")]
        file: String,
        /// Print a share URL instead of the bare token.
        #[arg(long)]
        url: bool,
    },
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = run(&cli.base_url, cli.command)?;
    println!("{output}");
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = if verbose == 0 { "warn" } else { "debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn run(base_url: &str, command: Command) -> Result<String, CliError> {
    match command {
        Command::Decode { input, lenient } => run_decode(&input, lenient),
        Command::Encode { file } => run_encode(&file),
        Command::Share { file } => run_share(base_url, &file),
        Command::Inspect { input } => run_inspect(&input),
        Command::Replay { file, url } => run_replay(base_url, &file, url),
    }
}

fn run_decode(input: &str, lenient: bool) -> Result<String, CliError> {
    let design = if lenient {
        let (design, err) = codec::decode_or_default(&token_of(input)?);
        if let Some(err) = err {
            tracing::warn!(%err, "printing the empty design");
        }
        design
    } else {
        codec::decode(&token_of(input)?)?
    };
    Ok(codec::design_to_json(&design))
}

fn run_encode(file: &str) -> Result<String, CliError> {
    let design = read_design(file)?;
    Ok(codec::encode(&design))
}

fn run_share(base_url: &str, file: &str) -> Result<String, CliError> {
    let design = read_design(file)?;
    Ok(codec::share_url(base_url, &design))
}

fn run_inspect(input: &str) -> Result<String, CliError> {
    let design = codec::decode(&token_of(input)?)?;
    Ok(report::summarize(&design))
}

fn run_replay(base_url: &str, file: &str, url: bool) -> Result<String, CliError> {
    let steps = script::parse(&read_input(file)?)?;
    let mut engine = Engine::new();
    let log = script::replay(&mut engine, &steps);
    tracing::info!(steps = steps.len(), committed = log.committed, discarded = log.discarded, "replay finished");
    for notice in &log.notices {
        tracing::warn!(%notice, "replay");
    }
    if url {
        Ok(engine.share_url(base_url))
    } else {
        Ok(codec::encode(engine.design()))
    }
}

/// Bare tokens pass through; URLs and queries must carry `data=`.
fn token_of(input: &str) -> Result<String, CliError> {
    let input = input.trim();
    if let Some(token) = codec::token_from_query(input) {
        return Ok(token);
    }
    if input.contains('?') || input.contains("://") {
        return Err(CliError::MissingToken(input.to_owned()));
    }
    Ok(input.to_owned())
}

fn read_design(file: &str) -> Result<Design, CliError> {
    Ok(codec::parse_design(&read_input(file)?)?)
}

fn read_input(file: &str) -> Result<String, CliError> {
    let read_err = |source| CliError::Read { path: file.to_owned(), source };
    if file == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map_err(read_err)?;
        return Ok(text);
    }
    fs::read_to_string(file).map_err(read_err)
}
