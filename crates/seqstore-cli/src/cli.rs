use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use seqstore_core::Span;

#[derive(Parser)]
#[command(
    name = "seqstore",
    about = "Content-addressed sequence store with ranged addresses",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use a filesystem store rooted here, overriding the config file
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Store a sequence and print its digest
    Put(PutArgs),
    /// Print the sequence an address names
    Get(GetArgs),
    /// Resolve a JSON map of requester id to address
    GetMany(GetManyArgs),
    /// Store one sequence and derive addresses for named ranges
    Chunk(ChunkArgs),
    /// Delete a stored sequence
    Delete(DeleteArgs),
    /// Check whether an address's sequence is stored
    Exists(ExistsArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct PutArgs {
    /// File holding the sequence; `-` or nothing reads stdin
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct GetArgs {
    pub address: String,
}

#[derive(Args)]
pub struct GetManyArgs {
    /// JSON file of `{ "id": "address" | null }`
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ChunkArgs {
    pub file: PathBuf,
    /// `name=start:end` or `name=whole`; repeatable
    #[arg(short, long = "range", value_parser = parse_range_spec)]
    pub ranges: Vec<(String, Span)>,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub digest: String,
}

#[derive(Args)]
pub struct ExistsArgs {
    pub address: String,
}

/// Parse `name=start:end` or `name=whole`.
pub fn parse_range_spec(s: &str) -> Result<(String, Span), String> {
    let (name, range) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=start:end or name=whole, got {s:?}"))?;
    if name.is_empty() {
        return Err("range name is empty".into());
    }
    if range == "whole" {
        return Ok((name.to_string(), Span::Whole));
    }
    let (start, end) = range
        .split_once(':')
        .ok_or_else(|| format!("expected start:end, got {range:?}"))?;
    let start: u64 = start.parse().map_err(|_| format!("bad start {start:?}"))?;
    let end: u64 = end.parse().map_err(|_| format!("bad end {end:?}"))?;
    let span = Span::range(start, end).map_err(|e| e.to_string())?;
    Ok((name.to_string(), span))
}
