use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use bytes::Bytes;
use colored::Colorize;
use seqstore_core::{is_loose_dna, BackendConfig, RangeMap, RequesterMap, SequenceStore};
use seqstore_server::{SequenceServer, ServerConfig};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli.config.as_deref(), cli.root.clone())?;
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Put(args) => cmd_put(&open_store(&config).await?, args, &format).await,
        Command::Get(args) => cmd_get(&open_store(&config).await?, args).await,
        Command::GetMany(args) => cmd_get_many(&open_store(&config).await?, args).await,
        Command::Chunk(args) => cmd_chunk(&open_store(&config).await?, args, &format).await,
        Command::Delete(args) => cmd_delete(&open_store(&config).await?, args, &format).await,
        Command::Exists(args) => cmd_exists(&open_store(&config).await?, args, &format).await,
    }
}

async fn open_store(config: &ServerConfig) -> anyhow::Result<SequenceStore> {
    Ok(SequenceStore::open(&config.store).await?)
}

/// Load the config file if given, then apply `--root`.
pub fn resolve_config(path: Option<&Path>, root: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(root) = root {
        config.store.backend = BackendConfig::Filesystem { root };
    }
    Ok(config)
}

/// Read a sequence from `path`, or stdin for `-` or no path, and trim
/// surrounding whitespace.
pub fn read_sequence(path: Option<&Path>) -> anyhow::Result<String> {
    let raw = match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("reading {}", p.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };
    let sequence = raw.trim().to_string();
    if sequence.is_empty() {
        bail!("sequence is empty");
    }
    if !is_loose_dna(sequence.as_bytes()) {
        bail!("sequence contains non-nucleotide characters");
    }
    Ok(sequence)
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!("{} sequence server on {}", "▶".green(), config.bind_addr.to_string().bold());
    SequenceServer::open(config).await?.serve().await?;
    Ok(())
}

async fn cmd_put(store: &SequenceStore, args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let sequence = read_sequence(args.file.as_deref())?;
    let len = sequence.len();
    let digest = store.write(Bytes::from(sequence)).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "digest": digest, "length": len })),
        OutputFormat::Text => println!("{} {} ({} bp)", "✓".green().bold(), digest.to_string().yellow(), len),
    }
    Ok(())
}

async fn cmd_get(store: &SequenceStore, args: GetArgs) -> anyhow::Result<()> {
    match store.get(Some(&args.address)).await? {
        Some(content) => println!("{}", String::from_utf8_lossy(&content)),
        None => bail!("no address given"),
    }
    Ok(())
}

async fn cmd_get_many(store: &SequenceStore, args: GetManyArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let requesters: RequesterMap = serde_json::from_str(&text).context("parsing requester map")?;
    let resolved = store.get_many(&requesters).await?;
    let out: BTreeMap<String, Option<String>> = resolved
        .into_iter()
        .map(|(id, content)| (id, content.map(|c| String::from_utf8_lossy(&c).into_owned())))
        .collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn cmd_chunk(store: &SequenceStore, args: ChunkArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let sequence = read_sequence(Some(args.file.as_path()))?;
    let ranges: RangeMap = args.ranges.into_iter().collect();
    let addresses = store.write_chunks(Bytes::from(sequence), &ranges).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&addresses)?),
        OutputFormat::Text => {
            for (name, address) in &addresses {
                println!("  {} {}", name.bold(), address.to_string().yellow());
            }
        }
    }
    Ok(())
}

async fn cmd_delete(store: &SequenceStore, args: DeleteArgs, format: &OutputFormat) -> anyhow::Result<()> {
    store.delete(&args.digest).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "deleted": args.digest })),
        OutputFormat::Text => println!("{} Deleted {}", "✓".green().bold(), args.digest.yellow()),
    }
    Ok(())
}

async fn cmd_exists(store: &SequenceStore, args: ExistsArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let exists = store.exists(&args.address).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "exists": exists })),
        OutputFormat::Text if exists => println!("{} {}", "✓".green().bold(), args.address),
        OutputFormat::Text => println!("{} {}", "✗".red().bold(), args.address),
    }
    Ok(())
}
