//! Command-line front end for the primary-category engine.
//!
//! # Responsibility
//! - Verify `primary_category_core` linkage (`ping`).
//! - Print generated route rules, canonical permalinks and request dispatch
//!   results against a SQLite host database and a JSON rewrite config.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use primary_category_core::db::open_db;
use primary_category_core::{
    core_version, init_logging, ping, ContentItem, Dispatched, EphemeralStore,
    HostStores, LogSettings, MemoryTransientStore, PrimaryCategoryEngine, RewriteConfig,
    RewriteConfigBuilder, SqliteContentStore, SqliteMetaStore, SqliteTermStore,
    SqliteTransientStore,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "primary-category")]
#[command(about = "Primary category resolution and URL rewrite tool")]
struct Cli {
    /// Absolute directory for rolling log files; logging stays off when unset.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prints core linkage and version.
    Ping,
    /// Prints generated route rules as JSON.
    Rules(HostArgs),
    /// Prints the canonical permalink of one item.
    Permalink {
        #[command(flatten)]
        host: HostArgs,
        #[arg(long)]
        item: Uuid,
    },
    /// Routes one request path and prints the dispatch outcome.
    Dispatch {
        #[command(flatten)]
        host: HostArgs,
        path: String,
    },
}

#[derive(Debug, clap::Args)]
struct HostArgs {
    /// SQLite host database.
    #[arg(long)]
    db: PathBuf,
    /// JSON rewrite config.
    #[arg(long)]
    config: PathBuf,
    /// Keep resolution cache in process memory instead of the database.
    #[arg(long)]
    memory_cache: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let settings = LogSettings::parse(log_dir, cli.log_level.as_deref())?;
        init_logging(&settings)?;
    }
    info!("event=cli_command module=cli status=start command={:?}", cli.command);

    match cli.command {
        Command::Ping => {
            println!("primary_category_core ping={}", ping());
            println!("primary_category_core version={}", core_version());
        }
        Command::Rules(host) => with_engine(&host, |engine| {
            let table = engine.route_table(Vec::new())?;
            let rules: Vec<_> = table
                .rules()
                .map(|rule| json!({ "pattern": rule.pattern, "query": rule.target.to_string() }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rules)?);
            Ok(())
        })?,
        Command::Permalink { host, item } => with_engine(&host, |engine| {
            let content_item = lookup_item(engine, item)?;
            println!("{}", engine.build_path(&content_item));
            Ok(())
        })?,
        Command::Dispatch { host, path } => with_engine(&host, |engine| {
            let table = engine.route_table(Vec::new())?;
            let outcome = match engine.dispatch(&table, &path)? {
                None => json!({ "matched": false }),
                Some(Dispatched::Item(item)) => json!({ "matched": true, "item": item }),
                Some(Dispatched::TermArchive(term)) => json!({ "matched": true, "term": term }),
                Some(Dispatched::Host { query }) => json!({ "matched": true, "query": query }),
                Some(Dispatched::Unresolved { rule_index }) => {
                    json!({ "matched": true, "unresolved_rule": rule_index })
                }
            };
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        })?,
    }

    Ok(())
}

fn with_engine(
    host: &HostArgs,
    run: impl FnOnce(&PrimaryCategoryEngine<'_>) -> Result<()>,
) -> Result<()> {
    let conn = open_db(&host.db)
        .with_context(|| format!("failed to open database `{}`", host.db.display()))?;
    let items = SqliteContentStore::new(&conn);
    let terms = SqliteTermStore::new(&conn);
    let meta = SqliteMetaStore::new(&conn);
    let sqlite_cache = SqliteTransientStore::new(&conn);
    let memory_cache = MemoryTransientStore::new();

    let cache: &dyn EphemeralStore = if host.memory_cache {
        &memory_cache as &dyn EphemeralStore
    } else {
        &sqlite_cache as &dyn EphemeralStore
    };

    let config = load_config(&host.config, &terms)?;
    let stores = HostStores {
        items: &items,
        terms: &terms,
        meta: &meta,
        cache,
    };
    let engine = PrimaryCategoryEngine::new(&config, stores);
    run(&engine)
}

fn load_config(path: &Path, terms: &SqliteTermStore<'_>) -> Result<RewriteConfig> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read config `{}`", path.display()))?;
    let config = RewriteConfigBuilder::from_json(&source)?.build(terms)?;
    Ok(config)
}

fn lookup_item(engine: &PrimaryCategoryEngine<'_>, item_id: Uuid) -> Result<ContentItem> {
    engine
        .stores()
        .items
        .get_item(item_id)?
        .with_context(|| format!("content item `{item_id}` not found"))
}
