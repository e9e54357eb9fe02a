//! AWQL CLI
//!
//! Runs AWQL statements against the reporting service and prints the
//! results as a table.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use awql::cache::{CsvCache, CsvStore};
use awql::catalog::MemoryCatalog;
use awql::config::{expand_home, generate_default_config, Config};
use awql::engine::{Engine, Outcome, ResultSet};
use awql::query::parse;
use awql::remote::AdwordsClient;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "awql")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query advertising reports with a SQL-like language")]
struct Cli {
    /// Statements to run instead of reading stdin
    #[arg(short = 'e', long)]
    execute: Option<String>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog document path
    #[arg(long)]
    catalog: Option<String>,

    /// Client customer id
    #[arg(short = 'i', long = "id")]
    account_id: Option<String>,

    /// Reporting API version
    #[arg(short = 'V', long = "api-version")]
    api_version: Option<String>,

    #[arg(short = 'D', long = "developer-token")]
    developer_token: Option<String>,

    #[arg(short = 'T', long = "access-token")]
    access_token: Option<String>,

    /// Serve repeated reports from the local cache
    #[arg(short = 'c', long)]
    cache: bool,

    /// Include rows without impressions
    #[arg(short = 'z', long = "zero-impressions")]
    zero_impressions: bool,

    #[arg(short = 'v', long)]
    verbose: bool,

    /// Tab-separated output without borders
    #[arg(short = 'B', long)]
    batch: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config) = cli.command {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_logging(&config, cli.verbose);
    apply_cli(&mut config, &cli);

    let catalog_path = config.catalog.file_path();
    let catalog = MemoryCatalog::load(&catalog_path)
        .with_context(|| format!("loading catalog {:?}", catalog_path))?;

    let client = AdwordsClient::new(config.adwords.clone())?;
    let mut engine = Engine::new(catalog, Arc::new(client))
        .with_account_id(config.adwords.account_id.clone());

    let mut cache_worker = None;
    if config.cache.enabled {
        let store = CsvStore::open(config.cache.dir_path(), config.cache.max_age())?;
        tracing::debug!(dir = ?store.dir(), "Report cache enabled");
        let (cache, worker) = CsvCache::spawn(store, config.cache.queue_size);
        engine = engine.with_cache(Arc::new(cache));
        cache_worker = Some(worker);
    }

    let script = match cli.execute {
        Some(ref text) => text.clone(),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for stmt in parse(&script)? {
        match engine.run(stmt).await? {
            Outcome::Rows(mut rs) => {
                if cli.batch {
                    print_batch(&mut out, &mut rs)?;
                } else if rs.is_vertical() {
                    print_vertical(&mut out, &mut rs)?;
                } else {
                    print_table(&mut out, &mut rs)?;
                }
                rs.close();
            }
            Outcome::ViewStored(name) => {
                engine.catalog().save(&catalog_path)?;
                writeln!(out, "View {} stored", name)?;
            }
        }
    }
    out.flush()?;

    // the worker drains pending cache writes once the engine is gone
    drop(engine);
    if let Some(worker) = cache_worker {
        worker.await?;
    }
    Ok(())
}

fn init_logging(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("awql=debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            format!("awql={}", config.logging.level)
        }))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn apply_cli(config: &mut Config, cli: &Cli) {
    if let Some(id) = &cli.account_id {
        config.adwords.account_id = id.clone();
    }
    if let Some(version) = &cli.api_version {
        config.adwords.api_version = version.clone();
    }
    if let Some(token) = &cli.developer_token {
        config.adwords.developer_token = token.clone();
    }
    if let Some(token) = &cli.access_token {
        config.adwords.access_token = token.clone();
    }
    if let Some(path) = &cli.catalog {
        config.catalog.path = expand_home(path).to_string_lossy().to_string();
    }
    if cli.cache {
        config.cache.enabled = true;
    }
    if cli.zero_impressions {
        config.adwords.zero_impressions = true;
    }
}

fn print_table(out: &mut impl Write, rs: &mut ResultSet) -> io::Result<()> {
    let widths: Vec<usize> = rs.columns().iter().map(|c| c.width).collect();
    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let line = |values: Vec<String>| {
        let cells: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!(" {:<w$} ", v, w = *w))
            .collect();
        format!("|{}|", cells.join("|"))
    };

    let total = rs.len();
    if total == 0 {
        return writeln!(out, "Empty set");
    }

    writeln!(out, "{}", border)?;
    let header = rs.column_names().iter().map(|n| n.to_string()).collect();
    writeln!(out, "{}", line(header))?;
    writeln!(out, "{}", border)?;
    while let Some(row) = rs.next_row() {
        let values = row.iter().map(|c| c.to_string()).collect();
        writeln!(out, "{}", line(values))?;
    }
    writeln!(out, "{}", border)?;
    writeln!(out, "{} {} in set", total, plural(total))
}

fn print_vertical(out: &mut impl Write, rs: &mut ResultSet) -> io::Result<()> {
    let names: Vec<String> = rs.columns().iter().map(|c| c.name.clone()).collect();
    let pad = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);
    let total = rs.len();

    let mut n = 0;
    while let Some(row) = rs.next_row() {
        n += 1;
        writeln!(out, "{} {}. row {}", "*".repeat(27), n, "*".repeat(27))?;
        for (name, cell) in names.iter().zip(row) {
            writeln!(out, "{:>pad$}: {}", name, cell, pad = pad)?;
        }
    }
    writeln!(out, "{} {} in set", total, plural(total))
}

fn print_batch(out: &mut impl Write, rs: &mut ResultSet) -> io::Result<()> {
    writeln!(out, "{}", rs.column_names().join("\t"))?;
    while let Some(row) = rs.next_row() {
        let values: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        writeln!(out, "{}", values.join("\t"))?;
    }
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "row"
    } else {
        "rows"
    }
}
