//! Command-line access to the catalog admin core.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use catalog_core::{
    AdminConfig, Endpoints, HttpGateway, RecordManager, RecordSchema, RemoteCollection,
    SkuAllocator,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file; `CATALOG_*` variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured API base URL
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of a collection
    List {
        /// products, customers or orders
        kind: String,
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Print the next SKU for a category
    ProposeSku {
        #[arg(long)]
        category: String,
        /// Products already numbered in this category
        #[arg(long, default_value_t = 0)]
        counter: u32,
    },
    /// Ask the backend whether a SKU is taken
    CheckSku { key: String },
}

fn load_config(args: &Args) -> Result<AdminConfig> {
    let mut config = match &args.config {
        Some(path) => AdminConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AdminConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    Ok(config)
}

fn gateway(config: &AdminConfig, kind: &str) -> Result<HttpGateway> {
    let schema = RecordSchema::builtin(kind).ok_or_else(|| anyhow!("unknown record kind `{kind}`"))?;
    let endpoints = Endpoints::builtin(kind).ok_or_else(|| anyhow!("no routes for `{kind}`"))?;
    Ok(HttpGateway::with_timeout(
        &config.base_url,
        config.timeout(),
        endpoints,
        schema,
    )?)
}

async fn list(config: &AdminConfig, kind: &str, query: String, page: usize) -> Result<()> {
    let gateway = gateway(config, kind)?;
    let page_size = config.page_size_for(gateway.schema().kind())?;
    let searchable = gateway.schema().searchable_fields().to_vec();
    let mut manager = RecordManager::new(gateway, page_size);
    manager
        .refresh()
        .await
        .with_context(|| format!("fetching {kind}"))?;
    manager.set_query(query);
    manager.set_page(page);

    let view = manager.view();
    for row in &view.rows {
        let columns: Vec<String> = searchable
            .iter()
            .map(|path| {
                row.record
                    .get_path(path)
                    .and_then(|value| value.search_text())
                    .map(|text| text.into_owned())
                    .unwrap_or_default()
            })
            .collect();
        println!("{:>4}  {}  {}", row.serial, row.record.id(), columns.join("  "));
    }
    println!(
        "page {} of {} ({} matching)",
        view.page_index, view.total_pages, view.filtered_len
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command {
        Command::List { kind, query, page } => list(&config, &kind, query, page).await?,
        Command::ProposeSku { category, counter } => {
            println!("{}", SkuAllocator::propose(&category, counter));
        }
        Command::CheckSku { key } => {
            let gateway = gateway(&config, "products")?;
            match SkuAllocator::reserve(&gateway, &key).await {
                Ok(()) => println!("{key}: available"),
                Err(catalog_core::CoreError::Conflict(_)) => println!("{key}: taken"),
                Err(err) => return Err(err).context("checking SKU"),
            }
        }
    }
    Ok(())
}
