//! tei-sync main entry point
//!
//! Command-line driver over the library: transforms the given pages, crawls
//! the remote collections and writes the document catalog.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tei_sync::config::{load_config_with_hash, Config};
use tei_sync::output::{format_markdown_summary, SyncSummary};
use tei_sync::storage::{write_atomic, write_json_pretty};
use tei_sync::{PageContext, Publisher};
use tracing_subscriber::EnvFilter;

/// File name of the catalog written below the output directory
const CATALOG_FILE: &str = "teidocuments.json";

/// tei-sync: incremental mirror of TEI Publisher documents
///
/// Expands every `<pb-view>` in the given pages into paginated JSON
/// fragments next to the page output, and optionally crawls the remote
/// collection hierarchy into a template-grouped document catalog.
#[derive(Parser, Debug)]
#[command(name = "tei-sync")]
#[command(version)]
#[command(about = "Incremental mirror of TEI Publisher documents", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// HTML pages to transform
    #[arg(value_name = "PAGES")]
    pages: Vec<PathBuf>,

    /// Directory page paths are taken relative to
    #[arg(long, value_name = "DIR", default_value = ".")]
    input_root: PathBuf,

    /// Only crawl collections and write the catalog
    #[arg(long, conflicts_with = "pages")]
    collections_only: bool,

    /// Fetch one remote resource and print it
    #[arg(long, value_name = "URL")]
    fetch: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::debug!("Configuration hash: {}", config_hash);

    if config.sync.disabled {
        tracing::info!("Synchronization disabled, nothing to do");
        return Ok(());
    }

    let config = apply_cli_flags(config, cli.collections_only);
    let base_dir = PathBuf::from(&config.sync.output_dir);
    let crawl = config.sync.collections;
    let publisher = Arc::new(Publisher::new(config)?);
    let mut summary = SyncSummary::new();

    if let Some(url) = &cli.fetch {
        println!("{}", publisher.fetch(url).await);
    }

    if !cli.collections_only && !cli.pages.is_empty() {
        handle_pages(&publisher, &cli.pages, &cli.input_root, &base_dir, &mut summary).await?;
    }

    if crawl {
        handle_collections(&publisher, &base_dir, &mut summary).await?;
    }

    if !cli.quiet {
        println!("{}", format_markdown_summary(&summary));
    }

    if summary.pages_failed > 0 {
        bail!("{} page(s) failed to transform", summary.pages_failed);
    }
    Ok(())
}

/// Folds command-line flags into the loaded configuration
///
/// `--collections-only` turns the collection crawl on, since a catalog built
/// without it would be empty.
fn apply_cli_flags(mut config: Config, collections_only: bool) -> Config {
    if collections_only {
        config.sync.collections = true;
    }
    config
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tei_sync=info,warn"),
            1 => EnvFilter::new("tei_sync=debug,info"),
            2 => EnvFilter::new("tei_sync=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Output location of a page below the site root
///
/// Pages under `input_root` keep their relative path; anything else lands
/// directly in the site root under its file name.
fn output_path_for(page: &Path, input_root: &Path, base_dir: &Path) -> PathBuf {
    let page = without_cur_dir(page);
    let input_root = without_cur_dir(input_root);
    match page.strip_prefix(&input_root) {
        Ok(relative) if page.is_relative() == input_root.is_relative() => base_dir.join(relative),
        _ => match page.file_name() {
            Some(name) => base_dir.join(name),
            None => base_dir.join(&page),
        },
    }
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Transforms every page and writes it to the output tree
async fn handle_pages(
    publisher: &Arc<Publisher>,
    pages: &[PathBuf],
    input_root: &Path,
    base_dir: &Path,
    summary: &mut SyncSummary,
) -> anyhow::Result<()> {
    let mut batch = Vec::with_capacity(pages.len());
    for page in pages {
        let content = tokio::fs::read_to_string(page)
            .await
            .with_context(|| format!("Failed to read {}", page.display()))?;
        let output_path = output_path_for(page, input_root, base_dir);
        batch.push((content, PageContext::new(page, output_path, base_dir)));
    }

    tracing::info!("Transforming {} pages", batch.len());
    for (context, result) in publisher.transform_pages(batch).await {
        match result {
            Ok(page) => {
                write_atomic(&context.output_path, page.content.as_bytes())
                    .await
                    .with_context(|| format!("Failed to write {}", context.output_path.display()))?;
                summary.add(&page.report);
            }
            Err(e) => {
                tracing::error!("{}: {}", context.input_path.display(), e);
                summary.record_failure();
            }
        }
    }
    Ok(())
}

/// Crawls collections and writes the catalog
async fn handle_collections(
    publisher: &Publisher,
    base_dir: &Path,
    summary: &mut SyncSummary,
) -> anyhow::Result<()> {
    log_remote(publisher.config());
    let catalog = publisher.fetch_collections(base_dir).await?;

    let catalog_path = base_dir.join(CATALOG_FILE);
    write_json_pretty(&catalog_path, &catalog).await?;
    tracing::info!("Catalog written to {}", catalog_path.display());

    summary.catalog_documents = Some(catalog.values().map(Vec::len).sum());
    summary.catalog_templates = catalog.keys().cloned().collect();
    Ok(())
}

fn log_remote(config: &Config) {
    tracing::info!(
        "Crawling collections of {} (page size {})",
        config.remote.url,
        config.sync.collection_page_size
    );
}
