//! Publisher - main synchronization entry point
//!
//! This module ties the pieces together:
//! - Page transforms: views → staleness check → retrieval → index merge
//! - The fetch helper for single remote resources
//! - The collection crawl and the document catalog

use crate::cache::{CachedValue, ContentCache, CATALOG_CACHE_KEY, DEFAULT_MAX_AGE};
use crate::client::RemoteClient;
use crate::collections::{build_catalog, Catalog, CollectionWalker, DocList};
use crate::config::Config;
use crate::output::{build_indexers, jsonl_path, run_indexers, Indexer, IndexerBinding, TransformReport};
use crate::page::{find_views, ParamSet};
use crate::state::Staleness;
use crate::storage::{artifact_name, PageIndex};
use crate::sync::assets::{download_images, ensure_stylesheet};
use crate::sync::retriever::{document_url, retrieve_view};
use crate::sync::scheduler::{DirLocks, WorkQueue};
use crate::{Result, SyncError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Paths of the page being transformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// Source file of the page
    pub input_path: PathBuf,
    /// Where the rendered page is written; artifacts go next to it
    pub output_path: PathBuf,
    /// Root of the generated site
    pub base_dir: PathBuf,
}

impl PageContext {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            base_dir: base_dir.into(),
        }
    }

    /// Directory holding the page's artifacts and `index.json`
    pub fn output_dir(&self) -> PathBuf {
        match self.output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Result of transforming one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedPage {
    /// The page content, returned unchanged
    pub content: String,
    pub report: TransformReport,
}

/// What to do with one view of a page
enum ViewPlan {
    /// Artifacts are current; carry these index entries forward
    Reuse(PageIndex),
    /// Fetch every page again with these parameters
    Refresh(ParamSet),
}

/// Synchronizes a local site tree with a remote publisher
pub struct Publisher {
    config: Config,
    client: RemoteClient,
    cache: Option<ContentCache>,
    indexers: Vec<IndexerBinding>,
    queue: WorkQueue,
    locks: DirLocks,
}

impl Publisher {
    /// Creates a publisher from a validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Publisher)` - Ready to transform pages
    /// * `Err(SyncError)` - The remote URL or an indexer is invalid
    pub fn new(config: Config) -> Result<Self> {
        let client = RemoteClient::new(&config.remote)?;
        let indexers = build_indexers(&config.indexers)?;
        let cache = config
            .sync
            .use_cache
            .then(|| ContentCache::new(&config.sync.cache_dir));
        let queue = WorkQueue::new(config.sync.concurrency as usize);

        Ok(Self {
            config,
            client,
            cache,
            indexers,
            queue,
            locks: DirLocks::new(),
        })
    }

    /// Registers an additional indexer for a component
    pub fn with_indexer(mut self, component: &str, indexer: Arc<dyn Indexer>) -> Self {
        self.indexers.push(IndexerBinding {
            component: component.to_string(),
            indexer,
        });
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }

    pub fn is_disabled(&self) -> bool {
        self.config.sync.disabled
    }

    /// Fetches one remote resource as text
    ///
    /// Goes through the cache (keyed by URL, one day) when caching is on.
    /// A failed request yields `Failed to fetch <url>`; a disabled publisher
    /// yields an empty string.
    pub async fn fetch(&self, url: &str) -> String {
        if self.is_disabled() {
            return String::new();
        }

        if let Some(cache) = &self.cache {
            if cache.is_fresh(url, DEFAULT_MAX_AGE).await {
                if let Some(CachedValue::Text(text)) = cache.read(url).await {
                    tracing::debug!("Cache hit for {}", url);
                    return text;
                }
            }
        }

        tracing::debug!("Fetching {}", url);
        let Some(text) = self.client.fetch_text(url).await else {
            return format!("Failed to fetch {}", url);
        };

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.write(url, CachedValue::Text(text.clone())).await {
                tracing::warn!("Failed to cache {}: {}", url, e);
            }
        }
        text
    }

    /// Transforms a page once a worker slot is free
    pub async fn add_transform(&self, content: &str, context: &PageContext) -> Result<TransformedPage> {
        let _permit = self.queue.acquire().await;
        self.transform(content, context).await
    }

    /// Retrieves every view embedded in a page
    ///
    /// For each `<pb-view>`: loads the document metadata, reuses the existing
    /// artifacts when they are not older than the document and still indexed,
    /// and otherwise fetches every page again. Metadata and parameters of all
    /// views are resolved before the first fetch. The merged index is written to
    /// `<output dir>/index.json` while holding that directory's lock; entries
    /// written for views of other pages in the same directory are kept.
    ///
    /// # Errors
    ///
    /// * `SyncError::MissingMetadata` - A view's document has no metadata
    /// * `SyncError::Params` - A view carries an invalid parameter
    /// * `SyncError::Io` - Writing to the output tree failed
    pub async fn transform(&self, content: &str, context: &PageContext) -> Result<TransformedPage> {
        let mut report = TransformReport::default();
        let unchanged = |report| TransformedPage {
            content: content.to_string(),
            report,
        };

        if self.is_disabled() {
            return Ok(unchanged(report));
        }

        let found = find_views(content);
        if found.is_empty() {
            return Ok(unchanged(report));
        }
        report.views_skipped = found.skipped;

        let output_dir = context.output_dir();
        tracing::debug!(
            "Found {} views in page {}",
            found.views.len(),
            context.output_path.display()
        );
        tokio::fs::create_dir_all(&output_dir).await?;

        let _dir_guard = self.locks.lock(&output_dir).await;
        let previous = PageIndex::load(&output_dir).await?;
        let components: Vec<&str> = found.views.iter().map(|v| v.id.as_str()).collect();
        let mut carried = previous.without_components(&components);
        let mut fresh = PageIndex::new();

        // Every view is resolved before anything is fetched, so a page that
        // fails here leaves no artifacts behind.
        let mut plans = Vec::with_capacity(found.views.len());
        for view in &found.views {
            let meta = self
                .client
                .load_meta(&view.document_path)
                .await
                .ok_or_else(|| SyncError::MissingMetadata {
                    path: view.document_path.clone(),
                })?;

            let first_page = output_dir.join(artifact_name(&view.id, 1));
            let entries = previous.carry_forward(&view.id);
            match Staleness::check(meta.last_modified(), &first_page).await {
                Staleness::Reuse if !entries.is_empty() => {
                    plans.push((view, ViewPlan::Reuse(entries)));
                    continue;
                }
                Staleness::Reuse => {
                    tracing::debug!("Component {} has no index entries, fetching again", view.id);
                }
                Staleness::Refresh => {}
            }
            plans.push((view, ViewPlan::Refresh(view.parameters(&meta)?)));
        }

        for (view, plan) in plans {
            let params = match plan {
                ViewPlan::Reuse(entries) => {
                    tracing::debug!(
                        "Skipping component {} for {} as it is unchanged",
                        view.id,
                        view.document_path
                    );
                    carried = carried.merge(entries);
                    report.views_reused += 1;
                    continue;
                }
                ViewPlan::Refresh(params) => params,
            };

            ensure_stylesheet(&self.client, &params, &context.base_dir).await?;

            tracing::info!("Retrieving {} for {}", view.id, view.document_path);
            let retrieved = retrieve_view(
                &self.client,
                &view.id,
                &view.document_path,
                &params,
                self.config.sync.limit,
                &output_dir,
            )
            .await?;

            let base = document_url(self.client.base_url(), &view.document_path);
            report.images_written +=
                download_images(&self.client, &retrieved.images, &base, &output_dir).await?;
            report.artifacts_written += retrieved.pages;
            report.views_refreshed += 1;
            fresh = fresh.merge(retrieved.index);
        }

        carried.merge(fresh).save(&output_dir).await?;

        if report.changed() && !self.indexers.is_empty() {
            let jsonl = jsonl_path(&context.base_dir);
            let _jsonl_guard = self.locks.lock(&jsonl).await;
            tracing::debug!("Indexing files in {}", output_dir.display());
            report.index_records =
                run_indexers(&self.indexers, &output_dir, &context.base_dir).await?;
        }

        Ok(unchanged(report))
    }

    /// Transforms a batch of pages through the worker pool
    ///
    /// Pages run concurrently up to the configured width. Results come back
    /// in input order; one page failing does not stop the others.
    pub async fn transform_pages(
        self: &Arc<Self>,
        pages: Vec<(String, PageContext)>,
    ) -> Vec<(PageContext, Result<TransformedPage>)> {
        let mut handles = Vec::with_capacity(pages.len());

        for (content, context) in pages {
            let publisher = Arc::clone(self);
            let task_context = context.clone();
            let handle = tokio::spawn(async move {
                publisher.add_transform(&content, &task_context).await
            });
            handles.push((context, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (context, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(SyncError::from(e)),
            };
            if let Err(e) = &result {
                tracing::warn!("Failed to transform {}: {}", context.input_path.display(), e);
            }
            results.push((context, result));
        }
        results
    }

    /// Crawls the collection hierarchy and builds the document catalog
    ///
    /// The crawl runs when collections are enabled, since it produces files
    /// on disk. A fresh cached catalog is returned without loading metadata.
    ///
    /// # Returns
    ///
    /// * `Ok(Catalog)` - Template name → documents
    /// * `Err(SyncError)` - Writing to the output tree or cache failed
    pub async fn fetch_collections(&self, base_dir: &Path) -> Result<Catalog> {
        if self.is_disabled() {
            return Ok(Catalog::new());
        }

        let mut docs = DocList::new();
        if self.config.sync.collections {
            let walker = CollectionWalker::new(&self.client, self.config.sync.collection_page_size);
            walker.crawl(base_dir, &mut docs).await?;
        }

        if let Some(cache) = &self.cache {
            if cache.is_fresh(CATALOG_CACHE_KEY, DEFAULT_MAX_AGE).await {
                if let Some(CachedValue::Json(value)) = cache.read(CATALOG_CACHE_KEY).await {
                    match serde_json::from_value::<Catalog>(value) {
                        Ok(catalog) => {
                            tracing::debug!("Using cached document catalog");
                            return Ok(catalog);
                        }
                        Err(e) => tracing::warn!("Ignoring cached catalog: {}", e),
                    }
                }
            }
        }

        let catalog = build_catalog(&self.client, docs.as_slice()).await;

        if let Some(cache) = &self.cache {
            cache
                .write(CATALOG_CACHE_KEY, CachedValue::Json(serde_json::to_value(&catalog)?))
                .await?;
        }
        Ok(catalog)
    }
}
