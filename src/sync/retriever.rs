//! Pagination-driven retrieval of one view
//!
//! A [`Pager`] yields the fragment pages of a document lazily. It stops when
//! the server omits the continuation token, when the configured page limit is
//! reached, or when a request fails. It cannot be restarted.

use crate::client::{FragmentResponse, RemoteClient};
use crate::page::{transform_fragment, ParamSet, ID_KEY, PAGINATION_KEY};
use crate::storage::{artifact_name, prune_artifacts, write_json_pretty, PageIndex};
use crate::Result;
use std::path::Path;
use url::Url;

/// One page returned by the parts endpoint
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// 1-based page number
    pub number: u32,
    /// Parameters the page was requested with, including the pagination token
    pub params: ParamSet,
    pub fragment: FragmentResponse,
}

/// Bounded, non-restartable sequence of fragment pages
pub struct Pager<'a> {
    client: &'a RemoteClient,
    doc_path: &'a str,
    base: ParamSet,
    limit: Option<u32>,
    token: Option<String>,
    fetched: u32,
    done: bool,
}

impl<'a> Pager<'a> {
    /// Creates a pager for a document
    ///
    /// # Arguments
    ///
    /// * `client` - Remote client used for the parts endpoint
    /// * `doc_path` - Remote document path (unencoded)
    /// * `base` - View parameters sent with every page
    /// * `limit` - Maximum number of pages, or `None` for no limit
    pub fn new(
        client: &'a RemoteClient,
        doc_path: &'a str,
        base: ParamSet,
        limit: Option<u32>,
    ) -> Self {
        Self {
            client,
            doc_path,
            base,
            limit,
            token: None,
            fetched: 0,
            done: false,
        }
    }

    /// Number of pages yielded so far
    pub fn fetched(&self) -> u32 {
        self.fetched
    }

    /// Fetches the next page, or returns `None` once the sequence has ended
    pub async fn next(&mut self) -> Option<FetchedPage> {
        if self.done {
            return None;
        }
        if self.limit.is_some_and(|limit| self.fetched >= limit) {
            self.done = true;
            return None;
        }

        let params = match &self.token {
            Some(token) => self.base.with(PAGINATION_KEY, token.clone()),
            None => self.base.clone(),
        };

        let Some(fragment) = self
            .client
            .fetch_fragment(self.doc_path, &params.to_query())
            .await
        else {
            self.done = true;
            return None;
        };

        if fragment.content().is_none() {
            tracing::warn!(
                "No content received for {} (page {})",
                self.doc_path,
                self.fetched + 1
            );
            self.done = true;
            return None;
        }

        self.fetched += 1;
        self.token = fragment.next_token();
        if self.token.is_none() {
            self.done = true;
        }

        Some(FetchedPage {
            number: self.fetched,
            params,
            fragment,
        })
    }
}

/// Everything one view retrieval produced
#[derive(Debug, Clone, Default)]
pub struct RetrievedView {
    /// Index entries for the written artifacts
    pub index: PageIndex,
    /// Image URLs referenced by any page, in discovery order
    pub images: Vec<Url>,
    /// Number of artifacts written
    pub pages: u32,
}

/// The URL relative references inside a document's fragments resolve against
pub fn document_url(remote: &Url, doc_path: &str) -> Url {
    remote.join(doc_path).unwrap_or_else(|_| remote.clone())
}

/// Runs the pagination loop for one view and writes its artifacts
///
/// Every page is transformed, written to `<component>-<n>.json` and indexed
/// under the fingerprint of the parameters it was requested with. Each
/// element id found in the page (plus the page's own `id`) adds an entry for
/// the parameters without the pagination token plus that id.
///
/// Artifacts of the component numbered above the last page written are
/// removed, so a document that shrank leaves no outdated pages behind.
///
/// # Returns
///
/// * `Ok(RetrievedView)` - Pages written so far; a failed request ends the loop
/// * `Err(SyncError)` - Writing an artifact failed
pub async fn retrieve_view(
    client: &RemoteClient,
    component: &str,
    doc_path: &str,
    params: &ParamSet,
    limit: Option<u32>,
    output_dir: &Path,
) -> Result<RetrievedView> {
    let remote = client.base_url();
    let base = document_url(remote, doc_path);
    let mut pager = Pager::new(client, doc_path, params.clone(), limit);
    let mut retrieved = RetrievedView::default();

    while let Some(page) = pager.next().await {
        let file_name = artifact_name(component, page.number);
        let mut fragment = page.fragment;

        let transformed = transform_fragment(
            fragment.content().unwrap_or_default(),
            &base,
            remote,
            &mut retrieved.images,
        );
        fragment.set_content(transformed.content);

        write_json_pretty(&output_dir.join(&file_name), &fragment.as_value()).await?;
        retrieved.pages += 1;

        retrieved.index.record(&page.params, &file_name);

        let unpaged = page.params.without(PAGINATION_KEY);
        for id in transformed.ids.into_iter().chain(fragment.id()) {
            retrieved.index.record(&unpaged.with(ID_KEY, id), &file_name);
        }
    }

    let pruned = prune_artifacts(output_dir, component, retrieved.pages).await?;
    if pruned > 0 {
        tracing::debug!("Removed {} outdated page(s) of {}", pruned, component);
    }

    tracing::debug!(
        "Retrieved {} page(s) of {} for {}",
        retrieved.pages,
        doc_path,
        component
    );
    Ok(retrieved)
}
