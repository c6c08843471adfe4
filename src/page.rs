//! Cursor Pagination
//!
//! Horizon collections are served as pages. Every page embeds an opaque link
//! to the next one; the traversal here only ever follows that link and stops
//! at the first page with no records.
//!
//! The traversal is not a consistent snapshot: records inserted behind the
//! cursor while it runs are missed, and a collection without stable cursors
//! may yield a record twice.

use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::horizon::HorizonError;

/// Opaque link to the next page of a collection
///
/// Only a [`PageFetcher`] can dereference it; callers cannot build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    href: String,
}

impl PageLink {
    pub(crate) fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }

    pub(crate) fn href(&self) -> &str {
        &self.href
    }

    /// Fetch the page this link points to
    pub async fn fetch_next<T, F>(&self, fetcher: &F) -> Result<Page<T>, HorizonError>
    where
        T: Send,
        F: PageFetcher<T> + ?Sized,
    {
        fetcher.fetch_page(self).await
    }
}

/// One batch of records
#[derive(Debug, Clone)]
pub struct Page<T> {
    records: Vec<T>,
    next: Option<PageLink>,
}

impl<T> Page<T> {
    pub(crate) fn new(records: Vec<T>, next: Option<PageLink>) -> Self {
        Self { records, next }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// A page without records ends the collection
    pub fn is_terminal(&self) -> bool {
        self.records.is_empty()
    }

    pub fn next_link(&self) -> Option<&PageLink> {
        self.next.as_ref()
    }

    pub fn into_parts(self) -> (Vec<T>, Option<PageLink>) {
        (self.records, self.next)
    }
}

/// Something that can dereference a [`PageLink`]
#[async_trait]
pub trait PageFetcher<T: Send>: Send + Sync {
    /// Fetch the page behind `link`
    async fn fetch_page(&self, link: &PageLink) -> Result<Page<T>, HorizonError>;
}

/// Collect every record of a collection, starting from an already fetched page
///
/// Fails as a whole on the first error; partial results are never returned.
pub async fn collect_all<T, F>(
    first: Page<T>,
    fetcher: &F,
    cancel: &CancellationToken,
) -> Result<Vec<T>, HorizonError>
where
    T: Send,
    F: PageFetcher<T> + ?Sized,
{
    let mut records = Vec::new();
    let mut page = first;
    let mut page_index = 0usize;

    loop {
        tracing::debug!(
            target: "claimsweep::horizon",
            page = page_index,
            records = page.records.len(),
            "page received"
        );

        if page.is_terminal() {
            break;
        }

        let (batch, next) = page.into_parts();
        records.extend(batch);

        let link = next.ok_or_else(|| {
            HorizonError::MalformedPage(format!(
                "page {} has records but no next link",
                page_index
            ))
        })?;

        page = cancellable(cancel, link.fetch_next(fetcher)).await?;
        page_index += 1;
    }

    tracing::debug!(
        target: "claimsweep::horizon",
        pages = page_index + 1,
        records = records.len(),
        "collection exhausted"
    );

    Ok(records)
}

/// Run a Horizon request unless `cancel` fires first
pub async fn cancellable<T, Fut>(cancel: &CancellationToken, fut: Fut) -> Result<T, HorizonError>
where
    Fut: Future<Output = Result<T, HorizonError>>,
{
    if cancel.is_cancelled() {
        return Err(HorizonError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(HorizonError::Cancelled),
        result = fut => result,
    }
}
