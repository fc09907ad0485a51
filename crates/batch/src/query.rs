//! Pagination-driven batch runs.
//!
//! Sibling of the executor for jobs whose unit of work is "fetch one more
//! page" (mass export, follower listing). The paginator appends what it
//! fetched to the shared item list; progress counts accumulated items,
//! not requests.

use crate::compose::Compose;
use crate::context::BatchContext;
use crate::controller::Controller;
use crate::items::SharedItems;
use crate::progress::Progress;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info};

/// A cursor over remote pages.
#[async_trait]
pub trait Paginator: Send {
    /// Whether another page can be requested.
    fn has_next(&self) -> bool;

    /// Fetch one page and append its items wherever the caller reads them.
    async fn fetch_next_page(&mut self) -> Result<()>;
}

/// Everything a handler can see about one page fetch.
pub struct QueryContext<T> {
    /// Handle to the accumulated items
    pub items: SharedItems<T>,
    /// 1-based number of the page just requested
    pub page: usize,
    /// Whether the paginator reported another page after this fetch
    pub has_next: bool,
    pub error: Option<anyhow::Error>,
    pub progress: Progress,
    pub controller: Controller,
}

impl<T: Send + 'static> BatchContext for QueryContext<T> {
    fn error(&self) -> Option<&anyhow::Error> {
        self.error.as_ref()
    }

    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn controller(&self) -> &Controller {
        &self.controller
    }

    fn has_more(&self) -> bool {
        self.has_next
    }

    fn describe(&self) -> String {
        format!("page {}", self.page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryResult {
    pub total: usize,
    /// Page requests made, failed ones included
    pub pages: usize,
    pub failed: usize,
    /// Items accumulated when the run ended
    pub items: usize,
}

/// Drives a [`Paginator`] until it is exhausted or the run is aborted.
///
/// ## Failure handling
/// A failed fetch is counted and attached to the context. If the paginator
/// keeps reporting `has_next`, the next iteration simply retries; the
/// `on_processed` chain is expected to abort on errors it will not tolerate.
pub struct BatchQuery {
    controller: Controller,
    total: Option<usize>,
}

impl BatchQuery {
    pub fn new(controller: Controller) -> Self {
        Self {
            controller,
            total: None,
        }
    }

    /// Expected number of items, when the remote side reports one.
    pub fn total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub async fn run<T, P>(
        &self,
        items: &SharedItems<T>,
        paginator: &mut P,
        on_processed: &Compose<QueryContext<T>>,
    ) -> Result<QueryResult>
    where
        T: Send + 'static,
        P: Paginator + ?Sized,
    {
        let start_time = Instant::now();
        let mut pages = 0;
        let mut failed = 0;

        info!("Starting paged run");

        while !self.controller.is_aborted() && paginator.has_next() {
            pages += 1;
            let mut context = QueryContext {
                items: items.clone(),
                page: pages,
                has_next: false,
                error: None,
                progress: Progress::started(start_time),
                controller: self.controller.clone(),
            };

            if let Err(err) = paginator.fetch_next_page().await {
                failed += 1;
                debug!("Page {} failed: {:#}", pages, err);
                context.error = Some(err);
            }

            context.has_next = paginator.has_next();
            let processed = items.len();
            let total = self.total.unwrap_or(processed);
            context.progress =
                Progress::compute(start_time, processed, total, processed, failed);

            on_processed.run(&mut context).await?;
        }

        let accumulated = items.len();
        info!(
            "Paged run finished: {} pages, {} failed, {} items in {:.2?}",
            pages,
            failed,
            accumulated,
            start_time.elapsed()
        );

        Ok(QueryResult {
            total: self.total.unwrap_or(accumulated),
            pages,
            failed,
            items: accumulated,
        })
    }
}
