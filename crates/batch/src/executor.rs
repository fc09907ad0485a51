//! Item-driven batch execution.
//!
//! Runs one async operation per item, strictly one at a time, over a list
//! that may keep growing while the run is in progress.
//!
//! ## Algorithm
//! While the controller is not aborted and `index < items.len()`:
//! 1. Read `items[index]` (the list is re-read on every pass)
//! 2. Await `execute(item)`; keep the value, or keep the error and count a failure
//! 3. Recompute progress
//! 4. Await the `on_processed` chain with the iteration context
//! 5. `index += 1`
//!
//! A failed `execute` does not stop the run by itself. The error is handed
//! to `on_processed`, which decides whether to abort. An error returned *by*
//! the chain is different: it ends the run and comes out of [`BatchExecutor::run`].

use crate::compose::Compose;
use crate::context::BatchContext;
use crate::controller::Controller;
use crate::items::SharedItems;
use crate::progress::Progress;
use anyhow::Result;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info};

/// Everything a handler can see about one iteration. Rebuilt every time.
pub struct ExecutionContext<T, R> {
    /// Handle to the live item list; handlers may append to it
    pub items: SharedItems<T>,
    pub index: usize,
    pub item: T,
    pub result: Option<R>,
    pub error: Option<anyhow::Error>,
    pub progress: Progress,
    pub controller: Controller,
}

impl<T, R> BatchContext for ExecutionContext<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
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
        self.index + 1 < self.items.len()
    }

    fn describe(&self) -> String {
        format!("item {}", self.index + 1)
    }
}

/// Aggregate of the iterations that actually ran.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<R> {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// One slot per iteration, `None` where `execute` failed
    pub results: Vec<Option<R>>,
}

impl<R> BatchResult<R> {
    /// Successful values only, in index order.
    pub fn values(self) -> Vec<R> {
        self.results.into_iter().flatten().collect()
    }
}

/// Runs `execute` over every item of a growable list.
///
/// ## Usage
/// ```ignore
/// let items = SharedItems::from(user_ids);
/// let hooks = Compose::new()
///     .with(SurfaceErrors::new(notifier.clone()))
///     .with(Pacing::new(Duration::from_secs(1)));
///
/// let result = BatchExecutor::new(controller)
///     .run(&items, |id| async move { api.block(&id).await }, &hooks)
///     .await?;
/// ```
pub struct BatchExecutor<T> {
    controller: Controller,
    total: Option<usize>,
    weight: Option<fn(&T) -> usize>,
}

impl<T> BatchExecutor<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(controller: Controller) -> Self {
        Self {
            controller,
            total: None,
            weight: None,
        }
    }

    /// Fix the total instead of deriving it from the item list.
    pub fn total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Treat each item as a list of `weight(item)` entries.
    ///
    /// The total then becomes the flattened length of all known items, and
    /// `processed` counts entries rather than iterations.
    pub fn flatten_with(mut self, weight: fn(&T) -> usize) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    fn resolve_total(&self, items: &SharedItems<T>) -> usize {
        if let Some(total) = self.total {
            return total;
        }
        match self.weight {
            Some(weight) => items.total_weight(weight),
            None => items.len(),
        }
    }

    /// Run until the items run out or the controller is aborted.
    ///
    /// # Arguments
    /// * `items` - The live item list, re-read before every iteration
    /// * `execute` - The unit of work for one item
    /// * `on_processed` - Handler chain run after every item
    ///
    /// # Returns
    /// * `Ok(BatchResult)` - Counts and values of the iterations that ran
    /// * `Err` - If a handler in `on_processed` returned an error
    pub async fn run<R, F, Fut>(
        &self,
        items: &SharedItems<T>,
        mut execute: F,
        on_processed: &Compose<ExecutionContext<T, R>>,
    ) -> Result<BatchResult<R>>
    where
        R: Send + 'static,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let start_time = Instant::now();
        let mut index = 0;
        let mut processed = 0;
        let mut success = 0;
        let mut failed = 0;
        let mut total = self.resolve_total(items);
        let mut results = Vec::new();

        info!("Starting batch run ({} items known)", items.len());

        while !self.controller.is_aborted() && index < items.len() {
            let Some(item) = items.get(index) else {
                break;
            };

            let mut context = ExecutionContext {
                items: items.clone(),
                index,
                item: item.clone(),
                result: None,
                error: None,
                progress: Progress::started(start_time),
                controller: self.controller.clone(),
            };

            processed += self.weight.map_or(1, |weight| weight(&item));
            match execute(item).await {
                Ok(value) => {
                    success += 1;
                    context.result = Some(value);
                }
                Err(err) => {
                    failed += 1;
                    debug!("Item {} failed: {:#}", index, err);
                    context.error = Some(err);
                }
            }

            total = self.resolve_total(items);
            context.progress = Progress::compute(start_time, processed, total, success, failed);

            on_processed.run(&mut context).await?;

            results.push(context.result);
            index += 1;
        }

        if self.controller.is_aborted() {
            info!(
                "Batch run aborted after {} items ({} ok, {} failed)",
                index, success, failed
            );
        } else {
            info!(
                "Batch run completed: {} items ({} ok, {} failed) in {:.2?}",
                index,
                success,
                failed,
                start_time.elapsed()
            );
        }

        Ok(BatchResult {
            total,
            success,
            failed,
            results,
        })
    }
}
