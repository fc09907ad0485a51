//! Standard handlers for the engines' `on_processed` chains.
//!
//! Typical order: surface errors first (so nothing else runs after a fatal
//! one), then the request-limit gate, then progress, then pacing.

use crate::compose::{Middleware, Next};
use crate::context::BatchContext;
use crate::error::{ErrorClass, ErrorCode, classify};
use crate::notify::{Confirm, Notifier};
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Decides what an iteration error means for the run.
///
/// - `notFound`: logged, the run continues
/// - `rateLimit`, `unauthorized`, `forbidden`: abort and report
/// - anything unrecognised: abort and report
///
/// After an abort the rest of the chain is skipped.
pub struct SurfaceErrors {
    notifier: Arc<dyn Notifier>,
}

impl SurfaceErrors {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl<C: BatchContext> Middleware<C> for SurfaceErrors {
    fn name(&self) -> &str {
        "SurfaceErrors"
    }

    async fn handle(&self, ctx: &mut C, next: Next<'_, C>) -> Result<()> {
        let Some((class, message)) = ctx
            .error()
            .map(|err| (classify(err), format!("{} failed: {:#}", ctx.describe(), err)))
        else {
            return next.run(ctx).await;
        };

        match class {
            ErrorClass::Expected(ErrorCode::NotFound) => {
                warn!("{}", message);
                next.run(ctx).await
            }
            ErrorClass::Expected(code) => {
                ctx.controller().abort();
                self.notifier
                    .error(&format!("Stopped ({}): {}", code.as_str(), message));
                Ok(())
            }
            ErrorClass::Unexpected => {
                ctx.controller().abort();
                self.notifier.error(&format!("Stopped: {}", message));
                Ok(())
            }
        }
    }
}

/// Asks for confirmation every `limit` iterations.
///
/// No prompt is shown when the engine has nothing left to run, so a limit
/// that lands on the last item or page is not asked about.
///
/// Answering `Stop` aborts the run and skips the rest of the chain.
pub struct MaxRequestGate {
    notifier: Arc<dyn Notifier>,
    limit: usize,
    seen: AtomicUsize,
}

impl MaxRequestGate {
    /// `limit` of zero disables the gate.
    pub fn new(notifier: Arc<dyn Notifier>, limit: usize) -> Self {
        Self {
            notifier,
            limit,
            seen: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl<C: BatchContext> Middleware<C> for MaxRequestGate {
    fn name(&self) -> &str {
        "MaxRequestGate"
    }

    async fn handle(&self, ctx: &mut C, next: Next<'_, C>) -> Result<()> {
        let seen = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        let due = self.limit > 0 && seen % self.limit == 0;
        if due && ctx.has_more() && !ctx.controller().is_aborted() {
            let prompt = format!("{} requests sent ({}). Continue?", seen, ctx.progress());
            if self.notifier.confirm(&prompt).await == Confirm::Stop {
                info!("Run stopped at request limit ({})", seen);
                ctx.controller().abort();
                return Ok(());
            }
        }

        next.run(ctx).await
    }
}

/// Pushes a progress line to the notifier on every iteration.
pub struct ProgressReporter {
    notifier: Arc<dyn Notifier>,
    label: String,
}

impl ProgressReporter {
    pub fn new(notifier: Arc<dyn Notifier>, label: impl Into<String>) -> Self {
        Self {
            notifier,
            label: label.into(),
        }
    }
}

#[async_trait]
impl<C: BatchContext> Middleware<C> for ProgressReporter {
    fn name(&self) -> &str {
        "ProgressReporter"
    }

    async fn handle(&self, ctx: &mut C, next: Next<'_, C>) -> Result<()> {
        self.notifier
            .loading(&format!("{}: {}", self.label, ctx.progress()));
        next.run(ctx).await
    }
}

/// Waits between requests to stay under the remote rate limit.
///
/// The wait races the controller, so an abort ends it at once.
pub struct Pacing {
    delay: Duration,
    jitter: Duration,
}

impl Pacing {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter: Duration::ZERO,
        }
    }

    /// Add a random extra wait in `[0, jitter]`.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.delay;
        }
        self.delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

#[async_trait]
impl<C: BatchContext> Middleware<C> for Pacing {
    fn name(&self) -> &str {
        "Pacing"
    }

    async fn handle(&self, ctx: &mut C, next: Next<'_, C>) -> Result<()> {
        let delay = self.next_delay();
        if !delay.is_zero() {
            let controller = ctx.controller().clone();
            controller.sleep(delay).await;
        }
        next.run(ctx).await
    }
}
