//! Onion-style composition of async handlers over one mutable context.
//!
//! Each handler receives the shared context and a [`Next`] for the rest of
//! the chain. Handlers run in registration order. Not calling `next.run`
//! ends the chain quietly; returning an error ends it too, and the error
//! comes out of [`Compose::run`] without any later handler running.
//!
//! The engines' per-item hooks are built from this, so error surfacing,
//! confirmation gates, progress rendering and pacing stay out of the loops.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// One link of a handler chain.
#[async_trait]
pub trait Middleware<C: Send + 'static>: Send + Sync {
    /// Returns the name of this handler (for logging/debugging)
    fn name(&self) -> &str;

    /// Handle the context, then call `next.run(ctx)` to continue the chain.
    async fn handle(&self, ctx: &mut C, next: Next<'_, C>) -> Result<()>;
}

/// The remainder of a chain, handed to each handler.
pub struct Next<'a, C: Send + 'static> {
    rest: &'a [Arc<dyn Middleware<C>>],
}

impl<C: Send + 'static> Next<'_, C> {
    /// Invoke the next handler, or do nothing at the end of the chain.
    pub async fn run(self, ctx: &mut C) -> Result<()> {
        match self.rest.split_first() {
            Some((head, tail)) => {
                tracing::trace!("Entering handler: {}", head.name());
                head.handle(ctx, Next { rest: tail }).await
            }
            None => Ok(()),
        }
    }
}

/// An ordered handler chain.
///
/// ## Usage
/// ```ignore
/// let hooks = Compose::new()
///     .with(SurfaceErrors::new(notifier.clone()))
///     .with(ProgressReporter::new(notifier.clone(), "Blocking"))
///     .with(Pacing::new(Duration::from_secs(1)));
///
/// hooks.run(&mut context).await?;
/// ```
pub struct Compose<C: Send + 'static> {
    handlers: Vec<Arc<dyn Middleware<C>>>,
}

impl<C: Send + 'static> Compose<C> {
    /// Create an empty chain. Running it does nothing.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Append a handler (builder pattern).
    pub fn with(mut self, handler: impl Middleware<C> + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Append an already shared handler.
    pub fn with_shared(mut self, handler: Arc<dyn Middleware<C>>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the chain from the first handler.
    pub async fn run(&self, ctx: &mut C) -> Result<()> {
        Next {
            rest: &self.handlers,
        }
        .run(ctx)
        .await
    }
}

impl<C: Send + 'static> Default for Compose<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// A whole chain can be nested inside another one.
#[async_trait]
impl<C: Send + 'static> Middleware<C> for Compose<C> {
    fn name(&self) -> &str {
        "Compose"
    }

    async fn handle(&self, ctx: &mut C, next: Next<'_, C>) -> Result<()> {
        self.run(ctx).await?;
        next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[derive(Default)]
    struct Trace {
        steps: Vec<String>,
    }

    struct Record {
        label: &'static str,
    }

    #[async_trait]
    impl Middleware<Trace> for Record {
        fn name(&self) -> &str {
            self.label
        }

        async fn handle(&self, ctx: &mut Trace, next: Next<'_, Trace>) -> Result<()> {
            ctx.steps.push(format!("{}:before", self.label));
            next.run(ctx).await?;
            ctx.steps.push(format!("{}:after", self.label));
            Ok(())
        }
    }

    struct Halt;

    #[async_trait]
    impl Middleware<Trace> for Halt {
        fn name(&self) -> &str {
            "Halt"
        }

        async fn handle(&self, ctx: &mut Trace, _next: Next<'_, Trace>) -> Result<()> {
            ctx.steps.push("halt".to_string());
            Ok(())
        }
    }

    struct Fail;

    #[async_trait]
    impl Middleware<Trace> for Fail {
        fn name(&self) -> &str {
            "Fail"
        }

        async fn handle(&self, _ctx: &mut Trace, _next: Next<'_, Trace>) -> Result<()> {
            bail!("handler failed")
        }
    }

    #[tokio::test]
    async fn test_onion_order() {
        let chain = Compose::new()
            .with(Record { label: "a" })
            .with(Record { label: "b" });

        let mut trace = Trace::default();
        chain.run(&mut trace).await.unwrap();

        assert_eq!(trace.steps, vec!["a:before", "b:before", "b:after", "a:after"]);
    }

    #[tokio::test]
    async fn test_not_calling_next_stops_chain() {
        let chain = Compose::new()
            .with(Record { label: "a" })
            .with(Halt)
            .with(Record { label: "never" });

        let mut trace = Trace::default();
        chain.run(&mut trace).await.unwrap();

        assert_eq!(trace.steps, vec!["a:before", "halt", "a:after"]);
    }

    #[tokio::test]
    async fn test_error_propagates_and_skips_rest() {
        let chain = Compose::new()
            .with(Record { label: "a" })
            .with(Fail)
            .with(Record { label: "never" });

        let mut trace = Trace::default();
        let err = chain.run(&mut trace).await.unwrap_err();

        assert_eq!(err.to_string(), "handler failed");
        // "a" propagated the error with `?`, so its after-step never ran
        assert_eq!(trace.steps, vec!["a:before"]);
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain: Compose<Trace> = Compose::new();
        let mut trace = Trace::default();
        chain.run(&mut trace).await.unwrap();
        assert!(trace.steps.is_empty());
        assert!(chain.is_empty());
    }

    #[tokio::test]
    async fn test_nested_chain() {
        let inner = Compose::new()
            .with(Record { label: "inner1" })
            .with(Record { label: "inner2" });
        let chain = Compose::new()
            .with(inner)
            .with(Record { label: "outer" });

        let mut trace = Trace::default();
        chain.run(&mut trace).await.unwrap();

        assert_eq!(
            trace.steps,
            vec![
                "inner1:before",
                "inner2:before",
                "inner2:after",
                "inner1:after",
                "outer:before",
                "outer:after"
            ]
        );
        assert_eq!(chain.len(), 2);
    }
}
