//! The notification surface the standard handlers talk to.
//!
//! In the browser this is a toast area with a confirm dialog; in the CLI it
//! is the terminal. Handlers only ever need these four primitives.

use async_trait::async_trait;

/// Answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    Stop,
    Continue,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Transient progress message; replaces the previous one.
    fn loading(&self, message: &str);

    fn success(&self, message: &str);

    /// Persistent error message.
    fn error(&self, message: &str);

    /// Ask whether to keep going.
    async fn confirm(&self, prompt: &str) -> Confirm;
}

/// Notifier that writes to the log and answers prompts with a fixed policy.
#[derive(Debug, Clone, Copy)]
pub struct TracingNotifier {
    answer: Confirm,
}

impl TracingNotifier {
    pub fn new(answer: Confirm) -> Self {
        Self { answer }
    }
}

impl Default for TracingNotifier {
    fn default() -> Self {
        Self::new(Confirm::Continue)
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    fn loading(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn success(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    async fn confirm(&self, prompt: &str) -> Confirm {
        tracing::warn!("{} -> {:?}", prompt, self.answer);
        self.answer
    }
}
