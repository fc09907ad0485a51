//! What handlers can see of an iteration, whichever engine produced it.

use crate::controller::Controller;
use crate::progress::Progress;

/// Common view over per-iteration contexts.
///
/// The standard handlers are written against this so one chain type works
/// for both item-driven and page-driven runs.
pub trait BatchContext: Send + 'static {
    /// The error raised by this iteration's unit of work, if any.
    fn error(&self) -> Option<&anyhow::Error>;

    fn progress(&self) -> &Progress;

    fn controller(&self) -> &Controller;

    /// Whether the engine will run another iteration after this one,
    /// barring an abort.
    fn has_more(&self) -> bool;

    /// Short description of the unit of work, for messages.
    fn describe(&self) -> String;
}
