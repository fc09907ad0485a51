//! Moderation pipeline: ordered rules deciding whether to show, hide or block.
//!
//! This crate provides:
//! - The `Rule` trait and the concrete rules in [`filters`]
//! - `FilterPipeline` for ordered, short-circuiting evaluation
//! - `FilterContext` holding refreshable spam/modlist snapshots
//! - `ActionDispatcher`/`ActionWorker` turning decisions into block requests
//! - `PipelineConfig` for building pipelines from JSON
//!
//! ## Architecture
//! Entities flow through in stages:
//! 1. Parsers recover users and tweets from a raw payload
//! 2. The pipeline decides each one; the first decisive rule wins
//! 3. Hide/Block decisions are queued and processed by a single worker
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterPipeline, FilterContext};
//! use pipeline::filters::*;
//!
//! let context = Arc::new(FilterContext::new(Duration::from_secs(600)));
//! let (dispatcher, receiver) = ActionDispatcher::channel(RecentWindow::new(1000, ttl), 256);
//!
//! let pipeline = FilterPipeline::new()
//!     .add_rule(TrustedRule::with_context(context.clone()))
//!     .add_rule(AlreadyBlockedRule)
//!     .add_rule(SpamRule::new(context.clone(), FilterAction::Block))
//!     .on_action(dispatcher);
//!
//! for (data, decision) in pipeline.decide_payload(&payload) {
//!     // ...
//! }
//! ```

pub mod actions;
pub mod config;
pub mod context;
pub mod error;
pub mod filter_pipeline;
pub mod filters;
pub mod traits;

// Re-export main types
pub use actions::{ActionDispatcher, ActionEvent, ActionWorker, Activity, RecentWindow, WorkerStats};
pub use config::{PipelineConfig, RuleConfig};
pub use context::{FilterContext, Snapshot, SnapshotSource};
pub use error::{PipelineError, Result};
pub use filter_pipeline::FilterPipeline;
pub use traits::{ActionHandler, Decision, FilterAction, FilterResult, FnRule, Rule};
