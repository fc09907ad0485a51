//! # Batch Crate
//!
//! Runs long bulk jobs (mass block, export) one unit at a time, with a
//! middleware chain after every unit that decides whether to go on.
//!
//! ## Main Components
//!
//! - **executor**: item-driven runs over a list that may grow mid-run
//! - **query**: page-driven runs over a [`Paginator`]
//! - **compose**: onion-style middleware chain
//! - **handlers**: error surfacing, request gate, progress, pacing
//! - **controller**: cooperative cancellation
//! - **progress**: processed/total/ETA snapshots
//! - **error**: expected API failures and their classification
//!
//! ## Example Usage
//!
//! ```ignore
//! use batch::{BatchExecutor, Compose, Controller, Pacing, SharedItems, SurfaceErrors};
//!
//! let chain = Compose::new()
//!     .with(SurfaceErrors::new(notifier.clone()))
//!     .with(Pacing::new(Duration::from_millis(500)));
//!
//! let result = BatchExecutor::new(Controller::new())
//!     .run(&SharedItems::from(users), |user| block(user), &chain)
//!     .await?;
//! ```

pub mod compose;
pub mod context;
pub mod controller;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod items;
pub mod jobs;
pub mod notify;
pub mod progress;
pub mod query;

pub use compose::{Compose, Middleware, Next};
pub use context::BatchContext;
pub use controller::Controller;
pub use error::{ApiError, ErrorClass, ErrorCode, classify};
pub use executor::{BatchExecutor, BatchResult, ExecutionContext};
pub use handlers::{MaxRequestGate, Pacing, ProgressReporter, SurfaceErrors};
pub use items::SharedItems;
pub use jobs::{StorePager, block_user};
pub use notify::{Confirm, Notifier, TracingNotifier};
pub use progress::Progress;
pub use query::{BatchQuery, Paginator, QueryContext, QueryResult};
