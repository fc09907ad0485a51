//! # Entities Crate
//!
//! Recovers structured entities from the social network's API payloads and
//! defines the capabilities the rest of the workspace consumes.
//!
//! ## Main Components
//!
//! - **extract**: shape-based subtree search over arbitrary JSON
//! - **parser**: thin user/tweet parsers built on `extract`
//! - **types**: `User`, `Tweet`, `FilterData`
//! - **api**: request signing and block transport contracts
//! - **store**: persistence contract plus an in-memory store
//! - **error**: error types for entity parsing
//!
//! ## Example Usage
//!
//! ```ignore
//! use entities::{extract_objects, parser};
//!
//! let payload: serde_json::Value = serde_json::from_str(&body)?;
//!
//! // Every user object, wherever the endpoint happened to nest it
//! let users = parser::parse_users(&payload);
//!
//! // Or search for any custom shape
//! let cursors = extract_objects(&payload, |v| v.get("cursorType").is_some());
//! ```

// Public modules
pub mod api;
pub mod error;
pub mod extract;
pub mod parser;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use api::{BlockApi, Signer, StaticSigner};
pub use error::{EntityError, Result};
pub use extract::{Match, PathSegment, extract, extract_objects, try_extract};
pub use parser::{parse_entities, parse_payloads, parse_tweets, parse_users};
pub use store::{MemoryStore, Page, PageQuery, Persistence, Record, UserRecord};
pub use types::{FilterData, Media, MediaKind, Tweet, TweetId, User, UserId, now_millis};
