//! Shared moderation state consulted by rules.
//!
//! Rules that depend on lists (spam accounts, subscribed moderation lists,
//! allow-lists) read a point-in-time [`Snapshot`] held by a [`FilterContext`].
//! The context is created once, injected into each rule, and refreshed
//! explicitly; a decision always sees one whole snapshot, never a mix.

use crate::traits::FilterAction;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use entities::UserId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Lists rules consult, as of one refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Accounts known to be spam
    pub spam_users: HashSet<UserId>,
    /// Accounts on subscribed moderation lists, with the list's action
    pub modlist: HashMap<UserId, FilterAction>,
    /// Accounts the viewer explicitly trusts
    pub trusted: HashSet<UserId>,
}

impl Snapshot {
    pub fn is_spam(&self, id: &str) -> bool {
        self.spam_users.contains(id)
    }

    pub fn modlist_action(&self, id: &str) -> Option<FilterAction> {
        self.modlist.get(id).copied()
    }

    pub fn is_trusted(&self, id: &str) -> bool {
        self.trusted.contains(id)
    }
}

/// Where fresh snapshots come from (local store, remote list service, file).
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn load(&self) -> Result<Snapshot>;
}

#[async_trait]
impl SnapshotSource for Snapshot {
    async fn load(&self) -> Result<Snapshot> {
        Ok(self.clone())
    }
}

struct State {
    snapshot: Arc<Snapshot>,
    refreshed_at: Option<Instant>,
}

/// Holder of the current [`Snapshot`].
///
/// ## Staleness
/// `max_age` is how long a snapshot is considered current. Rules keep using
/// a stale snapshot; it is up to the owner to call [`FilterContext::refresh`]
/// when [`FilterContext::is_stale`] says so.
pub struct FilterContext {
    state: RwLock<State>,
    max_age: Duration,
}

impl FilterContext {
    /// Empty context; stale until the first refresh.
    pub fn new(max_age: Duration) -> Self {
        Self {
            state: RwLock::new(State {
                snapshot: Arc::new(Snapshot::default()),
                refreshed_at: None,
            }),
            max_age,
        }
    }

    pub fn with_snapshot(snapshot: Snapshot, max_age: Duration) -> Self {
        let context = Self::new(max_age);
        context.replace(snapshot);
        context
    }

    /// The snapshot current at call time.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    /// Swap in a new snapshot and restart the staleness clock.
    pub fn replace(&self, snapshot: Snapshot) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.snapshot = Arc::new(snapshot);
        state.refreshed_at = Some(Instant::now());
    }

    /// Load from `source` and swap it in.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self, source: &dyn SnapshotSource) -> Result<()> {
        let snapshot = match source.load().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("Filter context refresh failed, keeping previous snapshot: {:#}", err);
                return Err(err).context("Failed to refresh filter context");
            }
        };

        info!(
            "Filter context refreshed: {} spam, {} modlist, {} trusted",
            snapshot.spam_users.len(),
            snapshot.modlist.len(),
            snapshot.trusted.len()
        );
        self.replace(snapshot);
        Ok(())
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Time since the last refresh, `None` if never refreshed.
    pub fn age(&self) -> Option<Duration> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .refreshed_at
            .map(|at| at.elapsed())
    }

    pub fn is_stale(&self) -> bool {
        self.age().is_none_or(|age| age > self.max_age)
    }
}
