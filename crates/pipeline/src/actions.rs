//! Turning Hide/Block decisions into side effects.
//!
//! `decide` is synchronous and must stay cheap, so the [`ActionDispatcher`]
//! only de-duplicates and queues. A single [`ActionWorker`] drains the queue
//! in order: it logs an [`Activity`] for every action and performs the block
//! request for Block, one request at a time.

use crate::traits::{ActionHandler, FilterAction};
use anyhow::{Context, Result};
use batch::{Controller, ErrorClass, block_user, classify};
use entities::{BlockApi, FilterData, Persistence, Record, Signer, User, UserRecord, now_millis};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

// =============================================================================
// Activity log
// =============================================================================

/// One moderation action, as kept in the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub action: FilterAction,
    /// Name of the rule that decided
    pub rule: String,
    /// `tweet` or `user`
    pub target_kind: String,
    pub target_id: String,
    pub user: User,
    pub created_at: i64,
}

impl Activity {
    pub fn new(event: &ActionEvent) -> Self {
        let created_at = now_millis();
        Self {
            id: format!("{}:{}:{}", event.action, event.data.kind(), event.data.id()),
            action: event.action,
            rule: event.rule.clone(),
            target_kind: event.data.kind().to_string(),
            target_id: event.data.id().to_string(),
            user: event.data.user().clone(),
            created_at,
        }
    }
}

impl Record for Activity {
    fn id(&self) -> &str {
        &self.id
    }

    fn recency(&self) -> i64 {
        self.created_at
    }
}

// =============================================================================
// De-duplication window
// =============================================================================

/// Bounded memory of recently seen keys.
///
/// A key is "recent" for `ttl` after it was last admitted. At most
/// `capacity` keys are remembered; the oldest are forgotten first.
pub struct RecentWindow {
    capacity: usize,
    ttl: Duration,
    order: VecDeque<(String, Instant)>,
    seen: HashMap<String, Instant>,
}

impl RecentWindow {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            order: VecDeque::new(),
            seen: HashMap::new(),
        }
    }

    /// Returns `true` and remembers `key` if it was not seen recently.
    pub fn admit(&mut self, key: &str) -> bool {
        self.admit_at(key, Instant::now())
    }

    fn admit_at(&mut self, key: &str, now: Instant) -> bool {
        self.expire(now);
        if self.seen.contains_key(key) {
            return false;
        }

        self.seen.insert(key.to_string(), now);
        self.order.push_back((key.to_string(), now));
        while self.seen.len() > self.capacity {
            self.pop_oldest();
        }
        true
    }

    /// Drop `key` so it is admitted again.
    pub fn forget(&mut self, key: &str) {
        if self.seen.remove(key).is_some() {
            self.order.retain(|(k, _)| k != key);
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn expire(&mut self, now: Instant) {
        while let Some((_, at)) = self.order.front() {
            if now.saturating_duration_since(*at) <= self.ttl {
                break;
            }
            self.pop_oldest();
        }
    }

    fn pop_oldest(&mut self) {
        if let Some((key, at)) = self.order.pop_front() {
            if self.seen.get(&key) == Some(&at) {
                self.seen.remove(&key);
            }
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// A queued action.
#[derive(Debug, Clone)]
pub struct ActionEvent {
    pub data: FilterData,
    pub action: FilterAction,
    pub rule: String,
}

/// [`ActionHandler`] that de-duplicates and queues actions for the worker.
///
/// De-duplication is per user: once any action was queued for a user, later
/// decisions about that user inside the window are not queued again. An
/// action dropped on a full or closed queue does not count.
pub struct ActionDispatcher {
    window: Mutex<RecentWindow>,
    sender: mpsc::Sender<ActionEvent>,
}

impl ActionDispatcher {
    /// Create a dispatcher and the receiving end for its worker.
    pub fn channel(
        window: RecentWindow,
        queue_size: usize,
    ) -> (Self, mpsc::Receiver<ActionEvent>) {
        let (sender, receiver) = mpsc::channel(queue_size.max(1));
        let dispatcher = Self {
            window: Mutex::new(window),
            sender,
        };
        (dispatcher, receiver)
    }
}

impl ActionHandler for ActionDispatcher {
    fn on_action(&self, data: &FilterData, action: FilterAction, rule: &str) {
        let user_id = &data.user().id;
        // Lock held across try_send: a key stays only if its event was queued
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        if !window.admit(user_id) {
            debug!("Skipping {} for user {}: seen recently", action, user_id);
            return;
        }

        let event = ActionEvent {
            data: data.clone(),
            action,
            rule: rule.to_string(),
        };
        match self.sender.try_send(event) {
            Ok(()) => debug!("Queued {} for user {} ({})", action, user_id, rule),
            Err(mpsc::error::TrySendError::Full(_)) => {
                window.forget(user_id);
                warn!("Action queue full, dropping {} for user {}", action, user_id);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                window.forget(user_id);
                warn!("Action worker stopped, dropping {} for user {}", action, user_id);
            }
        }
    }
}

// =============================================================================
// Worker
// =============================================================================

/// What a worker did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub processed: usize,
    pub blocked: usize,
    pub failed: usize,
}

/// Sequential consumer of the action queue.
///
/// ## Algorithm
/// For each event, in queue order:
/// 1. For Block: sign, call [`BlockApi`], then store the user with `blocking = true`
/// 2. Append an [`Activity`] to the activity store, only once step 1 succeeded
/// 3. Wait `delay` before taking the next event
///
/// Failures are logged and counted; they never stop the worker. It stops
/// when every dispatcher is dropped or the controller is aborted.
pub struct ActionWorker {
    receiver: mpsc::Receiver<ActionEvent>,
    api: Arc<dyn BlockApi>,
    signer: Arc<dyn Signer>,
    users: Arc<dyn Persistence<UserRecord>>,
    activities: Arc<dyn Persistence<Activity>>,
    controller: Controller,
    delay: Duration,
}

impl ActionWorker {
    pub fn new(
        receiver: mpsc::Receiver<ActionEvent>,
        api: Arc<dyn BlockApi>,
        signer: Arc<dyn Signer>,
        users: Arc<dyn Persistence<UserRecord>>,
        activities: Arc<dyn Persistence<Activity>>,
        controller: Controller,
    ) -> Self {
        Self {
            receiver,
            api,
            signer,
            users,
            activities,
            controller,
            delay: Duration::ZERO,
        }
    }

    /// Minimum pause between two events.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn run(mut self) -> WorkerStats {
        let mut stats = WorkerStats::default();
        info!("Action worker started");

        loop {
            let event = tokio::select! {
                () = self.controller.aborted() => break,
                event = self.receiver.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            stats.processed += 1;
            match self.handle(&event).await {
                Ok(true) => stats.blocked += 1,
                Ok(false) => {}
                Err(err) => {
                    stats.failed += 1;
                    match classify(&err) {
                        ErrorClass::Expected(code) => error!(
                            "Action {} for user {} failed ({}): {:#}",
                            event.action,
                            event.data.user().id,
                            code.as_str(),
                            err
                        ),
                        ErrorClass::Unexpected => error!(
                            "Action {} for user {} failed: {:#}",
                            event.action,
                            event.data.user().id,
                            err
                        ),
                    }
                }
            }

            if !self.delay.is_zero() && !self.controller.sleep(self.delay).await {
                break;
            }
        }

        info!(
            "Action worker stopped: {} processed, {} blocked, {} failed",
            stats.processed, stats.blocked, stats.failed
        );
        stats
    }

    /// Returns whether a block request was made and succeeded.
    async fn handle(&self, event: &ActionEvent) -> Result<bool> {
        let blocked = match event.action {
            FilterAction::Block => self.block(event).await?,
            FilterAction::Hide => false,
        };

        self.activities
            .record(vec![Activity::new(event)])
            .await
            .context("Failed to record activity")?;
        Ok(blocked)
    }

    async fn block(&self, event: &ActionEvent) -> Result<bool> {
        let user = event.data.user();
        if user.blocking {
            debug!("User {} is already blocked", user.id);
            return Ok(false);
        }

        block_user(self.api.as_ref(), self.signer.as_ref(), user).await?;

        let mut blocked = user.clone();
        blocked.blocking = true;
        self.users
            .record(vec![UserRecord::now(blocked)])
            .await
            .context("Failed to record blocked user")?;

        info!("Blocked @{} ({}) by rule {}", user.screen_name, user.id, event.rule);
        Ok(true)
    }
}
