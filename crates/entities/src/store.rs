//! Local persistence contract and an in-memory implementation.
//!
//! The real storage engine belongs to the host application. The core only
//! needs lookup by id, recency-ordered paging and bulk upsert.

use crate::types::{User, now_millis};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Anything that can be stored: it has an id and a recency key.
pub trait Record: Clone + Send + Sync {
    fn id(&self) -> &str;

    /// Larger is more recent. Pages are ordered by this, descending.
    fn recency(&self) -> i64;
}

/// A page request. `cursor` is whatever the previous page returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub limit: usize,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<E> {
    pub items: Vec<E>,
    /// `None` once the last page has been returned
    pub next_cursor: Option<String>,
}

#[async_trait]
pub trait Persistence<E: Record>: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<E>>;

    async fn get_by_page(&self, query: PageQuery) -> Result<Page<E>>;

    /// Insert or replace by id.
    async fn record(&self, entities: Vec<E>) -> Result<()>;
}

/// A stored user, stamped with when it was last written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user: User,
    pub updated_at: i64,
}

impl UserRecord {
    pub fn now(user: User) -> Self {
        Self {
            user,
            updated_at: now_millis(),
        }
    }
}

impl Record for UserRecord {
    fn id(&self) -> &str {
        &self.user.id
    }

    fn recency(&self) -> i64 {
        self.updated_at
    }
}

/// Process-local store keyed by id.
///
/// Ties in recency are broken by insertion order (newest first), which keeps
/// paging stable when many records share a timestamp.
pub struct MemoryStore<E> {
    inner: Mutex<Inner<E>>,
}

struct Inner<E> {
    records: HashMap<String, (u64, E)>,
    sequence: u64,
}

impl<E: Record> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: HashMap::new(),
                sequence: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<E>> {
        // a poisoned map is still structurally valid
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Record> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Record + 'static> Persistence<E> for MemoryStore<E> {
    async fn get(&self, id: &str) -> Result<Option<E>> {
        Ok(self.lock().records.get(id).map(|(_, e)| e.clone()))
    }

    /// The cursor is the `(recency, sequence)` key of the last item served,
    /// so writes between pages never shift records that are still to come.
    /// Records written after the scan started sort ahead of the cursor and
    /// are not part of it.
    async fn get_by_page(&self, query: PageQuery) -> Result<Page<E>> {
        let after = query.cursor.as_deref().map(parse_cursor).transpose()?;

        let inner = self.lock();
        let mut entries: Vec<(i64, u64, &E)> = inner
            .records
            .values()
            .map(|(sequence, e)| (e.recency(), *sequence, e))
            .filter(|(recency, sequence, _)| after.is_none_or(|key| (*recency, *sequence) < key))
            .collect();
        entries.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));

        let has_more = entries.len() > query.limit;
        entries.truncate(query.limit);
        let next_cursor = if has_more {
            entries
                .last()
                .map(|(recency, sequence, _)| format!("{}:{}", recency, sequence))
        } else {
            None
        };
        let items = entries.into_iter().map(|(_, _, e)| e.clone()).collect();

        Ok(Page { items, next_cursor })
    }

    async fn record(&self, entities: Vec<E>) -> Result<()> {
        let mut inner = self.lock();
        for entity in entities {
            inner.sequence += 1;
            let sequence = inner.sequence;
            inner
                .records
                .insert(entity.id().to_string(), (sequence, entity));
        }
        Ok(())
    }
}

fn parse_cursor(cursor: &str) -> Result<(i64, u64)> {
    cursor
        .split_once(':')
        .and_then(|(recency, sequence)| Some((recency.parse().ok()?, sequence.parse().ok()?)))
        .ok_or_else(|| anyhow!("Invalid page cursor: {}", cursor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, at: i64) -> UserRecord {
        UserRecord {
            user: User::new(id, format!("user{}", id)),
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_record_and_get() {
        let store = MemoryStore::new();
        store.record(vec![record("1", 10)]).await.unwrap();

        let found = store.get("1").await.unwrap().unwrap();
        assert_eq!(found.user.screen_name, "user1");
        assert!(store.get("2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_upserts() {
        let store = MemoryStore::new();
        store.record(vec![record("1", 10)]).await.unwrap();

        let mut updated = record("1", 20);
        updated.user.blocking = true;
        store.record(vec![updated]).await.unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.get("1").await.unwrap().unwrap().user.blocking);
    }

    #[tokio::test]
    async fn test_paging_by_recency() {
        let store = MemoryStore::new();
        store
            .record(vec![record("a", 1), record("b", 3), record("c", 2)])
            .await
            .unwrap();

        let first = store
            .get_by_page(PageQuery { limit: 2, cursor: None })
            .await
            .unwrap();
        let ids: Vec<_> = first.items.iter().map(|r| r.user.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(first.next_cursor.is_some());

        let second = store
            .get_by_page(PageQuery { limit: 2, cursor: first.next_cursor })
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].user.id, "a");
        assert_eq!(second.next_cursor, None);
    }

    #[tokio::test]
    async fn test_writes_between_pages_do_not_shift_the_scan() {
        let store = MemoryStore::new();
        store
            .record(vec![record("a", 4), record("b", 3), record("c", 2), record("d", 1)])
            .await
            .unwrap();

        let first = store
            .get_by_page(PageQuery { limit: 2, cursor: None })
            .await
            .unwrap();
        // a newer record lands mid-scan
        store.record(vec![record("e", 9)]).await.unwrap();

        let second = store
            .get_by_page(PageQuery { limit: 2, cursor: first.next_cursor })
            .await
            .unwrap();
        let ids: Vec<_> = first
            .items
            .iter()
            .chain(&second.items)
            .map(|r| r.user.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(second.next_cursor, None);
    }

    #[tokio::test]
    async fn test_invalid_cursor() {
        let store: MemoryStore<UserRecord> = MemoryStore::new();
        let result = store
            .get_by_page(PageQuery { limit: 1, cursor: Some("nope".to_string()) })
            .await;
        assert!(result.is_err());
    }
}
