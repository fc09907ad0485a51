//! Building blocks for the concrete bulk jobs: paging through local storage
//! and issuing one signed block request.

use crate::items::SharedItems;
use crate::query::Paginator;
use anyhow::{Context, Result};
use async_trait::async_trait;
use entities::{BlockApi, PageQuery, Persistence, Record, Signer, User};
use std::sync::Arc;
use tracing::debug;

/// Walks a [`Persistence`] store page by page, most recent first.
pub struct StorePager<E: Record> {
    store: Arc<dyn Persistence<E>>,
    items: SharedItems<E>,
    page_size: usize,
    cursor: Option<String>,
    exhausted: bool,
}

impl<E: Record + 'static> StorePager<E> {
    /// Fetched records are appended to `items`.
    pub fn new(store: Arc<dyn Persistence<E>>, items: SharedItems<E>, page_size: usize) -> Self {
        Self {
            store,
            items,
            page_size: page_size.max(1),
            cursor: None,
            exhausted: false,
        }
    }
}

#[async_trait]
impl<E: Record + 'static> Paginator for StorePager<E> {
    fn has_next(&self) -> bool {
        !self.exhausted
    }

    async fn fetch_next_page(&mut self) -> Result<()> {
        let page = self
            .store
            .get_by_page(PageQuery {
                limit: self.page_size,
                cursor: self.cursor.clone(),
            })
            .await
            .context("Failed to read page from store")?;

        debug!("Store page: {} records", page.items.len());
        self.items.extend(page.items);
        self.exhausted = page.next_cursor.is_none();
        self.cursor = page.next_cursor;
        Ok(())
    }
}

/// Sign the block endpoint and block `user`.
pub async fn block_user(api: &dyn BlockApi, signer: &dyn Signer, user: &User) -> Result<()> {
    let (method, path) = api.endpoint();
    let token = signer
        .sign(method, path)
        .with_context(|| format!("Failed to sign {} {}", method, path))?;
    api.block(user, &token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities::{MemoryStore, StaticSigner, UserRecord};
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_store_pager_reads_everything() {
        let store = Arc::new(MemoryStore::<UserRecord>::new());
        let records = (0..5)
            .map(|i| UserRecord {
                user: User::new(i.to_string(), format!("user{}", i)),
                updated_at: i,
            })
            .collect();
        store.record(records).await.unwrap();

        let items = SharedItems::new();
        let mut pager = StorePager::new(store, items.clone(), 2);
        let mut pages = 0;
        while pager.has_next() {
            pager.fetch_next_page().await.unwrap();
            pages += 1;
        }

        assert_eq!(pages, 3);
        let ids: Vec<_> = items.snapshot().iter().map(|r| r.user.id.clone()).collect();
        assert_eq!(ids, vec!["4", "3", "2", "1", "0"]);
    }

    #[tokio::test]
    async fn test_store_pager_empty_store() {
        let store = Arc::new(MemoryStore::<UserRecord>::new());
        let items = SharedItems::new();
        let mut pager = StorePager::new(store, items.clone(), 10);

        pager.fetch_next_page().await.unwrap();
        assert!(!pager.has_next());
        assert!(items.is_empty());
    }

    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl BlockApi for RecordingApi {
        async fn block(&self, user: &User, token: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((user.id.clone(), token.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_block_user_signs_request() {
        let api = RecordingApi::default();
        let signer = StaticSigner::new("token-1");

        block_user(&api, &signer, &User::new("42", "spammer"))
            .await
            .unwrap();

        assert_eq!(
            *api.calls.lock().unwrap(),
            vec![("42".to_string(), "token-1".to_string())]
        );
    }
}
