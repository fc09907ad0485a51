//! File-backed stand-ins for the capabilities the host application provides.
//!
//! Captured API responses replace the network, a JSON file replaces the
//! list service, and block requests are only logged.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use batch::{Paginator, SharedItems};
use entities::{parse_users, BlockApi, User};
use pipeline::{Snapshot, SnapshotSource};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Serves captured response files (`*.json`, name order) as pages.
///
/// Every user found in a page is appended once to the shared list. A file
/// that fails to read or parse is reported and skipped, not retried.
pub struct DirectoryPager {
    files: Vec<PathBuf>,
    next: usize,
    users: SharedItems<User>,
    seen: HashSet<String>,
}

impl DirectoryPager {
    pub fn open(dir: &Path, users: SharedItems<User>) -> Result<Self> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        debug!("Found {} page files in {}", files.len(), dir.display());

        Ok(Self {
            files,
            next: 0,
            users,
            seen: HashSet::new(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.files.len()
    }
}

#[async_trait]
impl Paginator for DirectoryPager {
    fn has_next(&self) -> bool {
        self.next < self.files.len()
    }

    async fn fetch_next_page(&mut self) -> Result<()> {
        let Some(path) = self.files.get(self.next).cloned() else {
            bail!("No more pages");
        };
        self.next += 1;

        let body = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let payload: serde_json::Value = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let fresh: Vec<User> = parse_users(&payload)
            .into_iter()
            .filter(|user| self.seen.insert(user.id.clone()))
            .collect();
        debug!("{}: {} new users", path.display(), fresh.len());
        self.users.extend(fresh);
        Ok(())
    }
}

/// Logs block requests instead of sending them.
pub struct DryRunBlockApi;

#[async_trait]
impl BlockApi for DryRunBlockApi {
    async fn block(&self, user: &User, _token: &str) -> Result<()> {
        let (method, path) = self.endpoint();
        info!("[dry-run] {} {} user_id={} (@{})", method, path, user.id, user.screen_name);
        Ok(())
    }
}

/// Reads a [`Snapshot`] from a JSON file on every refresh.
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn load(&self) -> Result<Snapshot> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&body).with_context(|| format!("Failed to parse {}", self.path.display()))
    }
}

/// Parse a list of accounts, one per line: `<id> [screen_name]`.
///
/// Blank lines and lines starting with `#` are ignored.
pub fn parse_user_list(text: &str) -> Result<Vec<User>> {
    let mut users = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let id = fields.next().unwrap_or_default();
        if !id.chars().all(|c| c.is_ascii_digit()) {
            bail!("Line {}: invalid user id {:?}", number + 1, id);
        }
        let screen_name = fields.next().unwrap_or(id);
        users.push(User::new(id, screen_name));
    }
    Ok(users)
}
