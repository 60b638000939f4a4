//! Operator-maintained allow-list of base mints

use arc_swap::ArcSwap;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Parse newline-delimited mints. Invalid lines are returned separately.
pub fn parse_snipe_list(content: &str) -> (HashSet<Pubkey>, Vec<String>) {
    let mut mints = HashSet::new();
    let mut invalid = Vec::new();

    for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match Pubkey::from_str(line) {
            Ok(mint) => {
                mints.insert(mint);
            }
            Err(_) => invalid.push(line.to_string()),
        }
    }

    (mints, invalid)
}

/// Current snipe list. Readers get a consistent snapshot, reloads swap it whole.
#[derive(Default)]
pub struct SnipeList {
    mints: ArcSwap<HashSet<Pubkey>>,
}

impl SnipeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mints(mints: HashSet<Pubkey>) -> Self {
        Self {
            mints: ArcSwap::from_pointee(mints),
        }
    }

    pub fn snapshot(&self) -> Arc<HashSet<Pubkey>> {
        self.mints.load_full()
    }

    pub fn contains(&self, mint: &Pubkey) -> bool {
        self.mints.load().contains(mint)
    }

    pub fn len(&self) -> usize {
        self.mints.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mints.load().is_empty()
    }

    pub fn replace(&self, mints: HashSet<Pubkey>) {
        self.mints.store(Arc::new(mints));
    }

    /// Re-read `path`. A failed read keeps the previous list.
    pub async fn reload(&self, path: &Path) -> bool {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read snipe list {}: {}", path.display(), e);
                return false;
            }
        };

        let (mints, invalid) = parse_snipe_list(&content);
        for line in &invalid {
            warn!("Skipping invalid mint in snipe list: {}", line);
        }

        let previous = self.len();
        let count = mints.len();
        self.replace(mints);
        if count != previous {
            info!("🎯 Loaded snipe list: {} mints", count);
        }
        true
    }
}

/// Periodically reloads a [`SnipeList`] from disk
pub struct SnipeListRefresher {
    list: Arc<SnipeList>,
    path: PathBuf,
    interval: Duration,
}

impl SnipeListRefresher {
    pub fn new(list: Arc<SnipeList>, path: PathBuf, interval: Duration) -> Self {
        Self {
            list,
            path,
            interval,
        }
    }

    /// Reload forever. The first tick fires immediately.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            self.list.reload(&self.path).await;
        }
    }
}
