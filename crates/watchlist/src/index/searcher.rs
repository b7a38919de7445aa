use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::snapshot::IndexSnapshot;

/// Owns the snapshot currently being served.
///
/// Readers load a cloned `Arc` without taking a lock, so a query that started before a
/// swap finishes against the snapshot it started with and never waits on a refresh.
#[derive(Debug)]
pub struct Searcher {
    current: ArcSwap<IndexSnapshot>,
    refreshing: Arc<AtomicBool>,
}

impl Searcher {
    pub fn new(snapshot: IndexSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
            refreshing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn current_snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.load_full()
    }

    /// Swaps in `snapshot` and hands back the one it replaced.
    pub fn replace(&self, snapshot: IndexSnapshot) -> Arc<IndexSnapshot> {
        self.current.swap(Arc::new(snapshot))
    }

    /// Claims the single refresh slot, or `None` while another refresh holds it.
    pub fn try_begin_refresh(&self) -> Option<RefreshGuard> {
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard {
                flag: Arc::clone(&self.refreshing),
            })
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new(IndexSnapshot::empty())
    }
}

/// Releases the refresh slot when dropped.
#[derive(Debug)]
pub struct RefreshGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
