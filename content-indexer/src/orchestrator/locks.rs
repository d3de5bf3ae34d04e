//! Per-site index locks.
//!
//! Index lifecycle operations hold a site's lock exclusively; indexing
//! attempts hold it shared, so attempts never run against an index that is
//! being dropped or rebuilt.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

#[derive(Debug, Default)]
pub struct SiteLocks {
    locks: Mutex<HashMap<u64, Arc<RwLock<()>>>>,
}

impl SiteLocks {
    fn lock_for(&self, site_id: u64) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(site_id).or_default().clone()
    }

    pub async fn shared(&self, site_id: u64) -> OwnedRwLockReadGuard<()> {
        self.lock_for(site_id).read_owned().await
    }

    pub async fn exclusive(&self, site_id: u64) -> OwnedRwLockWriteGuard<()> {
        self.lock_for(site_id).write_owned().await
    }
}
