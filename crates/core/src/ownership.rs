use crate::error::StoreError;
use sqlx::SqlitePool;
use std::collections::BTreeSet;

/// Maps a storage root to the users that can see it.
#[async_trait::async_trait]
pub trait OwnershipResolver: Send + Sync {
    async fn users_for_root(&self, root_id: i64) -> Result<BTreeSet<String>, StoreError>;
}

/// Resolves users through the `mounts` table. A user mounting the same root
/// twice is reported once.
pub struct MountOwnership {
    pool: SqlitePool,
}

impl MountOwnership {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OwnershipResolver for MountOwnership {
    async fn users_for_root(&self, root_id: i64) -> Result<BTreeSet<String>, StoreError> {
        let mounts = storage::mounts::for_root(&self.pool, root_id).await?;
        Ok(mounts.into_iter().map(|m| m.user_id).collect())
    }
}
