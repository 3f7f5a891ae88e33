//! Requests for downstream background jobs.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    ClusterFaces,
}

impl JobKind {
    pub fn class(self) -> &'static str {
        match self {
            JobKind::ClusterFaces => "cluster_faces",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserArgument {
    user_id: String,
}

pub fn user_argument(user_id: &str) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&UserArgument {
        user_id: user_id.to_string(),
    })?)
}

/// The user a stored job argument refers to, if it is a user argument.
pub fn argument_user(argument: &str) -> Option<String> {
    serde_json::from_str::<UserArgument>(argument)
        .ok()
        .map(|arg| arg.user_id)
}

#[async_trait::async_trait]
pub trait JobScheduler: Send + Sync {
    async fn exists(&self, kind: JobKind, user_id: &str) -> Result<bool, StoreError>;
    async fn enqueue(&self, kind: JobKind, user_id: &str) -> Result<(), StoreError>;
}

pub struct SqliteJobList {
    pool: SqlitePool,
}

impl SqliteJobList {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl JobScheduler for SqliteJobList {
    async fn exists(&self, kind: JobKind, user_id: &str) -> Result<bool, StoreError> {
        Ok(storage::jobs::has(&self.pool, kind.class(), &user_argument(user_id)?).await?)
    }

    async fn enqueue(&self, kind: JobKind, user_id: &str) -> Result<(), StoreError> {
        let added_at = chrono::Utc::now().timestamp();
        storage::jobs::add(&self.pool, kind.class(), &user_argument(user_id)?, added_at).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_argument_reads_back() {
        let arg = user_argument("alice").unwrap();
        assert_eq!(arg, r#"{"userId":"alice"}"#);
        assert_eq!(argument_user(&arg).as_deref(), Some("alice"));
        assert_eq!(argument_user("[]"), None);
    }
}
