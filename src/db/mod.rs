use crate::models::{Gift, GiftFilter, User};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("could not read seed file: {0}")]
    SeedIo(#[from] std::io::Error),
    #[error("invalid seed file: {0}")]
    SeedFormat(#[from] serde_json::Error),
}

/// Persistence for users and gifts.
///
/// Emails are passed in already normalized; implementations compare them
/// verbatim.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Inserts the user and returns it with its assigned id. Fails with
    /// `DuplicateKey` if the email is taken.
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;

    async fn list_gifts(&self) -> Result<Vec<Gift>, StoreError>;

    async fn find_gift(&self, id: &str) -> Result<Option<Gift>, StoreError>;

    async fn search_gifts(&self, filter: &GiftFilter) -> Result<Vec<Gift>, StoreError>;

    async fn count_gifts(&self) -> Result<u64, StoreError>;

    async fn insert_gifts(&self, gifts: Vec<Gift>) -> Result<usize, StoreError>;
}

/// Loads gifts from a JSON array file if the store has none yet.
/// Returns how many were inserted.
pub async fn seed_gifts(store: &dyn Store, path: &Path) -> Result<usize, StoreError> {
    let existing = store.count_gifts().await?;
    if existing > 0 {
        tracing::info!("Gift collection already has {} documents, skipping seed", existing);
        return Ok(0);
    }

    let raw = tokio::fs::read(path).await?;
    let gifts: Vec<Gift> = serde_json::from_slice(&raw)?;
    if gifts.is_empty() {
        return Ok(0);
    }
    let inserted = store.insert_gifts(gifts).await?;
    tracing::info!("Seeded {} gifts from {}", inserted, path.display());
    Ok(inserted)
}
