use super::{Store, StoreError};
use crate::models::{Gift, GiftFilter, User};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-local store, keyed by normalized email. Used in tests and when no
/// `MONGO_URL` is configured.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<Mutex<HashMap<String, User>>>,
    gifts: Arc<Mutex<Vec<Gift>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gifts(gifts: Vec<Gift>) -> Self {
        Self {
            users: Arc::default(),
            gifts: Arc::new(Mutex::new(gifts.into_iter().map(with_object_id).collect())),
        }
    }

    pub async fn user_count(&self) -> usize {
        self.users.lock().await.len()
    }
}

/// Mirrors Mongo assigning `_id` on insert.
fn with_object_id(mut gift: Gift) -> Gift {
    gift.object_id.get_or_insert_with(ObjectId::new);
    gift
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.get(email).cloned())
    }

    async fn insert_user(&self, mut user: User) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.email) {
            return Err(StoreError::DuplicateKey(user.email));
        }
        user.id = Some(ObjectId::new());
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn list_gifts(&self) -> Result<Vec<Gift>, StoreError> {
        Ok(self.gifts.lock().await.clone())
    }

    async fn find_gift(&self, id: &str) -> Result<Option<Gift>, StoreError> {
        Ok(self.gifts.lock().await.iter().find(|g| g.has_key(id)).cloned())
    }

    async fn search_gifts(&self, filter: &GiftFilter) -> Result<Vec<Gift>, StoreError> {
        let gifts = self.gifts.lock().await;
        Ok(gifts.iter().filter(|g| filter.matches(g)).cloned().collect())
    }

    async fn count_gifts(&self) -> Result<u64, StoreError> {
        Ok(self.gifts.lock().await.len() as u64)
    }

    async fn insert_gifts(&self, gifts: Vec<Gift>) -> Result<usize, StoreError> {
        let count = gifts.len();
        self.gifts
            .lock()
            .await
            .extend(gifts.into_iter().map(with_object_id));
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    fn user(email: &str) -> User {
        User {
            id: None,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: email.into(),
            password: "hash".into(),
            created_at: bson::DateTime::now(),
            updated_at: bson::DateTime::now(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let created = store.insert_user(user("jane@x.com")).await.unwrap();
        assert!(created.id.is_some());

        let err = store.insert_user(user("jane@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(store.user_count().await, 1);

        let found = store.find_user_by_email("jane@x.com").await.unwrap();
        assert_eq!(found.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn find_gift_by_id() {
        let gift: Gift = serde_json::from_str(r#"{"id": "7", "name": "Lamp"}"#).unwrap();
        let store = MemoryStore::with_gifts(vec![gift]);

        let found = store.find_gift("7").await.unwrap().unwrap();
        assert_eq!(found.name, "Lamp");
        let oid = found.object_id.unwrap();
        assert_eq!(
            store.find_gift(&oid.to_hex()).await.unwrap().map(|g| g.id),
            Some("7".to_string())
        );
        assert_eq!(store.find_gift("8").await.unwrap(), None);
    }
}
