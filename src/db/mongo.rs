use super::{Store, StoreError};
use crate::models::{Gift, GiftFilter, User};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Collection, Database, IndexModel,
};
use tokio::sync::OnceCell;

const USERS: &str = "users";
const GIFTS: &str = "gifts";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB backed store. The connection is opened on first use and the same
/// handle is reused afterwards; the driver pools connections internally.
pub struct MongoStore {
    uri: String,
    db_name: String,
    db: OnceCell<Database>,
}

impl MongoStore {
    pub fn new(uri: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            db_name: db_name.into(),
            db: OnceCell::new(),
        }
    }

    async fn database(&self) -> Result<&Database, StoreError> {
        self.db
            .get_or_try_init(|| async {
                let client = Client::with_uri_str(&self.uri).await?;
                let db = client.database(&self.db_name);

                // Backstop for the check-then-insert in registration.
                let index = IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build();
                db.collection::<Document>(USERS).create_index(index).await?;

                tracing::info!("Connected to MongoDB database {}", self.db_name);
                Ok::<_, StoreError>(db)
            })
            .await
    }

    async fn users(&self) -> Result<Collection<User>, StoreError> {
        Ok(self.database().await?.collection(USERS))
    }

    async fn gifts(&self) -> Result<Collection<Gift>, StoreError> {
        Ok(self.database().await?.collection(GIFTS))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE
    )
}

/// Gifts are looked up by listing `id`, or by `_id` when the key is an ObjectId.
fn gift_lookup(key: &str) -> Document {
    match ObjectId::parse_str(key) {
        Ok(oid) => doc! { "$or": [{ "id": key }, { "_id": oid }] },
        Err(_) => doc! { "id": key },
    }
}

/// Translates a search filter into a Mongo query document.
fn filter_document(filter: &GiftFilter) -> Document {
    let mut query = Document::new();
    if let Some(name) = &filter.name {
        query.insert(
            "name",
            doc! { "$regex": regex::escape(name), "$options": "i" },
        );
    }
    if let Some(category) = &filter.category {
        query.insert("category", category.as_str());
    }
    if let Some(condition) = &filter.condition {
        query.insert("condition", condition.as_str());
    }
    if let Some(max_age) = filter.age_years {
        query.insert("age_years", doc! { "$lte": max_age });
    }
    query
}

#[async_trait]
impl Store for MongoStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().await?.find_one(doc! { "email": email }).await?)
    }

    async fn insert_user(&self, mut user: User) -> Result<User, StoreError> {
        let result = match self.users().await?.insert_one(&user).await {
            Ok(result) => result,
            Err(e) if is_duplicate_key(&e) => return Err(StoreError::DuplicateKey(user.email)),
            Err(e) => return Err(e.into()),
        };
        user.id = result.inserted_id.as_object_id();
        Ok(user)
    }

    async fn list_gifts(&self) -> Result<Vec<Gift>, StoreError> {
        let cursor = self.gifts().await?.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_gift(&self, id: &str) -> Result<Option<Gift>, StoreError> {
        Ok(self.gifts().await?.find_one(gift_lookup(id)).await?)
    }

    async fn search_gifts(&self, filter: &GiftFilter) -> Result<Vec<Gift>, StoreError> {
        let cursor = self.gifts().await?.find(filter_document(filter)).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_gifts(&self) -> Result<u64, StoreError> {
        Ok(self.gifts().await?.count_documents(doc! {}).await?)
    }

    async fn insert_gifts(&self, gifts: Vec<Gift>) -> Result<usize, StoreError> {
        let result = self.gifts().await?.insert_many(gifts).await?;
        Ok(result.inserted_ids.len())
    }
}
