use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{de, Deserialize, Deserializer, Serialize};

/// A user document as stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// bcrypt hash, never sent to clients.
    pub password: String,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl User {
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id_hex(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            created_at: DateTime::from_timestamp_millis(self.created_at.timestamp_millis())
                .unwrap_or_default(),
        }
    }
}

/// The user as returned in API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub iat: usize,
    pub exp: usize,
}

/// A gift document as stored in the `gifts` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gift {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub posted_by: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub date_added: i64,
    #[serde(default)]
    pub age_days: f64,
    /// Gifts without an age never match an age bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_years: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

impl Gift {
    /// The key clients use for the gift: the Mongo `_id` as hex, or the
    /// listing `id` when the gift has no document id.
    pub fn key(&self) -> String {
        self.object_id
            .map(|oid| oid.to_hex())
            .unwrap_or_else(|| self.id.clone())
    }

    /// True if `key` is either the listing `id` or the hex `_id`.
    pub fn has_key(&self, key: &str) -> bool {
        self.id == key || self.object_id.is_some_and(|oid| oid.to_hex() == key)
    }
}

/// A gift as sent to clients, with `_id` flattened to a hex string so it can
/// be used as a route parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftView {
    #[serde(rename = "_id")]
    pub key: String,
    #[serde(flatten)]
    pub gift: Gift,
}

impl From<Gift> for GiftView {
    fn from(mut gift: Gift) -> Self {
        let key = gift.key();
        gift.object_id = None;
        GiftView { key, gift }
    }
}

/// Query string accepted by `GET /api/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GiftFilter {
    pub name: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub age_years: Option<f64>,
}

/// `age_years=` is treated like an absent parameter.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid age_years: {}", raw))),
        _ => Ok(None),
    }
}

impl GiftFilter {
    /// Drops blank text filters so `?category=` behaves like no filter.
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        GiftFilter {
            name: clean(self.name),
            category: clean(self.category),
            condition: clean(self.condition),
            age_years: self.age_years,
        }
    }

    pub fn matches(&self, gift: &Gift) -> bool {
        if let Some(name) = &self.name {
            if !gift.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &gift.category != category {
                return false;
            }
        }
        if let Some(condition) = &self.condition {
            if &gift.condition != condition {
                return false;
            }
        }
        match self.age_years {
            Some(max_age) => gift.age_years.is_some_and(|age| age <= max_age),
            None => true,
        }
    }
}
