//! Typed client for the HTTP API, following what the web front end does:
//! it calls the same endpoints, builds the same search query, and keeps the
//! token and user in a session store under the same keys the browser uses.

use crate::models::{AuthResponse, Claims, GiftView, LoginRequest, PublicUser, RegisterRequest};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

pub const TOKEN_KEY: &str = "bearer-token";
pub const USER_KEY: &str = "user-details";
/// Keys older front-end builds wrote; cleared on logout as well.
const LEGACY_KEYS: [&str; 2] = ["user", "authToken"];

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("stored user details are corrupt: {0}")]
    Session(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
            ClientError::Session(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// String key/value store with browser session-storage semantics.
#[derive(Debug, Clone, Default)]
pub struct Session {
    items: HashMap<String, String>,
}

impl Session {
    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: impl Into<String>) {
        self.items.insert(key.to_string(), value.into());
    }

    pub fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }

    pub fn token(&self) -> Option<&str> {
        self.get_item(TOKEN_KEY)
    }

    pub fn user(&self) -> Result<Option<PublicUser>, ClientError> {
        match self.get_item(USER_KEY) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    fn store_auth(&mut self, auth: &AuthResponse) -> Result<(), ClientError> {
        self.set_item(TOKEN_KEY, auth.token.clone());
        self.set_item(USER_KEY, serde_json::to_string(&auth.user)?);
        Ok(())
    }

    pub fn clear_credentials(&mut self) {
        self.remove_item(TOKEN_KEY);
        self.remove_item(USER_KEY);
        for key in LEGACY_KEYS {
            self.remove_item(key);
        }
    }
}

/// Search form state. Blank fields and a zero age are left out of the query.
#[derive(Debug, Clone, Default)]
pub struct SearchForm {
    pub name: String,
    pub category: String,
    pub condition: String,
    pub age_years: u32,
}

impl SearchForm {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let name = self.name.trim();
        if !name.is_empty() {
            pairs.push(("name", name.to_string()));
        }
        if !self.category.is_empty() {
            pairs.push(("category", self.category.clone()));
        }
        if !self.condition.is_empty() {
            pairs.push(("condition", self.condition.clone()));
        }
        if self.age_years > 0 {
            pairs.push(("age_years", self.age_years.to_string()));
        }
        pairs
    }
}

pub struct GiftLinkClient {
    http: reqwest::Client,
    base_url: String,
    pub session: Session,
}

impl GiftLinkClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: Session::default(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
        };
        Err(ClientError::Api { status, message })
    }

    pub async fn register(&mut self, req: &RegisterRequest) -> Result<PublicUser, ClientError> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(req)
            .send()
            .await?;
        let auth: AuthResponse = Self::parse(response).await?;
        self.session.store_auth(&auth)?;
        Ok(auth.user)
    }

    /// Clears any stored credentials when the login is rejected.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.http.post(self.url("/auth/login")).json(&req).send().await?;
        match Self::parse::<AuthResponse>(response).await {
            Ok(auth) => {
                self.session.store_auth(&auth)?;
                Ok(auth.user)
            }
            Err(e) => {
                self.session.clear_credentials();
                Err(e)
            }
        }
    }

    pub fn logout(&mut self) {
        self.session.clear_credentials();
    }

    pub async fn me(&self) -> Result<Claims, ClientError> {
        let mut request = self.http.get(self.url("/auth/me"));
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        Self::parse(request.send().await?).await
    }

    pub async fn list_gifts(&self) -> Result<Vec<GiftView>, ClientError> {
        Self::parse(self.http.get(self.url("/api/gifts")).send().await?).await
    }

    pub async fn get_gift(&self, id: &str) -> Result<GiftView, ClientError> {
        Self::parse(self.http.get(self.url(&format!("/api/gifts/{}", id))).send().await?).await
    }

    pub async fn search(&self, form: &SearchForm) -> Result<Vec<GiftView>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/search"))
            .query(&form.query_pairs())
            .send()
            .await?;
        Self::parse(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn default_form_sends_no_parameters() {
        assert!(SearchForm::default().query_pairs().is_empty());
    }

    #[test]
    fn form_trims_name_and_keeps_filters() {
        let form = SearchForm {
            name: "  lamp ".into(),
            category: "Office".into(),
            condition: String::new(),
            age_years: 10,
        };
        assert_eq!(
            form.query_pairs(),
            vec![
                ("name", "lamp".to_string()),
                ("category", "Office".to_string()),
                ("age_years", "10".to_string()),
            ]
        );
    }

    #[test]
    fn session_stores_and_clears_credentials() {
        let mut session = Session::default();
        let auth = AuthResponse {
            message: "Login successful".into(),
            user: PublicUser {
                id: "abc".into(),
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                email: "jane@x.com".into(),
                created_at: Utc::now(),
            },
            token: "tok".into(),
        };
        session.set_item("authToken", "old");
        session.store_auth(&auth).unwrap();

        assert_eq!(session.token(), Some("tok"));
        assert_eq!(session.user().unwrap().unwrap().first_name, "Jane");

        session.clear_credentials();
        assert!(!session.is_logged_in());
        assert!(session.user().unwrap().is_none());
        assert!(session.get_item("authToken").is_none());
    }

    #[test]
    fn corrupt_user_details_surface_as_error() {
        let mut session = Session::default();
        session.set_item(USER_KEY, "{not json");
        assert!(matches!(session.user(), Err(ClientError::Session(_))));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = GiftLinkClient::new("http://localhost:3060/");
        assert_eq!(client.url("/api/gifts"), "http://localhost:3060/api/gifts");
    }
}
