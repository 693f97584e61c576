use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::models::{Claims, User};
use crate::AppState;
use actix_web::{dev::ServiceRequest, web, Error, HttpMessage};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::TimeDelta;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token lifetime of {0} hours is out of range")]
    Lifetime(i64),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

pub fn create_jwt(user: &User, auth: &AuthConfig) -> Result<String, TokenError> {
    let now = chrono::Utc::now();
    let expiration = TimeDelta::try_hours(auth.token_ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or(TokenError::Lifetime(auth.token_ttl_hours))?;

    let claims = Claims {
        user_id: user.id_hex(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_ref()),
    )?)
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// bcrypt is CPU bound, so this runs on actix's blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    web::block(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| {
            tracing::error!("Blocking pool error while hashing: {}", e);
            ApiError::Internal("Internal server error during registration")
        })?
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::Internal("Internal server error during registration")
        })
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    let verified = web::block(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| {
            tracing::error!("Blocking pool error while verifying: {}", e);
            ApiError::Internal("Internal server error during login")
        })?;
    match verified {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!("Stored password hash could not be checked: {}", e);
            Ok(false)
        }
    }
}

/// Guard for `HttpAuthentication::with_fn`. Valid claims are stored in the
/// request extensions for handlers to pick up with `web::ReqData<Claims>`.
/// A missing or non-bearer `Authorization` header arrives as `None`.
pub async fn validator(
    req: ServiceRequest,
    credentials: Option<BearerAuth>,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let Some(credentials) = credentials else {
        return Err((ApiError::Unauthorized("Missing bearer token").into(), req));
    };

    let secret = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.auth.jwt_secret.clone());
    let Some(secret) = secret else {
        tracing::error!("AppState missing from app data");
        return Err((ApiError::Internal("Internal server error").into(), req));
    };

    match validate_jwt(credentials.token(), &secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(req)
        }
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            Err((ApiError::Unauthorized("Invalid or expired token").into(), req))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, oid::ObjectId};

    fn jane() -> User {
        User {
            id: Some(ObjectId::new()),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@x.com".into(),
            password: String::new(),
            created_at: bson::DateTime::now(),
            updated_at: bson::DateTime::now(),
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let auth = AuthConfig::new("test-secret");
        let user = jane();
        let token = create_jwt(&user, &auth).unwrap();
        let claims = validate_jwt(&token, "test-secret").unwrap();
        assert_eq!(claims.user_id, user.id_hex());
        assert_eq!(claims.email, "jane@x.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_jwt(&jane(), &AuthConfig::new("one")).unwrap();
        assert!(validate_jwt(&token, "two").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut auth = AuthConfig::new("test-secret");
        auth.token_ttl_hours = -2;
        let token = create_jwt(&jane(), &auth).unwrap();
        assert!(validate_jwt(&token, "test-secret").is_err());
    }

    #[test]
    fn oversized_lifetime_is_an_error() {
        let mut auth = AuthConfig::new("test-secret");
        auth.token_ttl_hours = i64::MAX;
        let err = create_jwt(&jane(), &auth).unwrap_err();
        assert!(matches!(err, TokenError::Lifetime(i64::MAX)));
    }

    #[actix_web::test]
    async fn hash_then_verify() {
        let hash = hash_password("secret1".into(), 4).await.unwrap();
        assert!(verify_password("secret1".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".into(), hash).await.unwrap());
    }

    #[actix_web::test]
    async fn garbage_hash_does_not_verify() {
        assert!(!verify_password("secret1".into(), "not-a-hash".into()).await.unwrap());
    }
}
