pub mod auth;
pub mod auth_handlers;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod gift_handlers;
pub mod models;
pub mod validation;

use crate::config::AuthConfig;
use crate::db::Store;
use crate::error::ApiError;
use actix_web::{get, web, HttpResponse, Responder};
use actix_web_httpauth::middleware::HttpAuthentication;
use std::sync::Arc;

/// Shared by every worker through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth: AuthConfig) -> Self {
        Self { store, auth }
    }
}

/// Simple health check
#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

/// Registers every route. The caller supplies `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!("Rejected request body: {}", err);
        ApiError::BadRequest(format!("Invalid request body: {}", err)).into()
    });
    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Invalid query string: {}", err)).into()
    });

    cfg.app_data(json_config)
        .app_data(query_config)
        .service(health)
        .service(
            web::scope("/auth")
                .service(auth_handlers::register)
                .service(auth_handlers::login)
                .service(
                    web::resource("/me")
                        .wrap(HttpAuthentication::with_fn(auth::validator))
                        .route(web::get().to(auth_handlers::me)),
                ),
        )
        .service(
            web::scope("/api")
                .service(gift_handlers::list_gifts)
                .service(gift_handlers::get_gift)
                .service(gift_handlers::search_gifts),
        );
}
