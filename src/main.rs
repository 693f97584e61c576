use actix_web::{middleware::Logger, web, App, HttpServer};
use giftlink::config::Config;
use giftlink::db::{self, MemoryStore, MongoStore, Store};
use giftlink::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "giftlink=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let store: Arc<dyn Store> = match &config.mongo_url {
        Some(url) => Arc::new(MongoStore::new(url.clone(), config.mongo_db.clone())),
        None => {
            tracing::warn!("MONGO_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(path) = &config.gifts_seed_file {
        if let Err(e) = db::seed_gifts(store.as_ref(), path).await {
            tracing::error!("Failed to seed gifts from {}: {}", path.display(), e);
        }
    }

    let state = web::Data::new(AppState::new(store, config.auth.clone()));
    let addr = config.bind_addr();
    tracing::info!("Listening on: {}", addr);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(giftlink::configure)
    })
    .bind(addr)?
    .run()
    .await
}
