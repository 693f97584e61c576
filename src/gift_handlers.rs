use crate::error::ApiError;
use crate::models::{Gift, GiftFilter, GiftView};
use crate::AppState;
use actix_web::{get, web, HttpResponse};

const GIFTS_FAILED: &str = "Internal server error";

fn views(gifts: Vec<Gift>) -> Vec<GiftView> {
    gifts.into_iter().map(GiftView::from).collect()
}

#[get("/gifts")]
pub async fn list_gifts(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let gifts = state.store.list_gifts().await.map_err(|e| {
        tracing::error!("Failed to list gifts: {}", e);
        ApiError::Internal(GIFTS_FAILED)
    })?;
    Ok(HttpResponse::Ok().json(views(gifts)))
}

/// `id` may be the listing id or the hex `_id` returned in listings.
#[get("/gifts/{id}")]
pub async fn get_gift(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    match state.store.find_gift(&id).await {
        Ok(Some(gift)) => Ok(HttpResponse::Ok().json(GiftView::from(gift))),
        Ok(None) => Err(ApiError::NotFound("Gift not found")),
        Err(e) => {
            tracing::error!("Failed to fetch gift {}: {}", id, e);
            Err(ApiError::Internal(GIFTS_FAILED))
        }
    }
}

/// `name` is a case-insensitive substring, `category` and `condition` match
/// exactly, `age_years` is an inclusive upper bound that excludes gifts with
/// no recorded age. Blank parameters are ignored.
#[get("/search")]
pub async fn search_gifts(
    state: web::Data<AppState>,
    query: web::Query<GiftFilter>,
) -> Result<HttpResponse, ApiError> {
    let filter = query.into_inner().normalized();
    tracing::debug!("Searching gifts with {:?}", filter);
    let gifts = state.store.search_gifts(&filter).await.map_err(|e| {
        tracing::error!("Gift search failed: {}", e);
        ApiError::Internal(GIFTS_FAILED)
    })?;
    Ok(HttpResponse::Ok().json(views(gifts)))
}
