use actix_web::http::header::{CACHE_CONTROL, HeaderValue};
use actix_web::{HttpResponse, get, web};

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route get_results,
}

/// Latest published snapshot, cacheable for a minute
#[get("/get_results")]
pub async fn get_results(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let snapshot = state.store.read().ok_or(ApiError::NoResults)?;

    Ok(HttpResponse::Ok()
        .insert_header((CACHE_CONTROL, HeaderValue::from_static("public, max-age=60")))
        .json(snapshot.as_ref()))
}
