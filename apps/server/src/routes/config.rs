use actix_web::{HttpResponse, get, post, web};
use serde_json::json;
use tcpingmap::{RetryPolicy, TargetConfig};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route get_config,
    route update_ips,
}

/// Target configuration as the next cycle would see it
///
/// Fetched with a single attempt.
#[get("/get_config")]
pub async fn get_config(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let config = state
        .source
        .fetch(&RetryPolicy::no_retry())
        .await
        .map_err(ApiError::ConfigUnavailable)?;
    Ok(HttpResponse::Ok().json(config))
}

/// Replace the target configuration; picked up by the next cycle
#[post("/update_ips")]
pub async fn update_ips(
    state: web::Data<AppState>,
    body: web::Json<TargetConfig>,
) -> Result<HttpResponse, ApiError> {
    if !state.source.is_writable() {
        return Err(ApiError::ReadOnly);
    }

    let config = body.into_inner();
    if config.is_empty() {
        return Err(ApiError::InvalidConfig("no regions given".into()));
    }

    state.source.store(&config).await?;
    info!("Target configuration updated with {} targets", config.len());

    Ok(HttpResponse::Ok().json(json!({ "status": "success" })))
}
