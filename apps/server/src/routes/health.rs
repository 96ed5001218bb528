use actix_web::{HttpResponse, Responder, get};

macros_utils::routes! {
    route index_route,
    route health_route,
}

#[get("/")]
pub async fn index_route() -> impl Responder {
    HttpResponse::Ok().body("API Server is running. Use /get_results to fetch data.")
}

/// Health check route
/// This route returns no content, the response status is enough.
#[get("/health")]
pub async fn health_route() -> impl Responder {
    HttpResponse::Ok()
}
