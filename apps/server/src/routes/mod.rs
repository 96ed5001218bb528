use actix_web::web::ServiceConfig;

mod config;
mod health;
mod results;

pub fn routes(cfg: &mut ServiceConfig) {
    health::routes(cfg);
    results::routes(cfg);
    config::routes(cfg);
}
