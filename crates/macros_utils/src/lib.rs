//! Small declarative helpers shared by the HTTP apps.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web as __actix;

/// Generate a `routes` function registering actix services
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     route get_results,
/// }
/// ```
///
/// expands to `pub fn routes(cfg: &mut ServiceConfig)` calling
/// `cfg.service(...)` for each handler, in order. Handlers are the
/// structs generated by actix's `#[get]` / `#[post]` attributes.
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($(route $handler:ident),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::__actix::web::ServiceConfig) {
            $(cfg.service($handler);)*
        }
    };
}
