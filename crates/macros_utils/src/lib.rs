//! Small declarative helpers shared by the HTTP apps.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web as __actix;

/// Generates a `pub fn routes(cfg: &mut ServiceConfig)` for a route module.
///
/// Two forms are accepted. A list of handlers registers each one as a service:
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
/// }
/// ```
///
/// A list of child modules declares them and chains their own `routes`:
///
/// ```ignore
/// macros_utils::routes! {
///     mod health,
///     mod websites,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($(route $route:ident),+ $(,)?) => {
        pub fn routes(cfg: &mut $crate::__actix::web::ServiceConfig) {
            $( cfg.service($route); )+
        }
    };
    ($(mod $module:ident),+ $(,)?) => {
        $( mod $module; )+

        pub fn routes(cfg: &mut $crate::__actix::web::ServiceConfig) {
            $( $module::routes(cfg); )+
        }
    };
}
