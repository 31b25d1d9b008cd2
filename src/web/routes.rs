use actix_web::http::Method;
use actix_web::{web, Resource};
use crate::web::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(chat_resource("/functions/v1/chat"))
        .service(
            web::scope("/api")
                .service(chat_resource("/chat"))
                .route("/health", web::get().to(handlers::health_check)),
        )
        .route("/health", web::get().to(handlers::health_check));
}

fn chat_resource(path: &str) -> Resource {
    web::resource(path)
        .route(web::post().to(handlers::chat))
        .route(web::method(Method::OPTIONS).to(handlers::preflight))
        .default_service(web::route().to(handlers::method_not_allowed))
}
