pub mod custom_field_handlers;
pub mod listing_handlers;
pub mod preference_handlers;

use actix_web::web;

use crate::auth::middleware::{require_auth, require_json_content_type};

/// Register every helpdesk route. Mutations only accept JSON bodies.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/helpdesk")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .wrap(actix_web::middleware::from_fn(require_auth))
            .route("", web::get().to(listing_handlers::home))
            .route("/closed", web::get().to(listing_handlers::closed))
            .route("/recyclebin", web::get().to(listing_handlers::recycle_bin))
            .route("/block/{block}", web::get().to(listing_handlers::view_block))
            .route("/preferences", web::post().to(preference_handlers::save)),
    );
    // /new before /{id} to avoid the path conflict
    cfg.service(
        web::scope("/admin/custom-fields")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .wrap(actix_web::middleware::from_fn(require_auth))
            .route("", web::get().to(custom_field_handlers::list))
            .route("", web::post().to(custom_field_handlers::create))
            .route("/new", web::get().to(custom_field_handlers::new_form))
            .route("/{id}", web::get().to(custom_field_handlers::read))
            .route("/{id}", web::post().to(custom_field_handlers::update))
            .route("/{id}/delete", web::post().to(custom_field_handlers::delete))
            .route("/{id}/move", web::post().to(custom_field_handlers::move_field)),
    );
}
