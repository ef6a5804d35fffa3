//! Public resolution: `GET /{code}`

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, web};
use tracing::{debug, error};

use crate::services::LinkService;

use super::fallback::FallbackPage;
use super::helpers::api_error;

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        code: web::Path<String>,
        service: web::Data<Arc<LinkService>>,
        fallback: web::Data<FallbackPage>,
    ) -> HttpResponse {
        let code = code.into_inner();

        match service.resolve_link(&code).await {
            Ok(Some(link)) => HttpResponse::build(StatusCode::TEMPORARY_REDIRECT)
                .insert_header((LOCATION, link.destination))
                .finish(),
            Ok(None) => {
                debug!("No link for '{}', serving fallback page", code);
                fallback.response()
            }
            Err(e) if e.is_internal() => {
                error!("Lookup for '{}' failed: {}", code, e);
                fallback.response()
            }
            Err(e) => api_error(&e, "lookup failed"),
        }
    }
}

pub fn redirect_routes() -> actix_web::Resource {
    web::resource("/{code}").route(web::get().to(RedirectService::handle_redirect))
}
