//! Owner API: `/_api/links`

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::trace;

use crate::api::auth::{bearer_token, owner_token};
use crate::services::{CreateLinkRequest, LinkService};

use super::helpers::{LinkPayload, api_error, error_response, ok_response};

#[derive(Debug, Deserialize)]
struct PostNewLink {
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "shortCode")]
    short_code: Option<String>,
}

/// `POST /_api/links`
pub async fn create_link(
    req: HttpRequest,
    body: web::Bytes,
    service: web::Data<Arc<LinkService>>,
) -> HttpResponse {
    let token = match bearer_token(&req) {
        Ok(token) => token,
        Err(e) => return api_error(&e, "invalid authorization header"),
    };

    let payload: PostNewLink = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let request = CreateLinkRequest {
        destination: payload.url.unwrap_or_default(),
        short_code: payload.short_code.unwrap_or_default(),
    };

    match service.create_link(&token, request).await {
        Ok(_) => ok_response(StatusCode::CREATED),
        Err(e) => api_error(&e, "insertion failed"),
    }
}

/// `GET /_api/links/{code}`
pub async fn get_link(
    req: HttpRequest,
    code: web::Path<String>,
    service: web::Data<Arc<LinkService>>,
) -> HttpResponse {
    let token = match owner_token(&req) {
        Ok(token) => token,
        Err(e) => return api_error(&e, "invalid token"),
    };

    match service.get_owned_link(&token, &code).await {
        Ok(link) => HttpResponse::Ok().json(json!({
            "error": false,
            "link": LinkPayload::from(link),
        })),
        Err(e) => api_error(&e, "failed to fetch link"),
    }
}

/// `GET /_api/links`
pub async fn list_links(req: HttpRequest, service: web::Data<Arc<LinkService>>) -> HttpResponse {
    let token = match owner_token(&req) {
        Ok(token) => token,
        Err(e) => return api_error(&e, "invalid token"),
    };

    match service.list_owned_links(&token).await {
        Ok(links) => {
            trace!("Listing {} owned links", links.len());
            let links: Vec<LinkPayload> = links.into_iter().map(LinkPayload::from).collect();
            HttpResponse::Ok().json(json!({ "error": false, "links": links }))
        }
        Err(e) => api_error(&e, "failed to fetch links"),
    }
}

/// `DELETE /_api/links/{code}`
pub async fn delete_link(
    req: HttpRequest,
    code: web::Path<String>,
    service: web::Data<Arc<LinkService>>,
) -> HttpResponse {
    let token = match owner_token(&req) {
        Ok(token) => token,
        Err(e) => return api_error(&e, "invalid token"),
    };

    match service.delete_owned_link(&token, &code).await {
        Ok(()) => ok_response(StatusCode::OK),
        Err(e) => api_error(&e, "failed to delete link"),
    }
}

/// `GET /_api/links/{code}/exists`, no authorization
pub async fn link_exists(
    code: web::Path<String>,
    service: web::Data<Arc<LinkService>>,
) -> HttpResponse {
    match service.link_exists(&code).await {
        Ok(exists) => HttpResponse::Ok().json(json!({ "error": false, "exists": exists })),
        Err(e) => api_error(&e, "failed to check link"),
    }
}

pub fn links_routes() -> actix_web::Scope {
    web::scope("/_api/links")
        .route("", web::get().to(list_links))
        .route("", web::post().to(create_link))
        .route("/{code}/exists", web::get().to(link_exists))
        .route("/{code}", web::get().to(get_link))
        .route("/{code}", web::delete().to(delete_link))
}
