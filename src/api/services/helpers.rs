//! JSON response helpers
//!
//! Every API body carries an `error` flag; failures add a `message`.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::errors::TokenlinkError;
use crate::storage::Link;

/// Link as exposed by the owner API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPayload {
    pub url: String,
    pub short_code: String,
    pub visits: u64,
    pub token: String,
}

impl From<Link> for LinkPayload {
    fn from(link: Link) -> Self {
        Self {
            url: link.destination,
            short_code: link.short_code,
            visits: link.visits,
            token: link.token,
        }
    }
}

pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "error": true,
        "message": message,
    }))
}

/// Map a service error to a response.
///
/// Storage and other internal failures are logged with their detail and
/// answered with `internal_message` only.
pub fn api_error(err: &TokenlinkError, internal_message: &str) -> HttpResponse {
    if err.is_internal() {
        error!("{} [{}]: {}", internal_message, err.code(), err.message());
        return error_response(err.http_status(), internal_message);
    }
    error_response(err.http_status(), err.message())
}

pub fn ok_response(status: StatusCode) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "error": false }))
}
