//! Bearer token extraction
//!
//! The token is an opaque string: whatever follows `Bearer ` in the
//! `Authorization` header, compared verbatim against stored owners.

use actix_web::HttpRequest;
use actix_web::http::header::AUTHORIZATION;

use crate::errors::{Result, TokenlinkError};

const BEARER_PREFIX: &str = "Bearer ";

/// Token from the `Authorization` header.
///
/// A missing or empty header and a header without the `Bearer ` prefix are
/// reported as different errors.
pub fn bearer_token(req: &HttpRequest) -> Result<String> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.as_bytes())
        .unwrap_or_default();

    if header.is_empty() {
        return Err(TokenlinkError::missing_authorization(
            "no authorization header",
        ));
    }

    let header = std::str::from_utf8(header).map_err(|_| {
        TokenlinkError::invalid_authorization_header("invalid authorization header")
    })?;

    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::to_string)
        .ok_or_else(|| {
            TokenlinkError::invalid_authorization_header("invalid authorization header")
        })
}

/// Same as [`bearer_token`], but a malformed header counts as a bad token.
///
/// Used by the owner-scoped read and delete endpoints.
pub fn owner_token(req: &HttpRequest) -> Result<String> {
    bearer_token(req).map_err(|e| match e {
        TokenlinkError::InvalidAuthorizationHeader(_) => {
            TokenlinkError::invalid_token("invalid token")
        }
        other => other,
    })
}
