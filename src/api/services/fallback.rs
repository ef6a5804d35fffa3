//! Page served when a short code does not resolve

use std::sync::Arc;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use rust_embed::Embed;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::errors::{Result, TokenlinkError};

#[derive(Embed)]
#[folder = "assets/"]
struct PageAssets;

const MINIMAL_PAGE: &str = "<!doctype html><title>Not Found</title><h1>404</h1>";

#[derive(Clone)]
pub struct FallbackPage {
    html: Arc<str>,
}

impl FallbackPage {
    /// The page compiled into the binary
    pub fn embedded() -> Self {
        let html = PageAssets::get("404.html")
            .map(|file| String::from_utf8_lossy(&file.data).into_owned())
            .unwrap_or_else(|| MINIMAL_PAGE.to_string());
        Self { html: html.into() }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let html = std::fs::read_to_string(path).map_err(|e| {
            TokenlinkError::file_operation(format!("cannot read not-found page {}: {}", path, e))
        })?;
        Ok(Self { html: html.into() })
    }

    /// `server.not_found_page` when set and readable, the embedded page otherwise
    pub fn from_config(config: &ServerConfig) -> Self {
        match config.not_found_page.as_deref() {
            Some(path) if !path.is_empty() => match Self::from_file(path) {
                Ok(page) => {
                    info!("Using not-found page from {}", path);
                    page
                }
                Err(e) => {
                    warn!("{}; falling back to the built-in page", e);
                    Self::embedded()
                }
            },
            _ => Self::embedded(),
        }
    }

    pub fn response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .content_type("text/html; charset=utf-8")
            .body(self.html.to_string())
    }
}
