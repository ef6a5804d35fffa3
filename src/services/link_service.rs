//! Link lifecycle service
//!
//! Creation, resolution and owner-scoped access to links. HTTP handlers only
//! translate between the wire format and these calls.

use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{Result, TokenlinkError};
use crate::services::CapacityGuard;
use crate::storage::{Link, LinkStore};
use crate::visits::VisitRecorder;

/// Request to create a new link
#[derive(Debug, Clone, Default)]
pub struct CreateLinkRequest {
    pub destination: String,
    pub short_code: String,
}

pub struct LinkService {
    store: Arc<dyn LinkStore>,
    capacity: Arc<CapacityGuard>,
    visits: VisitRecorder,
}

impl LinkService {
    pub fn new(
        store: Arc<dyn LinkStore>,
        capacity: Arc<CapacityGuard>,
        visits: VisitRecorder,
    ) -> Self {
        Self {
            store,
            capacity,
            visits,
        }
    }

    /// Create a link owned by `token`.
    ///
    /// Field checks run first, then the capacity check, then the uniqueness
    /// check. An existing code is a conflict no matter who owns it.
    pub async fn create_link(&self, token: &str, req: CreateLinkRequest) -> Result<Link> {
        if req.destination.is_empty() {
            return Err(TokenlinkError::validation("url is required"));
        }
        if req.short_code.is_empty() {
            return Err(TokenlinkError::validation("shortCode is required"));
        }

        self.capacity.on_creation(self.store.as_ref()).await;

        if self.store.find_by_code(&req.short_code).await?.is_some() {
            return Err(TokenlinkError::link_already_exists(
                "shortCode already exists",
            ));
        }

        let link = Link::new(req.short_code, req.destination, token);
        self.store.insert(&link).await.map_err(|e| match e {
            // lost a race against a concurrent create of the same code
            TokenlinkError::LinkAlreadyExists(_) => {
                TokenlinkError::link_already_exists("shortCode already exists")
            }
            other => other,
        })?;

        info!(
            "LinkService: created '{}' -> '{}'",
            link.short_code, link.destination
        );
        Ok(link)
    }

    /// Look up a link for public redirection and count the visit.
    ///
    /// `Ok(None)` means the code is unknown; no visit is recorded for it.
    pub async fn resolve_link(&self, code: &str) -> Result<Option<Link>> {
        if code.is_empty() {
            return Err(TokenlinkError::validation("shortCode is required"));
        }

        let link = self.store.find_by_code(code).await?;
        match &link {
            Some(_) => self.visits.record(code),
            None => debug!("LinkService: no link for '{}'", code),
        }
        Ok(link)
    }

    pub async fn get_owned_link(&self, token: &str, code: &str) -> Result<Link> {
        if code.is_empty() {
            return Err(TokenlinkError::validation("shortCode is required"));
        }

        let link = self
            .store
            .find_by_code(code)
            .await?
            .ok_or_else(|| TokenlinkError::not_found("link not found"))?;

        if !link.is_owned_by(token) {
            return Err(TokenlinkError::invalid_token("invalid token"));
        }
        Ok(link)
    }

    /// All links owned by `token`, newest first.
    pub async fn list_owned_links(&self, token: &str) -> Result<Vec<Link>> {
        self.store.find_by_token(token).await
    }

    /// Delete `code` if `token` owns it; anything else is a silent no-op.
    pub async fn delete_owned_link(&self, token: &str, code: &str) -> Result<()> {
        if code.is_empty() {
            return Err(TokenlinkError::validation("shortCode is required"));
        }

        let deleted = self.store.delete_owned(code, token).await?;
        if deleted == 0 {
            debug!("LinkService: delete of '{}' matched nothing", code);
        }
        Ok(())
    }

    pub async fn link_exists(&self, code: &str) -> Result<bool> {
        if code.is_empty() {
            return Err(TokenlinkError::validation("shortCode is required"));
        }
        Ok(self.store.find_by_code(code).await?.is_some())
    }
}
