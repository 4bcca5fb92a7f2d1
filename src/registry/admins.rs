use crate::config::{Admin, ConfigStore};
use crate::error::AdminError;
use std::sync::Arc;
use tracing::info;

/// Chat-platform snowflake ids are at least this many digits long; anything
/// shorter cannot be a real identity.
const MIN_ID_DIGITS: usize = 17;

/// View over the persisted admin allow-list.
///
/// Mutations are written through [`ConfigStore`] before they are reported as
/// successful, so an observed success reply implies durability.
#[derive(Debug, Clone)]
pub struct AdminDirectory {
    store: Arc<ConfigStore>,
}

impl AdminDirectory {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Membership test: true iff some stored entry is prefix-matched by the
    /// identity.
    pub async fn is_admin(&self, identity: &str) -> bool {
        if identity.is_empty() {
            return false;
        }
        self.store
            .admins()
            .await
            .iter()
            .any(|admin| admin.matches(identity))
    }

    /// Reduce a raw subject (plain id or `<@…>` mention markup) to its
    /// digits and enforce the id length floor.
    pub fn canonical_id(raw: &str) -> Result<String, AdminError> {
        let id: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if id.len() < MIN_ID_DIGITS {
            return Err(AdminError::InvalidId);
        }
        Ok(id)
    }

    /// Append a new admin entry and persist it.
    pub async fn add(&self, raw_subject: &str, display_name: &str) -> Result<(), AdminError> {
        let id = Self::canonical_id(raw_subject)?;

        if self.is_admin(&id).await {
            return Err(AdminError::AlreadyAdmin);
        }

        self.store
            .update(|cfg| cfg.admins.push(Admin::new(&id, display_name)))
            .await
            .map_err(|e| AdminError::Persist(e.to_string()))?;

        info!("Granted bot admin to {} ({})", display_name, id);
        Ok(())
    }

    /// Remove the first matching admin entry and persist the removal.
    pub async fn revoke(&self, raw_subject: &str) -> Result<(), AdminError> {
        let id = Self::canonical_id(raw_subject)?;

        if !self.is_admin(&id).await {
            return Err(AdminError::NotAdmin);
        }

        self.store
            .update(|cfg| {
                if let Some(pos) = cfg.admins.iter().position(|a| a.matches(&id)) {
                    cfg.admins.remove(pos);
                }
            })
            .await
            .map_err(|e| AdminError::Persist(e.to_string()))?;

        info!("Revoked bot admin from {}", id);
        Ok(())
    }

    /// All entries in stored order, for display.
    pub async fn list(&self) -> Vec<Admin> {
        self.store.admins().await
    }
}
