use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::CirclConfig;
use crate::error::{CirclError, Result};
use crate::model::*;
use crate::rate_limit::RateLimiter;
use crate::storage::{StorageBackend, Table};

/// Parse a caller-supplied id, naming the entity in the error.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| CirclError::InvalidInput(format!("invalid {what} id: '{raw}'")))
}

/// Owner-checked, rate-limited data access for a single user.
///
/// Every adapter call waits on the client's [`RateLimiter`] once, then talks
/// to the backend. Updates and deletes read the row's owner first and refuse
/// rows belonging to someone else.
pub struct SecureClient<B> {
    backend: B,
    user_id: Uuid,
    limiter: RateLimiter,
}

impl<B: StorageBackend> SecureClient<B> {
    pub fn new(backend: B, user_id: Uuid, limiter: RateLimiter) -> Self {
        Self {
            backend,
            user_id,
            limiter,
        }
    }

    pub fn from_config(backend: B, config: &CirclConfig) -> Result<Self> {
        Ok(Self::new(
            backend,
            config.user_id()?,
            RateLimiter::from_millis(config.rate_limit.min_interval_ms),
        ))
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    async fn ensure_owner(&self, table: Table, id: Uuid) -> Result<()> {
        match self.backend.owner_of(table, id).await? {
            None => Err(CirclError::NotFound(format!("{table} row {id}"))),
            Some(owner) if owner == self.user_id => Ok(()),
            Some(_) => {
                tracing::warn!(%table, %id, "ownership check failed");
                Err(CirclError::Forbidden(format!(
                    "{table} row {id} belongs to another user"
                )))
            }
        }
    }

    fn check_contact_owner(&self, contact: &Contact) -> Result<()> {
        if contact.user_id != self.user_id {
            tracing::warn!(id = %contact.id, "ownership check failed");
            return Err(CirclError::Forbidden(format!(
                "contact {} belongs to another user",
                contact.id
            )));
        }
        Ok(())
    }

    // -- Contacts --

    pub async fn fetch_contacts(&self) -> Result<Vec<Contact>> {
        self.limiter.acquire().await;
        self.backend.list_contacts(self.user_id).await
    }

    pub async fn fetch_contact(&self, id: &str) -> Result<Contact> {
        let id = parse_id(id, "contact")?;
        self.limiter.acquire().await;
        let contact = self.backend.get_contact(id).await?;
        self.check_contact_owner(&contact)?;
        Ok(contact)
    }

    pub async fn insert_contact(&self, fields: NewContact) -> Result<Contact> {
        fields.validate()?;
        let contact = Contact::new(self.user_id, fields);
        self.limiter.acquire().await;
        self.backend.insert_contact(&contact).await?;
        tracing::debug!(id = %contact.id, "contact inserted");
        Ok(contact)
    }

    /// Insert every contact in a single backend call. Nothing is written if
    /// any row fails validation or the backend rejects the batch.
    pub async fn insert_contacts(&self, batch: Vec<NewContact>) -> Result<Vec<Contact>> {
        for (i, fields) in batch.iter().enumerate() {
            fields.validate().map_err(|e| {
                CirclError::InvalidInput(format!("contact {} in batch: {e}", i + 1))
            })?;
        }
        let contacts: Vec<Contact> = batch
            .into_iter()
            .map(|fields| Contact::new(self.user_id, fields))
            .collect();
        if contacts.is_empty() {
            return Ok(contacts);
        }
        self.limiter.acquire().await;
        let n = self.backend.insert_contacts(&contacts).await?;
        tracing::info!(count = n, "bulk contact insert");
        Ok(contacts)
    }

    pub async fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<Contact> {
        let id = parse_id(id, "contact")?;
        patch.validate()?;
        self.limiter.acquire().await;
        let mut contact = self.backend.get_contact(id).await?;
        self.check_contact_owner(&contact)?;
        contact.apply(patch);
        self.backend.update_contact(&contact).await?;
        Ok(contact)
    }

    pub async fn delete_contact(&self, id: &str) -> Result<()> {
        let id = parse_id(id, "contact")?;
        self.limiter.acquire().await;
        self.ensure_owner(Table::Contacts, id).await?;
        self.backend.delete_contact(id).await?;
        tracing::info!(%id, "contact deleted");
        Ok(())
    }

    // -- Interactions --

    pub async fn fetch_interactions(&self, contact_id: Option<&str>) -> Result<Vec<Interaction>> {
        let contact_id = contact_id.map(|c| parse_id(c, "contact")).transpose()?;
        self.limiter.acquire().await;
        if let Some(cid) = contact_id {
            self.ensure_owner(Table::Contacts, cid).await?;
        }
        self.backend.list_interactions(self.user_id, contact_id).await
    }

    /// Record a touchpoint. Interactions have no update path.
    pub async fn log_interaction(
        &self,
        contact_id: &str,
        kind: InteractionKind,
        date: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<Interaction> {
        let contact_id = parse_id(contact_id, "contact")?;
        let mut interaction = Interaction::new(self.user_id, contact_id, kind, date);
        if let Some(notes) = notes {
            interaction = interaction.with_notes(notes);
        }
        self.limiter.acquire().await;
        self.ensure_owner(Table::Contacts, contact_id).await?;
        self.backend.insert_interaction(&interaction).await?;
        Ok(interaction)
    }

    // -- Keystones --

    pub async fn fetch_keystones(&self) -> Result<Vec<Keystone>> {
        self.limiter.acquire().await;
        self.backend.list_keystones(self.user_id).await
    }

    pub async fn insert_keystone(&self, mut keystone: Keystone) -> Result<Keystone> {
        keystone.validate()?;
        keystone.user_id = self.user_id;
        self.limiter.acquire().await;
        if let Some(cid) = keystone.contact_id {
            self.ensure_owner(Table::Contacts, cid).await?;
        }
        self.backend.insert_keystone(&keystone).await?;
        Ok(keystone)
    }

    pub async fn update_keystone(&self, id: &str, patch: &KeystonePatch) -> Result<Keystone> {
        let id = parse_id(id, "keystone")?;
        self.limiter.acquire().await;
        self.ensure_owner(Table::Keystones, id).await?;
        let mut keystone = self.backend.get_keystone(id).await?;
        keystone.apply(patch);
        keystone.validate()?;
        if let Some(Some(cid)) = patch.contact_id {
            self.ensure_owner(Table::Contacts, cid).await?;
        }
        self.backend.update_keystone(&keystone).await?;
        Ok(keystone)
    }

    pub async fn delete_keystone(&self, id: &str) -> Result<()> {
        let id = parse_id(id, "keystone")?;
        self.limiter.acquire().await;
        self.ensure_owner(Table::Keystones, id).await?;
        self.backend.delete_keystone(id).await
    }

    // -- Email logs --

    pub async fn log_email(&self, log: &EmailLog) -> Result<()> {
        if log.user_id != self.user_id {
            return Err(CirclError::Forbidden(
                "email log belongs to another user".to_string(),
            ));
        }
        self.limiter.acquire().await;
        self.backend.insert_email_log(log).await
    }

    pub async fn fetch_email_logs(&self, limit: usize) -> Result<Vec<EmailLog>> {
        self.limiter.acquire().await;
        self.backend.list_email_logs(self.user_id, limit).await
    }
}
