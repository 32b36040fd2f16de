use crate::error::Result;
use crate::model::*;
use uuid::Uuid;

use super::Table;

/// Abstract data service. Every row is scoped by `user_id`; ownership checks
/// live one layer up in [`SecureClient`](crate::secure::SecureClient).
pub trait StorageBackend: Send + Sync {
    // -- Contacts --

    fn list_contacts(
        &self,
        user_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Contact>>> + Send;

    fn get_contact(&self, id: Uuid) -> impl std::future::Future<Output = Result<Contact>> + Send;

    fn insert_contact(
        &self,
        contact: &Contact,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Insert all contacts in one transaction. Either every row lands or none do.
    fn insert_contacts(
        &self,
        contacts: &[Contact],
    ) -> impl std::future::Future<Output = Result<usize>> + Send;

    fn update_contact(
        &self,
        contact: &Contact,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Deleting a contact cascades to its interactions and detaches its keystones.
    fn delete_contact(&self, id: Uuid) -> impl std::future::Future<Output = Result<()>> + Send;

    // -- Interactions (append-only) --

    /// Interactions for a user, newest first, optionally narrowed to one contact.
    fn list_interactions(
        &self,
        user_id: Uuid,
        contact_id: Option<Uuid>,
    ) -> impl std::future::Future<Output = Result<Vec<Interaction>>> + Send;

    /// Store an interaction and advance the contact's `last_contact` if newer.
    fn insert_interaction(
        &self,
        interaction: &Interaction,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    // -- Keystones --

    fn list_keystones(
        &self,
        user_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Keystone>>> + Send;

    fn get_keystone(&self, id: Uuid)
        -> impl std::future::Future<Output = Result<Keystone>> + Send;

    fn insert_keystone(
        &self,
        keystone: &Keystone,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn update_keystone(
        &self,
        keystone: &Keystone,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn delete_keystone(&self, id: Uuid) -> impl std::future::Future<Output = Result<()>> + Send;

    // -- Email logs --

    fn insert_email_log(
        &self,
        log: &EmailLog,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn list_email_logs(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<EmailLog>>> + Send;

    // -- Ownership --

    /// The `user_id` owning row `id` in `table`, or `None` when no such row exists.
    fn owner_of(
        &self,
        table: Table,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Uuid>>> + Send;
}
