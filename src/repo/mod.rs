//! Persistence port for contacts and its implementations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::filter::ContactFilter;
use crate::model::Contact;
use crate::pagination::{Page, PageRequest};

mod memory;
mod postgres;

pub use memory::InMemoryContactRepository;
pub use postgres::PgContactRepository;

/// Storage operations the contact service relies on.
///
/// Implementations persist exactly what they are given: ids, timestamps and
/// field rules are the service's job.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contact>, StoreError>;

    /// Whether another contact already uses `email`, compared case-insensitively.
    /// `exclude` skips the contact being updated.
    async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool, StoreError>;

    async fn insert(&self, contact: &Contact) -> Result<(), StoreError>;

    /// Overwrite the row with `contact.id`. Returns false if no such row exists.
    async fn update(&self, contact: &Contact) -> Result<bool, StoreError>;

    /// Hard delete. Returns false if no such row exists.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list(
        &self,
        filter: &ContactFilter,
        page: PageRequest,
    ) -> Result<Page<Contact>, StoreError>;
}
