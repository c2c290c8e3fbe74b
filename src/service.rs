use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::filter::ContactFilter;
use crate::model::Contact;
use crate::pagination::{Page, PageRequest};
use crate::repo::ContactRepository;
use crate::validation::ContactPayload;

/// Business rules for contacts: field validation, email uniqueness, id and
/// timestamp assignment. Persistence goes through the repository port only.
///
/// The email check and the following write are separate repository calls with no
/// transaction around them, so two concurrent writes of the same address can both
/// pass the check.
#[derive(Clone)]
pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
}

/// Path ids that are not UUIDs cannot name a stored contact.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(raw))
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>) -> Self {
        Self { repo }
    }

    #[instrument(name = "contacts.service.list", skip(self, filter))]
    pub async fn list(
        &self,
        filter: ContactFilter,
        page: PageRequest,
    ) -> Result<Page<Contact>, ApiError> {
        let page = self.repo.list(&filter, page).await?;
        debug!(returned = page.data.len(), total = page.total, "listed contacts");
        Ok(page)
    }

    #[instrument(name = "contacts.service.get", skip(self))]
    pub async fn get(&self, id: &str) -> Result<Contact, ApiError> {
        let uuid = parse_id(id)?;
        self.repo
            .find_by_id(uuid)
            .await?
            .ok_or_else(|| ApiError::not_found(id))
    }

    #[instrument(name = "contacts.service.create", skip(self, payload))]
    pub async fn create(&self, payload: ContactPayload) -> Result<Contact, ApiError> {
        let input = payload.validate()?;

        if self.repo.email_taken(&input.email, None).await? {
            warn!(email = %input.email, "rejected duplicate email");
            return Err(ApiError::EmailTaken { email: input.email });
        }

        let contact = Contact::new(Uuid::new_v4(), input, Utc::now());
        self.repo.insert(&contact).await?;

        info!(contact_id = %contact.id, "created contact");
        Ok(contact)
    }

    /// Replace every writable field of an existing contact.
    ///
    /// The id is resolved before the payload is validated, so an unknown id is
    /// reported as not found even when the body is also invalid.
    #[instrument(name = "contacts.service.update", skip(self, payload))]
    pub async fn update(&self, id: &str, payload: ContactPayload) -> Result<Contact, ApiError> {
        let mut contact = self.get(id).await?;
        let input = payload.validate()?;

        if input.email != contact.email
            && self.repo.email_taken(&input.email, Some(contact.id)).await?
        {
            warn!(email = %input.email, "rejected duplicate email");
            return Err(ApiError::EmailTaken { email: input.email });
        }

        contact.apply(input, Utc::now());
        if !self.repo.update(&contact).await? {
            // Deleted between the lookup and the write.
            return Err(ApiError::not_found(id));
        }

        info!(contact_id = %contact.id, "updated contact");
        Ok(contact)
    }

    #[instrument(name = "contacts.service.delete", skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let uuid = parse_id(id)?;
        if !self.repo.delete(uuid).await? {
            return Err(ApiError::not_found(id));
        }
        info!(contact_id = %uuid, "deleted contact");
        Ok(())
    }
}
