use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::ContactRepository;
use crate::error::StoreError;
use crate::filter::ContactFilter;
use crate::model::Contact;
use crate::pagination::{Page, PageRequest};

/// Process-local contact store, kept in creation order.
#[derive(Debug, Default)]
pub struct InMemoryContactRepository {
    rows: RwLock<Vec<Contact>>,
}

impl InMemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contact>, StoreError> {
        Ok(self.rows.read().iter().find(|c| c.id == id).cloned())
    }

    async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool, StoreError> {
        let email = email.to_lowercase();
        Ok(self
            .rows
            .read()
            .iter()
            .any(|c| Some(c.id) != exclude && c.email.to_lowercase() == email))
    }

    async fn insert(&self, contact: &Contact) -> Result<(), StoreError> {
        self.rows.write().push(contact.clone());
        Ok(())
    }

    async fn update(&self, contact: &Contact) -> Result<bool, StoreError> {
        let mut rows = self.rows.write();
        match rows.iter_mut().find(|c| c.id == contact.id) {
            Some(row) => {
                *row = contact.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|c| c.id != id);
        Ok(rows.len() != before)
    }

    async fn list(
        &self,
        filter: &ContactFilter,
        page: PageRequest,
    ) -> Result<Page<Contact>, StoreError> {
        let mut matched: Vec<Contact> = self
            .rows
            .read()
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        matched.sort_by(|a, b| filter.compare(a, b));

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.per_page as usize)
            .collect();
        Ok(Page::new(items, total, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Sort, SortDirection, SortField};
    use crate::model::ContactInput;
    use chrono::{NaiveDate, Utc};

    fn contact(first: &str, email: &str, birth: Option<NaiveDate>) -> Contact {
        Contact::new(
            Uuid::new_v4(),
            ContactInput {
                first_name: first.to_string(),
                last_name: "Tester".to_string(),
                email: email.to_string(),
                phone_number: None,
                address: None,
                birth_date: birth,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn email_lookup_ignores_case_and_excluded_row() {
        let repo = InMemoryContactRepository::new();
        let ada = contact("Ada", "Ada@Example.com", None);
        repo.insert(&ada).await.unwrap();

        assert!(repo.email_taken("ada@example.com", None).await.unwrap());
        assert!(!repo.email_taken("ada@example.com", Some(ada.id)).await.unwrap());
        assert!(!repo.email_taken("bob@example.com", None).await.unwrap());
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let repo = InMemoryContactRepository::new();
        let ghost = contact("Ghost", "ghost@example.com", None);

        assert!(!repo.update(&ghost).await.unwrap());
        assert!(!repo.delete(ghost.id).await.unwrap());

        repo.insert(&ghost).await.unwrap();
        assert!(repo.delete(ghost.id).await.unwrap());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn list_keeps_creation_order_without_sort() {
        let repo = InMemoryContactRepository::new();
        for name in ["Carol", "Alice", "Bob"] {
            repo.insert(&contact(name, &format!("{name}@example.com"), None))
                .await
                .unwrap();
        }

        let page = repo
            .list(&ContactFilter::default(), PageRequest::new(1, 10))
            .await
            .unwrap();
        let names: Vec<_> = page.data.iter().map(|c| c.first_name.as_str()).collect();
        assert_eq!(names, ["Carol", "Alice", "Bob"]);
    }

    #[tokio::test]
    async fn list_sorts_then_slices() {
        let repo = InMemoryContactRepository::new();
        for (name, year) in [("a", 1980), ("b", 1995), ("c", 1970), ("d", 2001)] {
            let birth = NaiveDate::from_ymd_opt(year, 1, 1);
            repo.insert(&contact(name, &format!("{name}@example.com"), birth))
                .await
                .unwrap();
        }
        let filter = ContactFilter {
            sort: Some(Sort {
                field: SortField::BirthDate,
                direction: SortDirection::Desc,
            }),
            ..ContactFilter::default()
        };

        let page = repo.list(&filter, PageRequest::new(2, 2)).await.unwrap();
        let names: Vec<_> = page.data.iter().map(|c| c.first_name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
        assert_eq!(page.total, 4);
        assert_eq!(page.last_page, 2);
    }
}
