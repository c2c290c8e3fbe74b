use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use super::ContactRepository;
use crate::error::StoreError;
use crate::filter::ContactFilter;
use crate::model::Contact;
use crate::pagination::{Page, PageRequest};
use crate::schema::{CONTACT_COLUMNS, CREATE_CONTACTS_TABLE, CREATE_EMAIL_INDEX};

/// `contacts` table access over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgContactRepository {
    pool: PgPool,
}

impl PgContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "connected to postgres");
        Ok(Self::new(pool))
    }

    /// Create the table and its email lookup index if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_CONTACTS_TABLE)
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_EMAIL_INDEX).execute(&self.pool).await?;
        Ok(())
    }
}

/// Escape LIKE metacharacters so `term` matches literally, then wrap it in `%`.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_where(qb: &mut QueryBuilder<'static, Postgres>, filter: &ContactFilter) {
    let mut joiner = " WHERE ";
    if let Some(term) = &filter.search {
        let pattern = contains_pattern(term);
        qb.push(joiner)
            .push("(first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
        joiner = " AND ";
    }
    if let Some(from) = filter.birth_date_from {
        qb.push(joiner).push("birth_date >= ").push_bind(from);
        joiner = " AND ";
    }
    if let Some(to) = filter.birth_date_to {
        qb.push(joiner).push("birth_date <= ").push_bind(to);
    }
}

fn push_order(qb: &mut QueryBuilder<'static, Postgres>, filter: &ContactFilter) {
    // Column names come from the SortField allowlist, never from the request text.
    match filter.sort {
        Some(sort) => {
            qb.push(" ORDER BY ")
                .push(sort.field.column())
                .push(" ")
                .push(sort.direction.as_sql())
                .push(", id ASC");
        }
        None => {
            qb.push(" ORDER BY created_at ASC, id ASC");
        }
    }
}

fn count_query(filter: &ContactFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM contacts");
    push_where(&mut qb, filter);
    qb
}

fn page_query(filter: &ContactFilter, page: PageRequest) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {CONTACT_COLUMNS} FROM contacts"));
    push_where(&mut qb, filter);
    push_order(&mut qb, filter);
    qb.push(" LIMIT ")
        .push_bind(i64::from(page.per_page))
        .push(" OFFSET ")
        .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
    qb
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contact>, StoreError> {
        let contact = sqlx::query_as::<_, Contact>(
            "SELECT id, first_name, last_name, email, phone_number, address, birth_date, \
             created_at, updated_at FROM contacts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contact)
    }

    async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool, StoreError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM contacts \
             WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert(&self, contact: &Contact) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO contacts (id, first_name, last_name, email, phone_number, address, \
             birth_date, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(contact.id)
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.phone_number)
        .bind(&contact.address)
        .bind(contact.birth_date)
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, contact: &Contact) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE contacts SET first_name = $2, last_name = $3, email = $4, \
             phone_number = $5, address = $6, birth_date = $7, updated_at = $8 WHERE id = $1",
        )
        .bind(contact.id)
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.phone_number)
        .bind(&contact.address)
        .bind(contact.birth_date)
        .bind(contact.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        filter: &ContactFilter,
        page: PageRequest,
    ) -> Result<Page<Contact>, StoreError> {
        let total = count_query(filter)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut query = page_query(filter, page);
        debug!(sql = query.sql(), "listing contacts");
        let items = query
            .build_query_as::<Contact>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, u64::try_from(total).unwrap_or(0), page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Sort, SortDirection, SortField};
    use chrono::NaiveDate;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(contains_pattern("john"), "%john%");
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn unfiltered_listing_orders_by_creation() {
        let qb = page_query(&ContactFilter::default(), PageRequest::new(1, 15));
        assert_eq!(
            qb.sql(),
            "SELECT id, first_name, last_name, email, phone_number, address, birth_date, \
             created_at, updated_at FROM contacts ORDER BY created_at ASC, id ASC \
             LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn all_predicates_are_parameterized() {
        let filter = ContactFilter {
            search: Some("o'hara".to_string()),
            birth_date_from: NaiveDate::from_ymd_opt(1990, 1, 1),
            birth_date_to: NaiveDate::from_ymd_opt(2000, 1, 1),
            sort: Some(Sort {
                field: SortField::LastName,
                direction: SortDirection::Desc,
            }),
        };

        assert_eq!(
            count_query(&filter).sql(),
            "SELECT COUNT(*) FROM contacts WHERE (first_name ILIKE $1 OR last_name ILIKE $2 \
             OR email ILIKE $3) AND birth_date >= $4 AND birth_date <= $5"
        );
        assert!(page_query(&filter, PageRequest::new(2, 10))
            .sql()
            .ends_with(" ORDER BY last_name DESC, id ASC LIMIT $6 OFFSET $7"));
    }

    #[test]
    fn upper_bound_alone_starts_the_where_clause() {
        let filter = ContactFilter {
            birth_date_to: NaiveDate::from_ymd_opt(2000, 1, 1),
            ..ContactFilter::default()
        };
        assert_eq!(
            count_query(&filter).sql(),
            "SELECT COUNT(*) FROM contacts WHERE birth_date <= $1"
        );
    }
}
