use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored contact row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The writable fields of a contact, already validated.
///
/// Both create and update take the full set; there is no partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl Contact {
    pub fn new(id: Uuid, input: ContactInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone_number: input.phone_number,
            address: input.address,
            birth_date: input.birth_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every writable field, keeping `id` and `created_at`.
    pub fn apply(&mut self, input: ContactInput, now: DateTime<Utc>) {
        self.first_name = input.first_name;
        self.last_name = input.last_name;
        self.email = input.email;
        self.phone_number = input.phone_number;
        self.address = input.address;
        self.birth_date = input.birth_date;
        self.updated_at = now;
    }
}
