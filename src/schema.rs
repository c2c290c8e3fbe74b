//! Layout of the `contacts` table.

/// Columns of a full contact row, in [`Contact`](crate::model::Contact) field order.
pub const CONTACT_COLUMNS: &str =
    "id, first_name, last_name, email, phone_number, address, birth_date, created_at, updated_at";

pub const CREATE_CONTACTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS contacts (
    id UUID PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL,
    phone_number TEXT NULL,
    address TEXT NULL,
    birth_date DATE NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
)
"#;

// Lookup index for the email check. Not UNIQUE: the service checks uniqueness
// before writing, and that check is not atomic with the write.
pub const CREATE_EMAIL_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS contacts_email_lower_idx ON contacts (LOWER(email))";
