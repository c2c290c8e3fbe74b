//! Field rules for contact write payloads.
//!
//! Request bodies are first decoded into [`ContactPayload`], which accepts any JSON
//! value for each permitted field and ignores everything else. [`ContactPayload::validate`]
//! then applies the field rules and either produces a typed [`ContactInput`] or
//! collects every failure into [`ValidationErrors`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ContactInput;

/// Field-keyed validation failures, in field name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// One-line summary: the first message, plus a count of the rest.
    pub fn summary(&self) -> String {
        let Some(first) = self.0.values().flatten().next() else {
            return "The given data was invalid.".to_string();
        };
        match self.len() - 1 {
            0 => first.clone(),
            1 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {n} more errors)"),
        }
    }
}

/// Raw contact body. Unknown fields are dropped at decode time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPayload {
    #[serde(default)]
    pub first_name: Option<Value>,
    #[serde(default)]
    pub last_name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub phone_number: Option<Value>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub birth_date: Option<Value>,
}

impl ContactPayload {
    pub fn validate(self) -> Result<ContactInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let first_name = required_string(&mut errors, "first_name", self.first_name);
        let last_name = required_string(&mut errors, "last_name", self.last_name);
        let email = required_string(&mut errors, "email", self.email);
        if let Some(email) = &email {
            if !is_valid_email(email) {
                errors.add(
                    "email",
                    format!("The {} field must be a valid email address.", label("email")),
                );
            }
        }
        let phone_number = optional_string(&mut errors, "phone_number", self.phone_number);
        let address = optional_string(&mut errors, "address", self.address);
        let birth_date = optional_string(&mut errors, "birth_date", self.birth_date)
            .and_then(|raw| match parse_date(&raw) {
                Some(date) => Some(date),
                None => {
                    errors.add(
                        "birth_date",
                        format!("The {} field must be a valid date.", label("birth_date")),
                    );
                    None
                }
            });

        match (first_name, last_name, email) {
            (Some(first_name), Some(last_name), Some(email)) if errors.is_empty() => {
                Ok(ContactInput {
                    first_name,
                    last_name,
                    email,
                    phone_number,
                    address,
                    birth_date,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is kept.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Structural address check: one `@`, a dot-atom local part, and a domain of
/// alphanumeric/hyphen labels.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.is_empty() || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if !local
        .chars()
        .all(|c| c.is_alphanumeric() || "!#$%&'*+-/=?^_`{|}~.".contains(c))
    {
        return false;
    }
    domain.split('.').all(|part| {
        !part.is_empty()
            && part.len() <= 63
            && !part.starts_with('-')
            && !part.ends_with('-')
            && part.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

fn required_string(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<Value>,
) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        None | Some(Value::String(_)) => {
            errors.add(field, format!("The {} field is required.", label(field)));
            None
        }
        Some(_) => {
            errors.add(field, format!("The {} field must be a string.", label(field)));
            None
        }
    }
}

fn optional_string(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<Value>,
) -> Option<String> {
    match value {
        None => None,
        Some(Value::String(s)) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Some(_) => {
            errors.add(field, format!("The {} field must be a string.", label(field)));
            None
        }
    }
}
