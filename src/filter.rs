//! List query parameters and the filter they describe.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::model::Contact;
use crate::pagination::{PageLimits, PageRequest};
use crate::validation::{parse_date, ValidationErrors};

/// Columns a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    FirstName,
    LastName,
    Email,
    PhoneNumber,
    Address,
    BirthDate,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const ALL: [SortField; 9] = [
        SortField::Id,
        SortField::FirstName,
        SortField::LastName,
        SortField::Email,
        SortField::PhoneNumber,
        SortField::Address,
        SortField::BirthDate,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::FirstName => "first_name",
            SortField::LastName => "last_name",
            SortField::Email => "email",
            SortField::PhoneNumber => "phone_number",
            SortField::Address => "address",
            SortField::BirthDate => "birth_date",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    /// Ascending comparison of one column; nulls sort after every value.
    fn compare(self, a: &Contact, b: &Contact) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::FirstName => a.first_name.cmp(&b.first_name),
            SortField::LastName => a.last_name.cmp(&b.last_name),
            SortField::Email => a.email.cmp(&b.email),
            SortField::PhoneNumber => nulls_last(&a.phone_number, &b.phone_number),
            SortField::Address => nulls_last(&a.address, &b.address),
            SortField::BirthDate => nulls_last(&a.birth_date, &b.birth_date),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

fn nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.column() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Predicates and ordering for a contact listing.
///
/// Every predicate present must hold. `search` is a case-insensitive substring
/// match against first name, last name or email; the birth date bounds are
/// inclusive and never match a contact without a birth date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    pub search: Option<String>,
    pub birth_date_from: Option<NaiveDate>,
    pub birth_date_to: Option<NaiveDate>,
    pub sort: Option<Sort>,
}

impl ContactFilter {
    pub fn matches(&self, contact: &Contact) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = [&contact.first_name, &contact.last_name, &contact.email]
                .iter()
                .any(|value| value.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        if let Some(from) = self.birth_date_from {
            if !contact.birth_date.is_some_and(|d| d >= from) {
                return false;
            }
        }
        if let Some(to) = self.birth_date_to {
            if !contact.birth_date.is_some_and(|d| d <= to) {
                return false;
            }
        }
        true
    }

    /// Ordering for in-process listings. Without an explicit sort every pair
    /// compares equal, so a stable sort keeps creation order.
    pub fn compare(&self, a: &Contact, b: &Contact) -> Ordering {
        let Some(sort) = self.sort else {
            return Ordering::Equal;
        };
        let ord = sort.field.compare(a, b);
        let ord = match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        ord.then_with(|| a.id.cmp(&b.id))
    }
}

/// Raw `GET /contacts` query string.
///
/// Every value is kept as text so that empty or malformed values can be reported
/// in the response envelope instead of as an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub search: Option<String>,
    pub birth_date: Option<String>,
    pub birth_date_before: Option<String>,
    pub sort_by: Option<String>,
    pub order_direction: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ListParams {
    pub fn parse(
        self,
        limits: PageLimits,
    ) -> Result<(ContactFilter, PageRequest), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let page = present(self.page)
            .and_then(|raw| raw.parse::<u32>().ok())
            .unwrap_or(1);

        let per_page = match present(self.per_page) {
            None => limits.default_per_page,
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => limits.default_per_page,
                Ok(n) => u32::try_from(n)
                    .unwrap_or(u32::MAX)
                    .min(limits.max_per_page),
                Err(_) => {
                    errors.add("per_page", "The per page field must be a positive integer.");
                    limits.default_per_page
                }
            },
        };

        let mut date_bound = |field: &str, value: Option<String>| {
            present(value).and_then(|raw| {
                let date = parse_date(&raw);
                if date.is_none() {
                    errors.add(
                        field,
                        format!("The {} field must be a valid date.", field.replace('_', " ")),
                    );
                }
                date
            })
        };
        let birth_date_from = date_bound("birth_date", self.birth_date);
        let birth_date_to = date_bound("birth_date_before", self.birth_date_before);

        let sort = match present(self.sort_by) {
            None => None,
            Some(raw) => {
                let direction = match present(self.order_direction) {
                    None => Some(SortDirection::Asc),
                    Some(dir) => dir.parse::<SortDirection>().ok().or_else(|| {
                        errors.add(
                            "order_direction",
                            "The order direction field must be either asc or desc.",
                        );
                        None
                    }),
                };
                let field = raw.parse::<SortField>().ok().or_else(|| {
                    let allowed: Vec<&str> = SortField::ALL.iter().map(|f| f.column()).collect();
                    errors.add(
                        "sort_by",
                        format!("The sort by field must be one of: {}.", allowed.join(", ")),
                    );
                    None
                });
                field.zip(direction).map(|(field, direction)| Sort { field, direction })
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let filter = ContactFilter {
            search: present(self.search),
            birth_date_from,
            birth_date_to,
            sort,
        };
        Ok((filter, PageRequest::new(page, per_page)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn contact(first: &str, last: &str, email: &str, birth: Option<(i32, u32, u32)>) -> Contact {
        let now = Utc::now();
        Contact {
            id: Uuid::new_v4(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone_number: None,
            address: None,
            birth_date: birth.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            created_at: now,
            updated_at: now,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let object = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(object)).unwrap()
    }

    #[test]
    fn defaults_when_nothing_given() {
        let (filter, page) = ListParams::default().parse(PageLimits::default()).unwrap();
        assert_eq!(filter, ContactFilter::default());
        assert_eq!(page, PageRequest::new(1, 15));
    }

    #[test]
    fn empty_and_zero_values_are_absent() {
        let (filter, page) = params(&[
            ("per_page", "0"),
            ("search", "   "),
            ("birth_date", ""),
            ("page", "nope"),
        ])
        .parse(PageLimits::default())
        .unwrap();
        assert!(filter.search.is_none());
        assert!(filter.birth_date_from.is_none());
        assert_eq!(page, PageRequest::new(1, 15));
    }

    #[test]
    fn per_page_is_clamped_or_rejected() {
        let (_, page) = params(&[("per_page", "5000"), ("page", "3")])
            .parse(PageLimits::default())
            .unwrap();
        assert_eq!(page, PageRequest::new(3, 100));

        let errors = params(&[("per_page", "-2")])
            .parse(PageLimits::default())
            .unwrap_err();
        assert!(errors.field("per_page").is_some());
    }

    #[test]
    fn sort_by_is_checked_against_columns() {
        let (filter, _) = params(&[("sort_by", "birth_date"), ("order_direction", "DESC")])
            .parse(PageLimits::default())
            .unwrap();
        assert_eq!(
            filter.sort,
            Some(Sort {
                field: SortField::BirthDate,
                direction: SortDirection::Desc
            })
        );

        let errors = params(&[("sort_by", "id; DROP TABLE contacts"), ("order_direction", "up")])
            .parse(PageLimits::default())
            .unwrap_err();
        assert!(errors.field("sort_by").is_some());
        assert!(errors.field("order_direction").is_some());
    }

    #[test]
    fn direction_without_sort_is_ignored() {
        let (filter, _) = params(&[("order_direction", "sideways")])
            .parse(PageLimits::default())
            .unwrap();
        assert!(filter.sort.is_none());
    }

    #[test]
    fn invalid_birth_date_bounds_are_rejected() {
        let errors = params(&[("birth_date", "1990-13-01"), ("birth_date_before", "soon")])
            .parse(PageLimits::default())
            .unwrap_err();
        assert_eq!(
            errors.field("birth_date_before").unwrap(),
            ["The birth date before field must be a valid date."]
        );
        assert!(errors.field("birth_date").is_some());
    }

    #[test]
    fn search_matches_names_and_email_case_insensitively() {
        let filter = ContactFilter {
            search: Some("JOHN".to_string()),
            ..ContactFilter::default()
        };
        assert!(filter.matches(&contact("Johnny", "Cash", "jc@example.com", None)));
        assert!(filter.matches(&contact("Elton", "Johnson", "e@example.com", None)));
        assert!(filter.matches(&contact("A", "B", "bigjohn@example.com", None)));
        assert!(!filter.matches(&contact("Jane", "Doe", "jane@example.com", None)));
    }

    #[test]
    fn birth_date_range_is_inclusive_and_skips_nulls() {
        let filter = ContactFilter {
            birth_date_from: NaiveDate::from_ymd_opt(1990, 1, 1),
            birth_date_to: NaiveDate::from_ymd_opt(2000, 1, 1),
            ..ContactFilter::default()
        };
        assert!(filter.matches(&contact("a", "a", "a@x.io", Some((1990, 1, 1)))));
        assert!(filter.matches(&contact("b", "b", "b@x.io", Some((2000, 1, 1)))));
        assert!(!filter.matches(&contact("c", "c", "c@x.io", Some((1989, 12, 31)))));
        assert!(!filter.matches(&contact("d", "d", "d@x.io", Some((2000, 1, 2)))));
        assert!(!filter.matches(&contact("e", "e", "e@x.io", None)));
    }

    #[test]
    fn nulls_sort_last_ascending_and_first_descending() {
        let dated = contact("a", "a", "a@x.io", Some((1990, 1, 1)));
        let undated = contact("b", "b", "b@x.io", None);
        let mut filter = ContactFilter {
            sort: Some(Sort {
                field: SortField::BirthDate,
                direction: SortDirection::Asc,
            }),
            ..ContactFilter::default()
        };
        assert_eq!(filter.compare(&dated, &undated), Ordering::Less);

        filter.sort = Some(Sort {
            field: SortField::BirthDate,
            direction: SortDirection::Desc,
        });
        assert_eq!(filter.compare(&dated, &undated), Ordering::Greater);
    }
}
