//! REST API over a `contacts` table: create, read, update, delete, and a
//! searchable, sortable, paginated listing.

pub mod config;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod model;
pub mod pagination;
pub mod repo;
pub mod routes;
pub mod schema;
pub mod service;
pub mod validation;

pub use config::Config;
pub use error::{ApiError, StoreError};
pub use routes::{app, AppState};
