use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_contact, delete_contact, list_contacts, show_contact, update_contact,
};
use crate::pagination::PageLimits;
use crate::repo::{ContactRepository, InMemoryContactRepository};
use crate::service::ContactService;

#[derive(Clone)]
pub struct AppState {
    pub contacts: ContactService,
    pub limits: PageLimits,
}

impl AppState {
    pub fn new(repo: Arc<dyn ContactRepository>, limits: PageLimits) -> Self {
        Self {
            contacts: ContactService::new(repo),
            limits,
        }
    }

    /// State backed by a fresh in-process store.
    pub fn in_memory(limits: PageLimits) -> Self {
        Self::new(Arc::new(InMemoryContactRepository::new()), limits)
    }
}

/// The `/contacts` resource routes with request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route(
            "/contacts/:id",
            get(show_contact)
                .put(update_contact)
                .patch(update_contact)
                .delete(delete_contact),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
