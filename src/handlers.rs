use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::filter::ListParams;
use crate::model::Contact;
use crate::pagination::Page;
use crate::routes::AppState;
use crate::validation::ContactPayload;

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

pub async fn list_contacts(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Page<Contact>> {
    let Query(params) = params?;
    let (filter, page) = params.parse(state.limits)?;
    let page = state.contacts.list(filter, page).await?;
    Ok(Json(Envelope::success(
        "Contacts retrieved successfully",
        page,
    )))
}

pub async fn create_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Contact>>), ApiError> {
    let Json(payload) = payload?;
    let contact = state.contacts.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::success("Contact created successfully", contact)),
    ))
}

pub async fn show_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Contact> {
    let contact = state.contacts.get(&id).await?;
    Ok(Json(Envelope::success(
        "Contact retrieved successfully",
        contact,
    )))
}

pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ContactPayload>, JsonRejection>,
) -> ApiResult<Contact> {
    let Json(payload) = payload?;
    let contact = state.contacts.update(&id, payload).await?;
    Ok(Json(Envelope::success(
        "Contact updated successfully",
        contact,
    )))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.contacts.delete(&id).await?;
    Ok(Json(Envelope::message("Contact deleted successfully")))
}
