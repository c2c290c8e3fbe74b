#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use contacts_api::{app, pagination::PageLimits, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

pub fn test_app() -> Router {
    app(AppState::in_memory(PageLimits::default()))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub fn contact_body(first: &str, last: &str, email: &str, birth_date: Option<&str>) -> Value {
    json!({
        "first_name": first,
        "last_name": last,
        "email": email,
        "phone_number": null,
        "address": null,
        "birth_date": birth_date,
    })
}

/// Create a contact and return its id.
pub async fn create(
    app: &Router,
    first: &str,
    last: &str,
    email: &str,
    birth_date: Option<&str>,
) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/contacts",
        Some(contact_body(first, last, email, birth_date)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

pub fn ids(page: &Value) -> Vec<String> {
    page["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap().to_string())
        .collect()
}

pub fn first_names(page: &Value) -> Vec<String> {
    page["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["first_name"].as_str().unwrap().to_string())
        .collect()
}
