//! Standard response envelope helpers: `{success, data, pagination, message, error}`.

use crate::error::ErrorKind;
use crate::service::{PaginatedResult, Pagination};
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl<T> Envelope<T> {
    fn ok(data: Option<T>, message: Option<String>) -> Self {
        Envelope {
            success: true,
            data,
            pagination: None,
            message,
            error: None,
        }
    }
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::ok(Some(data), None)))
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::ok(Some(data), None)))
}

pub fn success_page<T: Serialize>(
    result: PaginatedResult<T>,
    message: impl Into<String>,
) -> (StatusCode, Json<Envelope<Vec<T>>>) {
    let mut body = Envelope::ok(Some(result.data), Some(message.into()));
    body.pagination = Some(result.pagination);
    (StatusCode::OK, Json(body))
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<Envelope<Vec<T>>>) {
    (StatusCode::OK, Json(Envelope::ok(Some(data), None)))
}

pub fn success_message(message: impl Into<String>) -> (StatusCode, Json<Envelope<()>>) {
    (StatusCode::OK, Json(Envelope::ok(None, Some(message.into()))))
}

pub fn error_envelope(kind: ErrorKind, message: String) -> Envelope<()> {
    Envelope {
        success: false,
        data: None,
        pagination: None,
        message: Some(message),
        error: Some(kind.code()),
    }
}
