use crate::api::APIResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::error::Error;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod model;
pub mod repository;
pub mod routes;

pub fn server_error(body: APIResponse) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Flattens an error and its sources into `outer: inner: root`.
pub fn unpack_error(err: &dyn Error) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
