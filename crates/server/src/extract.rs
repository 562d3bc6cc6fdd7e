//! Extractors whose rejections render as `JsonApiError` bodies.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::JsonApiError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(JsonApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(JsonApiError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(JsonApiError))]
pub struct ApiQuery<T>(pub T);
