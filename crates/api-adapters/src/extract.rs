//! Identity extractors.
//!
//! Authentication happens upstream; by the time a request reaches these
//! routes the auth middleware has put the verified email in `x-user-email`.

use std::convert::Infallible;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user-email";

fn header_email(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Required identity for mutating routes.
#[derive(Debug, Clone)]
pub struct ActingUser(pub String);

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_email(parts).map(ActingUser).ok_or(ApiError::MissingIdentity)
    }
}

/// Optional identity for read routes; anonymous viewers see `is_liked: false`.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<String>);

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(header_email(parts)))
    }
}

/// `axum::Json` whose rejections answer as `ApiError` (400, `{"error": ..}`).
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
