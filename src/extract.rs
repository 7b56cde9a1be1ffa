//! `Json` and `Path` with rejections reported as [`ChatError`], so a bad body
//! or path segment gets the same `{"error": ...}` response as everything else.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::ChatError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ChatError))]
pub struct AppJson<T>(pub T);

impl<T: Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        let Self(value) = self;
        axum::Json(value).into_response()
    }
}

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ChatError))]
pub struct AppPath<T>(pub T);

impl From<JsonRejection> for ChatError {
    fn from(rejection: JsonRejection) -> Self {
        ChatError::validation("body", rejection.body_text())
    }
}

impl From<PathRejection> for ChatError {
    fn from(rejection: PathRejection) -> Self {
        ChatError::validation("path", rejection.body_text())
    }
}
