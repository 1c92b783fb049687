use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use tracing::error;
use uuid::Uuid;

use crate::error::{AppError, BearerError};
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Bearer,
    ApiKey,
}

impl Scheme {
    pub fn label(&self) -> &'static str {
        match self {
            Scheme::Bearer => "Bearer",
            Scheme::ApiKey => "ApiKey",
        }
    }
}

/// Pulls the credential out of the first `Authorization` value.
///
/// The scheme label is matched case-insensitively and may be followed by any
/// amount of whitespace. A value without the label is returned as-is after
/// trimming. The credential itself is not inspected.
pub fn extract<S: AsRef<str>>(header_values: &[S], scheme: Scheme) -> Result<String, BearerError> {
    let value = header_values
        .first()
        .map(|v| v.as_ref().trim())
        .ok_or(BearerError::MissingCredential)?;

    let credential = match value.split_once(char::is_whitespace) {
        Some((label, rest)) if label.eq_ignore_ascii_case(scheme.label()) => rest.trim(),
        None if value.eq_ignore_ascii_case(scheme.label()) => "",
        _ => value,
    };

    if credential.is_empty() {
        return Err(BearerError::MissingCredential);
    }
    Ok(credential.to_string())
}

/// `Authorization` header values of a request, in order. A value that is not
/// valid UTF-8 keeps its position as an empty string.
pub fn header_values(req: &HttpRequest) -> Vec<&str> {
    req.headers()
        .get_all(AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or(""))
        .collect()
}

/// Identity of the caller, resolved from a valid access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state.sessions.authorize(header_values(req).as_slice()).map(AuthenticatedUser),
            None => {
                error!("AppState is not registered on this app");
                Err(AppError::InternalError("application state missing".into()))
            }
        };
        ready(result)
    }
}
