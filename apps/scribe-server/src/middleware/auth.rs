//! Authentication extractors.
//!
//! Sign-in happens in the external authentication service. Requests carry its
//! bearer token, which is only decoded here to learn who is acting.

use std::future::{Ready, ready};

use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, web};
use scribe_core::domain::Identity;
use scribe_core::ports::AuthError;
use scribe_shared::ErrorResponse;

use crate::state::AppState;

/// Signed-in caller, required by write endpoints.
///
/// ```ignore
/// async fn create(user: CurrentUser) -> impl Responder {
///     format!("Hello, {}!", user.0.author_name())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

/// Caller identity when a valid token was sent, `None` otherwise.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<Identity>);

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your session has expired. Please sign in again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let token = bearer_token(req)?;

    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthError::InvalidToken("Server configuration error".to_string()));
    };

    let Some(tokens) = state.tokens.as_ref() else {
        tracing::warn!("Bearer token sent but token authentication is disabled");
        return Err(AuthError::InvalidToken(
            "Token authentication is disabled".to_string(),
        ));
    };

    tokens.validate_token(token)
}

impl FromRequest for CurrentUser {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            authenticate(req)
                .map(CurrentUser)
                .map_err(AuthenticationError),
        )
    }
}

impl FromRequest for OptionalUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = match authenticate(req) {
            Ok(identity) => Some(identity),
            Err(AuthError::MissingAuth) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable token on public route");
                None
            }
        };
        ready(Ok(OptionalUser(identity)))
    }
}
