use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        *code
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some()
        || err.find::<reject::UnsupportedMediaType>().is_some()
        || err.find::<reject::LengthRequired>().is_some()
        || err.find::<reject::PayloadTooLarge>().is_some()
    {
        ApiErrorCode::BadRequest
    } else {
        ApiErrorCode::internal(format!("unhandled rejection: {:?}", err))
    };

    let json = warp::reply::json(&ApiError {
        message: code.to_string(),
        code,
    });
    Ok(warp::reply::with_status(json, code.status()))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    #[error("User not found")]
    UserNotFound,
    #[error("Email is already taken")]
    EmailAlreadyTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Refresh token expired or unknown")]
    RefreshTokenExpiredOrUnknown,
    #[error("Access token is malformed")]
    TokenMalformed,
    #[error("Access token signature is invalid")]
    TokenSignatureInvalid,
    #[error("Access token expired")]
    TokenExpired,
    #[error("Access token is missing or not valid")]
    InvalidToken,
    #[error("Forbidden")]
    Forbidden,
    #[error("Malformed request")]
    BadRequest,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::UserNotFound
            | ApiErrorCode::EmailAlreadyTaken
            | ApiErrorCode::InvalidCredentials
            | ApiErrorCode::RefreshTokenExpiredOrUnknown
            | ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::TokenMalformed
            | ApiErrorCode::TokenSignatureInvalid
            | ApiErrorCode::TokenExpired
            | ApiErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::UserNotFound => ApiErrorCode::UserNotFound,
            AuthError::EmailAlreadyTaken => ApiErrorCode::EmailAlreadyTaken,
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::RefreshTokenExpiredOrUnknown => ApiErrorCode::RefreshTokenExpiredOrUnknown,
            AuthError::TokenMalformed => ApiErrorCode::TokenMalformed,
            AuthError::TokenSignatureInvalid => ApiErrorCode::TokenSignatureInvalid,
            AuthError::TokenExpired => ApiErrorCode::TokenExpired,
            AuthError::Forbidden => ApiErrorCode::Forbidden,
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

impl From<DenyReason> for ApiErrorCode {
    fn from(reason: DenyReason) -> Self {
        ApiErrorCode::from(AuthError::from(reason))
    }
}
