use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::domain_model::*;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

pub const ACCESS_TOKEN_HEADER: &str = "access-token";

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // path before method, so an unknown path is a 404 rather than a 405
    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::path!("auth" / "refresh-access-token")
        .and(warp::post())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh_access_token);

    let current = warp::path!("auth" / "current")
        .and(warp::get())
        .and(with_access_guard(server.access_guard.clone(), ANY_ROLE))
        .and(with(server.auth_service.clone()))
        .and_then(handler::current_user);

    login.or(refresh).or(current)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Admits the request only if its access token verifies and carries one of
/// `required_roles`. Extracts the verified claims.
pub fn with_access_guard(
    guard: Arc<dyn AccessGuard>,
    required_roles: &'static [Role],
) -> impl Filter<Extract = (AccessTokenPayload,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(ACCESS_TOKEN_HEADER).and_then(move |token: Option<String>| {
        let guard = guard.clone();
        async move {
            let Some(token) = token else {
                return Err(reject::custom(ApiErrorCode::InvalidToken));
            };
            let token = token.strip_prefix("Bearer ").unwrap_or(&token).to_string();
            match guard.authorize(&AccessToken(token), required_roles) {
                Authorization::Allow(payload) => Ok(payload),
                Authorization::Deny(reason) => Err(reject::custom(ApiErrorCode::from(reason))),
            }
        }
    })
}
