use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokengate::api;
use tokengate::application_impl::{JwtConfig, JwtHs256Signer};
use tokengate::application_port::TokenSigner;
use tokengate::domain_model::{AccessGrant, Role, SubjectId};
use tokengate::server::Server;
use tokengate::settings::parse_settings_str;
use warp::Filter;
use warp::http::StatusCode;

const SETTINGS: &str = r#"
    [auth]
    signing_secret = "http-test-secret"
    issuer = "tokengate.test"
    audience = "test-client"
    access_ttl_secs = 900
    refresh_ttl_secs = 3600

    [http]
    address = "127.0.0.1:0"

    [log]
    filter = "warn"

    [store]
    backend = "memory"
    prefix = "auth:refresh"
    sweep_interval_secs = 60

    [[directory.users]]
    id = "u1"
    email = "admin@example.com"
    role = "admin"
    credential = "admin-password"

    [[directory.users]]
    id = "u2"
    email = "user@example.com"
    role = "user"
    credential = "user-password"
"#;

async fn server() -> Arc<Server> {
    let settings = parse_settings_str(SETTINGS).expect("settings");
    Arc::new(Server::try_new(&settings).await.expect("server"))
}

fn app(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    api::routes(server).recover(api::recover_error)
}

fn body(res: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
    serde_json::from_slice(res.body()).expect("json body")
}

async fn login(server: &Arc<Server>, email: &str, password: &str) -> Value {
    let res = warp::test::request()
        .method("POST")
        .path("/auth/login")
        .json(&json!({ "email": email, "password": password }))
        .reply(&app(server.clone()))
        .await;
    assert_eq!(res.status(), StatusCode::OK, "login failed: {:?}", res.body());
    body(&res)
}

#[tokio::test]
async fn login_returns_tokens_and_profile() {
    let server = server().await;
    let login = login(&server, "admin@example.com", "admin-password").await;

    assert_eq!(login["id"], "u1");
    assert_eq!(login["email"], "admin@example.com");
    assert_eq!(login["role"], "admin");
    assert!(login["accessToken"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(login["refreshToken"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn login_failures_are_client_errors() {
    let server = server().await;

    let unknown = warp::test::request()
        .method("POST")
        .path("/auth/login")
        .json(&json!({ "email": "ghost@example.com", "password": "x" }))
        .reply(&app(server.clone()))
        .await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&unknown)["code"], "USER_NOT_FOUND");

    let wrong = warp::test::request()
        .method("POST")
        .path("/auth/login")
        .json(&json!({ "email": "admin@example.com", "password": "nope" }))
        .reply(&app(server.clone()))
        .await;
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&wrong)["code"], "INVALID_CREDENTIALS");

    let malformed = warp::test::request()
        .method("POST")
        .path("/auth/login")
        .header("content-type", "application/json")
        .body("{\"email\":")
        .reply(&app(server.clone()))
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_rotates_once() {
    let server = server().await;
    let login = login(&server, "user@example.com", "user-password").await;
    let request = json!({
        "accessToken": login["accessToken"],
        "refreshToken": login["refreshToken"],
    });

    let first = warp::test::request()
        .method("POST")
        .path("/auth/refresh-access-token")
        .json(&request)
        .reply(&app(server.clone()))
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    let rotated = body(&first);
    assert_ne!(rotated["accessToken"], login["accessToken"]);
    assert_ne!(rotated["refreshToken"], login["refreshToken"]);

    let replay = warp::test::request()
        .method("POST")
        .path("/auth/refresh-access-token")
        .json(&request)
        .reply(&app(server.clone()))
        .await;
    assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&replay)["code"], "REFRESH_TOKEN_EXPIRED_OR_UNKNOWN");
}

#[tokio::test]
async fn current_user_requires_a_verified_token() {
    let server = server().await;
    let login = login(&server, "admin@example.com", "admin-password").await;
    let token = login["accessToken"].as_str().expect("token").to_string();

    let ok = warp::test::request()
        .method("GET")
        .path("/auth/current")
        .header("access-token", &token)
        .reply(&app(server.clone()))
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(
        body(&ok),
        json!({ "id": "u1", "email": "admin@example.com", "role": "admin" })
    );

    let bearer = warp::test::request()
        .method("GET")
        .path("/auth/current")
        .header("access-token", format!("Bearer {}", token))
        .reply(&app(server.clone()))
        .await;
    assert_eq!(bearer.status(), StatusCode::OK);

    let missing = warp::test::request()
        .method("GET")
        .path("/auth/current")
        .reply(&app(server.clone()))
        .await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(&missing)["code"], "INVALID_TOKEN");

    let garbage = warp::test::request()
        .method("GET")
        .path("/auth/current")
        .header("access-token", "not-a-jwt")
        .reply(&app(server.clone()))
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(&garbage)["code"], "TOKEN_MALFORMED");

    let foreign = JwtHs256Signer::new(JwtConfig {
        issuer: "tokengate.test".to_string(),
        audience: "test-client".to_string(),
        access_ttl: Duration::from_secs(900),
        signing_key: b"not-our-secret".to_vec(),
    });
    let (forged, _) = foreign
        .issue(&AccessGrant {
            subject_id: SubjectId("u1".to_string()),
            role: Role::SuperAdmin,
        })
        .expect("forge");
    let forged = warp::test::request()
        .method("GET")
        .path("/auth/current")
        .header("access-token", forged.0.as_str())
        .reply(&app(server.clone()))
        .await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(&forged)["code"], "TOKEN_SIGNATURE_INVALID");
}

#[tokio::test]
async fn role_guard_filter_rejects_lower_roles() {
    use tokengate::application_port::ONLY_ADMIN;

    let server = server().await;
    let admin_only = warp::path!("admin")
        .and(api::with_access_guard(server.access_guard.clone(), ONLY_ADMIN))
        .map(|payload: tokengate::domain_model::AccessTokenPayload| payload.subject_id.0)
        .recover(api::recover_error);

    let user = login(&server, "user@example.com", "user-password").await;
    let admin = login(&server, "admin@example.com", "admin-password").await;

    let denied = warp::test::request()
        .path("/admin")
        .header("access-token", user["accessToken"].as_str().expect("token"))
        .reply(&admin_only)
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    assert_eq!(body(&denied)["code"], "FORBIDDEN");

    let allowed = warp::test::request()
        .path("/admin")
        .header("access-token", admin["accessToken"].as_str().expect("token"))
        .reply(&admin_only)
        .await;
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(allowed.body().as_ref(), b"u1");

    server.shutdown().await;
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let server = server().await;
    let res = warp::test::request()
        .method("GET")
        .path("/auth/nope")
        .reply(&app(server))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
