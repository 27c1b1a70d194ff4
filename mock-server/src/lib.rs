//! REST fixture server used by the end-to-end tests.
//!
//! Serves a small user resource plus a handful of diagnostic routes: fixed
//! status codes, an empty 200, a redirect, header and body echoes, and a
//! resource behind HTTP Basic authentication.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Realm advertised by `/protected`.
pub const REALM: &str = "Restricted";
/// User accepted by `/protected`.
pub const PROTECTED_USER: &str = "test";
/// Password accepted by `/protected`.
pub const PROTECTED_PASSWORD: &str = "testPassword";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub username: String,
}

#[derive(Deserialize)]
pub struct UserQuery {
    pub user: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, User>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/user", get(find_user))
        .route("/status/{code}", get(status).post(status))
        .route("/empty", get(empty))
        .route("/redirect", get(redirect))
        .route(
            "/echo",
            get(echo_body)
                .post(echo_body)
                .put(echo_body)
                .patch(echo_body)
                .delete(echo_body),
        )
        .route("/echo/headers", get(echo_headers))
        .route("/protected", get(protected))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_users(State(db): State<Db>) -> Json<Vec<User>> {
    let users = db.read().await;
    Json(users.values().cloned().collect())
}

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<CreateUser>,
) -> (StatusCode, Json<User>) {
    let user = User {
        id: Uuid::new_v4(),
        username: input.username,
    };
    db.write().await.insert(user.id, user.clone());
    tracing::debug!(id = %user.id, "created user");
    (StatusCode::CREATED, Json(user))
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, StatusCode> {
    let users = db.read().await;
    users.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut users = db.write().await;
    users.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn find_user(
    State(db): State<Db>,
    Query(query): Query<UserQuery>,
) -> Result<Json<User>, StatusCode> {
    let users = db.read().await;
    users
        .values()
        .find(|user| user.username == query.user)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn redirect() -> Redirect {
    Redirect::temporary("/empty")
}

async fn echo_body(body: Bytes) -> Bytes {
    body
}

async fn echo_headers(headers: HeaderMap) -> Json<HashMap<String, String>> {
    Json(
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect(),
    )
}

async fn protected(headers: HeaderMap) -> Response {
    if is_authorized(&headers) {
        return Json(serde_json::json!({ "realm": REALM })).into_response();
    }
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{REALM}\""))],
    )
        .into_response()
}

fn is_authorized(headers: &HeaderMap) -> bool {
    let expected = base64::engine::general_purpose::STANDARD
        .encode(format!("{PROTECTED_USER}:{PROTECTED_PASSWORD}"));
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .is_some_and(|token| token == expected)
}
