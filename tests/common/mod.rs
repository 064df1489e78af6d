//! In-process mock of the SoleMate REST backend, served by axum on an
//! ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use solemate::api::ApiClient;
use solemate::models::{AdminUser, ArchType, Foot, Review, Role};
use solemate::navigation::Navigator;
use solemate::session::SessionStore;

#[derive(Clone, Debug)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Default)]
pub struct Backend {
    pub users: Vec<UserRow>,
    pub feet: Vec<Foot>,
    /// (foot id, review)
    pub reviews: Vec<(i64, Review)>,
    next_id: i64,
    /// Every request seen: ("GET /feet", Authorization header).
    pub requests: Vec<(String, Option<String>)>,
    /// Raw 200 body sent back by `/auth/login` instead of a token.
    pub login_body: Option<String>,
    /// Make `POST /feet` fail with a 500 whatever the image.
    pub fail_create: bool,
}

impl Backend {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, call: String, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.push((call, auth));
    }

    fn caller(&self, headers: &HeaderMap) -> Option<UserRow> {
        let header = headers.get("authorization")?.to_str().ok()?;
        let name = header.strip_prefix("Bearer tok-")?;
        self.users.iter().find(|u| u.username == name).cloned()
    }
}

type Shared = Arc<Mutex<Backend>>;

pub struct MockBackend {
    pub url: String,
    state: Shared,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Backend::default()));
        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/me", get(me))
            .route("/feet", get(list_feet).post(create_foot))
            .route("/feet/{id}", axum::routing::delete(delete_foot))
            .route("/feet/{id}/reviews", get(list_reviews).post(create_review))
            .route("/feet/reviews/{id}", put(update_review).delete(delete_review))
            .route("/admin/users", get(admin_users))
            .route(
                "/admin/users/{id}",
                put(update_admin_user).delete(delete_admin_user),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn backend(&self) -> MutexGuard<'_, Backend> {
        self.state.lock().unwrap()
    }

    /// Client with an in-memory session, optionally logged in as `user`.
    pub fn client(&self, user: Option<&str>, route: &str) -> ApiClient {
        let session = SessionStore::in_memory();
        if let Some(user) = user {
            session.save_token(&format!("tok-{}", user)).unwrap();
        }
        ApiClient::new(&self.url, &self.url, session, Navigator::new(route))
    }

    pub fn add_user(&self, username: &str, role: Role) -> i64 {
        let mut backend = self.backend();
        let id = backend.next_id();
        backend.users.push(UserRow {
            id,
            username: username.into(),
            email: format!("{}@solemate.test", username),
            password: "secret".into(),
            role,
        });
        id
    }

    pub fn add_foot(&self, owner: &str, title: &str) -> i64 {
        let mut backend = self.backend();
        let id = backend.next_id();
        backend.feet.push(Foot {
            id,
            title: title.into(),
            image_url: format!("https://img.test/{}.png", id),
            arch_type: ArchType::PesRectus,
            owner_username: owner.into(),
            created_at: "2024-05-01T10:00:00".into(),
        });
        id
    }

    pub fn add_review(&self, foot_id: i64, user: &str, rating: u8, created_at: &str) -> i64 {
        let mut backend = self.backend();
        let id = backend.next_id();
        backend.reviews.push((
            foot_id,
            Review {
                id,
                comment: format!("review de {}", user),
                rate_aspect: rating,
                review_username: user.into(),
                created_at: created_at.into(),
            },
        ));
        id
    }

    pub fn calls(&self, call: &str) -> usize {
        self.backend()
            .requests
            .iter()
            .filter(|(c, _)| c == call)
            .count()
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn unauthorized() -> Response {
    message(StatusCode::UNAUTHORIZED, "Token inválido o expirado")
}

async fn login(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record("POST /auth/login".into(), &headers);
    if let Some(raw) = backend.login_body.clone() {
        return (StatusCode::OK, raw).into_response();
    }
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match backend
        .users
        .iter()
        .find(|u| u.username == username && u.password == password)
    {
        Some(user) => Json(json!({ "token": format!("tok-{}", user.username) })).into_response(),
        None => message(StatusCode::UNAUTHORIZED, "Credenciales incorrectas"),
    }
}

async fn register(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record("POST /auth/register".into(), &headers);
    let username = body["username"].as_str().unwrap_or_default().to_string();
    if backend.users.iter().any(|u| u.username == username) {
        return message(StatusCode::CONFLICT, "El usuario ya existe");
    }
    let id = backend.next_id();
    backend.users.push(UserRow {
        id,
        username,
        email: body["email"].as_str().unwrap_or_default().into(),
        password: body["password"].as_str().unwrap_or_default().into(),
        role: Role::User,
    });
    // Plain-text body, like the real service.
    (StatusCode::OK, "User registered successfully").into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record("GET /auth/me".into(), &headers);
    match backend.caller(&headers) {
        Some(user) => Json(json!({
            "id": user.id,
            "username": user.username,
            "role": user.role,
        }))
        .into_response(),
        None => unauthorized(),
    }
}

async fn list_feet(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record("GET /feet".into(), &headers);
    if backend.caller(&headers).is_none() {
        return unauthorized();
    }
    Json(backend.feet.clone()).into_response()
}

async fn create_foot(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record("POST /feet".into(), &headers);
    let Some(user) = backend.caller(&headers) else {
        return unauthorized();
    };
    let image_url = body["imageUrl"].as_str().unwrap_or_default().to_string();
    // The real column is too short for inline images.
    if backend.fail_create || image_url.starts_with("data:image/") {
        return message(
            StatusCode::INTERNAL_SERVER_ERROR,
            "could not execute statement; value too long for column image_url",
        );
    }
    if let Some(existing) = backend.feet.iter().find(|f| f.image_url == image_url) {
        let text = format!("Ya existe un foot con esa imagen (id {})", existing.id);
        return message(StatusCode::CONFLICT, &text);
    }
    let arch_type: ArchType =
        serde_json::from_value(body["archType"].clone()).unwrap_or_default();
    let id = backend.next_id();
    let foot = Foot {
        id,
        title: body["title"].as_str().unwrap_or_default().into(),
        image_url,
        arch_type,
        owner_username: user.username,
        created_at: "2024-06-01T12:00:00".into(),
    };
    backend.feet.push(foot.clone());
    Json(foot).into_response()
}

async fn delete_foot(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record(format!("DELETE /feet/{}", id), &headers);
    let Some(user) = backend.caller(&headers) else {
        return unauthorized();
    };
    let Some(foot) = backend.feet.iter().find(|f| f.id == id).cloned() else {
        return message(StatusCode::NOT_FOUND, "Foot not found");
    };
    if foot.owner_username != user.username && user.role != Role::Admin {
        return message(StatusCode::FORBIDDEN, "No puedes borrar este foot");
    }
    if backend.reviews.iter().any(|(foot_id, _)| *foot_id == id) {
        return message(
            StatusCode::INTERNAL_SERVER_ERROR,
            "could not execute statement; constraint [fk_review_foot]",
        );
    }
    backend.feet.retain(|f| f.id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_reviews(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record(format!("GET /feet/{}/reviews", id), &headers);
    if backend.caller(&headers).is_none() {
        return unauthorized();
    }
    let reviews: Vec<Review> = backend
        .reviews
        .iter()
        .filter(|(foot_id, _)| *foot_id == id)
        .map(|(_, r)| r.clone())
        .collect();
    Json(reviews).into_response()
}

async fn create_review(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record(format!("POST /feet/{}/reviews", id), &headers);
    let Some(user) = backend.caller(&headers) else {
        return unauthorized();
    };
    if backend
        .reviews
        .iter()
        .any(|(foot_id, r)| *foot_id == id && r.review_username == user.username)
    {
        return message(StatusCode::BAD_REQUEST, "You already review this foot");
    }
    let review_id = backend.next_id();
    let review = Review {
        id: review_id,
        comment: body["comment"].as_str().unwrap_or_default().into(),
        rate_aspect: body["rateAspect"].as_u64().unwrap_or_default() as u8,
        review_username: user.username,
        created_at: "2024-06-02T08:00:00".into(),
    };
    backend.reviews.push((id, review.clone()));
    Json(review).into_response()
}

async fn update_review(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record(format!("PUT /feet/reviews/{}", id), &headers);
    let Some(user) = backend.caller(&headers) else {
        return unauthorized();
    };
    let Some((_, review)) = backend.reviews.iter_mut().find(|(_, r)| r.id == id) else {
        return message(StatusCode::NOT_FOUND, "Review not found");
    };
    if review.review_username != user.username {
        return message(StatusCode::FORBIDDEN, "Solo el autor puede editar");
    }
    review.comment = body["comment"].as_str().unwrap_or_default().into();
    review.rate_aspect = body["rateAspect"].as_u64().unwrap_or_default() as u8;
    Json(review.clone()).into_response()
}

async fn delete_review(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record(format!("DELETE /feet/reviews/{}", id), &headers);
    match backend.caller(&headers) {
        Some(user) if user.role == Role::Admin => {
            backend.reviews.retain(|(_, r)| r.id != id);
            StatusCode::NO_CONTENT.into_response()
        }
        Some(_) => message(StatusCode::FORBIDDEN, "Solo admins"),
        None => unauthorized(),
    }
}

async fn admin_users(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record("GET /admin/users".into(), &headers);
    match backend.caller(&headers) {
        Some(user) if user.role == Role::Admin => {}
        Some(_) => return message(StatusCode::FORBIDDEN, "Solo admins"),
        None => return unauthorized(),
    }

    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    let size: usize = params.get("size").and_then(|s| s.parse().ok()).unwrap_or(10);
    let search = params.get("search").cloned().unwrap_or_default();

    let matching: Vec<AdminUser> = backend
        .users
        .iter()
        .filter(|u| search.is_empty() || u.username.contains(&search) || u.email.contains(&search))
        .map(|u| AdminUser {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            role: u.role,
            created_at: "2024-01-01T00:00:00".into(),
        })
        .collect();
    let total = matching.len();
    let content: Vec<AdminUser> = matching.into_iter().skip(page * size).take(size).collect();

    Json(json!({
        "content": content,
        "totalPages": total.div_ceil(size),
        "totalElements": total,
        "size": size,
        "number": page,
    }))
    .into_response()
}

async fn update_admin_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record(format!("PUT /admin/users/{}", id), &headers);
    if backend.caller(&headers).is_none() {
        return unauthorized();
    }
    let Some(user) = backend.users.iter_mut().find(|u| u.id == id) else {
        return message(StatusCode::NOT_FOUND, "Usuario no encontrado");
    };
    if let Some(email) = body["email"].as_str() {
        user.email = email.into();
    }
    if let Ok(role) = serde_json::from_value::<Role>(body["role"].clone()) {
        user.role = role;
    }
    Json(AdminUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
        created_at: "2024-01-01T00:00:00".into(),
    })
    .into_response()
}

async fn delete_admin_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.record(format!("DELETE /admin/users/{}", id), &headers);
    if backend.caller(&headers).is_none() {
        return unauthorized();
    }
    backend.users.retain(|u| u.id != id);
    StatusCode::NO_CONTENT.into_response()
}
