//! Fake Microsoft Graph server for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Serves:
//! - `GET /groups`
//! - `GET /groups/{id}/transitiveMembers`
//! - `GET /users`
//!
//! Collections are paged `page_size` items at a time through
//! `@odata.nextLink` (`?skip=N`). Every request must carry
//! `Authorization: Bearer <token>`; anything else gets a 401.
//!
//! # Example
//!
//! ```rust,no_run
//! let api = FakeGraphApi::start("secret").await.unwrap();
//! api.add_group("g-team", "KCQS101001.教學組").await;
//! api.add_user_member("g-team", "u1", "Keyu Chen", "keyu@kcis.test").await;
//! let source = GraphSource::new(api.base_url(), auth, Duration::from_secs(5))?;
//! ```

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// State shared between the router and test code.
struct ApiState {
    base_url: String,
    token: String,
    page_size: usize,
    groups: Vec<Value>,
    members: HashMap<String, Vec<Value>>,
    users: Vec<Value>,
    failing_groups: HashSet<String>,
    /// Request count per route key (`groups`, `members:<id>`, `users`).
    calls: HashMap<String, usize>,
}

/// Handle to the running fake Graph server.
pub struct FakeGraphApi {
    addr: SocketAddr,
    state: Arc<Mutex<ApiState>>,
}

impl FakeGraphApi {
    /// Start the server on a random port. Returns once it is listening.
    pub async fn start(token: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(ApiState {
            base_url: format!("http://{addr}"),
            token: token.to_string(),
            page_size: 100,
            groups: Vec::new(),
            members: HashMap::new(),
            users: Vec::new(),
            failing_groups: HashSet::new(),
            calls: HashMap::new(),
        }));

        let app = Router::new()
            .route("/groups", get(list_groups))
            .route("/groups/{id}/transitiveMembers", get(list_members))
            .route("/users", get(list_users))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the task a moment to register.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        Ok(Self { addr, state })
    }

    /// Base URL for the API (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn set_page_size(&self, size: usize) {
        self.state.lock().await.page_size = size.max(1);
    }

    pub async fn add_group(&self, id: &str, display_name: &str) {
        self.state.lock().await.groups.push(json!({
            "id": id,
            "displayName": display_name,
            "mail": null,
        }));
    }

    pub async fn add_user_member(&self, group_id: &str, id: &str, name: &str, email: &str) {
        self.push_member(
            group_id,
            json!({
                "@odata.type": "#microsoft.graph.user",
                "id": id,
                "displayName": name,
                "mail": email,
                "jobTitle": "Teacher",
            }),
        )
        .await;
    }

    /// A user member whose `displayName` is `null`, as Graph reports for
    /// some service and guest accounts.
    pub async fn add_unnamed_user_member(&self, group_id: &str, id: &str, email: &str) {
        self.push_member(
            group_id,
            json!({
                "@odata.type": "#microsoft.graph.user",
                "id": id,
                "displayName": null,
                "mail": email,
                "jobTitle": null,
            }),
        )
        .await;
    }

    /// A nested group inside `group_id`; the source must filter it out.
    pub async fn add_group_member(&self, group_id: &str, id: &str, name: &str) {
        self.push_member(
            group_id,
            json!({
                "@odata.type": "#microsoft.graph.group",
                "id": id,
                "displayName": name,
            }),
        )
        .await;
    }

    pub async fn add_user(&self, id: &str, name: &str, upn: &str, department: &str) {
        self.state.lock().await.users.push(json!({
            "id": id,
            "displayName": name,
            "mail": null,
            "userPrincipalName": upn,
            "department": department,
        }));
    }

    pub async fn add_unnamed_user(&self, id: &str, upn: &str) {
        self.state.lock().await.users.push(json!({
            "id": id,
            "displayName": null,
            "mail": null,
            "userPrincipalName": upn,
            "department": null,
        }));
    }

    /// Member requests for `group_id` answer 503.
    pub async fn fail_group(&self, group_id: &str) {
        self.state.lock().await.failing_groups.insert(group_id.to_string());
    }

    /// Accept a different token from now on; the old one gets 401.
    pub async fn rotate_token(&self, token: &str) {
        self.state.lock().await.token = token.to_string();
    }

    pub async fn calls(&self, key: &str) -> usize {
        self.state.lock().await.calls.get(key).copied().unwrap_or(0)
    }

    async fn push_member(&self, group_id: &str, value: Value) {
        self.state
            .lock()
            .await
            .members
            .entry(group_id.to_string())
            .or_default()
            .push(value);
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

type Shared = State<Arc<Mutex<ApiState>>>;

async fn list_groups(
    State(state): Shared,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut s = state.lock().await;
    *s.calls.entry("groups".to_string()).or_default() += 1;
    if let Some(denied) = check_auth(&s, &headers) {
        return denied;
    }
    page(&s, &s.groups, "/groups", &query)
}

async fn list_members(
    State(state): Shared,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut s = state.lock().await;
    *s.calls.entry(format!("members:{id}")).or_default() += 1;
    if let Some(denied) = check_auth(&s, &headers) {
        return denied;
    }
    if s.failing_groups.contains(&id) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": { "code": "serviceNotAvailable" } })),
        )
            .into_response();
    }
    let Some(items) = s.members.get(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "code": "Request_ResourceNotFound" } })),
        )
            .into_response();
    };
    page(&s, items, &format!("/groups/{id}/transitiveMembers"), &query)
}

async fn list_users(
    State(state): Shared,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut s = state.lock().await;
    *s.calls.entry("users".to_string()).or_default() += 1;
    if let Some(denied) = check_auth(&s, &headers) {
        return denied;
    }
    page(&s, &s.users, "/users", &query)
}

fn check_auth(s: &ApiState, headers: &HeaderMap) -> Option<Response> {
    let expected = format!("Bearer {}", s.token);
    let ok = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    (!ok).then(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "code": "InvalidAuthenticationToken" } })),
        )
            .into_response()
    })
}

fn page(s: &ApiState, items: &[Value], path: &str, query: &HashMap<String, String>) -> Response {
    let skip: usize = query.get("skip").and_then(|v| v.parse().ok()).unwrap_or(0);
    let end = (skip + s.page_size).min(items.len());
    let slice = items.get(skip..end).unwrap_or_default();
    let mut body = json!({ "value": slice });
    if end < items.len() {
        body["@odata.nextLink"] = json!(format!("{}{path}?skip={end}", s.base_url));
    }
    Json(body).into_response()
}
