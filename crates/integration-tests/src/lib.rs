//! Integration test harness for Store Ratings.
//!
//! In-process tests drive the full router against [`MemoryStore`] with
//! `tower::ServiceExt::oneshot`, so they need no database or network.
//! Live-server tests are `#[ignore]`d and talk to a running server over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests
//! cargo test -p store-ratings-integration-tests
//!
//! # Against a running server
//! RATINGS_BASE_URL=http://localhost:5001 cargo test -p store-ratings-integration-tests -- --ignored
//! ```

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use store_ratings_core::Role;
use store_ratings_server::config::TokenConfig;
use store_ratings_server::db::MemoryStore;
use store_ratings_server::routes;
use store_ratings_server::services::{AccountInput, AuthService, TokenIssuer};
use store_ratings_server::state::AppState;

/// Password accepted by the password policy, shared by seeded accounts.
pub const PASSWORD: &str = "Passw0rd!";

/// Signing secret used by every in-process test app.
const TEST_SECRET: &str = "k7Qz9pLm2Xv8Rt4Wn6Yb1Hc5Jd3Fg0Ae";

/// An application instance backed by a fresh in-memory store.
pub struct TestApp {
    pub state: AppState<MemoryStore>,
    router: Router,
}

/// Status and parsed JSON body of a response.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    /// Build an app with an empty store.
    #[must_use]
    pub fn new() -> Self {
        let tokens = TokenIssuer::new(&TokenConfig {
            secret: SecretString::from(TEST_SECRET),
            ttl: Duration::hours(1),
        });
        let state = AppState::new(MemoryStore::new(), tokens);
        let router = routes::routes::<MemoryStore>().with_state(state.clone());
        Self { state, router }
    }

    /// Send a request, optionally with a bearer token and a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };

        TestResponse { status, body }
    }

    /// `POST` a JSON body.
    pub async fn post(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// `PUT` a JSON body.
    pub async fn put(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    /// `GET` with an optional token.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None).await
    }

    /// Create an admin directly through the service layer and return its token.
    ///
    /// # Panics
    ///
    /// Panics if the account cannot be created.
    pub async fn seed_admin(&self, email: &str) -> String {
        let admin = AuthService::new(self.state.store())
            .register(
                AccountInput {
                    name: "Platform Administrator Account",
                    email,
                    password: PASSWORD,
                    address: None,
                },
                Role::Admin,
            )
            .await
            .expect("seed admin");
        self.state
            .tokens()
            .issue(admin.id, admin.role)
            .expect("issue admin token")
    }

    /// Register an end-user over HTTP; returns `(id, token)`.
    ///
    /// # Panics
    ///
    /// Panics if registration does not succeed.
    pub async fn register_user(&self, email: &str) -> (i64, String) {
        let response = self
            .post(
                "/api/register",
                None,
                &serde_json::json!({
                    "name": "Integration Test Shopper Name",
                    "email": email,
                    "password": PASSWORD,
                    "address": "1 Test Lane",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        (
            response.body["user"]["id"].as_i64().expect("user id"),
            response.body["token"]
                .as_str()
                .expect("token")
                .to_owned(),
        )
    }

    /// Create a store as the given admin and log in as it; returns `(id, token)`.
    ///
    /// # Panics
    ///
    /// Panics if creation or login does not succeed.
    pub async fn create_store(&self, admin_token: &str, name: &str, email: &str) -> (i64, String) {
        let created = self
            .post(
                "/api/admin/create-store",
                Some(admin_token),
                &serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": PASSWORD,
                    "address": "99 Market Street",
                }),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);

        let login = self
            .post(
                "/api/store/store-login",
                None,
                &serde_json::json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.body);
        (
            created.body["store"]["id"].as_i64().expect("store id"),
            login.body["token"].as_str().expect("token").to_owned(),
        )
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
