//! End-to-end API flows against the in-memory store.
//!
//! Each test builds its own app, so tests share no state.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use store_ratings_integration_tests::{PASSWORD, TestApp};

const STORE_NAME: &str = "Corner Grocery And Fresh Produce";

// =============================================================================
// Registration & Login
// =============================================================================

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::new();
    let (id, _) = app.register_user("shopper@example.com").await;

    let login = app
        .post(
            "/api/login",
            None,
            &json!({ "email": "shopper@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["id"], id);
    assert_eq!(login.body["user"]["role"], "user");
    assert!(login.body["user"].get("password").is_none());
    assert!(login.body["user"].get("passwordHash").is_none());
    assert!(login.body["token"].as_str().is_some_and(|t| t.contains('.')));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.register_user("shopper@example.com").await;

    let wrong_password = app
        .post(
            "/api/login",
            None,
            &json!({ "email": "shopper@example.com", "password": "Wr0ng!pass" }),
        )
        .await;
    let unknown_email = app
        .post(
            "/api/login",
            None,
            &json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.body["error"], "invalid_credentials");
}

#[tokio::test]
async fn test_login_routes_are_role_specific() {
    let app = TestApp::new();
    let admin = app.seed_admin("admin@example.com").await;
    app.create_store(&admin, STORE_NAME, "owner@example.com")
        .await;
    app.register_user("shopper@example.com").await;

    let store_on_user_route = app
        .post(
            "/api/login",
            None,
            &json!({ "email": "owner@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(store_on_user_route.status, StatusCode::UNAUTHORIZED);

    let user_on_store_route = app
        .post(
            "/api/store/store-login",
            None,
            &json!({ "email": "shopper@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(user_on_store_route.status, StatusCode::UNAUTHORIZED);

    let admin_login = app
        .post(
            "/api/login",
            None,
            &json!({ "email": "admin@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(admin_login.status, StatusCode::OK);
    assert_eq!(admin_login.body["user"]["role"], "admin");
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = TestApp::new();
    app.register_user("shopper@example.com").await;

    let again = app
        .post(
            "/api/register",
            None,
            &json!({
                "name": "Another Shopper With Long Name",
                "email": "shopper@example.com",
                "password": PASSWORD,
            }),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["error"], "duplicate_email");
}

#[tokio::test]
async fn test_register_validation_reports_field() {
    let app = TestApp::new();

    let short_name = app
        .post(
            "/api/register",
            None,
            &json!({ "name": "Too Short", "email": "a@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(short_name.status, StatusCode::BAD_REQUEST);
    assert_eq!(short_name.body["error"], "validation_error");
    assert_eq!(short_name.body["field"], "name");

    let missing_password = app
        .post(
            "/api/register",
            None,
            &json!({ "name": "Integration Test Shopper Name", "email": "a@example.com" }),
        )
        .await;
    assert_eq!(missing_password.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new();
    let response = app
        .post("/api/register", None, &json!({ "name": 42 }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "validation_error");
}

#[tokio::test]
async fn test_update_password() {
    let app = TestApp::new();
    let (_, token) = app.register_user("shopper@example.com").await;

    let changed = app
        .put(
            "/api/update-password",
            Some(&token),
            &json!({ "newPassword": "N3w!secret" }),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);

    let old = app
        .post(
            "/api/login",
            None,
            &json!({ "email": "shopper@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = app
        .post(
            "/api/login",
            None,
            &json!({ "email": "shopper@example.com", "password": "N3w!secret" }),
        )
        .await;
    assert_eq!(new.status, StatusCode::OK);

    let missing = app
        .put("/api/update-password", Some(&token), &json!({}))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["field"], "newPassword");
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthenticated() {
    let app = TestApp::new();

    let none = app.get("/api/users/stores", None).await;
    assert_eq!(none.status, StatusCode::UNAUTHORIZED);
    assert_eq!(none.body["error"], "unauthenticated");

    let garbage = app.get("/api/users/stores", Some("not-a-token")).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = TestApp::new();
    let (_, user) = app.register_user("shopper@example.com").await;
    let admin = app.seed_admin("admin@example.com").await;

    let body = json!({
        "name": "Second Platform Administrator",
        "email": "admin2@example.com",
        "password": PASSWORD,
        "role": "admin",
    });

    let as_user = app
        .post("/api/admin/create-user", Some(&user), &body)
        .await;
    assert_eq!(as_user.status, StatusCode::FORBIDDEN);
    assert_eq!(as_user.body["error"], "forbidden");

    let as_admin = app
        .post("/api/admin/create-user", Some(&admin), &body)
        .await;
    assert_eq!(as_admin.status, StatusCode::CREATED);
    assert_eq!(as_admin.body["user"]["role"], "admin");

    let as_store_role = app
        .post(
            "/api/admin/create-user",
            Some(&admin),
            &json!({
                "name": "Should Not Become A Store",
                "email": "nope@example.com",
                "password": PASSWORD,
                "role": "store",
            }),
        )
        .await;
    assert_eq!(as_store_role.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_cannot_rate() {
    let app = TestApp::new();
    let admin = app.seed_admin("admin@example.com").await;
    let (store_id, store_token) = app
        .create_store(&admin, STORE_NAME, "owner@example.com")
        .await;

    let response = app
        .post(
            "/api/rate",
            Some(&store_token),
            &json!({ "storeId": store_id, "rating": 5 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Ratings
// =============================================================================

#[tokio::test]
async fn test_rerating_overwrites() {
    let app = TestApp::new();
    let admin = app.seed_admin("admin@example.com").await;
    let (store_id, _) = app
        .create_store(&admin, STORE_NAME, "owner@example.com")
        .await;
    let (_, user) = app.register_user("shopper@example.com").await;

    let first = app
        .post(
            "/api/rate",
            Some(&user),
            &json!({ "storeId": store_id, "rating": 5 }),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["aggregate"]["count"], 1);
    assert_eq!(first.body["aggregate"]["mean"], 5.0);

    let second = app
        .post(
            "/api/rate",
            Some(&user),
            &json!({ "storeId": store_id, "rating": 2 }),
        )
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["rating"]["value"], 2);
    assert_eq!(second.body["aggregate"]["count"], 1);
    assert_eq!(second.body["aggregate"]["mean"], 2.0);
    assert_eq!(first.body["rating"]["id"], second.body["rating"]["id"]);
}

#[tokio::test]
async fn test_rating_out_of_range_is_rejected() {
    let app = TestApp::new();
    let admin = app.seed_admin("admin@example.com").await;
    let (store_id, _) = app
        .create_store(&admin, STORE_NAME, "owner@example.com")
        .await;
    let (_, user) = app.register_user("shopper@example.com").await;

    for value in [0, 6, -1] {
        let response = app
            .post(
                "/api/rate",
                Some(&user),
                &json!({ "storeId": store_id, "rating": value }),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "value {value}");
        assert_eq!(response.body["field"], "rating");
    }

    let aggregate = app
        .get(&format!("/api/stores/{store_id}/rating"), Some(&user))
        .await;
    assert_eq!(aggregate.body["count"], 0);
}

#[tokio::test]
async fn test_rating_unknown_store_is_not_found() {
    let app = TestApp::new();
    let (user_id, user) = app.register_user("shopper@example.com").await;

    let missing = app
        .post(
            "/api/rate",
            Some(&user),
            &json!({ "storeId": 9999, "rating": 3 }),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let not_a_store = app
        .post(
            "/api/rate",
            Some(&user),
            &json!({ "storeId": user_id, "rating": 3 }),
        )
        .await;
    assert_eq!(not_a_store.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_aggregate_mean_and_no_ratings() {
    let app = TestApp::new();
    let admin = app.seed_admin("admin@example.com").await;
    let (store_id, _) = app
        .create_store(&admin, STORE_NAME, "owner@example.com")
        .await;

    let empty = app
        .get(&format!("/api/stores/{store_id}/rating"), Some(&admin))
        .await;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(empty.body["count"], 0);
    assert_eq!(empty.body["mean"], "N/A");

    for (email, value) in [
        ("a@example.com", 5),
        ("b@example.com", 3),
        ("c@example.com", 4),
    ] {
        let (_, token) = app.register_user(email).await;
        let response = app
            .post(
                "/api/rate",
                Some(&token),
                &json!({ "storeId": store_id, "rating": value }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let rated = app
        .get(&format!("/api/stores/{store_id}/rating"), Some(&admin))
        .await;
    assert_eq!(rated.body["count"], 3);
    assert_eq!(rated.body["mean"], 4.0);

    let bad_id = app.get("/api/stores/abc/rating", Some(&admin)).await;
    assert_eq!(bad_id.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_owner_sees_ratings_sorted_by_email() {
    let app = TestApp::new();
    let admin = app.seed_admin("admin@example.com").await;
    let (store_id, store_token) = app
        .create_store(&admin, STORE_NAME, "owner@example.com")
        .await;

    for (email, value) in [("zed@example.com", 1), ("amy@example.com", 4)] {
        let (_, token) = app.register_user(email).await;
        app.post(
            "/api/rate",
            Some(&token),
            &json!({ "storeId": store_id, "rating": value }),
        )
        .await;
    }

    let response = app.get("/api/store/ratings", Some(&store_token)).await;
    assert_eq!(response.status, StatusCode::OK);
    let ratings = response.body["ratings"].as_array().unwrap();
    assert_eq!(ratings.len(), 2);
    assert_eq!(ratings[0]["userEmail"], "amy@example.com");
    assert_eq!(ratings[0]["rating"], 4);
    assert_eq!(ratings[1]["userEmail"], "zed@example.com");
    assert_eq!(response.body["totalRatings"], 2);
    assert_eq!(response.body["averageRating"], 2.5);
}

#[tokio::test]
async fn test_user_store_list_includes_own_rating() {
    let app = TestApp::new();
    let admin = app.seed_admin("admin@example.com").await;
    let (rated_id, _) = app
        .create_store(&admin, "Bakery On The Main Street", "bakery@example.com")
        .await;
    app.create_store(&admin, "Hardware Depot And Supplies", "hardware@example.com")
        .await;
    let (_, user) = app.register_user("shopper@example.com").await;

    app.post(
        "/api/rate",
        Some(&user),
        &json!({ "storeId": rated_id, "rating": 3 }),
    )
    .await;

    let response = app.get("/api/users/stores", Some(&user)).await;
    assert_eq!(response.status, StatusCode::OK);
    let stores = response.body.as_array().unwrap();
    assert_eq!(stores.len(), 2);
    assert_eq!(stores[0]["name"], "Bakery On The Main Street");
    assert_eq!(stores[0]["avgRating"], 3.0);
    assert_eq!(stores[0]["userRating"], 3);
    assert_eq!(stores[1]["avgRating"], "N/A");
    assert!(stores[1].get("userRating").is_none());
}

// =============================================================================
// Administration
// =============================================================================

#[tokio::test]
async fn test_admin_stats_and_listings() {
    let app = TestApp::new();
    let admin = app.seed_admin("admin@example.com").await;
    let (store_id, _) = app
        .create_store(&admin, STORE_NAME, "owner@example.com")
        .await;
    let (_, user) = app.register_user("shopper@example.com").await;
    app.post(
        "/api/rate",
        Some(&user),
        &json!({ "storeId": store_id, "rating": 4 }),
    )
    .await;

    let stats = app.get("/api/admin/stats", Some(&admin)).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["totalUsers"], 2);
    assert_eq!(stats.body["totalStores"], 1);
    assert_eq!(stats.body["totalRatings"], 1);

    let users = app.get("/api/admin/users", Some(&admin)).await;
    let roles: Vec<_> = users
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["role"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(roles.len(), 2);
    assert!(roles.iter().all(|r| r != "store"));

    let stores = app.get("/api/admin/stores", Some(&admin)).await;
    assert_eq!(stores.body[0]["totalRatings"], 1);
    assert_eq!(stores.body[0]["avgRating"], 4.0);
}
