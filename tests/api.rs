use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use bursar::server::{AppState, create_router};
use bursar::store::{SqliteStore, Store};

struct TestApp {
    router: Router,
    _temp: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp.path().join("test.db")).expect("open store");
        store.initialize().expect("initialize store");

        let state = Arc::new(AppState::new(Arc::new(store)));
        Self {
            router: create_router(state),
            _temp: temp,
        }
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("send request");

        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse body")
        };

        (status, set_cookie, body)
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        let (status, _, body) = self.request("GET", path, cookie, None).await;
        (status, body)
    }

    async fn post(&self, path: &str, cookie: Option<&str>, body: Value) -> (StatusCode, Value) {
        let (status, _, body) = self.request("POST", path, cookie, Some(body)).await;
        (status, body)
    }

    async fn put(&self, path: &str, cookie: Option<&str>, body: Value) -> (StatusCode, Value) {
        let (status, _, body) = self.request("PUT", path, cookie, Some(body)).await;
        (status, body)
    }

    async fn delete(&self, path: &str, cookie: Option<&str>) -> StatusCode {
        let (status, _, _) = self.request("DELETE", path, cookie, None).await;
        status
    }

    /// Runs the first-boot setup flow and returns the admin's session cookie.
    async fn setup_alice(&self) -> String {
        let (status, cookie, body) = self
            .request(
                "POST",
                "/api/setup/initialize",
                None,
                Some(account_payload("alice", "pw123")),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "setup failed: {body}");
        assert_eq!(body["is_admin"], json!(true));
        cookie.expect("setup sets session cookie")
    }

    async fn register(&self, username: &str, password: &str) -> String {
        let (status, cookie, body) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(account_payload(username, password)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        cookie.expect("register sets session cookie")
    }
}

fn settings_payload() -> Value {
    json!({
        "income_per_paycheck": 4000.0,
        "payroll_day_1": 1,
        "payroll_day_2": 31,
        "bills_account_name": "Bills",
        "bills_account_deposit": 1500.0,
        "personal_account_name": "Personal",
        "personal_account_deposit": 1000.0,
        "savings_account_1_name": "Emergency",
        "savings_account_1_deposit": 250.0,
        "savings_account_2_name": "Vacation",
        "starting_balance": 500.0
    })
}

fn account_payload(username: &str, password: &str) -> Value {
    json!({
        "username": username,
        "password": password,
        "settings": settings_payload(),
        "bills": [
            {"name": "Rent", "base_amount": 1200.0, "due_day": 1, "frequency": "monthly"}
        ]
    })
}

#[tokio::test]
async fn setup_flow() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/setup/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["needs_setup"], json!(true));
    assert_eq!(body["has_users"], json!(false));
    assert_eq!(body["allow_registration"], json!(true));

    app.setup_alice().await;

    let (_, body) = app.get("/api/setup/status", None).await;
    assert_eq!(body["needs_setup"], json!(false));
    assert_eq!(body["has_users"], json!(true));

    // Setup is once-only
    let (status, _) = app
        .post(
            "/api/setup/initialize",
            None,
            account_payload("mallory", "pw"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn initial_bill_and_resolved_amount() {
    let app = TestApp::new();
    let cookie = app.setup_alice().await;

    let (status, bills) = app.get("/api/bills", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let bills = bills.as_array().unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0]["name"], json!("Rent"));
    assert_eq!(bills[0]["base_amount"], json!(1200.0));

    let bill_id = bills[0]["id"].as_str().unwrap();
    let (status, resolved) = app
        .get(&format!("/api/bills/{bill_id}/amount/2024/0"), Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["amount"], json!(1200.0));
}

#[tokio::test]
async fn override_upsert_and_resolution() {
    let app = TestApp::new();
    let cookie = app.setup_alice().await;

    let (_, bills) = app.get("/api/bills", Some(&cookie)).await;
    let bill_id = bills[0]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            "/api/overrides",
            Some(&cookie),
            json!({"bill_id": bill_id, "year": 2024, "month": 0, "amount": 1500.0}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, resolved) = app
        .get(&format!("/api/bills/{bill_id}/amount/2024/0"), Some(&cookie))
        .await;
    assert_eq!(resolved["amount"], json!(1500.0));

    // Other months are untouched
    let (_, resolved) = app
        .get(&format!("/api/bills/{bill_id}/amount/2024/1"), Some(&cookie))
        .await;
    assert_eq!(resolved["amount"], json!(1200.0));

    // Second write for the same period replaces in place
    app.post(
        "/api/overrides",
        Some(&cookie),
        json!({"bill_id": bill_id, "year": 2024, "month": 0, "amount": 1600.0}),
    )
    .await;

    let (_, overrides) = app.get("/api/overrides", Some(&cookie)).await;
    assert_eq!(overrides.as_array().unwrap().len(), 1);
    assert_eq!(overrides[0]["amount"], json!(1600.0));

    // Month outside 0-11 is rejected
    let (status, _) = app
        .post(
            "/api/overrides",
            Some(&cookie),
            json!({"bill_id": bill_id, "year": 2024, "month": 12, "amount": 10.0}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn override_requires_owned_bill() {
    let app = TestApp::new();
    let alice = app.setup_alice().await;
    let bob = app.register("bob", "hunter2").await;

    let (_, bills) = app.get("/api/bills", Some(&alice)).await;
    let alice_bill = bills[0]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            "/api/overrides",
            Some(&bob),
            json!({"bill_id": alice_bill, "year": 2024, "month": 0, "amount": 1.0}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Bob cannot read or resolve Alice's bill either
    let (status, _) = app
        .get(&format!("/api/bills/{alice_bill}/amount/2024/0"), Some(&bob))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registration_toggle() {
    let app = TestApp::new();
    let admin = app.setup_alice().await;

    let (status, body) = app
        .put(
            "/api/admin/settings",
            Some(&admin),
            json!({"allow_registration": false}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allow_registration"], json!(false));

    let (status, _, _) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(account_payload("bob", "hunter2")),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.put(
        "/api/admin/settings",
        Some(&admin),
        json!({"allow_registration": true}),
    )
    .await;
    app.register("bob", "hunter2").await;
}

#[tokio::test]
async fn login_error_does_not_reveal_usernames() {
    let app = TestApp::new();
    app.setup_alice().await;

    let (wrong_pw_status, wrong_pw_body) = app
        .post(
            "/api/auth/login",
            None,
            json!({"username": "alice", "password": "nope"}),
        )
        .await;
    let (unknown_status, unknown_body) = app
        .post(
            "/api/auth/login",
            None,
            json!({"username": "nobody", "password": "nope"}),
        )
        .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body["error"], unknown_body["error"]);
}

#[tokio::test]
async fn login_logout_and_status() {
    let app = TestApp::new();
    app.setup_alice().await;

    let (status, body) = app.get("/api/auth/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], json!(false));

    let (status, cookie, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": "alice", "password": "pw123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], json!("alice"));
    let cookie = cookie.unwrap();

    let (_, body) = app.get("/api/auth/status", Some(&cookie)).await;
    assert_eq!(body["authenticated"], json!(true));
    assert_eq!(body["username"], json!("alice"));
    assert_eq!(body["is_admin"], json!(true));

    let (status, _, _) = app.request("POST", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/bills", Some(&cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cleared_toggle_round_trip() {
    let app = TestApp::new();
    let cookie = app.setup_alice().await;

    let key = json!({"transaction_key": "rent:2024:0"});

    let (status, body) = app.post("/api/cleared/toggle", Some(&cookie), key.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], json!(true));

    let (_, listed) = app.get("/api/cleared", Some(&cookie)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["transaction_key"], json!("rent:2024:0"));

    let (_, body) = app.post("/api/cleared/toggle", Some(&cookie), key).await;
    assert_eq!(body["cleared"], json!(false));

    let (_, listed) = app.get("/api/cleared", Some(&cookie)).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn auth_and_admin_gating() {
    let app = TestApp::new();
    app.setup_alice().await;
    let bob = app.register("bob", "hunter2").await;

    let (status, _) = app.get("/api/bills", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/admin/stats", Some(&bob)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/admin/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_user_management() {
    let app = TestApp::new();
    let admin = app.setup_alice().await;
    let bob_cookie = app.register("bob", "hunter2").await;

    let (status, users) = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("password_hash").is_none());
    }

    let alice_id = users
        .iter()
        .find(|u| u["username"] == json!("alice"))
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let bob_id = users.iter().find(|u| u["username"] == json!("bob")).unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Self-deletion is blocked
    let status = app
        .delete(&format!("/api/admin/users/{alice_id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Promote then demote bob
    let (status, body) = app
        .post(
            &format!("/api/admin/users/{bob_id}/toggle-admin"),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_admin"], json!(true));

    let (status, _) = app
        .post(
            "/api/admin/users/no-such-user/toggle-admin",
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, stats) = app.get("/api/admin/stats", Some(&admin)).await;
    assert_eq!(stats["total_users"], json!(2));
    assert_eq!(stats["total_admins"], json!(2));
    assert_eq!(stats["total_bills"], json!(2));

    // Deleting bob cascades and kills his live session
    let status = app
        .delete(&format!("/api/admin/users/{bob_id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/bills", Some(&bob_cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, stats) = app.get("/api/admin/stats", Some(&admin)).await;
    assert_eq!(stats["total_users"], json!(1));
    assert_eq!(stats["total_bills"], json!(1));

    // Repeat delete is idempotent
    let status = app
        .delete(&format!("/api/admin/users/{bob_id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn change_password() {
    let app = TestApp::new();
    let cookie = app.setup_alice().await;

    let (status, _) = app
        .post(
            "/api/auth/change-password",
            Some(&cookie),
            json!({"current_password": "wrong", "new_password": "pw456"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/auth/change-password",
            Some(&cookie),
            json!({"current_password": "pw123", "new_password": "pw456"}),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({"username": "alice", "password": "pw123"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({"username": "alice", "password": "pw456"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn settings_read_and_update() {
    let app = TestApp::new();
    let cookie = app.setup_alice().await;

    let (status, settings) = app.get("/api/settings", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["income_per_paycheck"], json!(4000.0));
    assert_eq!(settings["setup_completed"], json!(true));

    let mut payload = settings_payload();
    payload["income_per_paycheck"] = json!(4500.0);
    let (status, updated) = app.put("/api/settings", Some(&cookie), payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["income_per_paycheck"], json!(4500.0));

    // Payroll day outside 1-31 is rejected
    let mut payload = settings_payload();
    payload["payroll_day_1"] = json!(0);
    let (status, _) = app.put("/api/settings", Some(&cookie), payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bill_crud_and_idempotent_deletes() {
    let app = TestApp::new();
    let cookie = app.setup_alice().await;

    let (status, bill) = app
        .post(
            "/api/bills",
            Some(&cookie),
            json!({"name": "Internet", "base_amount": 80.0, "due_day": 15, "frequency": "monthly", "notes": "Fiber"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let bill_id = bill["id"].as_str().unwrap().to_string();

    // Listed in due-day order after the Rent bill
    let (_, bills) = app.get("/api/bills", Some(&cookie)).await;
    let names: Vec<&str> = bills
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Rent", "Internet"]);

    let (status, updated) = app
        .put(
            &format!("/api/bills/{bill_id}"),
            Some(&cookie),
            json!({"name": "Internet", "base_amount": 90.0, "due_day": 20, "frequency": "monthly"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["base_amount"], json!(90.0));

    let (status, _) = app
        .put(
            "/api/bills/no-such-bill",
            Some(&cookie),
            json!({"name": "X", "base_amount": 1.0, "due_day": 1, "frequency": "monthly"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Invalid frequency is rejected at deserialization
    let (status, _) = app
        .post(
            "/api/bills",
            Some(&cookie),
            json!({"name": "X", "base_amount": 1.0, "due_day": 1, "frequency": "weekly"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Deletes are uniformly idempotent
    let status = app
        .delete(&format!("/api/bills/{bill_id}"), Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let status = app
        .delete(&format!("/api/bills/{bill_id}"), Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let status = app
        .delete("/api/overrides/no-such-bill/2024/0", Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn export_snapshot() {
    let app = TestApp::new();
    let cookie = app.setup_alice().await;

    let (_, bills) = app.get("/api/bills", Some(&cookie)).await;
    let bill_id = bills[0]["id"].as_str().unwrap().to_string();

    app.post(
        "/api/overrides",
        Some(&cookie),
        json!({"bill_id": bill_id, "year": 2024, "month": 0, "amount": 1500.0}),
    )
    .await;
    app.post(
        "/api/cleared/toggle",
        Some(&cookie),
        json!({"transaction_key": "rent:2024:0"}),
    )
    .await;

    let (status, export) = app.get("/api/export", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(export["username"], json!("alice"));
    assert!(export["exported_at"].is_string());
    assert_eq!(export["settings"]["income_per_paycheck"], json!(4000.0));
    assert_eq!(export["bills"].as_array().unwrap().len(), 1);
    assert_eq!(export["overrides"].as_array().unwrap().len(), 1);
    assert_eq!(export["cleared_transactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn users_only_see_their_own_data() {
    let app = TestApp::new();
    let alice = app.setup_alice().await;
    let bob = app.register("bob", "hunter2").await;

    let (_, alice_bills) = app.get("/api/bills", Some(&alice)).await;
    let (_, bob_bills) = app.get("/api/bills", Some(&bob)).await;
    assert_eq!(alice_bills.as_array().unwrap().len(), 1);
    assert_eq!(bob_bills.as_array().unwrap().len(), 1);

    let alice_bill = alice_bills[0]["id"].as_str().unwrap().to_string();
    let bob_bill = bob_bills[0]["id"].as_str().unwrap().to_string();
    assert_ne!(alice_bill, bob_bill);

    // Bob's delete on Alice's bill is a no-op; her bill survives
    let status = app
        .delete(&format!("/api/bills/{alice_bill}"), Some(&bob))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, alice_bills) = app.get("/api/bills", Some(&alice)).await;
    assert_eq!(alice_bills.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = TestApp::new();
    app.setup_alice().await;

    let (status, _, _) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(account_payload("alice", "other")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn health_endpoint() {
    let app = TestApp::new();
    let (status, _, _) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
