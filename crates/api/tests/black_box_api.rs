use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use gatekeeper_api::app::services::AppServices;
use gatekeeper_auth::{JwtClaims, JwtCodec, NewUser, StoreError, User, UserStore};
use gatekeeper_core::UserId;
use gatekeeper_infra::InMemoryUserStore;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const SECRET: &str = "black-box-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_store(Arc::new(InMemoryUserStore::new())).await
    }

    async fn spawn_with_store(store: Arc<dyn UserStore>) -> Self {
        // Same router as prod, but bound to an ephemeral port.
        let codec = JwtCodec::new(SECRET, ChronoDuration::hours(1)).expect("codec");
        let app = gatekeeper_api::router(Arc::new(AppServices::new(store, codec)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn register(&self, name: &str, email: &str, role: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "fullName": name,
                "dateOfBirth": "1990-05-17",
                "email": email,
                "password": "hunter22",
                "role": role,
            }))
            .send()
            .await
            .unwrap()
    }

    /// Register and log in; returns `(id, token)`.
    async fn signup(&self, name: &str, email: &str, role: &str) -> (u64, String) {
        let res = self.register(name, email, role).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": "hunter22" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body: Value = res.json().await.unwrap();
        (
            body["user"]["id"].as_u64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(
    secret: &str,
    sub: u64,
    issued_at: chrono::DateTime<Utc>,
    ttl: ChronoDuration,
) -> String {
    let claims = JwtClaims {
        sub: UserId::new(sub),
        issued_at,
        expires_at: issued_at + ttl,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn message(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["message"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;
    let res = server.get("/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_returns_user_without_password() {
    let server = TestServer::spawn().await;

    let res = server.register("Ada Lovelace", "ada@example.com", "user").await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["fullName"], "Ada Lovelace");
    assert_eq!(body["user"]["dateOfBirth"], "1990-05-17");
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["isActive"], true);
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());
    assert!(!body.to_string().contains("hunter22"));
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let server = TestServer::spawn().await;
    server.signup("Ada", "ada@example.com", "user").await;

    let res = server.register("Other Ada", "ADA@example.com", "user").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(res).await, "User with this email already exists");
}

#[tokio::test]
async fn register_reports_every_invalid_field() {
    let server = TestServer::spawn().await;

    let res = server
        .client
        .post(server.url("/api/auth/register"))
        .json(&json!({
            "fullName": "  Ada",
            "dateOfBirth": "not-a-date",
            "email": "nope",
            "password": "123",
            "role": "root",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await.unwrap();
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["fullName", "dateOfBirth", "email", "password", "role"]);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let server = TestServer::spawn().await;

    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_do_not_reveal_which_part_was_wrong() {
    let server = TestServer::spawn().await;
    server.signup("Ada", "ada@example.com", "user").await;

    let attempts = [("ada@example.com", "wrong-pass"), ("bob@example.com", "hunter22")];
    for (email, password) in attempts {
        let res = server
            .client
            .post(server.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(message(res).await, "Invalid credentials");
    }
}

#[tokio::test]
async fn users_can_read_themselves_but_not_others() {
    let server = TestServer::spawn().await;
    let (ada_id, ada_token) = server.signup("Ada", "ada@example.com", "user").await;
    let (bob_id, _) = server.signup("Bob", "bob@example.com", "user").await;

    let res = server.get(&format!("/api/users/{ada_id}"), Some(&ada_token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["email"], "ada@example.com");

    let res = server.get(&format!("/api/users/{bob_id}"), Some(&ada_token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(message(res).await, "Insufficient permissions");

    let res = server.get("/api/users", Some(&ada_token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admins_can_list_read_and_search() {
    let server = TestServer::spawn().await;
    let (_, admin_token) = server.signup("Root Admin", "root@example.com", "admin").await;
    let (ada_id, _) = server.signup("Ada Lovelace", "ada@example.com", "user").await;
    server.signup("Bob Builder", "bob@example.com", "user").await;

    let res = server.get("/api/users", Some(&admin_token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 3);

    let res = server.get(&format!("/api/users/{ada_id}"), Some(&admin_token)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.get("/api/users/search?q=lovelace", Some(&admin_token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["fullName"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Ada Lovelace"]);

    let res = server.get("/api/users/999", Some(&admin_token)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(message(res).await, "User not found");
}

#[tokio::test]
async fn input_is_validated_before_authentication() {
    let server = TestServer::spawn().await;

    let res = server.get("/api/users/abc", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.get("/api/users/-1", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.get("/api/users/search", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errors"][0]["message"], "Search query is required");

    let res = server.get("/api/users/search?q=%20ada", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Valid input, no credentials.
    let res = server.get("/api/users/search?q=ada", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_and_malformed_credentials_are_unauthorized() {
    let server = TestServer::spawn().await;
    let (ada_id, _) = server.signup("Ada", "ada@example.com", "user").await;
    let path = server.url(&format!("/api/users/{ada_id}"));

    let res = server.client.get(&path).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await, "Access token is required");

    for header in ["Bearer", "Basic abc", "token-without-scheme"] {
        let res = server
            .client
            .get(&path)
            .header("authorization", header)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "header {header:?}");
        assert_eq!(message(res).await, "Access token is required");
    }
}

#[tokio::test]
async fn expired_and_forged_tokens_are_rejected() {
    let server = TestServer::spawn().await;
    let (ada_id, _) = server.signup("Ada", "ada@example.com", "user").await;
    let path = format!("/api/users/{ada_id}");

    let expired = mint_jwt(
        SECRET,
        ada_id,
        Utc::now() - ChronoDuration::hours(2),
        ChronoDuration::hours(1),
    );
    let res = server.get(&path, Some(&expired)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await, "Token expired");

    let forged = mint_jwt("some-other-secret", ada_id, Utc::now(), ChronoDuration::hours(1));
    let res = server.get(&path, Some(&forged)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await, "Invalid token");

    // Well-signed, but for a user that does not exist.
    let ghost = mint_jwt(SECRET, 4242, Utc::now(), ChronoDuration::hours(1));
    let res = server.get(&path, Some(&ghost)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await, "Invalid token");

    let res = server.get(&path, Some("garbage")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await, "Invalid token");
}

#[tokio::test]
async fn blocked_users_lose_access() {
    let server = TestServer::spawn().await;
    let (_, admin_token) = server.signup("Root Admin", "root@example.com", "admin").await;
    let (ada_id, ada_token) = server.signup("Ada", "ada@example.com", "user").await;

    let res = server
        .client
        .patch(server.url(&format!("/api/users/{ada_id}/block")))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User blocked successfully");
    assert_eq!(body["user"]["isActive"], false);

    // Outstanding tokens stop working immediately.
    let res = server.get(&format!("/api/users/{ada_id}"), Some(&ada_token)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await, "User account is deactivated");

    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": "ada@example.com", "password": "hunter22" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(res).await, "User account is deactivated");

    let res = server
        .client
        .patch(server.url("/api/users/999/block"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_may_block_themselves_but_not_others() {
    let server = TestServer::spawn().await;
    let (ada_id, ada_token) = server.signup("Ada", "ada@example.com", "user").await;
    let (bob_id, _) = server.signup("Bob", "bob@example.com", "user").await;

    let res = server
        .client
        .patch(server.url(&format!("/api/users/{bob_id}/block")))
        .bearer_auth(&ada_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .patch(server.url(&format!("/api/users/{ada_id}/block")))
        .bearer_auth(&ada_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unsupported_methods_on_known_paths_are_not_found() {
    let server = TestServer::spawn().await;
    let (ada_id, _) = server.signup("Ada", "ada@example.com", "user").await;

    // No credentials: the guards must not run for a method that has no handler.
    let attempts = [
        (reqwest::Method::DELETE, format!("/api/users/{ada_id}")),
        (reqwest::Method::POST, "/api/users".to_string()),
        (reqwest::Method::GET, format!("/api/users/{ada_id}/block")),
        (reqwest::Method::POST, "/api/users/search?q=ada".to_string()),
        (reqwest::Method::GET, "/api/auth/login".to_string()),
        (reqwest::Method::GET, "/api/auth/register".to_string()),
        (reqwest::Method::POST, "/health".to_string()),
    ];

    for (method, path) in attempts {
        let res = server
            .client
            .request(method.clone(), server.url(&path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{method} {path}");

        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "not_found", "{method} {path}");
        assert_eq!(body["message"], "Endpoint not found", "{method} {path}");
    }
}

#[tokio::test]
async fn login_with_the_longest_allowed_lifetime_succeeds() {
    let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    let codec = JwtCodec::new(SECRET, ChronoDuration::seconds(gatekeeper_auth::MAX_TOKEN_TTL_SECS))
        .expect("codec");
    let services = Arc::new(AppServices::new(store, codec));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        axum::serve(listener, gatekeeper_api::router(services)).await.unwrap();
    });
    let server = TestServer {
        base_url,
        client: reqwest::Client::new(),
        handle,
    };

    let (ada_id, token) = server.signup("Ada", "ada@example.com", "user").await;
    let res = server.get(&format!("/api/users/{ada_id}"), Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_routes_return_json_not_found() {
    let server = TestServer::spawn().await;

    let res = server.get("/api/nothing-here", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Endpoint not found");
}

struct FailingStore;

#[async_trait]
impl UserStore for FailingStore {
    async fn create(&self, _user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Unavailable("db at 10.0.0.5 refused connection".to_string()))
    }

    async fn find_by_id(&self, _id: UserId) -> Result<Option<User>, StoreError> {
        Err(StoreError::Unavailable("db at 10.0.0.5 refused connection".to_string()))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Unavailable("db at 10.0.0.5 refused connection".to_string()))
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Err(StoreError::Unavailable("db at 10.0.0.5 refused connection".to_string()))
    }

    async fn search(&self, _query: &str) -> Result<Vec<User>, StoreError> {
        Err(StoreError::Unavailable("db at 10.0.0.5 refused connection".to_string()))
    }

    async fn set_active(&self, _id: UserId, _active: bool) -> Result<Option<User>, StoreError> {
        Err(StoreError::Unavailable("db at 10.0.0.5 refused connection".to_string()))
    }
}

#[tokio::test]
async fn store_failures_surface_as_generic_server_errors() {
    let server = TestServer::spawn_with_store(Arc::new(FailingStore)).await;

    let res = server.register("Ada", "ada@example.com", "user").await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Something went wrong");
    assert!(!body.to_string().contains("10.0.0.5"));

    // A valid token whose owner cannot be looked up is a server fault, not a bad token.
    let token = mint_jwt(SECRET, 1, Utc::now(), ChronoDuration::hours(1));
    let res = server.get("/api/users/1", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
