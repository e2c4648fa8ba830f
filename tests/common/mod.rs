use std::net::SocketAddr;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use chatplane::config::{parse_origins, Config};

pub const ADMIN_KEY: &str = "test-admin-key";
pub const TRUSTED_ORIGIN: &str = "https://app.chatplane.test";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

/// Who a request is made as.
pub enum As<'a> {
    Anonymous,
    /// Platform admin acting on a tenant.
    Admin(&'a str),
    /// Platform admin on admin-only routes.
    Platform,
    User(&'a str),
}

async fn into_parts(req: RequestBuilder) -> (Value, StatusCode) {
    let resp = req.send().await.expect("request failed");
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(json!(null));
    (body, status)
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn authed(&self, req: RequestBuilder, who: &As<'_>) -> RequestBuilder {
        match who {
            As::Anonymous => req,
            As::Platform => req.header("x-admin-key", ADMIN_KEY),
            As::Admin(tenant_id) => req
                .header("x-admin-key", ADMIN_KEY)
                .header("x-tenant-id", *tenant_id),
            As::User(token) => req.bearer_auth(token),
        }
    }

    pub async fn get(&self, path: &str, who: As<'_>) -> (Value, StatusCode) {
        into_parts(self.authed(self.client.get(self.url(path)), &who)).await
    }

    pub async fn post(&self, path: &str, who: As<'_>, body: &Value) -> (Value, StatusCode) {
        into_parts(self.authed(self.client.post(self.url(path)), &who).json(body)).await
    }

    pub async fn put(&self, path: &str, who: As<'_>, body: &Value) -> (Value, StatusCode) {
        into_parts(self.authed(self.client.put(self.url(path)), &who).json(body)).await
    }

    pub async fn patch(&self, path: &str, who: As<'_>, body: &Value) -> (Value, StatusCode) {
        into_parts(self.authed(self.client.patch(self.url(path)), &who).json(body)).await
    }

    pub async fn delete(&self, path: &str, who: As<'_>) -> (Value, StatusCode) {
        into_parts(self.authed(self.client.delete(self.url(path)), &who)).await
    }

    /// Create a tenant through the admin API, return its id.
    pub async fn create_tenant(&self, name: &str, slug: &str) -> String {
        let (body, status) = self
            .post(
                "/api/tenants",
                As::Platform,
                &json!({ "name": name, "slug": slug }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create tenant failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Create a tenant with an owner, log in and return (tenant_id, token).
    pub async fn tenant_with_owner(&self, slug: &str) -> (String, String) {
        let email = format!("owner@{slug}.test");
        let (body, status) = self
            .post(
                "/api/tenants",
                As::Platform,
                &json!({
                    "name": slug,
                    "slug": slug,
                    "owner": { "email": email, "password": "password123", "name": "Owner" }
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create tenant failed: {body}");
        let tenant_id = body["data"]["id"].as_str().unwrap().to_string();

        let token = self.login(&email, "password123").await;
        (tenant_id, token)
    }

    /// Log in and return the access token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (body, status) = self
            .post(
                "/api/auth/login",
                As::Anonymous,
                &json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["access_token"].as_str().unwrap().to_string()
    }
}

fn db_url(base_url: &str, db_name: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!("chatplane_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&db_url(&base_url, "postgres"))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = db_url(&base_url, &db_name);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        admin_api_key: ADMIN_KEY.to_string(),
        encryption_key: "test-encryption-key-32-chars-ok!".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        allowed_origins: parse_origins(Some(TRUSTED_ORIGIN)),
        max_body_size: 1_048_576,
        webhook_timeout_secs: 5,
        log_level: "warn".to_string(),
    };

    let (app, _state) = chatplane::build_app(pool.clone(), config).expect("Failed to build app");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop stale test databases (useful after test crashes).
#[allow(dead_code)]
pub async fn cleanup_stale_test_dbs() {
    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    if let Ok(admin_pool) = PgPoolOptions::new()
        .max_connections(2)
        .connect(&db_url(&base_url, "postgres"))
        .await
    {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT datname FROM pg_database WHERE datname LIKE 'chatplane_test_%'",
        )
        .fetch_all(&admin_pool)
        .await
        .unwrap_or_default();

        for db_name in rows {
            let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
                .execute(&admin_pool)
                .await;
        }
        admin_pool.close().await;
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&db_url(&base_url, "postgres"))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
