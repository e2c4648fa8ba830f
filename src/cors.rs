use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tower_http::cors::{AllowCredentials, AllowOrigin, CorsLayer};

pub const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Origin allowlist shared by the CORS layer and the rejection middleware.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Arc<Vec<String>>,
}

impl OriginPolicy {
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed: Arc::new(allowed),
        }
    }

    /// Requests without an `Origin` header (curl, server to server) pass.
    pub fn is_allowed(&self, origin: Option<&HeaderValue>) -> bool {
        match origin {
            None => true,
            Some(value) => value
                .to_str()
                .map(|o| self.allowed.iter().any(|a| a == o))
                .unwrap_or(false),
        }
    }

    pub fn origins(&self) -> &[String] {
        &self.allowed
    }

    pub fn layer(&self) -> CorsLayer {
        let origin_policy = self.clone();
        let credentials_policy = self.clone();

        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(move |origin, _| {
                origin_policy.is_allowed(Some(origin))
            }))
            .allow_credentials(AllowCredentials::predicate(move |origin, _| {
                credentials_policy.is_allowed(Some(origin))
            }))
            .allow_methods(ALLOWED_METHODS)
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-admin-key"),
                HeaderName::from_static("x-tenant-id"),
                HeaderName::from_static("x-requested-with"),
            ])
    }
}

/// Answer requests from untrusted origins with 403 before they reach a
/// handler. Preflights never get here: the CORS layer answers them.
pub async fn reject_untrusted_origin(
    State(policy): State<OriginPolicy>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req.headers().get(header::ORIGIN);
    if policy.is_allowed(origin) {
        return next.run(req).await;
    }

    tracing::warn!(
        origin = origin.and_then(|o| o.to_str().ok()).unwrap_or("<invalid>"),
        "Rejected request from untrusted origin"
    );
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "success": false, "error": "Origin not allowed by CORS" })),
    )
        .into_response()
}
