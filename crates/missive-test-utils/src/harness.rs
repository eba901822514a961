// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full stack (temp SQLite store, messaging
//! service, router with static session keys) and drives HTTP requests
//! through it without binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use missive_config::model::StorageConfig;
use missive_core::{FileUsageNotifier, MessageStore, MissiveError};
use missive_gateway::{
    build_router, GatewayState, MessagingService, ServiceLimits, StaticAuthenticator,
};
use missive_storage::SqliteStorage;
use serde_json::Value;
use tower::ServiceExt;

use crate::mock_notifier::RecordingNotifier;

/// Session keys every harness accepts unless overridden: `<user>-key` for alice, bob and carol.
pub const DEFAULT_USERS: [&str; 3] = ["alice", "bob", "carol"];

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    tokens: Vec<(String, String)>,
    limits: ServiceLimits,
    notifier: Option<Arc<dyn FileUsageNotifier>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            tokens: DEFAULT_USERS
                .iter()
                .map(|user| (format!("{user}-key"), user.to_string()))
                .collect(),
            limits: ServiceLimits::default(),
            notifier: None,
        }
    }

    /// Override the request limits.
    pub fn with_limits(mut self, limits: ServiceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Use `notifier` instead of the harness's [`RecordingNotifier`].
    pub fn with_notifier(mut self, notifier: Arc<dyn FileUsageNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, MissiveError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| MissiveError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        }));
        storage.initialize().await?;

        let recorder = Arc::new(RecordingNotifier::new());
        let notifier = self
            .notifier
            .unwrap_or_else(|| recorder.clone() as Arc<dyn FileUsageNotifier>);

        let service = MessagingService::new(storage.clone(), notifier, self.limits);
        let router = build_router(
            GatewayState::new(service.clone()),
            Arc::new(StaticAuthenticator::new(self.tokens)),
        );

        Ok(TestHarness {
            _temp_dir: temp_dir,
            storage,
            service,
            notifier: recorder,
            router,
        })
    }
}

/// A complete messaging stack backed by a temporary database.
pub struct TestHarness {
    _temp_dir: tempfile::TempDir,
    pub storage: Arc<SqliteStorage>,
    pub service: MessagingService,
    /// Receives notifications unless the builder supplied another notifier.
    pub notifier: Arc<RecordingNotifier>,
    router: Router,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default users and limits.
    pub async fn new() -> Result<Self, MissiveError> {
        Self::builder().build().await
    }

    /// Send a fully built request through the router.
    pub async fn call(&self, request: Request<Body>) -> Response {
        match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    /// Start a request authenticated as `user` (one of [`DEFAULT_USERS`]).
    pub fn request(&self, method: Method, uri: &str, user: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {user}-key"))
    }

    /// POST a new message from `sender`. Returns the response.
    pub async fn send(&self, sender: &str, body: Value) -> Response {
        let request = self
            .request(Method::POST, "/", sender)
            .header(header::CONTENT_TYPE, missive_gateway::models::MIME_NEW_PERSONAL_MESSAGE_V1)
            .body(Body::from(body.to_string()));
        self.call(request.unwrap_or_default()).await
    }

    pub async fn close(&self) -> Result<(), MissiveError> {
        self.storage.close().await
    }
}

/// Read a response body as JSON. `Value::Null` for an empty body.
pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Read a response header as a string.
pub fn header_value(response: &Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[tokio::test]
    async fn harness_builds_and_serves_health() {
        let harness = TestHarness::new().await.unwrap();
        let response = harness
            .call(Request::get("/health").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
        harness.close().await.unwrap();
    }

    #[tokio::test]
    async fn default_users_are_authenticated() {
        let harness = TestHarness::new().await.unwrap();
        for user in DEFAULT_USERS {
            let response = harness
                .call(harness.request(Method::GET, "/", user).body(Body::empty()).unwrap())
                .await;
            assert_eq!(response.status(), StatusCode::OK, "{user}");
        }
        harness.close().await.unwrap();
    }
}
