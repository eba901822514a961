// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication for the gateway.
//!
//! Every API request must carry `Authorization: Bearer <session key>`. The
//! key, client address and user agent are handed to an [`Authenticator`];
//! the resolved [`UserId`] is attached to the request as an extension.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use missive_core::{
    AdapterType, Authenticator, Credential, HealthStatus, MissiveError, PluginAdapter, UserId,
};

use crate::handlers::ApiError;

/// Resolves session keys from a fixed table.
pub struct StaticAuthenticator {
    tokens: HashMap<String, UserId>,
}

impl StaticAuthenticator {
    /// Build from `(session key, user id)` pairs.
    pub fn new(tokens: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .map(|(key, user)| (key, UserId(user)))
                .collect(),
        }
    }
}

impl std::fmt::Debug for StaticAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticAuthenticator")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

#[async_trait]
impl PluginAdapter for StaticAuthenticator {
    fn name(&self) -> &str {
        "static-tokens"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, MissiveError> {
        if self.tokens.is_empty() {
            return Ok(HealthStatus::Degraded("no session keys configured".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MissiveError> {
        Ok(())
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, credential: &Credential) -> Result<Option<UserId>, MissiveError> {
        Ok(self.tokens.get(&credential.key).cloned())
    }
}

/// State for [`auth_middleware`].
#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Arc<dyn Authenticator>,
}

/// Pull the credential out of the request. `None` without a bearer key.
pub fn extract_credential(request: &Request) -> Option<Credential> {
    let headers = request.headers();
    let key = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|k| !k.is_empty())?;

    // Socket peer only; X-Forwarded-For is ignored.
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    Some(Credential {
        key: key.to_string(),
        ip,
        user_agent,
    })
}

/// Rejects requests whose credential does not resolve to a user.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(credential) = extract_credential(&request) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    match auth.authenticator.authenticate(&credential).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => {
            tracing::debug!(ip = ?credential.ip, "unknown session key");
            StatusCode::UNAUTHORIZED.into_response()
        }
        Err(e) => ApiError(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(auth: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder()
            .uri("/")
            .header(header::USER_AGENT, "test-agent")
            .header("x-forwarded-for", "10.0.0.1, 10.0.0.2");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn credential_needs_bearer_key() {
        assert!(extract_credential(&request(None)).is_none());
        assert!(extract_credential(&request(Some("Basic abc"))).is_none());
        assert!(extract_credential(&request(Some("Bearer   "))).is_none());
    }

    #[test]
    fn credential_carries_client_details() {
        let mut request = request(Some("Bearer key-1"));
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 7], 40000))));
        let credential = extract_credential(&request).unwrap();
        assert_eq!(credential.key, "key-1");
        assert_eq!(credential.ip.as_deref(), Some("192.168.1.7"));
        assert_eq!(credential.user_agent.as_deref(), Some("test-agent"));
    }

    #[test]
    fn forwarded_for_header_is_not_trusted() {
        let credential = extract_credential(&request(Some("Bearer key-1"))).unwrap();
        assert_eq!(credential.ip, None);
    }

    #[tokio::test]
    async fn static_authenticator_resolves_known_keys() {
        let auth = StaticAuthenticator::new([("key-1".to_string(), "alice".to_string())]);
        let known = Credential {
            key: "key-1".into(),
            ip: None,
            user_agent: None,
        };
        let unknown = Credential {
            key: "nope".into(),
            ..known.clone()
        };

        assert_eq!(auth.authenticate(&known).await.unwrap(), Some(UserId::from("alice")));
        assert_eq!(auth.authenticate(&unknown).await.unwrap(), None);
        assert_eq!(auth.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn empty_table_is_degraded() {
        let auth = StaticAuthenticator::new(Vec::<(String, String)>::new());
        assert!(matches!(
            auth.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }

    #[test]
    fn debug_hides_keys() {
        let auth = StaticAuthenticator::new([("secret".to_string(), "alice".to_string())]);
        let debug = format!("{auth:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("tokens: 1"));
    }
}
