// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-usage notifiers.
//!
//! The file service keeps a usage count per file id. Missive tells it when a
//! message starts referencing a file (`in_use = true`) and when a deleted
//! message stops referencing it (`in_use = false`).

use std::time::Duration;

use async_trait::async_trait;
use missive_core::{AdapterType, FileUsageNotifier, HealthStatus, MissiveError, PluginAdapter};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
struct FileUsage<'a> {
    file_id: &'a str,
    in_use: bool,
}

/// POSTs `{"file_id": ..., "in_use": ...}` to the file service.
pub struct HttpFileUsageNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFileUsageNotifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, MissiveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MissiveError::Notifier {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PluginAdapter for HttpFileUsageNotifier {
    fn name(&self) -> &str {
        "http-file-usage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::FileUsage
    }

    async fn health_check(&self) -> Result<HealthStatus, MissiveError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MissiveError> {
        Ok(())
    }
}

#[async_trait]
impl FileUsageNotifier for HttpFileUsageNotifier {
    async fn notify(&self, file_id: &str, in_use: bool) -> Result<(), MissiveError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&FileUsage { file_id, in_use })
            .send()
            .await
            .map_err(|e| MissiveError::Notifier {
                message: format!("file usage request for '{file_id}' failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        response
            .error_for_status()
            .map_err(|e| MissiveError::Notifier {
                message: format!("file service rejected usage of '{file_id}': {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(file_id, in_use, "file usage sent");
        Ok(())
    }
}

/// Logs usage changes instead of sending them. Used when no file service is configured.
#[derive(Debug, Default)]
pub struct LoggingFileUsageNotifier;

#[async_trait]
impl PluginAdapter for LoggingFileUsageNotifier {
    fn name(&self) -> &str {
        "log-file-usage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::FileUsage
    }

    async fn health_check(&self) -> Result<HealthStatus, MissiveError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MissiveError> {
        Ok(())
    }
}

#[async_trait]
impl FileUsageNotifier for LoggingFileUsageNotifier {
    async fn notify(&self, file_id: &str, in_use: bool) -> Result<(), MissiveError> {
        debug!(file_id, in_use, "file usage changed (no file service configured)");
        Ok(())
    }
}
