// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock file-usage notifiers.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use missive_core::{AdapterType, FileUsageNotifier, HealthStatus, MissiveError, PluginAdapter};

/// Records every notification it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(String, bool)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of `(file_id, in_use)` pairs received so far.
    pub fn notifications(&self) -> Vec<(String, bool)> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    /// Wait until at least `count` notifications arrived, or `timeout` passes.
    ///
    /// Notifications are sent from a spawned task, so tests poll for them.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<(String, bool)> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let seen = self.notifications();
            if seen.len() >= count || tokio::time::Instant::now() >= deadline {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl PluginAdapter for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
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
impl FileUsageNotifier for RecordingNotifier {
    async fn notify(&self, file_id: &str, in_use: bool) -> Result<(), MissiveError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((file_id.to_string(), in_use));
        }
        Ok(())
    }
}

/// Fails every notification, for checking that failures stay best-effort.
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl PluginAdapter for FailingNotifier {
    fn name(&self) -> &str {
        "failing"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::FileUsage
    }

    async fn health_check(&self) -> Result<HealthStatus, MissiveError> {
        Ok(HealthStatus::Unhealthy("always fails".into()))
    }

    async fn shutdown(&self) -> Result<(), MissiveError> {
        Ok(())
    }
}

#[async_trait]
impl FileUsageNotifier for FailingNotifier {
    async fn notify(&self, file_id: &str, _in_use: bool) -> Result<(), MissiveError> {
        Err(MissiveError::Notifier {
            message: format!("file service unavailable for '{file_id}'"),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify("a", true).await.unwrap();
        notifier.notify("b", false).await.unwrap();
        assert_eq!(
            notifier.notifications(),
            [("a".to_string(), true), ("b".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn wait_for_gives_up_after_timeout() {
        let notifier = RecordingNotifier::new();
        let seen = notifier.wait_for(1, Duration::from_millis(20)).await;
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn failing_notifier_fails() {
        assert!(FailingNotifier.notify("a", true).await.is_err());
    }
}
