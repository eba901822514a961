// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Missive configuration.
///
/// Every section is optional and defaults to values suitable for a local
/// single-node deployment.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MissiveConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Incremental sync paging.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Attachment validation and usage reporting.
    #[serde(default)]
    pub files: FilesConfig,

    /// Static session keys.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "missive.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Incremental sync paging limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Page size used when the client does not pass `limit`.
    #[serde(default = "default_sync_limit")]
    pub default_limit: u32,

    /// Largest page size a client may request.
    #[serde(default = "default_sync_max_limit")]
    pub max_limit: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_limit: default_sync_limit(),
            max_limit: default_sync_max_limit(),
        }
    }
}

fn default_sync_limit() -> u32 {
    50
}

fn default_sync_max_limit() -> u32 {
    100
}

/// Attachment settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    /// Endpoint receiving file-usage reports. `None` logs reports instead.
    #[serde(default)]
    pub usage_endpoint: Option<String>,

    /// Request timeout for usage reports, in seconds.
    #[serde(default = "default_files_timeout")]
    pub timeout_secs: u64,

    /// Exact length of a valid file id.
    #[serde(default = "default_file_id_length")]
    pub file_id_length: usize,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            usage_endpoint: None,
            timeout_secs: default_files_timeout(),
            file_id_length: default_file_id_length(),
        }
    }
}

fn default_files_timeout() -> u64 {
    5
}

fn default_file_id_length() -> usize {
    24
}

/// Static authenticator settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Session key to user id.
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
}
