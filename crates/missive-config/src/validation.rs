// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::MissiveConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &MissiveConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        fail(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        fail(format!(
            "gateway.host `{host}` is not a valid IP address or hostname"
        ));
    }

    if config.gateway.port == 0 {
        fail("gateway.port must not be 0".to_string());
    }

    if config.sync.max_limit == 0 {
        fail("sync.max_limit must be at least 1".to_string());
    }

    if config.sync.default_limit == 0 || config.sync.default_limit > config.sync.max_limit {
        fail(format!(
            "sync.default_limit must be between 1 and sync.max_limit ({}), got {}",
            config.sync.max_limit, config.sync.default_limit
        ));
    }

    if let Some(endpoint) = &config.files.usage_endpoint {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            fail(format!(
                "files.usage_endpoint `{endpoint}` must be an http:// or https:// URL"
            ));
        }
    }

    if config.files.timeout_secs == 0 {
        fail("files.timeout_secs must be at least 1".to_string());
    }

    if config.files.file_id_length == 0 {
        fail("files.file_id_length must be at least 1".to_string());
    }

    for (key, user) in &config.auth.tokens {
        if key.trim().is_empty() || user.trim().is_empty() {
            fail("auth.tokens entries must have a non-empty key and user id".to_string());
            break;
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
