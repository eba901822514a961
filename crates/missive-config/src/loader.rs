// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./missive.toml` > `~/.config/missive/missive.toml` >
//! `/etc/missive/missive.toml`, with `MISSIVE_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MissiveConfig;

pub const SYSTEM_CONFIG_PATH: &str = "/etc/missive/missive.toml";
pub const LOCAL_CONFIG_PATH: &str = "missive.toml";

/// Path of the per-user config file, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("missive").join("missive.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/missive/missive.toml`
/// 3. `~/.config/missive/missive.toml`
/// 4. `./missive.toml`
/// 5. `MISSIVE_*` environment variables
pub fn load_config() -> Result<MissiveConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MissiveConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MissiveConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MissiveConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MissiveConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MissiveConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `MISSIVE_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `MISSIVE_STORAGE_DATABASE_PATH` must become
/// `storage.database_path`, not `storage.database.path`. Figment's own
/// lowercasing is off so session keys keep their case.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("MISSIVE_")
        .map(|key| map_env_key(key.as_str()).into())
        .lowercase(false)
}

/// Map a prefix-stripped env key to its config path.
///
/// Section and field names are lowercased. `AUTH_TOKENS_<key>` becomes
/// `auth.tokens.<key>` with the session key left as written.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 6] = ["service", "storage", "gateway", "sync", "files", "auth"];
    const TOKENS_PREFIX: &str = "auth_tokens_";

    let lower = key.to_ascii_lowercase();
    if lower.starts_with(TOKENS_PREFIX) && key.len() > TOKENS_PREFIX.len() {
        return format!("auth.tokens.{}", &key[TOKENS_PREFIX.len()..]);
    }
    for section in SECTIONS {
        if let Some(rest) = lower.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    lower
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("gateway_port"), "gateway.port");
        assert_eq!(map_env_key("sync_default_limit"), "sync.default_limit");
        assert_eq!(map_env_key("files_usage_endpoint"), "files.usage_endpoint");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_keys_are_matched_case_insensitively() {
        assert_eq!(map_env_key("STORAGE_DATABASE_PATH"), "storage.database_path");
        assert_eq!(map_env_key("Gateway_Port"), "gateway.port");
    }

    #[test]
    fn session_keys_map_into_token_table() {
        assert_eq!(map_env_key("AUTH_TOKENS_Secret-Key"), "auth.tokens.Secret-Key");
        assert_eq!(map_env_key("auth_tokens_abc"), "auth.tokens.abc");
    }
}
