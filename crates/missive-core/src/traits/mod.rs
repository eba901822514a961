// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Long-lived collaborators extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility. [`VersionGenerator`]
//! is the exception: it is synchronous because storage draws from it inside
//! an open transaction.

pub mod adapter;
pub mod auth;
pub mod files;
pub mod sequence;
pub mod storage;

pub use adapter::PluginAdapter;
pub use auth::Authenticator;
pub use files::FileUsageNotifier;
pub use sequence::VersionGenerator;
pub use storage::MessageStore;
