// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Missive messaging backend.
//!
//! Provides the error type, the domain types of the mutation and
//! synchronization protocol, and the adapter traits implemented by the
//! storage, notifier and authenticator crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MissiveError;
pub use types::{
    AdapterType, ChangeLogEntry, Created, Credential, HealthStatus, Message, MessageId,
    MutationOutcome, NewMessage, Transition, UserId, Version,
};

pub use traits::{
    Authenticator, FileUsageNotifier, MessageStore, PluginAdapter, VersionGenerator,
};
