// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Missive.
//!
//! Provides the message repository, the per-user change log, the durable
//! version sequence and the mutation coordinator that ties them together,
//! exposed through [`SqliteStorage`] as a [`missive_core::MessageStore`].

pub mod adapter;
pub mod coordinator;
pub mod database;
pub mod locks;
pub mod migrations;
pub mod queries;
pub mod sequence;

pub use adapter::SqliteStorage;
pub use coordinator::MutationCoordinator;
pub use database::Database;
pub use locks::KeyedLocks;
pub use sequence::TimelineSequence;
