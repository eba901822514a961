// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Missive integration tests.
//!
//! # Components
//!
//! - [`TestHarness`] - temp SQLite store, messaging service and router wired together
//! - [`RecordingNotifier`] - captures file-usage notifications
//! - [`FailingNotifier`] - rejects every notification

pub mod harness;
pub mod mock_notifier;

pub use harness::{header_value, json_body, TestHarness, TestHarnessBuilder, DEFAULT_USERS};
pub use mock_notifier::{FailingNotifier, RecordingNotifier};
