// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-usage notifier trait.

use async_trait::async_trait;

use crate::error::MissiveError;
use crate::traits::adapter::PluginAdapter;

/// Reports whether an attached file is referenced by a live message.
///
/// Called once per attachment after a successful create (`in_use = true`) or
/// delete (`in_use = false`). Failures never roll back the message mutation.
#[async_trait]
pub trait FileUsageNotifier: PluginAdapter {
    async fn notify(&self, file_id: &str, in_use: bool) -> Result<(), MissiveError>;
}
