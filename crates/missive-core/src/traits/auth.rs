// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticator trait: resolves transport credentials to user identities.

use async_trait::async_trait;

use crate::error::MissiveError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Credential, UserId};

/// Resolves a credential presented at the transport layer to a [`UserId`].
///
/// The message store never sees credentials, only resolved identities.
#[async_trait]
pub trait Authenticator: PluginAdapter {
    /// Returns `Ok(None)` when the credential is unknown or expired.
    async fn authenticate(&self, credential: &Credential) -> Result<Option<UserId>, MissiveError>;
}
