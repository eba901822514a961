// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST gateway for the Missive messaging backend.
//!
//! The gateway is a thin transport adapter: [`service::MessagingService`]
//! validates requests and checks participant roles, the handlers translate
//! between HTTP and the service, and mutation outcomes map one-to-one onto
//! status codes.

pub mod auth;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod server;
pub mod service;

pub use auth::StaticAuthenticator;
pub use notifier::{HttpFileUsageNotifier, LoggingFileUsageNotifier};
pub use server::{build_router, start_server, GatewayState, ServerConfig};
pub use service::{MessagingService, ServiceLimits};
