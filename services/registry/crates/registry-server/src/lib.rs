//! Charm agent registry server library, exposes modules for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod auth;
pub mod error;
pub mod handlers;
pub mod publish;
pub mod server;
pub mod store;
