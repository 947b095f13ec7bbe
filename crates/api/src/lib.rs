//! HTTP API: configuration, routing, middleware and request/response mapping.

pub mod app;
pub mod config;
pub mod context;
pub mod mailer;
pub mod middleware;
pub mod rate_limit;
