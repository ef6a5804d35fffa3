//! HTTP surface: routes, handlers and middleware

pub mod auth;
pub mod middleware;
pub mod services;
