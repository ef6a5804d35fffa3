//! tokenlink - token-owned short links
//!
//! A URL shortener whose links belong to whoever holds the bearer token
//! used to create them.
//!
//! # Architecture
//! - `storage`: link persistence (SeaORM on SQLite / MySQL / PostgreSQL)
//! - `services`: link lifecycle rules and capacity control
//! - `visits`: buffered visit counting
//! - `api`: HTTP handlers and middleware
//! - `config`: configuration loading
//! - `runtime`: startup, server and shutdown
//! - `system`: logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod visits;
