//! weather station host library.
//!
//! polling, rolling history, persistence and the dashboard api live here so
//! `main.rs` only wires them together.

pub mod config;
pub mod domain;
pub mod logging;
pub mod outlook;
pub mod persistence;
pub mod poller;
pub mod server;
pub mod source;
pub mod store;
