//! hive-relay: realtime presence, messaging and call-signaling relay.
//! This crate exposes internal modules for integration testing.
//! The binary entry point is in main.rs.

pub mod calls;
pub mod chat;
pub mod config;
pub mod db;
pub mod relay;
pub mod routes;
pub mod state;
pub mod store;
pub mod ws;
