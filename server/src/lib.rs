//! HTTP API over the civic events collection.

pub mod auth;
pub mod config;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;
