//! Client data layer for the civic events API.
//!
//! Reads go through [`EventFeed`], which prefers the API and falls back to a
//! static snapshot when the API call fails. Writes go straight to
//! [`ApiClient`]. The derived lists the UI shows live in [`views`].

pub mod api;
pub mod config;
pub mod draft;
pub mod error;
pub mod feed;
pub mod session;
pub mod snapshot;
pub mod views;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use draft::{DraftErrors, EventDraft, FieldError};
pub use error::ClientError;
pub use feed::{EventFeed, EventSource, Loaded, Origin};
pub use session::Session;
pub use snapshot::SnapshotSource;
