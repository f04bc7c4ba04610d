//! Persistence for the event collection.
//!
//! Every operation that addresses a record by id fails with
//! [`AppError::NotFound`] when the id does not resolve.

use async_trait::async_trait;
use civic_core::{Event, EventId, EventUpdate, NewEvent};

use crate::utils::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

#[async_trait]
pub trait EventStore: Send + Sync {
    /// All events, unfiltered and unpaginated, in whatever order the store yields.
    async fn list_events(&self) -> Result<Vec<Event>, AppError>;

    async fn get_event(&self, id: EventId) -> Result<Event, AppError>;

    /// Assigns a fresh id. Nothing is written when required fields are missing.
    async fn create_event(&self, fields: NewEvent) -> Result<Event, AppError>;

    /// Adds `email` to the members of `id` unless it is already there.
    /// The check and the append happen atomically. Returns whether the record changed.
    async fn add_member(&self, id: EventId, email: &str) -> Result<bool, AppError>;

    /// Overwrites the replaceable fields wholesale.
    async fn replace_event(&self, id: EventId, fields: EventUpdate) -> Result<(), AppError>;

    async fn delete_event(&self, id: EventId) -> Result<(), AppError>;
}
