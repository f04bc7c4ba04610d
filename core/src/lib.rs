//! Shared data model for the civic events service and its client.

pub mod envelope;
pub mod event;

pub use envelope::{ApiErrorBody, ApiErrorResponse, ApiResponse, CreatedEvent, UpdateOutcome};
pub use event::{
    Event, EventId, EventUpdate, EventWindow, JoinEligibility, JoinRequest, Membership,
    MissingFields, NewEvent,
};
