use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use civic_core::{CreatedEvent, Event, EventId, EventUpdate, JoinRequest, NewEvent, UpdateOutcome};
use tracing::info;

use crate::auth::AuthUser;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

/// Ids that do not parse cannot name a stored event.
fn parse_id(raw: &str) -> Result<EventId, AppError> {
    raw.parse().map_err(|_| AppError::event_not_found(raw))
}

fn ensure_owner(event: &Event, caller: &str) -> Result<(), AppError> {
    if event.is_owned_by(caller) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the creator of an event can change it".to_string(),
        ))
    }
}

/// GET /events
pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = state.store.list_events().await?;
    Ok(success(events, "Events retrieved successfully").into_response())
}

/// GET /events/:id
pub async fn get_event(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event = state.store.get_event(parse_id(&id)?).await?;
    Ok(success(event, "Event retrieved successfully").into_response())
}

/// POST /events
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(fields) = payload?;
    let event = state.store.create_event(fields).await?;

    info!(event_id = %event.id, created_by = %event.created_by, "Event created");
    let body = CreatedEvent { event_id: event.id };
    Ok(created(body, "Event created successfully").into_response())
}

/// PATCH /events/:id
pub async fn join_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let Json(JoinRequest { user_email }) = payload?;
    let email = user_email.trim();
    if email.is_empty() {
        return Err(AppError::ValidationError("userEmail is required".to_string()));
    }

    let modified = state.store.add_member(id, email).await?;
    if modified {
        info!(event_id = %id, member = %email, "Member joined");
    }

    let body = UpdateOutcome {
        modified_count: u64::from(modified),
    };
    Ok(success(body, "Event updated successfully").into_response())
}

/// PUT /events/:id
///
/// Only the creator may replace an event, and the stored creator is written
/// back whatever the body says.
pub async fn replace_event(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<EventUpdate>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let Json(mut fields) = payload?;

    let existing = state.store.get_event(id).await?;
    ensure_owner(&existing, caller.email()?)?;

    fields.created_by = existing.created_by;
    state.store.replace_event(id, fields).await?;

    info!(event_id = %id, "Event replaced");
    let body = UpdateOutcome { modified_count: 1 };
    Ok(success(body, "Event updated successfully").into_response())
}

/// DELETE /events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;

    let existing = state.store.get_event(id).await?;
    ensure_owner(&existing, caller.email()?)?;

    state.store.delete_event(id).await?;

    info!(event_id = %id, "Event deleted");
    Ok(empty_success("Event deleted successfully").into_response())
}
