//! The create/edit form model and its validation rules. The API accepts
//! anything that has the required fields; these checks exist only here.

use chrono::{DateTime, Utc};
use civic_core::{Event, EventUpdate, NewEvent};
use reqwest::Url;
use thiserror::Error;

pub const EVENT_TYPES: [&str; 8] = [
    "Cleanup",
    "Plantation",
    "Donation",
    "Education",
    "Healthcare",
    "Community Building",
    "Environmental",
    "Other",
];

pub const MIN_DESCRIPTION_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    /// One of [`EVENT_TYPES`].
    pub kind: String,
    pub thumbnail_url: String,
    pub location: String,
    pub event_date: Option<DateTime<Utc>>,
}

impl Default for EventDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            kind: EVENT_TYPES[0].to_string(),
            thumbnail_url: String::new(),
            location: String::new(),
            event_date: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summarize(.0))]
pub struct DraftErrors(pub Vec<FieldError>);

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DraftErrors {
    pub fn for_field(&self, field: &str) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }
}

impl EventDraft {
    /// Prefills the edit form from a stored event.
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            kind: event.kind.clone(),
            thumbnail_url: event.thumbnail_url.clone(),
            location: event.location.clone(),
            event_date: Some(event.event_date),
        }
    }

    /// Checks every field and returns the validated event date.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, DraftErrors> {
        let mut errors = Vec::new();
        let mut fail = |field, message| errors.push(FieldError { field, message });

        if self.title.trim().is_empty() {
            fail("title", "Event title is required");
        }

        if self.description.trim().is_empty() {
            fail("description", "Event description is required");
        } else if self.description.chars().count() < MIN_DESCRIPTION_LEN {
            fail(
                "description",
                "Description must be at least 50 characters long",
            );
        }

        if !EVENT_TYPES.contains(&self.kind.as_str()) {
            fail("type", "Please select a valid event type");
        }

        if self.location.trim().is_empty() {
            fail("location", "Event location is required");
        }

        if self.thumbnail_url.trim().is_empty() {
            fail("thumbnailUrl", "Thumbnail image URL is required");
        } else if Url::parse(self.thumbnail_url.trim()).is_err() {
            fail("thumbnailUrl", "Please enter a valid URL");
        }

        let event_date = self.event_date.filter(|date| *date > now);
        if event_date.is_none() {
            fail("eventDate", "Event date must be in the future");
        }

        match event_date {
            Some(date) if errors.is_empty() => Ok(date),
            _ => Err(DraftErrors(errors)),
        }
    }

    /// Create payload: the creator is the signed-in user and nobody has joined yet.
    pub fn into_new_event(self, creator: &str, now: DateTime<Utc>) -> Result<NewEvent, DraftErrors> {
        let event_date = self.validate(now)?;
        Ok(NewEvent {
            title: Some(self.title),
            description: Some(self.description),
            event_date: Some(event_date),
            location: Some(self.location),
            members: Some(Vec::new()),
            kind: Some(self.kind),
            thumbnail_url: Some(self.thumbnail_url),
            created_by: Some(creator.to_string()),
            created_at: Some(now),
        })
    }

    /// Replace payload that keeps the original creator and members.
    pub fn into_update(self, original: &Event, now: DateTime<Utc>) -> Result<EventUpdate, DraftErrors> {
        let event_date = self.validate(now)?;
        Ok(EventUpdate {
            title: self.title,
            description: self.description,
            kind: self.kind,
            thumbnail_url: self.thumbnail_url,
            location: self.location,
            event_date,
            members: original.members.clone(),
            created_by: original.created_by.clone(),
        })
    }
}
