use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Store-assigned identifier of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id for the event at `position` in a list that carries no ids.
    pub fn from_position(position: usize) -> Self {
        Self(Uuid::from_u128(position as u128))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EventId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(alias = "_id")]
    pub id: EventId,
    pub title: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub thumbnail_url: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Whether an event still lies ahead. Derived from `eventDate`, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventWindow {
    Upcoming,
    Past,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    NotJoined,
    Joined,
}

/// Whether a user may join an event, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinEligibility {
    Own,
    Ended,
    AlreadyJoined,
    Open,
}

impl fmt::Display for JoinEligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinEligibility::Own => "This is your event",
            JoinEligibility::Ended => "This event has already ended",
            JoinEligibility::AlreadyJoined => "You have already joined this event",
            JoinEligibility::Open => "Open to join",
        })
    }
}

impl Event {
    pub fn window(&self, now: DateTime<Utc>) -> EventWindow {
        if self.event_date > now {
            EventWindow::Upcoming
        } else {
            EventWindow::Past
        }
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.window(now) == EventWindow::Upcoming
    }

    pub fn membership(&self, email: &str) -> Membership {
        if self.members.iter().any(|member| member == email) {
            Membership::Joined
        } else {
            Membership::NotJoined
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        !self.created_by.is_empty() && self.created_by == email
    }

    pub fn join_eligibility(&self, email: &str, now: DateTime<Utc>) -> JoinEligibility {
        if self.is_owned_by(email) {
            JoinEligibility::Own
        } else if !self.is_upcoming(now) {
            JoinEligibility::Ended
        } else if self.membership(email) == Membership::Joined {
            JoinEligibility::AlreadyJoined
        } else {
            JoinEligibility::Open
        }
    }

    /// Appends `email` unless already present. Returns whether the list changed.
    pub fn add_member(&mut self, email: &str) -> bool {
        if self.membership(email) == Membership::Joined {
            return false;
        }
        self.members.push(email.to_string());
        true
    }

    /// Overwrites every replaceable field with the caller's values.
    pub fn apply(&mut self, update: EventUpdate) {
        self.title = update.title;
        self.description = update.description;
        self.kind = update.kind;
        self.thumbnail_url = update.thumbnail_url;
        self.location = update.location;
        self.event_date = update.event_date;
        self.members = update.members;
        self.created_by = update.created_by;
    }
}

/// Required create fields that were absent or empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Title, description, eventDate, and location are required (missing: {})", .0.join(", "))]
pub struct MissingFields(pub Vec<&'static str>);

/// Body of a create request. Everything is optional on the wire so that
/// missing required fields surface as a validation error rather than a
/// deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewEvent {
    pub fn into_event(self, id: EventId, now: DateTime<Utc>) -> Result<Event, MissingFields> {
        let mut missing = Vec::new();
        let title = required(self.title, "title", &mut missing);
        let description = required(self.description, "description", &mut missing);
        if self.event_date.is_none() {
            missing.push("eventDate");
        }
        let location = required(self.location, "location", &mut missing);

        let (Some(title), Some(description), Some(event_date), Some(location)) =
            (title, description, self.event_date, location)
        else {
            return Err(MissingFields(missing));
        };

        let mut members: Vec<String> = Vec::new();
        for member in self.members.unwrap_or_default() {
            if !members.contains(&member) {
                members.push(member);
            }
        }

        Ok(Event {
            id,
            title,
            description,
            kind: self.kind.unwrap_or_default(),
            thumbnail_url: self.thumbnail_url.unwrap_or_default(),
            location,
            event_date,
            members,
            created_by: self.created_by.unwrap_or_default(),
            created_at: self.created_at.unwrap_or(now),
        })
    }
}

fn required(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            missing.push(name);
            None
        }
    }
}

/// Body of a replace request: the full set of replaceable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub location: String,
    pub event_date: DateTime<Utc>,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub user_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn complete() -> NewEvent {
        NewEvent {
            title: Some("Beach cleanup".to_string()),
            description: Some("Pick up litter along the shoreline".to_string()),
            event_date: Some(Utc::now() + Duration::days(3)),
            location: Some("North beach".to_string()),
            ..NewEvent::default()
        }
    }

    #[test]
    fn new_event_applies_defaults() {
        let now = Utc::now();
        let event = complete().into_event(EventId::new(), now).unwrap();

        assert!(event.members.is_empty());
        assert_eq!(event.kind, "");
        assert_eq!(event.thumbnail_url, "");
        assert_eq!(event.created_by, "");
        assert_eq!(event.created_at, now);
    }

    #[test]
    fn new_event_reports_every_missing_field() {
        let fields = NewEvent {
            title: Some(String::new()),
            location: Some("Park".to_string()),
            ..NewEvent::default()
        };

        let err = fields.into_event(EventId::new(), Utc::now()).unwrap_err();
        assert_eq!(err.0, vec!["title", "description", "eventDate"]);
    }

    #[test]
    fn new_event_deduplicates_initial_members() {
        let fields = NewEvent {
            members: Some(vec!["a@x.org".into(), "b@x.org".into(), "a@x.org".into()]),
            ..complete()
        };

        let event = fields.into_event(EventId::new(), Utc::now()).unwrap();
        assert_eq!(event.members, vec!["a@x.org", "b@x.org"]);
    }

    #[test]
    fn add_member_is_idempotent() {
        let mut event = complete().into_event(EventId::new(), Utc::now()).unwrap();

        assert!(event.add_member("a@x.org"));
        assert!(!event.add_member("a@x.org"));
        assert_eq!(event.members, vec!["a@x.org"]);
        assert_eq!(event.membership("a@x.org"), Membership::Joined);
        assert_eq!(event.membership("b@x.org"), Membership::NotJoined);
    }

    #[test]
    fn join_eligibility_checks_owner_then_date_then_membership() {
        let now = Utc::now();
        let mut event = complete().into_event(EventId::new(), now).unwrap();
        event.created_by = "owner@x.org".to_string();
        event.members = vec!["a@x.org".to_string()];

        assert_eq!(event.join_eligibility("owner@x.org", now), JoinEligibility::Own);
        assert_eq!(event.join_eligibility("a@x.org", now), JoinEligibility::AlreadyJoined);
        assert_eq!(event.join_eligibility("b@x.org", now), JoinEligibility::Open);

        event.event_date = now - Duration::hours(1);
        assert_eq!(event.join_eligibility("a@x.org", now), JoinEligibility::Ended);
        assert_eq!(event.join_eligibility("b@x.org", now), JoinEligibility::Ended);
        assert_eq!(event.join_eligibility("owner@x.org", now), JoinEligibility::Own);
    }

    #[test]
    fn window_compares_against_now() {
        let now = Utc::now();
        let mut event = complete().into_event(EventId::new(), now).unwrap();
        assert_eq!(event.window(now), EventWindow::Upcoming);

        event.event_date = now;
        assert_eq!(event.window(now), EventWindow::Past);
    }

    #[test]
    fn event_reads_mongo_style_id_and_type() {
        let json = r#"{
            "_id": "6f1d3c4a-5b2e-4d8f-9a0b-1c2d3e4f5a6b",
            "title": "Tree planting",
            "description": "Plant saplings",
            "type": "Plantation",
            "location": "Hill park",
            "eventDate": "2030-04-01T09:00:00Z",
            "createdAt": "2030-01-01T09:00:00Z"
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, "Plantation");
        assert_eq!(
            event.id.to_string(),
            "6f1d3c4a-5b2e-4d8f-9a0b-1c2d3e4f5a6b"
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "Plantation");
        assert!(value.get("eventDate").is_some());
    }

    #[test]
    fn positional_ids_are_stable() {
        assert_eq!(EventId::from_position(3), EventId::from_position(3));
        assert_ne!(EventId::from_position(3), EventId::from_position(4));
    }
}
