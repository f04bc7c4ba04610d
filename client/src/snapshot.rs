//! Static event snapshot used for reads when the API cannot be reached.
//!
//! Snapshot entries usually carry no id. Each one gets
//! [`EventId::from_position`] for its index, so ids stay stable as long as
//! the file is unchanged.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use civic_core::{Event, EventId};
use serde::Deserialize;

use crate::error::ClientError;
use crate::feed::EventSource;
use crate::session::Session;

const BUNDLED_SNAPSHOT: &str = include_str!("../assets/eventsData.json");

#[derive(Debug, Clone)]
enum SnapshotData {
    Bundled(&'static str),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct SnapshotSource {
    data: SnapshotData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotEntry {
    #[serde(default, alias = "_id")]
    id: Option<EventId>,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    thumbnail_url: String,
    #[serde(default)]
    location: String,
    event_date: DateTime<Utc>,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    created_by: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl SnapshotEntry {
    fn into_event(self, position: usize) -> Event {
        Event {
            id: self.id.unwrap_or_else(|| EventId::from_position(position)),
            title: self.title,
            description: self.description,
            kind: self.kind,
            thumbnail_url: self.thumbnail_url,
            location: self.location,
            event_date: self.event_date,
            members: self.members,
            created_by: self.created_by,
            created_at: self.created_at.unwrap_or_default(),
        }
    }
}

impl SnapshotSource {
    /// The snapshot compiled into this crate.
    pub fn bundled() -> Self {
        Self {
            data: SnapshotData::Bundled(BUNDLED_SNAPSHOT),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data: SnapshotData::File(path.into()),
        }
    }

    pub async fn load(&self) -> Result<Vec<Event>, ClientError> {
        let entries: Vec<SnapshotEntry> = match &self.data {
            SnapshotData::Bundled(json) => serde_json::from_str(json)?,
            SnapshotData::File(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|source| ClientError::SnapshotIo {
                        path: path.clone(),
                        source,
                    })?;
                serde_json::from_slice(&bytes)?
            }
        };

        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(position, entry)| entry.into_event(position))
            .collect())
    }

    /// Finds an event by id, list position, or title slug.
    pub async fn find(&self, key: &str) -> Result<Event, ClientError> {
        self.load()
            .await?
            .into_iter()
            .enumerate()
            .find(|(position, event)| {
                event.id.to_string() == key
                    || position.to_string() == key
                    || slug(&event.title) == key
            })
            .map(|(_, event)| event)
            .ok_or_else(|| ClientError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl EventSource for SnapshotSource {
    async fn list_events(&self) -> Result<Vec<Event>, ClientError> {
        self.load().await
    }

    async fn find_event(&self, _session: Option<&Session>, key: &str) -> Result<Event, ClientError> {
        self.find(key).await
    }
}

/// Lowercase, whitespace runs collapsed to `-`, everything outside `[a-z0-9-]` dropped.
pub fn slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            slug.push(c);
        }
    }
    slug
}
