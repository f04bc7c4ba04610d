//! Two-tier read path: the API first, the snapshot only when the API call fails.
//! Results are never merged; each one says where it came from.

use async_trait::async_trait;
use civic_core::Event;
use tracing::warn;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::Session;
use crate::snapshot::SnapshotSource;

#[async_trait]
pub trait EventSource: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>, ClientError>;

    async fn find_event(&self, session: Option<&Session>, key: &str) -> Result<Event, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Remote,
    Snapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub origin: Origin,
    pub data: T,
}

pub struct EventFeed<P = ApiClient, S = SnapshotSource> {
    primary: P,
    fallback: S,
}

impl EventFeed {
    pub fn from_config(config: &ClientConfig) -> Self {
        let fallback = match &config.snapshot_path {
            Some(path) => SnapshotSource::from_path(path),
            None => SnapshotSource::bundled(),
        };
        Self::new(ApiClient::new(&config.base_url), fallback)
    }
}

impl<P, S> EventFeed<P, S>
where
    P: EventSource,
    S: EventSource,
{
    pub fn new(primary: P, fallback: S) -> Self {
        Self { primary, fallback }
    }

    pub async fn list_events(&self) -> Result<Loaded<Vec<Event>>, ClientError> {
        match self.primary.list_events().await {
            Ok(data) => Ok(Loaded {
                origin: Origin::Remote,
                data,
            }),
            Err(primary) => {
                warn!(error = %primary, "API not available, falling back to snapshot");
                let data = self
                    .fallback
                    .list_events()
                    .await
                    .map_err(|fallback| exhausted(primary, fallback))?;
                Ok(Loaded {
                    origin: Origin::Snapshot,
                    data,
                })
            }
        }
    }

    pub async fn find_event(
        &self,
        session: Option<&Session>,
        key: &str,
    ) -> Result<Loaded<Event>, ClientError> {
        match self.primary.find_event(session, key).await {
            Ok(data) => Ok(Loaded {
                origin: Origin::Remote,
                data,
            }),
            Err(primary) => {
                warn!(error = %primary, key, "API lookup failed, falling back to snapshot");
                let data = self
                    .fallback
                    .find_event(session, key)
                    .await
                    .map_err(|fallback| exhausted(primary, fallback))?;
                Ok(Loaded {
                    origin: Origin::Snapshot,
                    data,
                })
            }
        }
    }
}

fn exhausted(primary: ClientError, fallback: ClientError) -> ClientError {
    ClientError::Exhausted {
        primary: Box::new(primary),
        fallback: Box::new(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use civic_core::EventId;

    struct Fixed(Result<Vec<Event>, u16>);

    fn event(title: &str) -> Event {
        Event {
            id: EventId::new(),
            title: title.to_string(),
            description: String::new(),
            kind: String::new(),
            thumbnail_url: String::new(),
            location: String::new(),
            event_date: Utc::now(),
            members: Vec::new(),
            created_by: String::new(),
            created_at: Utc::now(),
        }
    }

    fn failure(status: u16) -> ClientError {
        ClientError::Api {
            status,
            code: "INTERNAL_SERVER_ERROR".to_string(),
            message: "down".to_string(),
        }
    }

    #[async_trait]
    impl EventSource for Fixed {
        async fn list_events(&self) -> Result<Vec<Event>, ClientError> {
            self.0.clone().map_err(failure)
        }

        async fn find_event(&self, _: Option<&Session>, key: &str) -> Result<Event, ClientError> {
            let events = self.list_events().await?;
            events
                .into_iter()
                .find(|e| e.title == key)
                .ok_or_else(|| ClientError::NotFound(key.to_string()))
        }
    }

    #[tokio::test]
    async fn primary_wins_when_available() {
        let feed = EventFeed::new(
            Fixed(Ok(vec![event("remote")])),
            Fixed(Ok(vec![event("local")])),
        );

        let loaded = feed.list_events().await.unwrap();

        assert_eq!(loaded.origin, Origin::Remote);
        assert_eq!(loaded.data.len(), 1);
        assert_eq!(loaded.data[0].title, "remote");
    }

    #[tokio::test]
    async fn fallback_is_used_without_merging() {
        let feed = EventFeed::new(Fixed(Err(500)), Fixed(Ok(vec![event("local")])));

        let loaded = feed.list_events().await.unwrap();

        assert_eq!(loaded.origin, Origin::Snapshot);
        assert_eq!(loaded.data.len(), 1);
        assert_eq!(loaded.data[0].title, "local");
    }

    #[tokio::test]
    async fn lookup_falls_back_on_any_failure() {
        let feed = EventFeed::new(Fixed(Ok(Vec::new())), Fixed(Ok(vec![event("local")])));

        let loaded = feed.find_event(None, "local").await.unwrap();

        assert_eq!(loaded.origin, Origin::Snapshot);
    }

    #[tokio::test]
    async fn both_failing_reports_both_causes() {
        let feed = EventFeed::new(Fixed(Err(500)), Fixed(Err(404)));

        let err = feed.list_events().await.unwrap_err();

        match err {
            ClientError::Exhausted { primary, fallback } => {
                assert!(!primary.is_not_found());
                assert!(fallback.is_not_found());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
