use async_trait::async_trait;
use chrono::Utc;
use civic_core::{Event, EventId, EventUpdate, NewEvent};
use tokio::sync::RwLock;

use super::EventStore;
use crate::utils::error::AppError;

/// Process-local store. Every mutation runs under the write lock, which makes
/// add-member's check-then-append atomic.
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<Event>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        Ok(self.events.read().await.clone())
    }

    async fn get_event(&self, id: EventId) -> Result<Event, AppError> {
        self.events
            .read()
            .await
            .iter()
            .find(|event| event.id == id)
            .cloned()
            .ok_or_else(|| AppError::event_not_found(id))
    }

    async fn create_event(&self, fields: NewEvent) -> Result<Event, AppError> {
        let event = fields.into_event(EventId::new(), Utc::now())?;
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn add_member(&self, id: EventId, email: &str) -> Result<bool, AppError> {
        let mut events = self.events.write().await;
        let event = events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or_else(|| AppError::event_not_found(id))?;
        Ok(event.add_member(email))
    }

    async fn replace_event(&self, id: EventId, fields: EventUpdate) -> Result<(), AppError> {
        let mut events = self.events.write().await;
        let event = events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or_else(|| AppError::event_not_found(id))?;
        event.apply(fields);
        Ok(())
    }

    async fn delete_event(&self, id: EventId) -> Result<(), AppError> {
        let mut events = self.events.write().await;
        let position = events
            .iter()
            .position(|event| event.id == id)
            .ok_or_else(|| AppError::event_not_found(id))?;
        events.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn fields(title: &str) -> NewEvent {
        NewEvent {
            title: Some(title.to_string()),
            description: Some("A morning of community work for everyone".to_string()),
            event_date: Some(Utc::now() + Duration::days(2)),
            location: Some("Town hall".to_string()),
            created_by: Some("owner@example.org".to_string()),
            ..NewEvent::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_persists() {
        let store = MemoryEventStore::new();

        let event = store.create_event(fields("Cleanup")).await.unwrap();
        let fetched = store.get_event(event.id).await.unwrap();

        assert_eq!(fetched, event);
        assert!(fetched.members.is_empty());
    }

    #[tokio::test]
    async fn create_with_missing_fields_persists_nothing() {
        let store = MemoryEventStore::new();
        let incomplete = NewEvent {
            location: None,
            ..fields("Cleanup")
        };

        let err = store.create_event(incomplete).await.unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(store.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn join_twice_keeps_one_membership() {
        let store = MemoryEventStore::new();
        let event = store.create_event(fields("Cleanup")).await.unwrap();

        assert!(store.add_member(event.id, "a@x.org").await.unwrap());
        assert!(!store.add_member(event.id, "a@x.org").await.unwrap());

        let members = store.get_event(event.id).await.unwrap().members;
        assert_eq!(members, vec!["a@x.org"]);
    }

    #[tokio::test]
    async fn concurrent_joins_do_not_duplicate() {
        let store = Arc::new(MemoryEventStore::new());
        let id = store.create_event(fields("Cleanup")).await.unwrap().id;

        let joins: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.add_member(id, "a@x.org").await })
            })
            .collect();
        for join in joins {
            join.await.unwrap().unwrap();
        }

        let members = store.get_event(id).await.unwrap().members;
        assert_eq!(members.len(), 1);
    }

    #[tokio::test]
    async fn join_unknown_event_is_not_found() {
        let store = MemoryEventStore::new();

        let err = store.add_member(EventId::new(), "a@x.org").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_overwrites_fields_wholesale() {
        let store = MemoryEventStore::new();
        let event = store.create_event(fields("Cleanup")).await.unwrap();
        let update = EventUpdate {
            title: "Plantation".to_string(),
            description: String::new(),
            kind: "Environmental".to_string(),
            thumbnail_url: String::new(),
            location: "Riverside".to_string(),
            event_date: event.event_date,
            members: vec!["b@x.org".to_string(), "b@x.org".to_string()],
            created_by: "owner@example.org".to_string(),
        };

        store.replace_event(event.id, update).await.unwrap();

        let replaced = store.get_event(event.id).await.unwrap();
        assert_eq!(replaced.title, "Plantation");
        assert_eq!(replaced.description, "");
        assert_eq!(replaced.members.len(), 2);
        assert_eq!(replaced.created_at, event.created_at);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = MemoryEventStore::new();
        let event = store.create_event(fields("Cleanup")).await.unwrap();

        store.delete_event(event.id).await.unwrap();

        assert!(matches!(
            store.get_event(event.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_event(event.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
