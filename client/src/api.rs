use async_trait::async_trait;
use chrono::{DateTime, Utc};
use civic_core::{
    ApiErrorResponse, ApiResponse, CreatedEvent, Event, EventId, JoinEligibility, JoinRequest,
    UpdateOutcome,
};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::draft::EventDraft;
use crate::error::ClientError;
use crate::feed::EventSource;
use crate::session::Session;

/// HTTP client for the events API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn event_url(&self, id: EventId) -> String {
        self.url(&format!("/events/{id}"))
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, ClientError> {
        let response = self.http.get(self.url("/events")).send().await?;
        let events: Vec<Event> = require(read_envelope(response).await?)?;
        debug!(count = events.len(), "Events fetched from API");
        Ok(events)
    }

    pub async fn get_event(&self, session: &Session, id: EventId) -> Result<Event, ClientError> {
        let request = authorized(self.http.get(self.event_url(id)), session);
        require(read_envelope(request.send().await?).await?)
    }

    /// Validates the draft, then creates the event as `session`'s user.
    pub async fn create_event(
        &self,
        session: &Session,
        draft: EventDraft,
        now: DateTime<Utc>,
    ) -> Result<EventId, ClientError> {
        let fields = draft.into_new_event(&session.email, now)?;
        let request = authorized(self.http.post(self.url("/events")), session).json(&fields);
        let created: CreatedEvent = require(read_envelope(request.send().await?).await?)?;
        Ok(created.event_id)
    }

    /// Adds the session's user to the members. Returns false when they had already joined.
    /// Creators cannot join their own event, and nobody can join one that has ended.
    pub async fn join_event(
        &self,
        session: &Session,
        event: &Event,
        now: DateTime<Utc>,
    ) -> Result<bool, ClientError> {
        match event.join_eligibility(&session.email, now) {
            eligibility @ (JoinEligibility::Own | JoinEligibility::Ended) => {
                return Err(ClientError::NotJoinable(eligibility));
            }
            JoinEligibility::AlreadyJoined | JoinEligibility::Open => {}
        }

        let body = JoinRequest {
            user_email: session.email.clone(),
        };
        let request = authorized(self.http.patch(self.event_url(event.id)), session).json(&body);
        let outcome: UpdateOutcome = require(read_envelope(request.send().await?).await?)?;
        Ok(outcome.modified_count > 0)
    }

    pub async fn update_event(
        &self,
        session: &Session,
        original: &Event,
        draft: EventDraft,
        now: DateTime<Utc>,
    ) -> Result<(), ClientError> {
        let fields = draft.into_update(original, now)?;
        let request = authorized(self.http.put(self.event_url(original.id)), session).json(&fields);
        read_envelope::<UpdateOutcome>(request.send().await?).await?;
        Ok(())
    }

    pub async fn delete_event(&self, session: &Session, id: EventId) -> Result<(), ClientError> {
        let request = authorized(self.http.delete(self.event_url(id)), session);
        read_envelope::<serde_json::Value>(request.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl EventSource for ApiClient {
    async fn list_events(&self) -> Result<Vec<Event>, ClientError> {
        ApiClient::list_events(self).await
    }

    async fn find_event(&self, session: Option<&Session>, key: &str) -> Result<Event, ClientError> {
        let session = session.ok_or(ClientError::MissingSession)?;
        let id = key
            .parse::<EventId>()
            .map_err(|_| ClientError::NotFound(key.to_string()))?;
        self.get_event(session, id).await
    }
}

fn authorized(request: RequestBuilder, session: &Session) -> RequestBuilder {
    request.bearer_auth(session.token())
}

fn require<T>(data: Option<T>) -> Result<T, ClientError> {
    data.ok_or_else(|| ClientError::Decode("response carried no data".to_string()))
}

/// Unwraps the response envelope, turning error envelopes into [`ClientError::Api`].
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Option<T>, ClientError> {
    let status = response.status();
    if status.is_success() {
        let body: ApiResponse<T> = response.json().await?;
        return Ok(body.data);
    }

    let bytes = response.bytes().await?;
    let (code, message) = match serde_json::from_slice::<ApiErrorResponse>(&bytes) {
        Ok(body) => (body.error.code, body.error.message),
        Err(_) => (
            "UNKNOWN".to_string(),
            String::from_utf8_lossy(&bytes).into_owned(),
        ),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use chrono::Duration;
    use civic_server::auth::{Claims, JwtVerifier};
    use civic_server::config::Config;
    use civic_server::routes::create_routes;
    use civic_server::state::AppState;
    use civic_server::store::MemoryEventStore;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tokio::net::TcpListener;

    use super::*;
    use crate::config::ClientConfig;
    use crate::feed::{EventFeed, Origin};
    use crate::snapshot::SnapshotSource;

    const SECRET: &[u8] = b"client-test-secret";

    async fn serve() -> ApiClient {
        serve_store(MemoryEventStore::new()).await
    }

    async fn serve_store(store: MemoryEventStore) -> ApiClient {
        let state = AppState::new(Arc::new(store), Arc::new(JwtVerifier::hmac(SECRET)));
        let config = Config::from_lookup(|_| None).unwrap();
        let app = create_routes(state, &config);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        ApiClient::new(format!("http://{addr}/"))
    }

    fn session(email: &str) -> Session {
        let claims = Claims {
            sub: format!("uid-{email}"),
            email: Some(email.to_string()),
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap();
        Session::new(email, token)
    }

    fn draft(now: DateTime<Utc>) -> EventDraft {
        EventDraft {
            title: "Beach cleanup".to_string(),
            description: "Two hours of collecting litter along the dunes, then lunch together."
                .to_string(),
            kind: "Cleanup".to_string(),
            thumbnail_url: "https://img.example/beach.jpg".to_string(),
            location: "South beach".to_string(),
            event_date: Some(now + Duration::days(3)),
        }
    }

    #[tokio::test]
    async fn event_lifecycle_against_server() {
        let api = serve().await;
        let owner = session("owner@example.org");
        let member = session("member@example.org");
        let now = Utc::now();

        let id = api.create_event(&owner, draft(now), now).await.unwrap();
        let created = api.get_event(&member, id).await.unwrap();
        assert!(api.join_event(&member, &created, now).await.unwrap());
        assert!(!api.join_event(&member, &created, now).await.unwrap());

        let event = api.get_event(&member, id).await.unwrap();
        assert_eq!(event.created_by, "owner@example.org");
        assert_eq!(event.members, vec!["member@example.org"]);

        let mut edit = EventDraft::from_event(&event);
        edit.title = "Dune cleanup".to_string();
        let err = api
            .update_event(&member, &event, edit.clone(), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 403, .. }));
        api.update_event(&owner, &event, edit, now).await.unwrap();

        let events = api.list_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Dune cleanup");
        assert_eq!(events[0].members, vec!["member@example.org"]);

        api.delete_event(&owner, id).await.unwrap();
        let err = api.get_event(&owner, id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn own_and_ended_events_cannot_be_joined() {
        let now = Utc::now();
        let ended = Event {
            id: EventId::new(),
            title: "Last week's picnic".to_string(),
            description: String::new(),
            kind: "Community Building".to_string(),
            thumbnail_url: String::new(),
            location: "Riverside park".to_string(),
            event_date: now - Duration::days(7),
            members: Vec::new(),
            created_by: "owner@example.org".to_string(),
            created_at: now - Duration::days(14),
        };
        let api = serve_store(MemoryEventStore::with_events(vec![ended.clone()])).await;
        let owner = session("owner@example.org");
        let stranger = session("stranger@example.org");

        let err = api.join_event(&stranger, &ended, now).await.unwrap_err();
        assert!(matches!(err, ClientError::NotJoinable(JoinEligibility::Ended)));

        let upcoming = api.create_event(&owner, draft(now), now).await.unwrap();
        let upcoming = api.get_event(&owner, upcoming).await.unwrap();
        let err = api.join_event(&owner, &upcoming, now).await.unwrap_err();
        assert!(matches!(err, ClientError::NotJoinable(JoinEligibility::Own)));

        let stored = api.get_event(&owner, ended.id).await.unwrap();
        assert!(stored.members.is_empty());
        assert!(api.get_event(&owner, upcoming.id).await.unwrap().members.is_empty());
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_server() {
        let api = serve().await;
        let now = Utc::now();
        let mut invalid = draft(now);
        invalid.description = "short".to_string();

        let err = api
            .create_event(&session("owner@example.org"), invalid, now)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::InvalidDraft(_)));
        assert!(api.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn feed_reads_from_api_when_up() {
        let api = serve().await;
        let now = Utc::now();
        api.create_event(&session("owner@example.org"), draft(now), now)
            .await
            .unwrap();

        let feed = EventFeed::new(api, SnapshotSource::bundled());
        let loaded = feed.list_events().await.unwrap();

        assert_eq!(loaded.origin, Origin::Remote);
        assert_eq!(loaded.data.len(), 1);
    }

    #[tokio::test]
    async fn feed_falls_back_when_api_unreachable() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let feed = EventFeed::from_config(&ClientConfig {
            base_url: format!("http://{addr}"),
            snapshot_path: None,
        });

        let loaded = feed.list_events().await.unwrap();
        assert_eq!(loaded.origin, Origin::Snapshot);
        assert!(!loaded.data.is_empty());

        let found = feed.find_event(None, "0").await.unwrap();
        assert_eq!(found.origin, Origin::Snapshot);
        assert_eq!(found.data.id, EventId::from_position(0));
    }

    #[tokio::test]
    async fn unreachable_api_is_reported_as_such() {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = ApiClient::new(format!("http://{addr}"))
            .list_events()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unreachable(_)));
    }
}
