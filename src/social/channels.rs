//! Public topic channels (`publicChannels/{id}`) with chat
//! (`.../messages`) and dining events (`.../events`)
//!
//! Channels are addressed by name. Documents are looked up by their `name`
//! field, so a channel seeded before anyone claimed it and one created by a
//! user can coexist; the one recording `createdBy` wins.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::groups::{ordered_messages, ChatMessage};
use super::{document_id, required, SocialError, SocialResult};
use crate::store::{fields, timestamp_now, Direction, Document, DocumentStore, Filter, Query};
use crate::websocket::{ConnectionHub, EventAction, WsEvent};

pub const PUBLIC_CHANNELS: &str = "publicChannels";

/// Channels every deployment starts with
pub const DEFAULT_CHANNELS: [&str; 6] = [
    "Cybersecurity",
    "Data Science",
    "Computer Science",
    "Computer Engineering",
    "Design",
    "Africana Studies",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub participant_ids: Vec<String>,
    pub created_by: Option<String>,
    pub created_at: Option<String>,
}

impl Channel {
    fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.str("name").unwrap_or_default().to_string(),
            participant_ids: doc.strings("participantIds"),
            created_by: doc.str("createdBy").map(String::from),
            created_at: doc.str("createdAt").map(String::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEvent {
    pub id: String,
    pub channel_name: String,
    pub creator_id: String,
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub dining_time: String,
    pub created_at: Option<String>,
}

impl ChannelEvent {
    fn from_document(doc: &Document) -> Self {
        let text = |field: &str| doc.str(field).unwrap_or_default().to_string();
        Self {
            id: doc.id.clone(),
            channel_name: text("channelName"),
            creator_id: text("creatorId"),
            restaurant_id: text("restaurantId"),
            restaurant_name: text("restaurantName"),
            dining_time: text("diningTime"),
            created_at: doc.str("createdAt").map(String::from),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewChannelEvent {
    pub creator_id: String,
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub dining_time: String,
}

pub struct ChannelService {
    store: Arc<dyn DocumentStore>,
    hub: Arc<ConnectionHub>,
}

impl ChannelService {
    pub fn new(store: Arc<dyn DocumentStore>, hub: Arc<ConnectionHub>) -> Self {
        Self { store, hub }
    }

    /// Document for `name`, preferring one that records a creator
    async fn find(&self, name: &str) -> SocialResult<Option<Document>> {
        let query = Query::new().filter(Filter::eq("name", name));
        let mut docs = self.store.query(PUBLIC_CHANNELS, &query).await?;
        let idx = docs.iter().position(|d| d.str("createdBy").is_some()).unwrap_or(0);
        if docs.is_empty() {
            return Ok(None);
        }
        Ok(Some(docs.swap_remove(idx)))
    }

    async fn require(&self, name: &str) -> SocialResult<Document> {
        self.find(name)
            .await?
            .ok_or_else(|| SocialError::ChannelNotFound(name.to_string()))
    }

    pub async fn get(&self, name: &str) -> SocialResult<Channel> {
        Ok(Channel::from_document(&self.require(name).await?))
    }

    pub async fn get_or_create(&self, name: &str) -> SocialResult<Channel> {
        let name = required(name, "name")?;
        if let Some(doc) = self.find(&name).await? {
            return Ok(Channel::from_document(&doc));
        }

        let id = self
            .store
            .add(
                PUBLIC_CHANNELS,
                fields(json!({
                    "name": name,
                    "participantIds": [],
                    "createdAt": timestamp_now(),
                })),
            )
            .await?;
        tracing::info!(channel = %name, id = %id, "Channel created");
        self.get(&name).await
    }

    /// Seed [`DEFAULT_CHANNELS`]; existing channels are left alone
    pub async fn ensure_defaults(&self) -> SocialResult<()> {
        for name in DEFAULT_CHANNELS {
            self.get_or_create(name).await?;
        }
        Ok(())
    }

    /// Create a channel, or claim an existing unclaimed one, for `creator`
    pub async fn create(&self, name: &str, creator: &str) -> SocialResult<Channel> {
        let creator = required(creator, "createdBy")?;
        let channel = self.get_or_create(name).await?;
        let path = format!("{}/{}", PUBLIC_CHANNELS, channel.id);

        if channel.created_by.is_none() {
            self.store
                .set(&path, fields(json!({ "createdBy": creator })), true)
                .await?;
        }
        self.store
            .array_union(&path, "participantIds", vec![json!(creator)])
            .await?;
        self.get(&channel.name).await
    }

    /// Channels ordered by name, optionally filtered by a case-insensitive
    /// substring
    pub async fn list(&self, search: Option<&str>) -> SocialResult<Vec<Channel>> {
        let query = Query::new().order_by("name", Direction::Ascending);
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        Ok(self
            .store
            .query(PUBLIC_CHANNELS, &query)
            .await?
            .iter()
            .map(Channel::from_document)
            .filter(|c| match &needle {
                Some(n) => c.name.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .collect())
    }

    /// Post to a channel; blank text is ignored and returns `None`
    pub async fn send_message(
        &self,
        name: &str,
        sender_id: &str,
        text: &str,
    ) -> SocialResult<Option<ChatMessage>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let channel = self.get_or_create(name).await?;
        let channel_path = format!("{}/{}", PUBLIC_CHANNELS, channel.id);
        let collection = format!("{}/messages", channel_path);

        let id = self
            .store
            .add(
                &collection,
                fields(json!({
                    "channelName": channel.name,
                    "senderId": sender_id,
                    "type": "text",
                    "text": text,
                    "createdAt": timestamp_now(),
                })),
            )
            .await?;
        self.store
            .array_union(&channel_path, "participantIds", vec![json!(sender_id)])
            .await?;

        let message = self
            .store
            .get(&format!("{}/{}", collection, id))
            .await?
            .map(|d| ChatMessage::from_document(&d))
            .ok_or_else(|| SocialError::ChannelNotFound(channel.name.clone()))?;

        let payload = serde_json::to_value(&message).unwrap_or_default();
        self.hub.publish(WsEvent::channel_message(&channel.name, payload)).await;
        Ok(Some(message))
    }

    pub async fn messages(&self, name: &str) -> SocialResult<Vec<ChatMessage>> {
        let doc = self.require(name).await?;
        ordered_messages(self.store.as_ref(), &format!("{}/messages", doc.path)).await
    }

    pub async fn create_event(&self, name: &str, event: &NewChannelEvent) -> SocialResult<ChannelEvent> {
        let creator = required(&event.creator_id, "creatorId")?;
        let restaurant_id = required(&event.restaurant_id, "restaurantId")?;
        let restaurant_name = required(&event.restaurant_name, "restaurantName")?;
        let dining_time = required(&event.dining_time, "diningTime")?;

        let doc = self.require(name).await?;
        let collection = format!("{}/events", doc.path);
        let id = self
            .store
            .add(
                &collection,
                fields(json!({
                    "channelName": name,
                    "creatorId": creator,
                    "restaurantId": restaurant_id,
                    "restaurantName": restaurant_name,
                    "diningTime": dining_time,
                    "createdAt": timestamp_now(),
                })),
            )
            .await?;

        let created = self
            .store
            .get(&format!("{}/{}", collection, id))
            .await?
            .map(|d| ChannelEvent::from_document(&d))
            .ok_or_else(|| SocialError::EventNotFound(id.clone()))?;

        let payload = serde_json::to_value(&created).unwrap_or_default();
        self.hub
            .publish(WsEvent::channel_event(name, EventAction::Created, payload))
            .await;
        tracing::info!(channel = %name, event_id = %id, "Channel event created");
        Ok(created)
    }

    /// Events ordered by dining time
    pub async fn events(&self, name: &str) -> SocialResult<Vec<ChannelEvent>> {
        let doc = self.require(name).await?;
        let query = Query::new().order_by("diningTime", Direction::Ascending);
        Ok(self
            .store
            .query(&format!("{}/events", doc.path), &query)
            .await?
            .iter()
            .map(ChannelEvent::from_document)
            .collect())
    }

    pub async fn cancel_event(&self, name: &str, event_id: &str) -> SocialResult<()> {
        let doc = self.require(name).await?;
        let path = format!("{}/events/{}", doc.path, document_id(event_id, "eventId")?);
        let event = self
            .store
            .get(&path)
            .await?
            .map(|d| ChannelEvent::from_document(&d))
            .ok_or_else(|| SocialError::EventNotFound(event_id.to_string()))?;

        self.store.delete(&path).await?;

        let payload = serde_json::to_value(&event).unwrap_or_default();
        self.hub
            .publish(WsEvent::channel_event(name, EventAction::Cancelled, payload))
            .await;
        Ok(())
    }

    /// Delete a channel with its messages and events
    ///
    /// A channel that records a creator can only be disbanded by that user.
    pub async fn disband(&self, name: &str, requested_by: &str) -> SocialResult<()> {
        let doc = self.require(name).await?;
        if let Some(creator) = doc.str("createdBy") {
            if creator != requested_by {
                return Err(SocialError::NotChannelCreator);
            }
        }

        let query = Query::new().filter(Filter::eq("name", name));
        let channels = self.store.query(PUBLIC_CHANNELS, &query).await?;

        let mut deleted = 0usize;
        for channel in &channels {
            for sub in ["messages", "events"] {
                for child in self.store.list(&format!("{}/{}", channel.path, sub)).await? {
                    self.store.delete(&child.path).await?;
                    deleted += 1;
                }
            }
            self.store.delete(&channel.path).await?;
        }

        self.hub.publish(WsEvent::channel_disbanded(name)).await;
        tracing::info!(channel = %name, documents = deleted, "Channel disbanded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::testing;
    use crate::websocket::ServerMessage;

    async fn service() -> ChannelService {
        let (hub, _rx) = testing::hub_with_listener(&[]).await;
        ChannelService::new(testing::store(), hub)
    }

    fn event(creator: &str, time: &str) -> NewChannelEvent {
        NewChannelEvent {
            creator_id: creator.to_string(),
            restaurant_id: "r1".to_string(),
            restaurant_name: "Saffron Grill".to_string(),
            dining_time: time.to_string(),
        }
    }

    #[tokio::test]
    async fn test_ensure_defaults_is_idempotent() {
        let service = service().await;
        service.ensure_defaults().await.unwrap();
        service.ensure_defaults().await.unwrap();

        let channels = service.list(None).await.unwrap();
        assert_eq!(channels.len(), DEFAULT_CHANNELS.len());
        assert_eq!(channels[0].name, "Africana Studies");

        let computer = service.list(Some("COMPUTER")).await.unwrap();
        let names: Vec<_> = computer.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Computer Engineering", "Computer Science"]);
    }

    #[tokio::test]
    async fn test_create_claims_unclaimed_channel() {
        let service = service().await;
        service.ensure_defaults().await.unwrap();
        assert_eq!(service.get("Design").await.unwrap().created_by, None);

        let channel = service.create("Design", "a").await.unwrap();
        assert_eq!(channel.created_by.as_deref(), Some("a"));
        assert_eq!(channel.participant_ids, vec!["a"]);

        // A second claim does not change the creator
        service.create("Design", "b").await.unwrap();
        assert_eq!(service.get("Design").await.unwrap().created_by.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_messages_add_participants() {
        let (hub, mut rx) = testing::hub_with_listener(&["channels.Ramen"]).await;
        let service = ChannelService::new(testing::store(), hub);

        assert!(service.send_message("Ramen", "a", "  ").await.unwrap().is_none());
        let sent = service.send_message("Ramen", "a", "who's in?").await.unwrap().unwrap();
        assert_eq!(sent.channel_name.as_deref(), Some("Ramen"));

        let channel = service.get("Ramen").await.unwrap();
        assert_eq!(channel.participant_ids, vec!["a"]);
        assert_eq!(service.messages("Ramen").await.unwrap().len(), 1);

        match rx.try_recv() {
            Ok(ServerMessage::ChatMessage { conversation, message }) => {
                assert_eq!(conversation, "channels.Ramen");
                assert_eq!(message["text"], "who's in?");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_events_lifecycle() {
        let (hub, mut rx) = testing::hub_with_listener(&["channels.*"]).await;
        let service = ChannelService::new(testing::store(), hub);
        service.get_or_create("Design").await.unwrap();

        let later = service.create_event("Design", &event("a", "2026-10-20T19:00")).await.unwrap();
        service.create_event("Design", &event("b", "2026-10-20T12:00")).await.unwrap();

        let events = service.events("Design").await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].creator_id, "b");

        service.cancel_event("Design", &later.id).await.unwrap();
        assert_eq!(service.events("Design").await.unwrap().len(), 1);
        assert!(matches!(
            service.cancel_event("Design", &later.id).await,
            Err(SocialError::EventNotFound(_))
        ));

        let mut actions = Vec::new();
        while let Ok(ServerMessage::ChannelEvent { action, .. }) = rx.try_recv() {
            actions.push(action);
        }
        assert_eq!(actions, vec![EventAction::Created, EventAction::Created, EventAction::Cancelled]);
    }

    #[tokio::test]
    async fn test_event_requires_fields() {
        let service = service().await;
        service.get_or_create("Design").await.unwrap();

        let result = service.create_event("Design", &event("a", " ")).await;
        assert!(matches!(result, Err(SocialError::Validation(_))));
    }

    #[tokio::test]
    async fn test_disband() {
        let service = service().await;
        service.create("Supper Club", "a").await.unwrap();
        service.send_message("Supper Club", "b", "hi").await.unwrap();
        service.create_event("Supper Club", &event("a", "2026-10-21T18:00")).await.unwrap();

        assert!(matches!(
            service.disband("Supper Club", "b").await,
            Err(SocialError::NotChannelCreator)
        ));

        service.disband("Supper Club", "a").await.unwrap();
        assert!(matches!(
            service.get("Supper Club").await,
            Err(SocialError::ChannelNotFound(_))
        ));
    }
}
