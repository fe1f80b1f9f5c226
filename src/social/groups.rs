//! Private dining groups (`groups/{id}`) and their chat
//! (`groups/{id}/messages`)

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::{document_id, required, SocialError, SocialResult};
use crate::store::{fields, timestamp_now, Direction, Document, DocumentStore, Filter, Query};
use crate::websocket::{ConnectionHub, WsEvent};

pub const GROUPS: &str = "groups";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub member_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dining_time: Option<String>,
    pub created_by: Option<String>,
    pub created_at: Option<String>,
}

impl Group {
    fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.str("name").unwrap_or_default().to_string(),
            member_ids: doc.strings("memberIds"),
            restaurant_name: doc.str("restaurantName").map(String::from),
            dining_time: doc.str("diningTime").map(String::from),
            created_by: doc.str("createdBy").map(String::from),
            created_at: doc.str("createdAt").map(String::from),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewGroup {
    pub name: String,
    pub created_by: String,
    pub member_ids: Vec<String>,
    pub restaurant_name: Option<String>,
    pub dining_time: Option<String>,
}

/// One chat message, in a group or a public channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    pub sender_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub created_at: Option<String>,
}

impl ChatMessage {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            group_id: doc.str("groupId").map(String::from),
            channel_name: doc.str("channelName").map(String::from),
            sender_id: doc.str("senderId").unwrap_or_default().to_string(),
            kind: doc.str("type").unwrap_or("text").to_string(),
            text: doc.str("text").unwrap_or_default().to_string(),
            created_at: doc.str("createdAt").map(String::from),
        }
    }
}

/// Messages under `collection`, oldest first
pub(crate) async fn ordered_messages(
    store: &dyn DocumentStore,
    collection: &str,
) -> SocialResult<Vec<ChatMessage>> {
    let query = Query::new().order_by("createdAt", Direction::Ascending);
    Ok(store
        .query(collection, &query)
        .await?
        .iter()
        .map(ChatMessage::from_document)
        .collect())
}

pub struct GroupService {
    store: Arc<dyn DocumentStore>,
    hub: Arc<ConnectionHub>,
}

impl GroupService {
    pub fn new(store: Arc<dyn DocumentStore>, hub: Arc<ConnectionHub>) -> Self {
        Self { store, hub }
    }

    pub async fn create(&self, group: &NewGroup) -> SocialResult<Group> {
        let name = required(&group.name, "name")?;
        let creator = required(&group.created_by, "createdBy")?;

        let mut members = vec![creator.clone()];
        for member in &group.member_ids {
            let member = member.trim();
            if !member.is_empty() && !members.iter().any(|m| m == member) {
                members.push(member.to_string());
            }
        }

        let mut doc = fields(json!({
            "name": name,
            "memberIds": members,
            "createdBy": creator,
            "createdAt": timestamp_now(),
        }));
        if let Some(restaurant) = group.restaurant_name.as_deref().filter(|s| !s.trim().is_empty()) {
            doc.insert("restaurantName".to_string(), json!(restaurant.trim()));
        }
        if let Some(time) = group.dining_time.as_deref().filter(|s| !s.trim().is_empty()) {
            doc.insert("diningTime".to_string(), json!(time.trim()));
        }

        let id = self.store.add(GROUPS, doc).await?;
        tracing::info!(group_id = %id, members = members.len(), "Group created");
        self.get(&id).await
    }

    pub async fn get(&self, group_id: &str) -> SocialResult<Group> {
        self.store
            .get(&format!("{}/{}", GROUPS, document_id(group_id, "groupId")?))
            .await?
            .map(|d| Group::from_document(&d))
            .ok_or_else(|| SocialError::GroupNotFound(group_id.to_string()))
    }

    pub async fn list_for_member(&self, user_id: &str) -> SocialResult<Vec<Group>> {
        let query = Query::new().filter(Filter::contains("memberIds", user_id));
        Ok(self
            .store
            .query(GROUPS, &query)
            .await?
            .iter()
            .map(Group::from_document)
            .collect())
    }

    /// Post a text message; blank text is ignored and returns `None`
    pub async fn send_text(
        &self,
        group_id: &str,
        sender_id: &str,
        text: &str,
    ) -> SocialResult<Option<ChatMessage>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        self.get(group_id).await?;

        let collection = format!("{}/{}/messages", GROUPS, group_id);
        let id = self
            .store
            .add(
                &collection,
                fields(json!({
                    "groupId": group_id,
                    "senderId": sender_id,
                    "type": "text",
                    "text": text,
                    "createdAt": timestamp_now(),
                })),
            )
            .await?;

        let message = self
            .store
            .get(&format!("{}/{}", collection, id))
            .await?
            .map(|d| ChatMessage::from_document(&d))
            .ok_or_else(|| SocialError::GroupNotFound(group_id.to_string()))?;

        let payload = serde_json::to_value(&message).unwrap_or_default();
        self.hub.publish(WsEvent::group_message(group_id, payload)).await;
        Ok(Some(message))
    }

    pub async fn messages(&self, group_id: &str) -> SocialResult<Vec<ChatMessage>> {
        self.get(group_id).await?;
        ordered_messages(self.store.as_ref(), &format!("{}/{}/messages", GROUPS, group_id)).await
    }
}
