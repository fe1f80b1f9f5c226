//! Friend requests (`friendRequests/{id}`) and friend lists
//! (`users/{uid}.friends`)
//!
//! A request goes `pending` → `accepted` | `rejected`. A request that was
//! accepted or rejected earlier can be sent again, which resets it to
//! `pending`; this also covers friends who were removed after accepting.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::{document_id, user_path, SocialError, SocialResult};
use crate::store::{fields, timestamp_now, Document, DocumentStore, Filter, Query};
use crate::websocket::{ConnectionHub, WsEvent};

pub const FRIEND_REQUESTS: &str = "friendRequests";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("accepted") => RequestStatus::Accepted,
            Some("rejected") => RequestStatus::Rejected,
            _ => RequestStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub status: RequestStatus,
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl FriendRequest {
    fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            from_user_id: doc.str("fromUserId").unwrap_or_default().to_string(),
            to_user_id: doc.str("toUserId").unwrap_or_default().to_string(),
            status: RequestStatus::parse(doc.str("status")),
            created_at: doc.str("createdAt").map(String::from),
            updated_at: doc.str("updatedAt").map(String::from),
        }
    }
}

/// What [`FriendService::send_request`] did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "requestId", rename_all = "snake_case")]
pub enum SendOutcome {
    /// A new request was created
    Sent(String),
    /// An earlier accepted or rejected request was reset to pending
    Resent(String),
    /// The other user had already asked; their request was accepted
    AutoAccepted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    None,
    PendingSent,
    PendingReceived,
    Friends,
}

pub struct FriendService {
    store: Arc<dyn DocumentStore>,
    hub: Arc<ConnectionHub>,
}

fn request_path(request_id: &str) -> SocialResult<String> {
    Ok(format!("{}/{}", FRIEND_REQUESTS, document_id(request_id, "requestId")?))
}

impl FriendService {
    pub fn new(store: Arc<dyn DocumentStore>, hub: Arc<ConnectionHub>) -> Self {
        Self { store, hub }
    }

    pub async fn friends(&self, user_id: &str) -> SocialResult<Vec<String>> {
        Ok(self
            .store
            .get(&user_path(user_id)?)
            .await?
            .map(|d| d.strings("friends"))
            .unwrap_or_default())
    }

    pub async fn get(&self, request_id: &str) -> SocialResult<FriendRequest> {
        self.store
            .get(&request_path(request_id)?)
            .await?
            .map(|d| FriendRequest::from_document(&d))
            .ok_or_else(|| SocialError::RequestNotFound(request_id.to_string()))
    }

    /// Request from `from` to `to` in that direction only
    async fn existing(&self, from: &str, to: &str) -> SocialResult<Option<FriendRequest>> {
        let query = Query::new()
            .filter(Filter::eq("fromUserId", from))
            .filter(Filter::eq("toUserId", to));
        let docs = self.store.query(FRIEND_REQUESTS, &query).await?;
        Ok(docs.first().map(FriendRequest::from_document))
    }

    async fn notify(&self, request: &FriendRequest) {
        for user in [&request.from_user_id, &request.to_user_id] {
            self.hub
                .publish(WsEvent::friend_request(user, &request.id, request.status.as_str()))
                .await;
        }
    }

    pub async fn send_request(&self, from: &str, to: &str) -> SocialResult<SendOutcome> {
        document_id(from, "fromUserId")?;
        document_id(to, "toUserId")?;
        if from == to {
            return Err(SocialError::SelfRequest);
        }
        if self.friends(from).await?.iter().any(|f| f == to) {
            return Err(SocialError::AlreadyFriends);
        }

        if let Some(existing) = self.existing(from, to).await? {
            if existing.status == RequestStatus::Pending {
                return Err(SocialError::AlreadyRequested);
            }
            self.store
                .set(
                    &request_path(&existing.id)?,
                    fields(json!({ "status": "pending", "createdAt": timestamp_now() })),
                    true,
                )
                .await?;
            let request = self.get(&existing.id).await?;
            self.notify(&request).await;
            tracing::info!(request_id = %request.id, "Friend request re-sent");
            return Ok(SendOutcome::Resent(request.id));
        }

        if let Some(reverse) = self.existing(to, from).await? {
            if reverse.status == RequestStatus::Pending {
                self.accept(&reverse.id).await?;
                return Ok(SendOutcome::AutoAccepted(reverse.id));
            }
        }

        let id = self
            .store
            .add(
                FRIEND_REQUESTS,
                fields(json!({
                    "fromUserId": from,
                    "toUserId": to,
                    "status": "pending",
                    "createdAt": timestamp_now(),
                })),
            )
            .await?;

        let request = self.get(&id).await?;
        self.notify(&request).await;
        tracing::info!(request_id = %id, "Friend request sent");
        Ok(SendOutcome::Sent(id))
    }

    async fn pending_where(&self, field: &str, user_id: &str) -> SocialResult<Vec<FriendRequest>> {
        let query = Query::new().filter(Filter::eq(field, user_id));
        Ok(self
            .store
            .query(FRIEND_REQUESTS, &query)
            .await?
            .iter()
            .map(FriendRequest::from_document)
            .filter(|r| r.status == RequestStatus::Pending)
            .collect())
    }

    pub async fn incoming(&self, user_id: &str) -> SocialResult<Vec<FriendRequest>> {
        self.pending_where("toUserId", user_id).await
    }

    pub async fn outgoing(&self, user_id: &str) -> SocialResult<Vec<FriendRequest>> {
        self.pending_where("fromUserId", user_id).await
    }

    /// Accept a request and add each user to the other's friend list
    ///
    /// A failed friend-list update is logged and skipped.
    pub async fn accept(&self, request_id: &str) -> SocialResult<FriendRequest> {
        let request = self.get(request_id).await?;
        self.store
            .set(
                &request_path(request_id)?,
                fields(json!({ "status": "accepted", "updatedAt": timestamp_now() })),
                true,
            )
            .await?;

        let pairs = [
            (&request.from_user_id, &request.to_user_id),
            (&request.to_user_id, &request.from_user_id),
        ];
        for (user, friend) in pairs {
            if let Err(e) = self
                .store
                .array_union(&user_path(user)?, "friends", vec![json!(friend)])
                .await
            {
                tracing::error!(user_id = %user, error = %e, "Failed to update friends list");
            }
        }

        let request = self.get(request_id).await?;
        self.notify(&request).await;
        tracing::info!(request_id = %request_id, "Friend request accepted");
        Ok(request)
    }

    pub async fn reject(&self, request_id: &str) -> SocialResult<FriendRequest> {
        self.get(request_id).await?;
        self.store
            .set(
                &request_path(request_id)?,
                fields(json!({ "status": "rejected", "updatedAt": timestamp_now() })),
                true,
            )
            .await?;

        let request = self.get(request_id).await?;
        self.notify(&request).await;
        Ok(request)
    }

    /// Withdraw a request by deleting it
    pub async fn cancel(&self, request_id: &str) -> SocialResult<()> {
        let mut request = self.get(request_id).await?;
        self.store.delete(&request_path(request_id)?).await?;

        request.status = RequestStatus::Rejected;
        self.notify(&request).await;
        Ok(())
    }

    pub async fn remove_friend(&self, user_id: &str, friend_id: &str) -> SocialResult<()> {
        let (user_doc, friend_doc) = (user_path(user_id)?, user_path(friend_id)?);
        self.store
            .array_remove(&user_doc, "friends", vec![json!(friend_id)])
            .await?;
        self.store
            .array_remove(&friend_doc, "friends", vec![json!(user_id)])
            .await?;
        tracing::info!(user_id = %user_id, friend_id = %friend_id, "Friend removed");
        Ok(())
    }

    pub async fn status(&self, user_id: &str, other_id: &str) -> SocialResult<FriendshipStatus> {
        document_id(other_id, "userId")?;
        if self.friends(user_id).await?.iter().any(|f| f == other_id) {
            return Ok(FriendshipStatus::Friends);
        }
        if let Some(sent) = self.existing(user_id, other_id).await? {
            if sent.status == RequestStatus::Pending {
                return Ok(FriendshipStatus::PendingSent);
            }
        }
        if let Some(received) = self.existing(other_id, user_id).await? {
            if received.status == RequestStatus::Pending {
                return Ok(FriendshipStatus::PendingReceived);
            }
        }
        Ok(FriendshipStatus::None)
    }
}
