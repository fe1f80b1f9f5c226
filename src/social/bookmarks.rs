//! Saved restaurants (`users/{uid}/bookmarks/{restaurantId}`)

use serde_json::json;
use std::sync::Arc;

use super::{document_id, user_path, SocialResult};
use crate::store::{fields, DocumentStore};
use crate::websocket::{ConnectionHub, WsEvent};

pub struct BookmarkService {
    store: Arc<dyn DocumentStore>,
    hub: Arc<ConnectionHub>,
}

fn collection(user_id: &str) -> SocialResult<String> {
    Ok(format!("{}/bookmarks", user_path(user_id)?))
}

fn bookmark_path(user_id: &str, restaurant_id: &str) -> SocialResult<String> {
    Ok(format!(
        "{}/{}",
        collection(user_id)?,
        document_id(restaurant_id, "restaurantId")?
    ))
}

impl BookmarkService {
    pub fn new(store: Arc<dyn DocumentStore>, hub: Arc<ConnectionHub>) -> Self {
        Self { store, hub }
    }

    /// Bookmarked restaurant ids, sorted
    pub async fn list(&self, user_id: &str) -> SocialResult<Vec<String>> {
        let mut ids: Vec<String> = self
            .store
            .list(&collection(user_id)?)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    pub async fn add(&self, user_id: &str, restaurant_id: &str) -> SocialResult<Vec<String>> {
        let path = bookmark_path(user_id, restaurant_id)?;
        let created_at = chrono::Utc::now().timestamp_millis();
        self.store
            .set(&path, fields(json!({ "createdAt": created_at })), false)
            .await?;

        tracing::debug!(user_id = %user_id, restaurant_id = %restaurant_id, "Bookmark added");
        self.publish(user_id).await
    }

    pub async fn remove(&self, user_id: &str, restaurant_id: &str) -> SocialResult<Vec<String>> {
        let path = bookmark_path(user_id, restaurant_id)?;
        self.store.delete(&path).await?;

        tracing::debug!(user_id = %user_id, restaurant_id = %restaurant_id, "Bookmark removed");
        self.publish(user_id).await
    }

    async fn publish(&self, user_id: &str) -> SocialResult<Vec<String>> {
        let ids = self.list(user_id).await?;
        self.hub.publish(WsEvent::bookmarks(user_id, ids.clone())).await;
        Ok(ids)
    }
}
