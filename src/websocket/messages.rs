//! WebSocket Message Types
//!
//! Defines all message types exchanged between FoodBuddy clients and the
//! realtime hub.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics for real-time updates
    Subscribe {
        /// Topics to subscribe to (e.g., "groups.abc", "channels.*")
        topics: Vec<String>,
    },
    /// Unsubscribe from topics
    Unsubscribe { topics: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected { connection_id: String },
    /// Subscription confirmed
    Subscribed { topics: Vec<String> },
    /// Unsubscription confirmed
    Unsubscribed { topics: Vec<String> },
    /// Pong response to ping
    Pong,
    Error { message: String },
    /// A message was posted to a group or public channel
    ChatMessage {
        /// Topic of the conversation ("groups.{id}" or "channels.{name}")
        conversation: String,
        /// The stored message document
        message: Value,
    },
    /// A dining event was created or cancelled in a channel
    ChannelEvent {
        channel: String,
        action: EventAction,
        event: Value,
    },
    /// A channel and all its history were deleted
    ChannelDisbanded { channel: String },
    /// A user's bookmark set changed
    Bookmarks {
        user_id: String,
        restaurant_ids: Vec<String>,
    },
    /// A friend request involving the user changed
    FriendRequests {
        user_id: String,
        request_id: String,
        status: String,
    },
    /// Server notice
    System { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Created,
    Cancelled,
}

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    /// Topic this event belongs to (e.g., "groups.abc")
    pub topic: String,
    /// The message to send to subscribers
    pub message: ServerMessage,
}

impl WsEvent {
    pub fn group_message(group_id: &str, message: Value) -> Self {
        let topic = format!("groups.{}", group_id);
        Self {
            message: ServerMessage::ChatMessage {
                conversation: topic.clone(),
                message,
            },
            topic,
        }
    }

    pub fn channel_message(channel: &str, message: Value) -> Self {
        let topic = format!("channels.{}", channel);
        Self {
            message: ServerMessage::ChatMessage {
                conversation: topic.clone(),
                message,
            },
            topic,
        }
    }

    pub fn channel_event(channel: &str, action: EventAction, event: Value) -> Self {
        Self {
            topic: format!("channels.{}", channel),
            message: ServerMessage::ChannelEvent {
                channel: channel.to_string(),
                action,
                event,
            },
        }
    }

    pub fn channel_disbanded(channel: &str) -> Self {
        Self {
            topic: format!("channels.{}", channel),
            message: ServerMessage::ChannelDisbanded {
                channel: channel.to_string(),
            },
        }
    }

    pub fn bookmarks(user_id: &str, restaurant_ids: Vec<String>) -> Self {
        Self {
            topic: format!("bookmarks.{}", user_id),
            message: ServerMessage::Bookmarks {
                user_id: user_id.to_string(),
                restaurant_ids,
            },
        }
    }

    pub fn friend_request(user_id: &str, request_id: &str, status: &str) -> Self {
        Self {
            topic: format!("friends.{}", user_id),
            message: ServerMessage::FriendRequests {
                user_id: user_id.to_string(),
                request_id: request_id.to_string(),
                status: status.to_string(),
            },
        }
    }

    pub fn system(message: &str) -> Self {
        Self {
            topic: "system".to_string(),
            message: ServerMessage::System {
                message: message.to_string(),
            },
        }
    }
}
