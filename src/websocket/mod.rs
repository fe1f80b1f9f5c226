//! WebSocket Realtime Updates
//!
//! Pushes chat messages, channel events, bookmark and friend-request changes
//! to connected clients, so pages update without polling.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Manages all active connections and subscriptions
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! ## Topics
//!
//! Clients connect to `/ws` and subscribe to:
//! - `groups.{groupId}` - Messages in a dining group
//! - `channels.{name}` - Messages, events and disbanding of a public channel
//! - `bookmarks.{uid}` - The user's bookmark set
//! - `friends.{uid}` - Friend requests sent to or from the user
//! - `{prefix}.*` - Every topic under a prefix
//! - `system` - Server notices
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8080/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['channels.Design']}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'chat_message') render(msg.message);
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{is_valid_topic, ConnectionHub, HubConfig, HubError};
pub use messages::{ClientMessage, EventAction, ServerMessage, WsEvent};
