//! Social Features
//!
//! Everything users share with each other, kept in the document store:
//!
//! - [`profiles`]: user profiles, preference lists and username search
//! - [`bookmarks`]: saved restaurants
//! - [`friends`]: friend requests and friend lists
//! - [`groups`]: private dining groups and their chat
//! - [`channels`]: public topic channels with chat and dining events
//!
//! Every write that other users can observe is followed by a
//! [`WsEvent`](crate::websocket::WsEvent) on the matching topic.

pub mod bookmarks;
pub mod channels;
pub mod friends;
pub mod groups;
pub mod profiles;

pub use bookmarks::BookmarkService;
pub use channels::{Channel, ChannelEvent, ChannelService, NewChannelEvent, DEFAULT_CHANNELS};
pub use friends::{FriendRequest, FriendService, FriendshipStatus, RequestStatus, SendOutcome};
pub use groups::{ChatMessage, Group, GroupService, NewGroup};
pub use profiles::{PreferenceField, ProfileService, ProfileUpdate, UserProfile, UserSummary};

use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by the social services
#[derive(Debug, Error)]
pub enum SocialError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Validation(String),

    #[error("User profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Unknown profile field: {0}")]
    UnknownField(String),

    #[error("Already friends")]
    AlreadyFriends,

    #[error("Friend request already sent")]
    AlreadyRequested,

    #[error("Cannot send a friend request to yourself")]
    SelfRequest,

    #[error("Friend request not found: {0}")]
    RequestNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Only the channel creator can disband it")]
    NotChannelCreator,
}

pub type SocialResult<T> = Result<T, SocialError>;

/// Trimmed value, or a validation error naming the field
pub(crate) fn required(value: &str, field: &str) -> SocialResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SocialError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// An id that is exactly one document path segment
pub(crate) fn document_id<'a>(value: &'a str, field: &str) -> SocialResult<&'a str> {
    if value.is_empty() || value.contains('/') || value == "." || value == ".." {
        return Err(SocialError::Validation(format!("Invalid {}: {:?}", field, value)));
    }
    Ok(value)
}

/// `users/{uid}`
pub(crate) fn user_path(user_id: &str) -> SocialResult<String> {
    Ok(format!("{}/{}", profiles::USERS, document_id(user_id, "userId")?))
}
