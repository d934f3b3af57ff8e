use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::Message;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InboxError {
    #[error("message content is empty")]
    EmptyContent,

    #[error("cannot send a message to yourself")]
    SelfMessage,
}

/// One row of the conversation list
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    #[serde(rename = "otherUserId")]
    pub other_user_id: String,
    #[serde(rename = "otherUserName")]
    pub other_user_name: String,
    #[serde(rename = "lastMessage")]
    pub last_message: Message,
    #[serde(rename = "unreadCount")]
    pub unread_count: usize,
}

/// The other party of a message, from `user_id`'s point of view
#[inline]
pub fn counterpart<'a>(message: &'a Message, user_id: &str) -> Option<&'a str> {
    if message.sender_id == user_id {
        Some(message.receiver_id.as_str())
    } else if message.receiver_id == user_id {
        Some(message.sender_id.as_str())
    } else {
        None
    }
}

/// Group `messages` into conversations for `user_id`
///
/// `names` maps user ids to display names; counterparts missing from it are
/// dropped. `query` filters by a case-insensitive substring of the name.
/// Newest conversation first.
pub fn build_inbox(
    messages: &[Message],
    user_id: &str,
    names: &HashMap<String, String>,
    query: Option<&str>,
) -> Vec<ConversationSummary> {
    let mut by_user: HashMap<&str, ConversationSummary> = HashMap::new();

    for message in messages {
        let Some(other) = counterpart(message, user_id) else {
            continue;
        };
        let Some(name) = names.get(other) else {
            continue;
        };

        let unread = usize::from(message.receiver_id == user_id && !message.is_read);

        by_user
            .entry(other)
            .and_modify(|conv| {
                if message.timestamp > conv.last_message.timestamp {
                    conv.last_message = message.clone();
                }
                conv.unread_count += unread;
            })
            .or_insert_with(|| ConversationSummary {
                other_user_id: other.to_string(),
                other_user_name: name.clone(),
                last_message: message.clone(),
                unread_count: unread,
            });
    }

    let needle = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut conversations: Vec<ConversationSummary> = by_user
        .into_values()
        .filter(|conv| match &needle {
            Some(q) => conv.other_user_name.to_lowercase().contains(q),
            None => true,
        })
        .collect();

    conversations.sort_by(|a, b| {
        b.last_message
            .timestamp
            .cmp(&a.last_message.timestamp)
            .then_with(|| a.other_user_id.cmp(&b.other_user_id))
    });

    conversations
}

/// Messages exchanged between `user_id` and `other_id`, oldest first
pub fn thread(messages: &[Message], user_id: &str, other_id: &str) -> Vec<Message> {
    let mut thread: Vec<Message> = messages
        .iter()
        .filter(|m| {
            (m.sender_id == user_id && m.receiver_id == other_id)
                || (m.sender_id == other_id && m.receiver_id == user_id)
        })
        .cloned()
        .collect();

    thread.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    thread
}

/// Check an outgoing message before it reaches the store
pub fn validate_outgoing(sender_id: &str, receiver_id: &str, content: &str) -> Result<(), InboxError> {
    if content.trim().is_empty() {
        return Err(InboxError::EmptyContent);
    }
    if sender_id == receiver_id {
        return Err(InboxError::SelfMessage);
    }
    Ok(())
}

/// Only the receiver may mark a message read
#[inline]
pub fn can_mark_read(message: &Message, user_id: &str) -> bool {
    message.receiver_id == user_id
}
