//! Normalized room events.

use crate::{EventId, RoomId, UserId};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Broad category of a room event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `m.room.message`
    #[display("message")]
    Message,
    /// `m.reaction`
    #[display("reaction")]
    Reaction,
    /// `m.sticker`
    #[display("sticker")]
    Sticker,
    /// Anything else
    #[display("other")]
    Other,
}

impl EventKind {
    /// Maps a wire event type to its kind.
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "m.room.message" => Self::Message,
            "m.reaction" => Self::Reaction,
            "m.sticker" => Self::Sticker,
            _ => Self::Other,
        }
    }
}

/// Structured mentions (`m.mentions`) carried by a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Mentions {
    /// Users explicitly mentioned
    #[serde(default)]
    user_ids: Vec<UserId>,
    /// Whether the whole room is mentioned
    #[serde(default)]
    room: bool,
}

impl Mentions {
    /// Creates a mentions block for the given users.
    pub fn new(user_ids: Vec<UserId>, room: bool) -> Self {
        Self { user_ids, room }
    }

    /// Whether `user` is mentioned.
    pub fn has(&self, user: &UserId) -> bool {
        self.user_ids.contains(user)
    }
}

/// A room event as delivered by the transport, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Room the event was sent in
    pub room_id: RoomId,
    /// Event identifier
    pub event_id: EventId,
    /// Sender
    pub sender: UserId,
    /// Wire event type, e.g. `m.room.message`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event content
    #[serde(default)]
    pub content: JsonValue,
}

/// An event reduced to the fields protections look at.
///
/// Content fields are extracted independently: a malformed `m.mentions`
/// block only loses the mentions, not the message type or body.
#[derive(Debug, Clone, PartialEq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct NormalizedEvent {
    /// Room the event was sent in
    room_id: RoomId,
    /// Event identifier
    event_id: EventId,
    /// Sender
    sender: UserId,
    /// Event category
    kind: EventKind,
    /// Declared message type, for messages
    #[builder(default, setter(into, strip_option))]
    msgtype: Option<String>,
    /// HTML body, if any
    #[builder(default, setter(into, strip_option))]
    formatted_body: Option<String>,
    /// Structured mentions, if present and well-formed
    #[builder(default, setter(into, strip_option))]
    mentions: Option<Mentions>,
    /// Relation key, for reactions
    #[builder(default, setter(into, strip_option))]
    relates_to_key: Option<String>,
    /// Raw content bytes
    #[builder(default)]
    raw_content: Vec<u8>,
}

impl NormalizedEvent {
    /// Returns a builder for constructing a NormalizedEvent.
    pub fn builder() -> NormalizedEventBuilder {
        NormalizedEventBuilder::default()
    }

    /// Normalizes an event from its envelope fields and raw content bytes.
    #[tracing::instrument(skip(content), fields(content_len = content.len()))]
    pub fn from_parts(
        room_id: RoomId,
        event_id: EventId,
        sender: UserId,
        event_type: &str,
        content: &[u8],
    ) -> Self {
        let parsed: JsonValue = serde_json::from_slice(content).unwrap_or_else(|e| {
            tracing::trace!(error = %e, "Event content is not valid JSON");
            JsonValue::Null
        });

        let msgtype = parsed
            .get("msgtype")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        let formatted_body = parsed
            .get("formatted_body")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        let mentions = parsed.get("m.mentions").and_then(|value| {
            serde_json::from_value::<Mentions>(value.clone())
                .map_err(|e| tracing::trace!(error = %e, "Ignoring malformed m.mentions"))
                .ok()
        });
        let relates_to_key = parsed
            .get("m.relates_to")
            .and_then(|relation| relation.get("key"))
            .and_then(JsonValue::as_str)
            .map(str::to_string);

        Self {
            room_id,
            event_id,
            sender,
            kind: EventKind::from_event_type(event_type),
            msgtype,
            formatted_body,
            mentions,
            relates_to_key,
            raw_content: content.to_vec(),
        }
    }

    /// Number of users named in the structured mentions, zero when absent.
    pub fn mention_count(&self) -> usize {
        self.mentions
            .as_ref()
            .map(|m| m.user_ids.len())
            .unwrap_or(0)
    }

    /// Whether this event mentions `user`.
    ///
    /// Structured mentions are authoritative when present; otherwise the
    /// formatted body is searched for the user ID or its `matrix.to` link.
    pub fn mentions_user(&self, user: &UserId) -> bool {
        if let Some(mentions) = &self.mentions {
            return mentions.has(user);
        }
        self.formatted_body.as_deref().is_some_and(|body| {
            body.contains(&user.matrix_to_url()) || body.contains(user.as_str())
        })
    }
}

impl From<RawEvent> for NormalizedEvent {
    fn from(raw: RawEvent) -> Self {
        let content = serde_json::to_vec(&raw.content).unwrap_or_default();
        Self::from_parts(
            raw.room_id,
            raw.event_id,
            raw.sender,
            &raw.event_type,
            &content,
        )
    }
}
