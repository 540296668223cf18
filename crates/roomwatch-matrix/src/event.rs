//! Inbound room events and their content categories
//!
//! Events arrive already scoped to one room. The content is read into a
//! closed set of categories the projector understands; anything else is kept
//! verbatim as [`EventContent::Other`] so it can still reach observers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EventError;
use crate::state::{JoinRule, PowerLevels};

pub const ROOM_CREATE: &str = "m.room.create";
pub const ROOM_NAME: &str = "m.room.name";
pub const ROOM_TOPIC: &str = "m.room.topic";
pub const ROOM_ALIASES: &str = "m.room.aliases";
pub const ROOM_CANONICAL_ALIAS: &str = "m.room.canonical_alias";
pub const ROOM_JOIN_RULES: &str = "m.room.join_rules";
pub const ROOM_POWER_LEVELS: &str = "m.room.power_levels";
pub const ROOM_MESSAGE: &str = "m.room.message";

fn tru() -> bool {
    true
}

/// `m.room.create`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreateContent {
    /// The user_id of the room creator. Newer room versions omit this and
    /// use the event sender instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Whether users on other servers can join this room. Defaults to true if
    /// the key does not exist.
    #[serde(default = "tru", rename = "m.federate")]
    pub federate: bool,
}

/// `m.room.name`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NameContent {
    /// Absent or empty when the room's name is being removed.
    #[serde(default)]
    pub name: String,
}

/// `m.room.topic`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TopicContent {
    pub topic: String,
}

/// `m.room.aliases`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AliasesContent {
    pub aliases: Vec<String>,
}

/// `m.room.canonical_alias`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CanonicalAliasContent {
    /// `None` clears the canonical alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// `m.room.join_rules`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JoinRulesContent {
    pub join_rule: JoinRule,
}

/// The `msgtype` of an `m.room.message` event.
///
/// Unrecognised types are carried as `Custom`; every variant is still a
/// message as far as projection and notification are concerned.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    Text,
    Notice,
    Emote,
    Image,
    File,
    Audio,
    Video,
    Location,
    Custom(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "m.text",
            Self::Notice => "m.notice",
            Self::Emote => "m.emote",
            Self::Image => "m.image",
            Self::File => "m.file",
            Self::Audio => "m.audio",
            Self::Video => "m.video",
            Self::Location => "m.location",
            Self::Custom(other) => other,
        }
    }
}

impl From<String> for MessageType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "m.text" => Self::Text,
            "m.notice" => Self::Notice,
            "m.emote" => Self::Emote,
            "m.image" => Self::Image,
            "m.file" => Self::File,
            "m.audio" => Self::Audio,
            "m.video" => Self::Video,
            "m.location" => Self::Location,
            _ => Self::Custom(value),
        }
    }
}

impl From<MessageType> for String {
    fn from(value: MessageType) -> Self {
        match value {
            MessageType::Custom(other) => other,
            known => known.as_str().to_owned(),
        }
    }
}

/// `m.room.message`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MessageContent {
    pub msgtype: MessageType,
    #[serde(default)]
    pub body: String,
    /// Subtype-specific fields (`url`, `info`, `format`, ...), kept as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageContent {
    /// Create message content of the given type with no extra fields.
    pub fn new(msgtype: MessageType, body: impl Into<String>) -> Self {
        Self {
            msgtype,
            body: body.into(),
            extra: Map::new(),
        }
    }

    /// Plain `m.text` content.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(MessageType::Text, body)
    }

    /// Plain `m.notice` content.
    pub fn notice(body: impl Into<String>) -> Self {
        Self::new(MessageType::Notice, body)
    }
}

/// The content of a room event, discriminated by category.
#[derive(Clone, Debug, PartialEq)]
pub enum EventContent {
    Create(CreateContent),
    Name(NameContent),
    Topic(TopicContent),
    Aliases(AliasesContent),
    CanonicalAlias(CanonicalAliasContent),
    JoinRules(JoinRulesContent),
    PowerLevels(PowerLevels),
    Message(MessageContent),
    /// Any category the projector does not model, or a known category whose
    /// content did not match its schema.
    Other { event_type: String, content: Value },
}

impl EventContent {
    /// Read content for the given event type.
    ///
    /// Never fails: content that cannot be read as its declared category is
    /// kept as `Other`.
    pub fn from_parts(event_type: impl Into<String>, content: Value) -> Self {
        let event_type = event_type.into();

        let parsed = match event_type.as_str() {
            ROOM_CREATE => parse(&content).map(Self::Create),
            ROOM_NAME => parse(&content).map(Self::Name),
            ROOM_TOPIC => parse(&content).map(Self::Topic),
            ROOM_ALIASES => parse(&content).map(Self::Aliases),
            ROOM_CANONICAL_ALIAS => parse(&content).map(Self::CanonicalAlias),
            ROOM_JOIN_RULES => parse(&content).map(Self::JoinRules),
            ROOM_POWER_LEVELS => parse(&content).map(Self::PowerLevels),
            ROOM_MESSAGE => parse(&content).map(Self::Message),
            _ => None,
        };

        parsed.unwrap_or(Self::Other { event_type, content })
    }

    /// The protocol event type this content belongs to.
    pub fn event_type(&self) -> &str {
        match self {
            Self::Create(_) => ROOM_CREATE,
            Self::Name(_) => ROOM_NAME,
            Self::Topic(_) => ROOM_TOPIC,
            Self::Aliases(_) => ROOM_ALIASES,
            Self::CanonicalAlias(_) => ROOM_CANONICAL_ALIAS,
            Self::JoinRules(_) => ROOM_JOIN_RULES,
            Self::PowerLevels(_) => ROOM_POWER_LEVELS,
            Self::Message(_) => ROOM_MESSAGE,
            Self::Other { event_type, .. } => event_type,
        }
    }

    /// The message carried by this content, if it is message-worthy.
    pub fn as_message(&self) -> Option<&MessageContent> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_message(&self) -> bool {
        self.as_message().is_some()
    }
}

fn parse<T: DeserializeOwned>(content: &Value) -> Option<T> {
    T::deserialize(content).ok()
}

/// A single protocol event delivered for this room.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomEvent {
    pub event_id: Option<String>,
    pub sender: Option<String>,
    /// Milliseconds since the server emitted the event.
    pub age: u64,
    pub content: EventContent,
}

impl RoomEvent {
    /// Create an event with zero age and no id or sender.
    pub fn new(content: EventContent) -> Self {
        Self {
            event_id: None,
            sender: None,
            age: 0,
            content,
        }
    }

    pub fn with_age(mut self, age: u64) -> Self {
        self.age = age;
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    /// Read an event from its client-server JSON shape:
    /// `{"type", "content", "event_id", "sender", "unsigned": {"age"}}`.
    ///
    /// A missing `unsigned.age` reads as 0.
    pub fn from_json(value: Value) -> Result<Self, EventError> {
        let Value::Object(mut object) = value else {
            return Err(EventError::Malformed("expected a JSON object".into()));
        };

        let event_type = match object.remove("type") {
            Some(Value::String(event_type)) => event_type,
            _ => return Err(EventError::Malformed("missing string `type`".into())),
        };

        let content = object
            .remove("content")
            .unwrap_or_else(|| Value::Object(Map::new()));
        let age = object
            .get("unsigned")
            .and_then(|unsigned| unsigned.get("age"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        Ok(Self {
            event_id: object.get("event_id").and_then(Value::as_str).map(str::to_owned),
            sender: object.get("sender").and_then(Value::as_str).map(str::to_owned),
            age,
            content: EventContent::from_parts(event_type, content),
        })
    }

    pub fn event_type(&self) -> &str {
        self.content.event_type()
    }
}
