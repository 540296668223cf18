//! The in-memory projection of a joined room
//!
//! [`RoomState`] is owned by its [`Room`](crate::room::Room). Callers only
//! ever see it through shared references; the projector is the single writer.

use std::collections::BTreeMap;

use matrix_sdk::ruma::{OwnedRoomId, RoomId};
use serde::{Deserialize, Serialize};

use crate::event::MessageContent;

/// Default pre-allocation for a room's message history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 255;

/// Policy governing how users may enter a room.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum JoinRule {
    Public,
    Invite,
    Knock,
    Private,
    /// A rule this client does not know, passed through unchanged.
    Custom(String),
}

impl JoinRule {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Public => "public",
            Self::Invite => "invite",
            Self::Knock => "knock",
            Self::Private => "private",
            Self::Custom(rule) => rule,
        }
    }
}

impl From<String> for JoinRule {
    fn from(value: String) -> Self {
        match value.as_str() {
            "public" => Self::Public,
            "invite" => Self::Invite,
            "knock" => Self::Knock,
            "private" => Self::Private,
            _ => Self::Custom(value),
        }
    }
}

impl From<JoinRule> for String {
    fn from(value: JoinRule) -> Self {
        match value {
            JoinRule::Custom(rule) => rule,
            known => known.as_str().to_owned(),
        }
    }
}

fn fifty() -> i64 {
    50
}

/// `m.room.power_levels`
///
/// Permission thresholds for a room. Missing keys take the protocol defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PowerLevels {
    /// The level required to ban a user.
    #[serde(default = "fifty")]
    pub ban: i64,
    /// The level required to kick a user.
    #[serde(default = "fifty")]
    pub kick: i64,
    /// The level required to redact an event sent by another user.
    #[serde(default = "fifty")]
    pub redact: i64,
    /// The level required to invite a user.
    #[serde(default = "fifty")]
    pub invite: i64,
    /// Required level per event type, overriding the defaults below.
    #[serde(default)]
    pub events: BTreeMap<String, i64>,
    /// The default level required to send message events.
    #[serde(default)]
    pub events_default: i64,
    /// The default level required to send state events.
    #[serde(default = "fifty")]
    pub state_default: i64,
    /// Explicit levels per user id.
    #[serde(default)]
    pub users: BTreeMap<String, i64>,
    /// The level of every user not listed in `users`.
    #[serde(default)]
    pub users_default: i64,
}

impl Default for PowerLevels {
    fn default() -> Self {
        Self {
            ban: 50,
            kick: 50,
            redact: 50,
            invite: 50,
            events: BTreeMap::new(),
            events_default: 0,
            state_default: 50,
            users: BTreeMap::new(),
            users_default: 0,
        }
    }
}

impl PowerLevels {
    /// The power level of the given user.
    pub fn user_level(&self, user_id: &str) -> i64 {
        self.users.get(user_id).copied().unwrap_or(self.users_default)
    }

    /// The level required to send an event of the given type.
    pub fn event_level(&self, event_type: &str, is_state: bool) -> i64 {
        match self.events.get(event_type) {
            Some(level) => *level,
            None if is_state => self.state_default,
            None => self.events_default,
        }
    }
}

/// Messages received by a room, in arrival order.
///
/// The capacity is only a pre-allocation hint; nothing is ever evicted.
#[derive(Clone, Debug, Default)]
pub struct MessageHistory {
    messages: Vec<MessageContent>,
}

impl MessageHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { messages: Vec::with_capacity(capacity) }
    }

    pub(crate) fn push(&mut self, message: MessageContent) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recently received message.
    pub fn last(&self) -> Option<&MessageContent> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MessageContent> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[MessageContent] {
        &self.messages
    }
}

impl<'a> IntoIterator for &'a MessageHistory {
    type Item = &'a MessageContent;
    type IntoIter = std::slice::Iter<'a, MessageContent>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// The attributes of one joined room, as projected from its events.
///
/// `None` means no event for that attribute has been received yet.
#[derive(Clone, Debug)]
pub struct RoomState {
    id: OwnedRoomId,
    pub(crate) name: Option<String>,
    pub(crate) topic: Option<String>,
    pub(crate) creator: Option<String>,
    pub(crate) canonical_alias: Option<String>,
    pub(crate) should_federate: bool,
    pub(crate) aliases: Vec<String>,
    pub(crate) join_rule: Option<JoinRule>,
    pub(crate) power_levels: Option<PowerLevels>,
    pub(crate) message_history: MessageHistory,
}

impl RoomState {
    /// Create the state for a freshly joined room.
    pub fn new(id: OwnedRoomId, history_capacity: usize) -> Self {
        Self {
            id,
            name: None,
            topic: None,
            creator: None,
            canonical_alias: None,
            should_federate: true,
            aliases: Vec::new(),
            join_rule: None,
            power_levels: None,
            message_history: MessageHistory::with_capacity(history_capacity),
        }
    }

    /// Get the room ID.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Get the room name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the room topic.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Get the user that created the room.
    pub fn creator(&self) -> Option<&str> {
        self.creator.as_deref()
    }

    /// Get the canonical alias.
    pub fn canonical_alias(&self) -> Option<&str> {
        self.canonical_alias.as_deref()
    }

    /// Whether the room's events are shared with other home-servers.
    pub fn should_federate(&self) -> bool {
        self.should_federate
    }

    /// Get the published aliases.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Get the join rule.
    pub fn join_rule(&self) -> Option<&JoinRule> {
        self.join_rule.as_ref()
    }

    /// Get the power levels.
    pub fn power_levels(&self) -> Option<&PowerLevels> {
        self.power_levels.as_ref()
    }

    /// Get the message history.
    pub fn message_history(&self) -> &MessageHistory {
        &self.message_history
    }
}

/// A serializable copy of a room's attributes, for display and logging.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub creator: Option<String>,
    pub canonical_alias: Option<String>,
    pub should_federate: bool,
    pub aliases: Vec<String>,
    pub join_rule: Option<JoinRule>,
    pub power_levels: Option<PowerLevels>,
    pub message_count: usize,
}

impl From<&RoomState> for RoomSnapshot {
    fn from(state: &RoomState) -> Self {
        Self {
            room_id: state.id.to_string(),
            name: state.name.clone(),
            topic: state.topic.clone(),
            creator: state.creator.clone(),
            canonical_alias: state.canonical_alias.clone(),
            should_federate: state.should_federate,
            aliases: state.aliases.clone(),
            join_rule: state.join_rule.clone(),
            power_levels: state.power_levels.clone(),
            message_count: state.message_history.len(),
        }
    }
}
