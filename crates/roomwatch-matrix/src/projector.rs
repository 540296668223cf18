//! Folding inbound events into [`RoomState`]
//!
//! Projection is a pure state transition: it never talks to the API and never
//! notifies observers, so it can be checked against expected snapshots alone.

use tracing::debug;

use crate::event::{EventContent, RoomEvent};
use crate::state::RoomState;

/// The room attribute a state event overwrote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateField {
    Creator,
    Name,
    Topic,
    Aliases,
    CanonicalAlias,
    JoinRule,
    PowerLevels,
}

/// What projecting an event did to the room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    /// A room attribute was overwritten.
    State(StateField),
    /// A message was appended to the history.
    Message,
    /// The event's category is not projected.
    Ignored,
}

impl Projection {
    /// Whether the event should reach message observers.
    pub fn is_message(self) -> bool {
        matches!(self, Self::Message)
    }
}

/// Apply one event to the room state.
///
/// Every attribute is last-write-wins in arrival order. Unrecognised content
/// leaves the state untouched.
pub fn project(state: &mut RoomState, event: &RoomEvent) -> Projection {
    let projection = match &event.content {
        EventContent::Create(create) => {
            state.creator = create.creator.clone().or_else(|| event.sender.clone());
            state.should_federate = create.federate;
            Projection::State(StateField::Creator)
        }
        EventContent::Name(name) => {
            state.name = Some(name.name.clone()).filter(|name| !name.is_empty());
            Projection::State(StateField::Name)
        }
        EventContent::Topic(topic) => {
            state.topic = Some(topic.topic.clone());
            Projection::State(StateField::Topic)
        }
        EventContent::Aliases(aliases) => {
            state.aliases = aliases.aliases.clone();
            Projection::State(StateField::Aliases)
        }
        EventContent::CanonicalAlias(alias) => {
            state.canonical_alias = alias.alias.clone().filter(|alias| !alias.is_empty());
            Projection::State(StateField::CanonicalAlias)
        }
        EventContent::JoinRules(rules) => {
            state.join_rule = Some(rules.join_rule.clone());
            Projection::State(StateField::JoinRule)
        }
        EventContent::PowerLevels(levels) => {
            state.power_levels = Some(levels.clone());
            Projection::State(StateField::PowerLevels)
        }
        EventContent::Message(message) => {
            state.message_history.push(message.clone());
            Projection::Message
        }
        EventContent::Other { .. } => Projection::Ignored,
    };

    debug!(
        room_id = %state.id(),
        event_type = event.event_type(),
        projection = ?projection,
        "Projected room event"
    );

    projection
}
