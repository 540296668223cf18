//! A joined room: inbound event feed plus outbound commands
//!
//! Inbound events are projected into the room's [`RoomState`] and then handed
//! to its observers. Outbound commands go straight to the [`RoomApi`] and never
//! touch local state; their effect shows up once the server echoes the
//! resulting event back through [`Room::feed_event`].

use std::sync::Arc;

use matrix_sdk::ruma::{OwnedEventId, OwnedRoomId, RoomId, UserId};
use serde_json::{json, Value};
use tracing::info;

use crate::api::RoomApi;
use crate::config::RoomConfig;
use crate::error::{Result, RoomError};
use crate::event::{
    MessageContent, RoomEvent, ROOM_MESSAGE, ROOM_NAME, ROOM_POWER_LEVELS, ROOM_TOPIC,
};
use crate::future::MatrixFuture;
use crate::notify::{DispatchReport, NotificationDispatcher, ObserverId};
use crate::projector::project;
use crate::state::{PowerLevels, RoomSnapshot, RoomState};

/// One joined room.
///
/// Event delivery takes `&mut self`, so events for a room are necessarily
/// processed one at a time and in the order they are fed.
pub struct Room {
    state: RoomState,
    dispatcher: NotificationDispatcher,
    api: Arc<dyn RoomApi>,
}

impl Room {
    /// Create a room with default settings.
    pub fn new(room_id: OwnedRoomId, api: Arc<dyn RoomApi>) -> Self {
        Self::with_config(room_id, api, &RoomConfig::default())
    }

    /// Create a room with the given settings.
    pub fn with_config(room_id: OwnedRoomId, api: Arc<dyn RoomApi>, config: &RoomConfig) -> Self {
        info!(
            room_id = %room_id,
            max_message_age_ms = config.max_message_age_ms,
            "Tracking joined room"
        );

        Self {
            state: RoomState::new(room_id, config.history_capacity),
            dispatcher: NotificationDispatcher::new(config.max_message_age_ms),
            api,
        }
    }

    /// Get the room ID.
    pub fn room_id(&self) -> &RoomId {
        self.state.id()
    }

    /// Get the projected room state.
    pub fn state(&self) -> &RoomState {
        &self.state
    }

    /// Get a serializable copy of the room state.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot::from(&self.state)
    }

    pub fn max_message_age(&self) -> u64 {
        self.dispatcher.max_message_age()
    }

    /// Change the message age filter. 0 disables it.
    pub fn set_max_message_age(&mut self, max_message_age: u64) {
        self.dispatcher.set_max_message_age(max_message_age);
    }

    /// Register an observer for every event fed to this room.
    pub fn on_event<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&RoomState, &RoomEvent) -> anyhow::Result<()> + Send + 'static,
    {
        self.dispatcher.on_event(observer)
    }

    /// Register an observer for message events that pass the age filter.
    pub fn on_message<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&RoomState, &RoomEvent, &MessageContent) -> anyhow::Result<()> + Send + 'static,
    {
        self.dispatcher.on_message(observer)
    }

    /// Remove a previously registered observer.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    /// Deliver one event: project it into the state, then notify observers.
    ///
    /// Never fails. Observer failures are logged and returned in the report.
    pub fn feed_event(&mut self, event: &RoomEvent) -> DispatchReport {
        let projection = project(&mut self.state, event);
        self.dispatcher.dispatch(&self.state, event, projection)
    }

    /// Read an event from its JSON form and deliver it.
    ///
    /// Fails only when the value is not an event object at all.
    pub fn feed_json(&mut self, value: Value) -> Result<DispatchReport> {
        let event = RoomEvent::from_json(value)?;
        Ok(self.feed_event(&event))
    }

    /// Set the room name.
    pub fn set_name(&self, name: &str) -> MatrixFuture<OwnedEventId> {
        self.send_state(ROOM_NAME, json!({ "name": name }))
    }

    /// Set the room topic.
    pub fn set_topic(&self, topic: &str) -> MatrixFuture<OwnedEventId> {
        self.send_state(ROOM_TOPIC, json!({ "topic": topic }))
    }

    /// Send a message to the room.
    pub fn send_message(&self, content: &MessageContent) -> MatrixFuture<OwnedEventId> {
        match serde_json::to_value(content) {
            Ok(content) => {
                info!(room_id = %self.room_id(), "Sending room message");
                self.api.send_room_message(self.room_id(), ROOM_MESSAGE, content)
            }
            Err(error) => MatrixFuture::ready(Err(RoomError::from(error).into())),
        }
    }

    /// Send a plain text message to the room.
    pub fn send_text(&self, body: &str) -> MatrixFuture<OwnedEventId> {
        self.send_message(&MessageContent::text(body))
    }

    /// Send a notice to the room.
    pub fn send_notice(&self, body: &str) -> MatrixFuture<OwnedEventId> {
        self.send_message(&MessageContent::notice(body))
    }

    /// Replace the room's power levels.
    pub fn apply_power_levels(&self, levels: &PowerLevels) -> MatrixFuture<OwnedEventId> {
        match serde_json::to_value(levels) {
            Ok(content) => self.send_state(ROOM_POWER_LEVELS, content),
            Err(error) => MatrixFuture::ready(Err(RoomError::from(error).into())),
        }
    }

    /// Invite a user to the room.
    pub fn invite(&self, user_id: &UserId) -> MatrixFuture<()> {
        info!(room_id = %self.room_id(), user_id = %user_id, "Inviting user");
        self.api.invite(self.room_id(), user_id)
    }

    /// Leave the room.
    pub fn leave(&self) -> MatrixFuture<()> {
        info!(room_id = %self.room_id(), "Leaving room");
        self.api.leave_room(self.room_id())
    }

    fn send_state(&self, event_type: &str, content: Value) -> MatrixFuture<OwnedEventId> {
        info!(room_id = %self.room_id(), event_type, "Sending room state");
        self.api.send_room_state(self.room_id(), event_type, "", content)
    }
}
