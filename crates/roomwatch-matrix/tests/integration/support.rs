use std::sync::{Arc, Mutex};

use matrix_sdk::ruma::{OwnedEventId, OwnedRoomId, RoomId, UserId};
use roomwatch_matrix::{MatrixFuture, Room, RoomApi, RoomConfig};
use serde_json::{json, Value};
use uuid::Uuid;

/// API stub that accepts everything and remembers the event types it was asked to send.
#[derive(Default)]
pub struct AcceptingApi {
    pub sent: Mutex<Vec<String>>,
}

impl RoomApi for AcceptingApi {
    fn send_room_state(
        &self,
        _room_id: &RoomId,
        event_type: &str,
        _state_key: &str,
        _content: Value,
    ) -> MatrixFuture<OwnedEventId> {
        self.sent.lock().unwrap().push(event_type.to_owned());
        MatrixFuture::ready(Ok(random_event_id()))
    }

    fn send_room_message(
        &self,
        _room_id: &RoomId,
        event_type: &str,
        _content: Value,
    ) -> MatrixFuture<OwnedEventId> {
        self.sent.lock().unwrap().push(event_type.to_owned());
        MatrixFuture::spawn(async { Ok(random_event_id()) })
    }

    fn invite(&self, _room_id: &RoomId, _user_id: &UserId) -> MatrixFuture<()> {
        self.sent.lock().unwrap().push("invite".to_owned());
        MatrixFuture::ready(Ok(()))
    }

    fn leave_room(&self, _room_id: &RoomId) -> MatrixFuture<()> {
        self.sent.lock().unwrap().push("leave".to_owned());
        MatrixFuture::ready(Ok(()))
    }
}

// Helper to generate a random room ID
pub fn random_room_id() -> OwnedRoomId {
    OwnedRoomId::try_from(format!("!{}:test.com", Uuid::new_v4())).expect("Failed to create room ID")
}

// Helper to generate a random event ID
pub fn random_event_id() -> OwnedEventId {
    OwnedEventId::try_from(format!("${}:test.com", Uuid::new_v4())).expect("Failed to create event ID")
}

pub fn new_room() -> (Room, Arc<AcceptingApi>) {
    new_room_with(RoomConfig::default())
}

pub fn new_room_with(config: RoomConfig) -> (Room, Arc<AcceptingApi>) {
    let api = Arc::new(AcceptingApi::default());
    let room = Room::with_config(random_room_id(), api.clone(), &config);
    (room, api)
}

/// A client-server event in JSON form.
pub fn event(event_type: &str, content: Value, age: u64) -> Value {
    json!({
        "type": event_type,
        "event_id": format!("${}:test.com", Uuid::new_v4()),
        "sender": "@tester:test.com",
        "content": content,
        "unsigned": { "age": age }
    })
}

pub fn text(body: &str, age: u64) -> Value {
    event("m.room.message", json!({ "msgtype": "m.text", "body": body }), age)
}
