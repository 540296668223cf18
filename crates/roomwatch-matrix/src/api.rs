//! The outbound boundary of a room
//!
//! [`RoomApi`] is the capability a [`Room`](crate::room::Room) delegates its
//! commands to. Every call is addressed by room id and returns a
//! [`MatrixFuture`] that already runs in the background; results and failures
//! belong to the implementation.

use matrix_sdk::{
    room::Room as MatrixRoom,
    ruma::{OwnedEventId, RoomId, UserId},
    Client as MatrixClient,
};
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::future::MatrixFuture;

/// Home-server operations a room needs for its outbound commands.
pub trait RoomApi: Send + Sync {
    /// Send a state event. Room-level attributes use an empty state key.
    fn send_room_state(
        &self,
        room_id: &RoomId,
        event_type: &str,
        state_key: &str,
        content: Value,
    ) -> MatrixFuture<OwnedEventId>;

    /// Send a message-like event.
    fn send_room_message(
        &self,
        room_id: &RoomId,
        event_type: &str,
        content: Value,
    ) -> MatrixFuture<OwnedEventId>;

    /// Invite a user to the room.
    fn invite(&self, room_id: &RoomId, user_id: &UserId) -> MatrixFuture<()>;

    /// Leave the room.
    fn leave_room(&self, room_id: &RoomId) -> MatrixFuture<()>;
}

/// [`RoomApi`] backed by a logged-in matrix-sdk client.
#[derive(Clone, Debug)]
pub struct SdkRoomApi {
    client: MatrixClient,
}

impl SdkRoomApi {
    /// Create a new SdkRoomApi from an authenticated client.
    pub fn new(client: MatrixClient) -> Self {
        Self { client }
    }

    /// Get the inner Matrix client.
    pub fn inner(&self) -> &MatrixClient {
        &self.client
    }

    fn room(&self, room_id: &RoomId) -> Result<MatrixRoom, ApiError> {
        self.client
            .get_room(room_id)
            .ok_or_else(|| ApiError::RoomNotFound(room_id.to_string()))
    }
}

impl RoomApi for SdkRoomApi {
    fn send_room_state(
        &self,
        room_id: &RoomId,
        event_type: &str,
        state_key: &str,
        content: Value,
    ) -> MatrixFuture<OwnedEventId> {
        let room = match self.room(room_id) {
            Ok(room) => room,
            Err(error) => return MatrixFuture::ready(Err(error.into())),
        };
        let event_type = event_type.to_owned();
        let state_key = state_key.to_owned();

        debug!("Sending {} state to room {}", event_type, room_id);

        MatrixFuture::spawn(async move {
            let response = room
                .send_state_event_raw(&event_type, &state_key, content)
                .await
                .map_err(ApiError::from)?;

            Ok(response.event_id)
        })
    }

    fn send_room_message(
        &self,
        room_id: &RoomId,
        event_type: &str,
        content: Value,
    ) -> MatrixFuture<OwnedEventId> {
        let room = match self.room(room_id) {
            Ok(room) => room,
            Err(error) => return MatrixFuture::ready(Err(error.into())),
        };
        let event_type = event_type.to_owned();

        debug!("Sending {} to room {}", event_type, room_id);

        MatrixFuture::spawn(async move {
            let response = room
                .send_raw(&event_type, content)
                .await
                .map_err(ApiError::from)?;

            Ok(response.event_id)
        })
    }

    fn invite(&self, room_id: &RoomId, user_id: &UserId) -> MatrixFuture<()> {
        let room = match self.room(room_id) {
            Ok(room) => room,
            Err(error) => return MatrixFuture::ready(Err(error.into())),
        };
        let user_id = user_id.to_owned();

        MatrixFuture::spawn(async move {
            room.invite_user_by_id(&user_id).await.map_err(ApiError::from)?;
            Ok(())
        })
    }

    fn leave_room(&self, room_id: &RoomId) -> MatrixFuture<()> {
        let room = match self.room(room_id) {
            Ok(room) => room,
            Err(error) => return MatrixFuture::ready(Err(error.into())),
        };

        MatrixFuture::spawn(async move {
            room.leave().await.map_err(ApiError::from)?;
            Ok(())
        })
    }
}
