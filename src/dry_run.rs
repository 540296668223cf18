//! A [`RoomApi`] that logs requests instead of sending them.

use std::sync::atomic::{AtomicU64, Ordering};

use matrix_sdk::ruma::{OwnedEventId, RoomId, UserId};
use roomwatch_matrix::error::ApiError;
use roomwatch_matrix::{MatrixFuture, RoomApi};
use serde_json::Value;
use tracing::info;

#[derive(Debug, Default)]
pub struct DryRunApi {
    sent: AtomicU64,
}

impl DryRunApi {
    fn next_event_id(&self) -> MatrixFuture<OwnedEventId> {
        let n = self.sent.fetch_add(1, Ordering::Relaxed);
        let result: roomwatch_matrix::Result<OwnedEventId> =
            OwnedEventId::try_from(format!("$dry-run-{n}:localhost"))
                .map_err(|e| ApiError::matrix_sdk(e).into());
        MatrixFuture::ready(result)
    }

    pub fn requests(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl RoomApi for DryRunApi {
    fn send_room_state(
        &self,
        room_id: &RoomId,
        event_type: &str,
        state_key: &str,
        content: Value,
    ) -> MatrixFuture<OwnedEventId> {
        info!(room_id = %room_id, event_type, state_key, content = %content, "dry run: send state");
        self.next_event_id()
    }

    fn send_room_message(
        &self,
        room_id: &RoomId,
        event_type: &str,
        content: Value,
    ) -> MatrixFuture<OwnedEventId> {
        info!(room_id = %room_id, event_type, content = %content, "dry run: send message");
        self.next_event_id()
    }

    fn invite(&self, room_id: &RoomId, user_id: &UserId) -> MatrixFuture<()> {
        info!(room_id = %room_id, user_id = %user_id, "dry run: invite");
        self.sent.fetch_add(1, Ordering::Relaxed);
        MatrixFuture::ready(Ok(()))
    }

    fn leave_room(&self, room_id: &RoomId) -> MatrixFuture<()> {
        info!(room_id = %room_id, "dry run: leave");
        self.sent.fetch_add(1, Ordering::Relaxed);
        MatrixFuture::ready(Ok(()))
    }
}
