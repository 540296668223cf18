//! Joined-room state projection and observer notification for Matrix clients.
//!
//! A [`Room`] receives the protocol events of one joined room, folds them into
//! a [`RoomState`] and notifies registered observers. Outbound commands are
//! delegated to a [`RoomApi`] implementation and never change local state.

pub mod error;
pub mod future;
pub mod config;
pub mod event;
pub mod state;
pub mod projector;
pub mod notify;
pub mod api;
pub mod room;

pub use api::{RoomApi, SdkRoomApi};
pub use config::RoomConfig;
pub use error::{Error, Result};
pub use event::{EventContent, MessageContent, MessageType, RoomEvent};
pub use future::MatrixFuture;
pub use notify::{DispatchReport, ObserverId};
pub use room::Room;
pub use state::{JoinRule, PowerLevels, RoomSnapshot, RoomState};
