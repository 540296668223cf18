//! Observer fan-out for projected room events
//!
//! Two observer sets are kept per room: one that sees every event and one
//! that only sees messages young enough to pass the age filter. Each observer
//! call runs inside its own failure boundary, so an observer that errors or
//! panics is logged and skipped while the rest are still notified.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::error::ObserverError;
use crate::event::{MessageContent, RoomEvent};
use crate::projector::Projection;
use crate::state::RoomState;

/// Default maximum age, in milliseconds, of messages delivered to message
/// observers.
pub const DEFAULT_MAX_MESSAGE_AGE_MS: u64 = 5000;

/// Observer notified of every event.
pub type EventObserver = Box<dyn FnMut(&RoomState, &RoomEvent) -> anyhow::Result<()> + Send>;

/// Observer notified of message events.
pub type MessageObserver =
    Box<dyn FnMut(&RoomState, &RoomEvent, &MessageContent) -> anyhow::Result<()> + Send>;

/// Handle returned on registration, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// Which observer set an observer belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObserverKind {
    Event,
    Message,
}

/// A failure captured from one observer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObserverFailure {
    pub observer: ObserverId,
    pub kind: ObserverKind,
    pub error: ObserverError,
}

/// The outcome of notifying observers about one event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of observer calls made, successful or not.
    pub notified: usize,
    /// Whether the event went through the message observer set.
    pub message_delivered: bool,
    pub failures: Vec<ObserverFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Invokes registered observers for each projected event.
pub struct NotificationDispatcher {
    event_observers: Vec<(ObserverId, EventObserver)>,
    message_observers: Vec<(ObserverId, MessageObserver)>,
    max_message_age: u64,
    next_id: u64,
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_AGE_MS)
    }
}

impl NotificationDispatcher {
    /// Create a dispatcher with the given message age limit (0 disables the filter).
    pub fn new(max_message_age: u64) -> Self {
        Self {
            event_observers: Vec::new(),
            message_observers: Vec::new(),
            max_message_age,
            next_id: 0,
        }
    }

    pub fn max_message_age(&self) -> u64 {
        self.max_message_age
    }

    pub fn set_max_message_age(&mut self, max_message_age: u64) {
        self.max_message_age = max_message_age;
    }

    /// Register an observer for every event.
    pub fn on_event<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&RoomState, &RoomEvent) -> anyhow::Result<()> + Send + 'static,
    {
        let id = self.allocate_id();
        self.event_observers.push((id, Box::new(observer)));
        id
    }

    /// Register an observer for message events.
    pub fn on_message<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&RoomState, &RoomEvent, &MessageContent) -> anyhow::Result<()> + Send + 'static,
    {
        let id = self.allocate_id();
        self.message_observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer of either kind. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.event_observers.len() + self.message_observers.len();
        self.event_observers.retain(|(observer, _)| *observer != id);
        self.message_observers.retain(|(observer, _)| *observer != id);
        before != self.event_observers.len() + self.message_observers.len()
    }

    pub fn observer_count(&self) -> usize {
        self.event_observers.len() + self.message_observers.len()
    }

    /// Whether a message of the given age passes the age filter.
    pub fn accepts_age(&self, age: u64) -> bool {
        self.max_message_age == 0 || age < self.max_message_age
    }

    /// Notify observers about an event that has already been projected.
    ///
    /// Never fails; observer failures are logged and collected in the report.
    pub fn dispatch(
        &mut self,
        state: &RoomState,
        event: &RoomEvent,
        projection: Projection,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for (id, observer) in self.event_observers.iter_mut() {
            let outcome = guarded(|| observer(state, event));
            record(&mut report, state, event, *id, ObserverKind::Event, outcome);
        }

        let message = match event.content.as_message() {
            Some(message) if projection.is_message() => message,
            _ => return report,
        };

        if !self.accepts_age(event.age) {
            debug!(
                room_id = %state.id(),
                age = event.age,
                max_age = self.max_message_age,
                "Skipping message observers for stale message"
            );
            return report;
        }

        report.message_delivered = true;
        for (id, observer) in self.message_observers.iter_mut() {
            let outcome = guarded(|| observer(state, event, message));
            record(&mut report, state, event, *id, ObserverKind::Message, outcome);
        }

        report
    }

    fn allocate_id(&mut self) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        id
    }
}

fn guarded<F>(call: F) -> Result<(), ObserverError>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    // observers are not touched again by this call after a panic
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(ObserverError::Failed(format!("{error:#}"))),
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            Err(ObserverError::Panicked(panic_msg))
        }
    }
}

fn record(
    report: &mut DispatchReport,
    state: &RoomState,
    event: &RoomEvent,
    observer: ObserverId,
    kind: ObserverKind,
    outcome: Result<(), ObserverError>,
) {
    report.notified += 1;

    if let Err(error) = outcome {
        warn!(
            room_id = %state.id(),
            event_type = event.event_type(),
            observer = %observer,
            kind = ?kind,
            error = %error,
            "Room observer failed"
        );
        report.failures.push(ObserverFailure { observer, kind, error });
    }
}
