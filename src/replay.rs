//! Replaying a JSON-lines event log into a room

use std::io::BufRead;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use roomwatch_matrix::Room;
use serde::Serialize;
use tracing::{info, warn};

/// Counts gathered while replaying a log.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Events delivered to the room
    pub fed: usize,
    /// Lines that were not events
    pub skipped: usize,
    /// Messages that reached the message observers
    pub messages_delivered: usize,
    /// Observer calls that failed
    pub observer_failures: usize,
    /// `sender: body` of each delivered message, when requested
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

/// Feed every line of `reader` into `room`, in order.
///
/// Blank lines are ignored. Lines that are not JSON events are logged and
/// counted as skipped; they never abort the replay.
pub fn run<R: BufRead>(room: &mut Room, reader: R, collect_messages: bool) -> Result<ReplaySummary> {
    let collected = Arc::new(Mutex::new(Vec::new()));
    let observer = if collect_messages {
        let collected = collected.clone();
        Some(room.on_message(move |_, event, message| {
            let sender = event.sender.as_deref().unwrap_or("<unknown>");
            collected
                .lock()
                .map_err(|_| anyhow::anyhow!("message log poisoned"))?
                .push(format!("{sender}: {}", message.body));
            Ok(())
        }))
    } else {
        None
    };

    let mut summary = ReplaySummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping line that is not JSON");
                summary.skipped += 1;
                continue;
            }
        };

        match room.feed_json(value) {
            Ok(report) => {
                summary.fed += 1;
                summary.observer_failures += report.failures.len();
                if report.message_delivered {
                    summary.messages_delivered += 1;
                }
            }
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping line that is not an event");
                summary.skipped += 1;
            }
        }
    }

    if let Some(id) = observer {
        room.unsubscribe(id);
    }
    if let Ok(mut lines) = collected.lock() {
        summary.messages = std::mem::take(&mut *lines);
    }

    info!(
        room_id = %room.room_id(),
        fed = summary.fed,
        skipped = summary.skipped,
        "Replay finished"
    );

    Ok(summary)
}
