use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use roomwatch_matrix::RoomConfig;
use serde_json::json;

use crate::support::{event, new_room, new_room_with, text};

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn message_observers_respect_the_age_limit() {
    let (mut room, _) = new_room();
    let delivered = log();
    let observed = delivered.clone();
    room.on_message(move |_, _, message| {
        observed.lock().unwrap().push(message.body.clone());
        Ok(())
    });

    assert!(room.feed_json(text("fresh", 4999)).unwrap().message_delivered);
    assert!(!room.feed_json(text("stale", 5001)).unwrap().message_delivered);

    room.set_max_message_age(0);
    assert!(room.feed_json(text("ancient", 999_999)).unwrap().message_delivered);

    assert_eq!(*delivered.lock().unwrap(), vec!["fresh", "ancient"]);
    // stale messages are still recorded
    assert_eq!(room.state().message_history().len(), 3);
}

#[test]
fn configured_age_limit_applies() {
    let (mut room, _) = new_room_with(RoomConfig { max_message_age_ms: 100, history_capacity: 8 });
    let delivered = log();
    let observed = delivered.clone();
    room.on_message(move |_, _, message| {
        observed.lock().unwrap().push(message.body.clone());
        Ok(())
    });

    room.feed_json(text("quick", 99)).unwrap();
    room.feed_json(text("slow", 100)).unwrap();

    assert_eq!(room.max_message_age(), 100);
    assert_eq!(*delivered.lock().unwrap(), vec!["quick"]);
}

#[test]
fn a_failing_message_observer_does_not_block_the_next() {
    let (mut room, _) = new_room();
    let delivered = log();
    room.on_message(|_, _, _| anyhow::bail!("first observer is broken"));
    let observed = delivered.clone();
    room.on_message(move |_, _, message| {
        observed.lock().unwrap().push(message.body.clone());
        Ok(())
    });

    let report = room.feed_json(text("still delivered", 0)).unwrap();

    assert_eq!(*delivered.lock().unwrap(), vec!["still delivered"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.notified, 2);
}

#[test]
fn a_panicking_event_observer_does_not_escape_feed() {
    let (mut room, _) = new_room();
    let delivered = log();
    room.on_event(|_, event| {
        if event.event_type() == "m.room.topic" {
            panic!("cannot render topics");
        }
        Ok(())
    });
    let observed = delivered.clone();
    room.on_event(move |_, event| {
        observed.lock().unwrap().push(event.event_type().to_owned());
        Ok(())
    });

    room.feed_json(event("m.room.topic", json!({ "topic": "t" }), 0)).unwrap();
    room.feed_json(event("m.room.name", json!({ "name": "n" }), 0)).unwrap();

    assert_eq!(*delivered.lock().unwrap(), vec!["m.room.topic", "m.room.name"]);
    assert_eq!(room.state().topic(), Some("t"));
}

#[test]
fn generic_then_message_notification_per_event() {
    let (mut room, _) = new_room();
    let order = log();

    let generic = order.clone();
    room.on_event(move |state, event| {
        // observers see the state after projection
        generic
            .lock()
            .unwrap()
            .push(format!("event:{}:{}", event.event_type(), state.message_history().len()));
        Ok(())
    });
    let messages = order.clone();
    room.on_message(move |_, _, message| {
        messages.lock().unwrap().push(format!("message:{}", message.body));
        Ok(())
    });

    room.feed_json(text("one", 0)).unwrap();
    room.feed_json(event("m.room.name", json!({ "name": "between" }), 0)).unwrap();
    room.feed_json(text("two", 0)).unwrap();

    assert_eq!(
        *order.lock().unwrap(),
        vec![
            "event:m.room.message:1",
            "message:one",
            "event:m.room.name:1",
            "event:m.room.message:2",
            "message:two",
        ]
    );
}

#[test]
fn unsubscribed_observers_stop_receiving() {
    let (mut room, _) = new_room();
    let delivered = log();
    let observed = delivered.clone();
    let id = room.on_message(move |_, _, message| {
        observed.lock().unwrap().push(message.body.clone());
        Ok(())
    });

    room.feed_json(text("before", 0)).unwrap();
    assert!(room.unsubscribe(id));
    room.feed_json(text("after", 0)).unwrap();

    assert_eq!(*delivered.lock().unwrap(), vec!["before"]);
}
