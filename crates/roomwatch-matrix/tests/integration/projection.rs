use pretty_assertions::assert_eq;
use roomwatch_matrix::{JoinRule, RoomSnapshot};
use serde_json::json;

use crate::support::{event, new_room, text};

#[test]
fn each_attribute_holds_its_last_event() {
    let (mut room, _) = new_room();
    let feed = [
        event("m.room.create", json!({ "creator": "@first:test.com" }), 0),
        event("m.room.name", json!({ "name": "Alpha" }), 0),
        event("m.room.topic", json!({ "topic": "one" }), 0),
        event("m.room.aliases", json!({ "aliases": ["#a:test.com", "#b:test.com"] }), 0),
        event("m.room.canonical_alias", json!({ "alias": "#a:test.com" }), 0),
        event("m.room.join_rules", json!({ "join_rule": "invite" }), 0),
        event("m.room.power_levels", json!({ "users": { "@first:test.com": 100 } }), 0),
        event("m.room.name", json!({ "name": "Beta" }), 0),
        event("m.room.create", json!({ "creator": "@second:test.com", "m.federate": false }), 0),
        event("m.room.topic", json!({ "topic": "two" }), 0),
        event("m.room.aliases", json!({ "aliases": ["#c:test.com"] }), 0),
        event("m.room.canonical_alias", json!({ "alias": "#c:test.com" }), 0),
        event("m.room.join_rules", json!({ "join_rule": "knock" }), 0),
        event("m.room.power_levels", json!({ "ban": 100 }), 0),
    ];

    for value in feed {
        room.feed_json(value).unwrap();
    }

    let state = room.state();
    assert_eq!(state.creator(), Some("@second:test.com"));
    assert!(!state.should_federate());
    assert_eq!(state.name(), Some("Beta"));
    assert_eq!(state.topic(), Some("two"));
    assert_eq!(state.aliases(), ["#c:test.com".to_string()]);
    assert_eq!(state.canonical_alias(), Some("#c:test.com"));
    assert_eq!(state.join_rule(), Some(&JoinRule::Knock));

    let levels = state.power_levels().expect("power levels received");
    assert_eq!(levels.ban, 100);
    // replaced wholesale: the first event's user map is gone
    assert_eq!(levels.user_level("@first:test.com"), 0);
}

#[test]
fn empty_content_clears_name_and_canonical_alias() {
    let (mut room, _) = new_room();
    room.feed_json(event("m.room.canonical_alias", json!({ "alias": "#a:test.com" }), 0))
        .unwrap();
    room.feed_json(event("m.room.name", json!({ "name": "Old" }), 0)).unwrap();

    room.feed_json(event("m.room.canonical_alias", json!({}), 0)).unwrap();
    room.feed_json(event("m.room.name", json!({}), 0)).unwrap();

    assert_eq!(room.state().canonical_alias(), None);
    assert_eq!(room.state().name(), None);

    room.feed_json(event("m.room.name", json!({ "name": "Back" }), 0)).unwrap();
    room.feed_json(event("m.room.name", json!({ "name": "" }), 0)).unwrap();
    assert_eq!(room.state().name(), None);
}

#[test]
fn message_history_grows_in_arrival_order() {
    let (mut room, _) = new_room();
    let bodies: Vec<String> = (0..300).map(|i| format!("message {i}")).collect();

    for (i, body) in bodies.iter().enumerate() {
        room.feed_json(text(body, 0)).unwrap();
        if i % 50 == 0 {
            room.feed_json(event("m.room.name", json!({ "name": body }), 0)).unwrap();
        }
    }

    let history: Vec<&str> = room
        .state()
        .message_history()
        .iter()
        .map(|message| message.body.as_str())
        .collect();
    assert_eq!(history.len(), 300);
    assert_eq!(history, bodies.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn unknown_events_leave_state_unchanged_but_reach_observers() {
    let (mut room, _) = new_room();
    room.feed_json(event("m.room.name", json!({ "name": "Stable" }), 0)).unwrap();
    room.feed_json(text("only message", 0)).unwrap();
    let before = room.snapshot();

    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let observed = seen.clone();
    room.on_event(move |_, event| {
        observed.lock().unwrap().push(event.event_type().to_owned());
        Ok(())
    });

    room.feed_json(event("m.room.guest_access", json!({ "guest_access": "can_join" }), 0))
        .unwrap();
    // known type, unreadable content
    room.feed_json(event("m.room.topic", json!({ "topic": ["not", "a", "string"] }), 0))
        .unwrap();
    // message without a msgtype
    room.feed_json(event("m.room.message", json!({}), 0)).unwrap();

    assert_eq!(room.snapshot(), before);
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["m.room.guest_access", "m.room.topic", "m.room.message"]
    );
}

#[tokio::test]
async fn outbound_commands_do_not_change_state_until_echoed() {
    let (mut room, api) = new_room();
    room.feed_json(event("m.room.create", json!({ "creator": "@tester:test.com" }), 0))
        .unwrap();

    room.set_name("X").await.unwrap();
    assert_eq!(room.state().name(), None);
    assert_eq!(*api.sent.lock().unwrap(), vec!["m.room.name"]);

    room.feed_json(event("m.room.name", json!({ "name": "X" }), 0)).unwrap();
    assert_eq!(room.state().name(), Some("X"));
}

#[test]
fn room_id_never_changes() {
    let (mut room, _) = new_room();
    let id = room.room_id().to_owned();

    room.feed_json(event("m.room.create", json!({}), 0)).unwrap();
    room.feed_json(text("hello", 0)).unwrap();
    room.feed_json(event("m.room.name", json!(null), 0)).unwrap();
    let _ = room.feed_json(json!(42));
    let _ = room.feed_json(json!({ "no_type": true }));

    assert_eq!(room.room_id(), &*id);
    assert_eq!(RoomSnapshot::from(room.state()).room_id, id.to_string());
}
