//! Integration tests for the status broadcast registry through SharedDoor.

use futures_lite::future::block_on;

use coopdoor::fsm::context::InputLine;
use coopdoor::fsm::{DoorEvent, DoorState};
use coopdoor::rpc::broadcast::Subscriber;

use crate::mock_hw::{
    FailingWriter, SharedBuffer, StalledWriter, UnconfigurableWriter, make_door,
};

#[test]
fn every_listener_gets_each_transition() {
    let (door, pins, _sink) = make_door(false, true);
    let listeners: Vec<SharedBuffer> = (0..3).map(|_| SharedBuffer::new()).collect();
    for (id, buf) in listeners.iter().enumerate() {
        assert!(door.enroll(Some(Subscriber::new(id as u64, buf.clone()))));
        assert!(buf.is_nonblocking(), "enroll switches to non-blocking writes");
    }

    block_on(door.dispatch_event(DoorEvent::Up));
    pins.set_input(InputLine::Lower, false);
    pins.set_input(InputLine::Upper, true);
    block_on(door.dispatch_event(DoorEvent::Upper));

    for buf in &listeners {
        assert_eq!(buf.push_count(), 2);
        let text = buf.text();
        let opening = text.find("\"state\":\"opening\"").unwrap();
        let open = text.find("\"state\":\"open\"").unwrap();
        assert!(opening < open, "pushes arrive in transition order");
    }
}

#[test]
fn failed_listener_is_pruned_others_keep_receiving() {
    let (door, _pins, _sink) = make_door(false, false);
    let a = SharedBuffer::new();
    let c = SharedBuffer::new();
    door.enroll(Some(Subscriber::new(1, a.clone())));
    door.enroll(Some(Subscriber::new(2, FailingWriter)));
    door.enroll(Some(Subscriber::new(3, c.clone())));
    assert_eq!(door.subscriber_count(), 3);

    door.refresh_listeners();
    assert_eq!(door.subscriber_count(), 2);
    assert_eq!(a.push_count(), 1);
    assert_eq!(c.push_count(), 1);

    door.refresh_listeners();
    assert_eq!(door.subscriber_count(), 2);
    assert_eq!(a.push_count(), 2);
}

#[test]
fn stalled_listener_is_dropped_without_blocking() {
    let (door, _pins, _sink) = make_door(false, false);
    let ok = SharedBuffer::new();
    door.enroll(Some(Subscriber::new(1, StalledWriter)));
    door.enroll(Some(Subscriber::new(2, ok.clone())));

    // The open itself pushes to listeners.
    assert!(door.open());
    assert_eq!(door.subscriber_count(), 1);
    assert_eq!(ok.push_count(), 1);
    assert_eq!(door.state(), DoorState::Opening);
}

#[test]
fn enroll_fails_without_usable_connection() {
    let (door, _pins, _sink) = make_door(false, false);
    assert!(!door.enroll(None));
    assert!(!door.enroll(Some(Subscriber::new(9, UnconfigurableWriter))));
    assert_eq!(door.subscriber_count(), 0);
}

#[test]
fn no_listeners_is_fine() {
    let (door, _pins, _sink) = make_door(false, true);
    let status = block_on(door.dispatch_event(DoorEvent::Up));
    assert_eq!(status.state, DoorState::Opening);
    assert_eq!(door.subscriber_count(), 0);
}
