//! Integration tests for the debounced edge source.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_lite::future::block_on;

use coopdoor::edge::{self, EdgeTiming, confirm_edge};
use coopdoor::fsm::context::InputLine;
use coopdoor::fsm::{DoorEvent, DoorState};
use coopdoor::rpc::broadcast::Subscriber;

use crate::mock_hw::{SharedBuffer, make_door, wait_until};

const SETTLE: Duration = Duration::from_millis(5);

#[test]
fn confirmed_edge_dispatches_line_event() {
    let (door, pins, _sink) = make_door(false, true);
    pins.set_input(InputLine::Up, true);

    let event = block_on(confirm_edge(&door, InputLine::Up, SETTLE));
    assert_eq!(event, Some(DoorEvent::Up));
    assert_eq!(door.state(), DoorState::Opening);
}

#[test]
fn edge_low_after_settle_is_suppressed_but_pushed() {
    let (door, pins, _sink) = make_door(false, true);
    let listener = SharedBuffer::new();
    door.enroll(Some(Subscriber::new(1, listener.clone())));

    pins.set_input(InputLine::Up, false);
    let event = block_on(confirm_edge(&door, InputLine::Up, SETTLE));
    assert_eq!(event, None);
    assert_eq!(door.state(), DoorState::Closed);
    assert!(!pins.power());
    assert_eq!(listener.push_count(), 1, "suppressed edge still refreshes listeners");
}

#[test]
fn watcher_thread_drives_a_full_opening() {
    let (door, pins, _sink) = make_door(false, true);
    let shutdown = Arc::new(AtomicBool::new(false));
    let timing = EdgeTiming {
        debounce: Duration::from_millis(20),
        settle: SETTLE,
        poll: Duration::from_millis(1),
    };
    let handle = edge::spawn(door.clone(), timing, shutdown.clone()).unwrap();
    let timeout = Duration::from_secs(5);
    // Let the watchers take their initial samples.
    std::thread::sleep(Duration::from_millis(50));

    // Operator presses and releases the up switch.
    pins.set_input(InputLine::Up, true);
    assert!(wait_until(timeout, || door.state() == DoorState::Opening));
    std::thread::sleep(Duration::from_millis(30));
    pins.set_input(InputLine::Up, false);

    // Door leaves the bottom switch and reaches the top one.
    pins.set_input(InputLine::Lower, false);
    pins.set_input(InputLine::Upper, true);
    assert!(wait_until(timeout, || door.state() == DoorState::Open));
    assert!(!pins.power());

    shutdown.store(true, Ordering::Release);
    handle.join().unwrap();
}

#[test]
fn glitch_shorter_than_settle_does_nothing() {
    let (door, pins, _sink) = make_door(false, true);
    let shutdown = Arc::new(AtomicBool::new(false));
    let timing = EdgeTiming {
        debounce: Duration::from_millis(20),
        settle: Duration::from_millis(40),
        poll: Duration::from_millis(1),
    };
    let handle = edge::spawn(door.clone(), timing, shutdown.clone()).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    pins.set_input(InputLine::Up, true);
    std::thread::sleep(Duration::from_millis(10));
    pins.set_input(InputLine::Up, false);
    std::thread::sleep(Duration::from_millis(120));

    assert_eq!(door.state(), DoorState::Closed);
    assert!(!pins.power());

    shutdown.store(true, Ordering::Release);
    handle.join().unwrap();
}

#[test]
fn limit_chatter_then_steady_high_still_stops_the_door() {
    let (door, pins, _sink) = make_door(false, false);
    assert!(door.close());
    let shutdown = Arc::new(AtomicBool::new(false));
    let timing = EdgeTiming {
        debounce: Duration::from_millis(100),
        settle: Duration::from_millis(20),
        poll: Duration::from_millis(1),
    };
    let handle = edge::spawn(door.clone(), timing, shutdown.clone()).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    // Lower limit chatters: high, low before the settle re-sample, then
    // high again inside the debounce window and stays there.
    pins.set_input(InputLine::Lower, true);
    std::thread::sleep(Duration::from_millis(10));
    pins.set_input(InputLine::Lower, false);
    std::thread::sleep(Duration::from_millis(30));
    pins.set_input(InputLine::Lower, true);

    assert!(wait_until(Duration::from_secs(5), || door.state() == DoorState::Closed));
    assert!(!pins.power());

    shutdown.store(true, Ordering::Release);
    handle.join().unwrap();
}
