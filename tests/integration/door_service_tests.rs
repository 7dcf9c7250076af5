//! Integration tests for the SharedDoor → DoorService → pins pipeline.
//!
//! Full door journeys driven by edge events and commands, checked at the
//! simulated pins and in the recorded application events.

use futures_lite::future::block_on;

use coopdoor::app::commands::{Command, CommandOutcome};
use coopdoor::app::events::AppEvent;
use coopdoor::fsm::context::InputLine;
use coopdoor::fsm::{DoorEvent, DoorState};

use crate::mock_hw::make_door;

// ── Normal travel ─────────────────────────────────────────────

#[test]
fn closed_door_opens_and_stops_at_top() {
    let (door, pins, sink) = make_door(false, true);
    assert_eq!(door.state(), DoorState::Closed);

    block_on(door.dispatch_event(DoorEvent::Up));
    assert_eq!(door.state(), DoorState::Opening);
    assert!(pins.power());
    assert!(pins.direction(), "relay high for up");

    pins.set_input(InputLine::Lower, false);
    pins.set_input(InputLine::Upper, true);
    block_on(door.dispatch_event(DoorEvent::Upper));
    assert_eq!(door.state(), DoorState::Open);
    assert!(!pins.power());
    assert!(!pins.direction());

    assert!(sink.contains(&AppEvent::StateChanged {
        from: DoorState::Closed,
        to: DoorState::Opening,
    }));
    assert!(sink.contains(&AppEvent::StateChanged {
        from: DoorState::Opening,
        to: DoorState::Open,
    }));
}

#[test]
fn open_door_closes_and_stops_at_bottom() {
    let (door, pins, _sink) = make_door(true, false);
    let (outcome, status) = door.execute(Some(Command::Close), None);
    assert_eq!(outcome, CommandOutcome::Accepted);
    assert_eq!(status.state, DoorState::Closing);
    assert!(pins.power());
    assert!(!pins.direction(), "relay low for down");

    pins.set_input(InputLine::Upper, false);
    pins.set_input(InputLine::Lower, true);
    block_on(door.dispatch_event(DoorEvent::Lower));
    assert_eq!(door.state(), DoorState::Closed);
    assert!(!pins.power());
}

#[test]
fn manual_switch_stops_travel_midway() {
    let (door, pins, _sink) = make_door(false, true);
    assert!(door.open());
    pins.set_input(InputLine::Lower, false);

    block_on(door.dispatch_event(DoorEvent::Down));
    assert_eq!(door.state(), DoorState::Stopped);
    assert!(!pins.power());
}

#[test]
fn irrelevant_events_are_ignored() {
    let (door, pins, sink) = make_door(false, true);
    block_on(door.dispatch_event(DoorEvent::Lower));
    block_on(door.dispatch_event(DoorEvent::Down));
    assert_eq!(door.state(), DoorState::Closed);
    assert!(!pins.power());
    assert!(sink.contains(&AppEvent::EventIgnored {
        state: DoorState::Closed,
        event: DoorEvent::Down,
    }));
}

// ── Refusals ──────────────────────────────────────────────────

#[test]
fn commands_refused_when_not_permitted() {
    let (door, pins, _sink) = make_door(false, true);
    let (outcome, status) = door.execute(Some(Command::Close), None);
    assert_eq!(outcome, CommandOutcome::Refused(DoorState::Closed));
    assert_eq!(status.state, DoorState::Closed);
    assert!(!pins.power());

    assert!(!door.close());
    assert!(door.open());
    // Opening still permits `up`, so a repeated open is accepted and idempotent.
    assert!(door.open());
    assert_eq!(door.state(), DoorState::Opening);

    let (outcome, _) = door.execute(None, None);
    assert_eq!(outcome, CommandOutcome::Unrecognized);
    assert_eq!(door.state(), DoorState::Opening);
}

// ── Jam detection and recovery ────────────────────────────────

#[test]
fn jam_then_recovery_then_closed() {
    let (door, pins, sink) = make_door(true, false);
    assert!(door.close());

    // String wound back up: the upper switch fires while closing.
    block_on(door.dispatch_event(DoorEvent::Upper));
    assert_eq!(door.state(), DoorState::Error);
    assert!(!pins.power());
    assert!(sink.contains(&AppEvent::JamDetected));

    // Operator presses down; the pulse frees the door.
    pins.set_input(InputLine::Upper, false);
    block_on(door.dispatch_event(DoorEvent::Down));
    assert_eq!(door.state(), DoorState::ErrorRecovery);
    assert!(pins.power());
    assert!(!pins.direction());
    assert!(sink.contains(&AppEvent::JamCleared));

    pins.set_input(InputLine::Lower, true);
    block_on(door.dispatch_event(DoorEvent::Lower));
    assert_eq!(door.state(), DoorState::Closed);
    assert!(!pins.power());
}

#[test]
fn persistent_jam_goes_dead_until_stop() {
    let (door, pins, sink) = make_door(true, false);
    door.close();
    block_on(door.dispatch_event(DoorEvent::Upper));
    block_on(door.dispatch_event(DoorEvent::Down));
    assert_eq!(door.state(), DoorState::Dead);
    assert!(!pins.power());
    assert!(sink.contains(&AppEvent::RecoveryFailed));

    // Dead ignores everything but stop.
    for event in DoorEvent::ALL {
        block_on(door.dispatch_event(event));
        assert_eq!(door.state(), DoorState::Dead);
    }
    assert!(!door.open());
    assert!(!door.close());

    // After a manual fix, stop re-derives the resting state.
    assert!(door.stop());
    assert_eq!(door.state(), DoorState::Open);
}

#[test]
fn pulse_writes_up_then_power_off_then_down() {
    let (door, pins, _sink) = make_door(true, false);
    door.close();
    block_on(door.dispatch_event(DoorEvent::Upper));
    let before = pins.write_log().len();

    pins.set_input(InputLine::Upper, false);
    block_on(door.dispatch_event(DoorEvent::Down));

    use coopdoor::fsm::context::OutputLine::{Direction, Power};
    let writes = pins.write_log()[before..].to_vec();
    assert_eq!(
        writes,
        vec![
            (Direction, true),
            (Power, true),
            (Power, false),
            (Direction, false),
            (Power, true),
        ]
    );
}

// ── Status and shutdown ───────────────────────────────────────

#[test]
fn status_reflects_switch_levels() {
    let (door, pins, _sink) = make_door(false, false);
    pins.set_input(InputLine::Up, true);
    let status = door.status();
    assert_eq!(status.state, DoorState::Stopped);
    assert!(status.inputs.up);
    assert!(!status.inputs.down);
    assert_eq!(
        status.to_json(),
        r#"{"state":"stopped","upper":false,"lower":false,"up":true,"down":false}"#
    );
}

#[test]
fn shutdown_leaves_motor_unpowered() {
    let (door, pins, sink) = make_door(false, true);
    door.open();
    assert!(pins.power());
    door.shutdown();
    assert!(!pins.power());
    assert!(!pins.direction());
    assert_eq!(sink.events().last(), Some(&AppEvent::ShutDown));
}
