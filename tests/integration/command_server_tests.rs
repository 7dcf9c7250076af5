//! Integration tests for the command server over loopback TCP.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use coopdoor::client::DoorClient;
use coopdoor::fsm::DoorState;
use coopdoor::fsm::context::InputLine;
use coopdoor::rpc::engine::Reply;

use crate::mock_hw::{TestServer, make_door, wait_until};

const TIMEOUT: Duration = Duration::from_secs(5);

fn client(server: &TestServer) -> DoorClient {
    let client = DoorClient::connect(server.addr).unwrap();
    client.set_read_timeout(Some(TIMEOUT)).unwrap();
    client
}

#[test]
fn open_then_status_round_trip() {
    let (door, pins, _sink) = make_door(false, true);
    let server = TestServer::start(door.clone());
    let mut c = client(&server);

    let reply = c.open().unwrap();
    assert!(matches!(reply, Reply::Ok(_)), "{reply:?}");
    assert_eq!(reply.status().state, DoorState::Opening);
    assert!(pins.power());

    let status = c.status().unwrap();
    assert_eq!(status.state, DoorState::Opening);
    assert!(status.inputs.lower);
}

#[test]
fn refused_command_reports_incorrect_state() {
    let (door, pins, _sink) = make_door(false, true);
    let server = TestServer::start(door);
    let mut c = client(&server);

    let reply = c.close().unwrap();
    assert!(matches!(reply, Reply::IncorrectState(_)), "{reply:?}");
    assert_eq!(reply.status().state, DoorState::Closed);
    assert!(!pins.power());
}

#[test]
fn unknown_command_is_an_error() {
    let (door, _pins, _sink) = make_door(false, false);
    let server = TestServer::start(door);
    let mut c = client(&server);

    let reply = c.send_raw("launch").unwrap();
    assert!(matches!(reply, Reply::Error(_)), "{reply:?}");
    assert_eq!(reply.status().state, DoorState::Stopped);
}

#[test]
fn raw_wire_format() {
    let (door, _pins, _sink) = make_door(true, false);
    let server = TestServer::start(door);
    let stream = TcpStream::connect(server.addr).unwrap();
    stream.set_read_timeout(Some(TIMEOUT)).unwrap();
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    // Two commands in one segment, mixed case and CRLF.
    writer.write_all(b"STATUS\r\nopen\n").unwrap();

    let mut lines = Vec::new();
    for _ in 0..4 {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        lines.push(line);
    }
    let json = r#"{"state":"open","upper":true,"lower":false,"up":false,"down":false}"#;
    assert_eq!(lines[0], "Status\n");
    assert_eq!(lines[1], format!("{json}\n"));
    assert_eq!(lines[2], "Incorrect State\n");
    assert_eq!(lines[3], format!("{json}\n"));
}

#[test]
fn enrolled_client_sees_other_clients_commands() {
    let (door, _pins, _sink) = make_door(false, true);
    let server = TestServer::start(door.clone());

    let mut watcher = client(&server);
    let reply = watcher.enroll().unwrap();
    assert!(matches!(reply, Reply::Ok(_)), "{reply:?}");
    // Enroll itself triggers a push to the new listener.
    assert_eq!(watcher.next_push().unwrap().state, DoorState::Closed);
    assert_eq!(door.subscriber_count(), 1);

    let mut operator = client(&server);
    assert!(matches!(operator.open().unwrap(), Reply::Ok(_)));

    let pushed = watcher.next_push().unwrap();
    assert_eq!(pushed.state, DoorState::Opening);
}

#[test]
fn one_open_reaches_every_enrolled_connection_once() {
    let (door, _pins, _sink) = make_door(false, true);
    let server = TestServer::start(door.clone());

    let mut watchers: Vec<DoorClient> = (0..3).map(|_| client(&server)).collect();
    for w in &mut watchers {
        assert!(matches!(w.enroll().unwrap(), Reply::Ok(_)));
    }
    assert_eq!(door.subscriber_count(), 3);
    // Each enroll pushes to everyone enrolled so far.
    for (i, w) in watchers.iter_mut().enumerate() {
        for _ in 0..(3 - i) {
            assert_eq!(w.next_push().unwrap().state, DoorState::Closed);
        }
    }

    let mut operator = client(&server);
    assert!(matches!(operator.open().unwrap(), Reply::Ok(_)));

    for w in &mut watchers {
        assert_eq!(w.next_push().unwrap().state, DoorState::Opening);
        w.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
        assert!(w.next_push().is_err(), "exactly one push per watcher");
    }
}

#[test]
fn status_query_does_not_push() {
    let (door, _pins, _sink) = make_door(false, true);
    let server = TestServer::start(door.clone());

    let mut watcher = client(&server);
    watcher.enroll().unwrap();
    watcher.next_push().unwrap();

    let mut other = client(&server);
    other.status().unwrap();
    other.stop().unwrap();

    // The first push after enrolling comes from `stop`, not `status`.
    let pushed = watcher.next_push().unwrap();
    assert_eq!(pushed.state, DoorState::Closed);
    watcher.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
    assert!(watcher.next_push().is_err(), "exactly one push expected");
}

#[test]
fn disconnected_listener_is_pruned_on_next_push() {
    let (door, pins, _sink) = make_door(false, true);
    let server = TestServer::start(door.clone());

    {
        let mut watcher = client(&server);
        watcher.enroll().unwrap();
        watcher.next_push().unwrap();
    }
    assert_eq!(door.subscriber_count(), 1);

    // Writes to a closed peer fail within a couple of pushes.
    let pruned = wait_until(TIMEOUT, || {
        pins.set_input(InputLine::Up, !pins.input(InputLine::Up));
        door.refresh_listeners();
        door.subscriber_count() == 0
    });
    assert!(pruned);
}

#[test]
fn many_clients_are_served() {
    let (door, _pins, _sink) = make_door(false, false);
    let server = TestServer::start(door);
    let mut clients: Vec<DoorClient> = (0..5).map(|_| client(&server)).collect();
    for c in &mut clients {
        assert_eq!(c.status().unwrap().state, DoorState::Stopped);
    }
}
