//! Client side of the command protocol.
//!
//! [`DoorClient`] sends one command per line and reads back the two-line
//! reply.  After `enroll`, the server also pushes unsolicited `Status`
//! blocks on the same connection; [`DoorClient::next_push`] and
//! [`DoorClient::pushes`] read those.
//!
//! Pushes and the answer to `status` share the `Status` headline and
//! cannot be told apart on the wire.  While waiting for the reply to any
//! other command, interleaved `Status` blocks are skipped.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;

use crate::app::commands::Command;
use crate::app::events::StatusRecord;
use crate::rpc::engine::Reply;

pub struct DoorClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl DoorClient {
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let writer = TcpStream::connect(addr)?;
        writer.set_nodelay(true)?;
        let reader = BufReader::new(writer.try_clone()?);
        Ok(Self { reader, writer })
    }

    /// Bound how long a read may block (`None` blocks forever).
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.writer.set_read_timeout(timeout)
    }

    /// Send `command` and wait for its reply.
    pub fn send(&mut self, command: Command) -> io::Result<Reply> {
        self.send_line(command.name())?;
        loop {
            let reply = self.read_reply()?;
            if command == Command::Status || !matches!(reply, Reply::Status(_)) {
                return Ok(reply);
            }
            debug!("skipping status push while waiting for '{}'", command.name());
        }
    }

    /// Send an arbitrary line and return the first reply block.
    pub fn send_raw(&mut self, line: &str) -> io::Result<Reply> {
        self.send_line(line)?;
        self.read_reply()
    }

    pub fn open(&mut self) -> io::Result<Reply> {
        self.send(Command::Open)
    }

    pub fn close(&mut self) -> io::Result<Reply> {
        self.send(Command::Close)
    }

    pub fn stop(&mut self) -> io::Result<Reply> {
        self.send(Command::Stop)
    }

    pub fn status(&mut self) -> io::Result<StatusRecord> {
        self.send(Command::Status).map(|reply| *reply.status())
    }

    pub fn enroll(&mut self) -> io::Result<Reply> {
        self.send(Command::Enroll)
    }

    /// Block until the next `Status` push.
    pub fn next_push(&mut self) -> io::Result<StatusRecord> {
        loop {
            if let Reply::Status(status) = self.read_reply()? {
                return Ok(status);
            }
        }
    }

    /// Iterate pushed status records.  The first error ends the iteration.
    pub fn pushes(&mut self) -> impl Iterator<Item = io::Result<StatusRecord>> + '_ {
        let mut failed = false;
        std::iter::from_fn(move || {
            if failed {
                return None;
            }
            let next = self.next_push();
            failed = next.is_err();
            Some(next)
        })
    }

    fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn read_reply(&mut self) -> io::Result<Reply> {
        let headline = self.read_line()?;
        let body = self.read_line()?;
        Reply::parse(&headline, &body).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed reply: {:?} / {:?}", headline.trim(), body.trim()),
            )
        })
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(line)
    }
}
