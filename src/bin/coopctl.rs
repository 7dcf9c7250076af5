//! coopctl: command line client for the coop door daemon.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use coopdoor::app::events::StatusRecord;
use coopdoor::client::DoorClient;
use coopdoor::pins::COMMAND_PORT;
use coopdoor::rpc::engine::Reply;

#[derive(Parser)]
#[command(name = "coopctl")]
#[command(about = "Control the coop door", long_about = None)]
#[command(version)]
struct Cli {
    /// Daemon address
    #[arg(long, global = true, default_value_t = format!("127.0.0.1:{COMMAND_PORT}"))]
    addr: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Raise the door
    Open,
    /// Lower the door
    Close,
    /// Stop the motor
    Stop,
    /// Print the current status
    Status,
    /// Enroll and print every status push until interrupted
    Watch,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut client =
        DoorClient::connect(&cli.addr).with_context(|| format!("connecting to {}", cli.addr))?;

    let reply = match cli.command {
        Cmd::Open => client.open()?,
        Cmd::Close => client.close()?,
        Cmd::Stop => client.stop()?,
        Cmd::Status => {
            print_status(&client.status()?);
            return Ok(ExitCode::SUCCESS);
        }
        Cmd::Watch => {
            let reply = client.enroll()?;
            if !matches!(reply, Reply::Ok(_)) {
                anyhow::bail!("enroll refused ({})", reply.headline());
            }
            print_status(reply.status());
            for status in client.pushes() {
                print_status(&status.context("reading status push")?);
            }
            return Ok(ExitCode::SUCCESS);
        }
    };

    println!("{}", reply.headline());
    print_status(reply.status());
    Ok(match reply {
        Reply::Ok(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn print_status(status: &StatusRecord) {
    println!(
        "{:<15} upper={} lower={} up={} down={}",
        status.state.name(),
        u8::from(status.inputs.upper),
        u8::from(status.inputs.lower),
        u8::from(status.inputs.up),
        u8::from(status.inputs.down),
    );
}
