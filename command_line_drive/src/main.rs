//! # Command line drive tool
//!
//! Interactive console which sends telecommands directly to `drive_exec` over
//! the network.
//!
//! Raw commands:
//!
//! - `safe`: put the robot into safe mode
//! - `unsafe`: take the robot out of safe mode
//! - `zero-yaw`: zero the orientation sensor's yaw reading
//! - `quit`/`exit`: exit the console
//!
//! Any other input is parsed as a drive command, for example:
//!
//! ```text
//! drive $ chassis 0.5 0.0 -0.2
//! drive $ stop
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use structopt::StructOpt;

// Internal
use comms_if::{
    net::{zmq, MonitoredSocket, SocketOptions},
    tc::{drive::DriveCmd, Tc, TcResponse},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const PROMPT: &str = "drive $ ";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Command line options for the console itself.
#[derive(Debug, StructOpt)]
#[structopt(name = "command_line_drive")]
struct Opts {
    /// Endpoint of the drive_exec telecommand server.
    #[structopt(long, default_value = "tcp://localhost:5030")]
    endpoint: String,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    let opts = Opts::from_args();

    // Connect the TC socket
    let ctx = zmq::Context::new();

    let socket_options = SocketOptions {
        block_on_first_connect: false,
        connect_timeout: 1000,
        recv_timeout: 1000,
        send_timeout: 500,
        req_correlate: true,
        req_relaxed: true,
        linger: 1,
        ..Default::default()
    };

    let socket = MonitoredSocket::new(&ctx, zmq::REQ, socket_options, &opts.endpoint)
        .wrap_err("Failed to create the TC socket")?;

    println!("Sending TCs to {}", opts.endpoint);
    println!("Type \"help\" for a list of commands\n");

    // Setup the console editor
    let mut rl = DefaultEditor::new().wrap_err("Failed to create the console")?;

    loop {
        let readline = rl.readline(PROMPT);
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                match parse(&line) {
                    ParsedLine::Empty => (),
                    ParsedLine::Quit => break,
                    ParsedLine::Help => print_help(),
                    ParsedLine::Tc(tc) => send_tc(&socket, &tc),
                    ParsedLine::Error(msg) => println!("{}", msg),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Unhandled error: {:?}", err);
                break;
            }
        }
    }

    println!("Exiting...");

    Ok(())
}

/// Parse a line of console input.
fn parse(line: &str) -> ParsedLine {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.is_empty() {
        return ParsedLine::Empty;
    }

    match tokens[0] {
        "quit" | "exit" => ParsedLine::Quit,
        "help" => ParsedLine::Help,
        "safe" => ParsedLine::Tc(Tc::MakeSafe),
        "unsafe" => ParsedLine::Tc(Tc::MakeUnsafe),
        "zero-yaw" => ParsedLine::Tc(Tc::ZeroYaw),
        _ => {
            // Anything else is a drive command, parsed by structopt so the
            // console syntax matches the DriveCmd definition itself.
            let args = std::iter::once("drive").chain(tokens.iter().copied());

            match DriveCmd::from_iter_safe(args) {
                Ok(cmd) => ParsedLine::Tc(Tc::Drive(cmd)),
                Err(e) => ParsedLine::Error(e.message),
            }
        }
    }
}

/// Send a TC to the server and print the response.
fn send_tc(socket: &MonitoredSocket, tc: &Tc) {
    let tc_json = match tc.to_json() {
        Ok(j) => j,
        Err(e) => {
            println!("Could not serialise the TC: {}", e);
            return;
        }
    };

    if let Err(e) = socket.send(tc_json.as_str(), 0) {
        println!("Could not send the TC: {}", e);
        return;
    }

    match socket.recv_msg(0) {
        Ok(msg) => {
            let response: Result<TcResponse, _> =
                serde_json::from_str(msg.as_str().unwrap_or(""));

            match response {
                Ok(TcResponse::Ok) => println!("OK"),
                Ok(TcResponse::CannotExecute) => {
                    println!("Cannot execute, is the robot in safe mode?")
                }
                Ok(TcResponse::Invalid) => println!("TC rejected as invalid"),
                Err(e) => println!("Could not parse the response: {}", e),
            }
        }
        Err(e) => println!("No response from the server: {}", e),
    }
}

fn print_help() {
    println!("Raw commands:");
    println!("    safe        put the robot into safe mode");
    println!("    unsafe      take the robot out of safe mode");
    println!("    zero-yaw    zero the orientation sensor's yaw reading");
    println!("    quit        exit the console");
    println!();
    println!("Drive commands:");
    println!("    chassis <vx_ms> <vy_ms> <omega_rads>");
    println!("    stop");
    println!();
    println!("Pass --help to a drive command for more detail.");
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// The result of parsing a line of console input.
enum ParsedLine {
    Empty,
    Quit,
    Help,
    Tc(Tc),
    Error(String),
}
