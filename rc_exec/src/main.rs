//! # Remote control executable
//!
//! Command line remote control for the car. Commands typed at the prompt are parsed into remote
//! control commands and sent to the vehicle, while a background thread polls the vehicle's status.
//!
//! ```text
//! Carbot $ set target_speed 0.5
//! Carbot $ set direction -0.3
//! Carbot $ enable_sensor drive:line
//! Carbot $ play_sound horn.wav
//! Carbot $ status
//! Carbot $ quit
//! ```

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod telemetry;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{Report, eyre::WrapErr};
use comms_if::{
    net::{RcClient, RcClientParams},
    rc::RcCmd,
};
use log::{info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    sync::{atomic::{AtomicBool, Ordering}, Arc},
    thread,
};
use structopt::StructOpt;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

use telemetry::SharedTelemetry;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const PROMPT: &str = "Carbot $ ";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct RcExecParams {
    /// Prompt history file, relative to the software root
    history_path: Option<String>,

    client: RcClientParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What to do with a line typed at the prompt.
#[derive(Debug, PartialEq)]
enum Input {
    Empty,
    Quit,
    Status,
    Cmd(RcCmd),
    Invalid(String),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let session = Session::new("rc_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Info, &session)
        .wrap_err("Failed to initialise logging")?;

    let params: RcExecParams = util::params::load("rc_exec.toml")
        .wrap_err("Could not load the rc exec params")?;

    // ---- NETWORK ----

    let mut client = RcClient::new(&params.client)
        .wrap_err("Failed to initialise the RcClient")?;
    let sender = client.command_sender();

    info!("Remote control for the vehicle at {}", params.client.vehicle_addr);

    let telemetry = SharedTelemetry::default();
    let running = Arc::new(AtomicBool::new(true));

    let client_handle = {
        let running = running.clone();
        let mut handler = telemetry.clone();
        let frequency_hz = params.client.update_frequency_hz;

        thread::Builder::new()
            .name(String::from("rc_client"))
            .spawn(move || {
                if let Err(e) = client.run(frequency_hz, &running, &mut handler) {
                    warn!("RcClient stopped: {}", e);
                }
            })
            .wrap_err("Failed to start the RcClient thread")?
    };

    // ---- PROMPT ----

    let history_path = match params.history_path {
        Some(ref p) => Some(host::get_sw_root()?.join(p)),
        None => None
    };

    let mut rl = DefaultEditor::new()?;
    if let Some(ref p) = history_path {
        if rl.load_history(p).is_err() {
            println!("No history detected");
        }
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    warn!("Could not add the line to the history: {}", e);
                }

                match parse(&line) {
                    Input::Empty => (),
                    Input::Quit => break,
                    Input::Status => print!("{}", telemetry.report()),
                    Input::Cmd(cmd) if cmd.is_query() => print!("{}", telemetry.report()),
                    Input::Cmd(cmd) => {
                        if !sender.send(cmd) {
                            println!("The remote control client has stopped");
                            break
                        }
                    },
                    Input::Invalid(msg) => println!("{}", msg),
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                println!("Unhandled Error: {:?}", e);
                break
            }
        }
    }

    // ---- SHUTDOWN ----

    println!("Exiting...");

    running.store(false, Ordering::Relaxed);
    if client_handle.join().is_err() {
        warn!("RcClient thread panicked");
    }

    if let Some(ref p) = history_path {
        if let Some(dir) = p.parent() {
            fs::create_dir_all(dir).ok();
        }
        rl.save_history(p).wrap_err("Could not save the prompt history")?;
    }

    Ok(())
}

/// Parse a line typed at the prompt.
fn parse(line: &str) -> Input {
    let mut words = line.split_whitespace().peekable();

    match words.peek() {
        None => Input::Empty,
        Some(&"quit") | Some(&"exit") => Input::Quit,
        Some(&"status") => Input::Status,
        Some(_) => match RcCmd::from_iter_safe(std::iter::once("Carbot").chain(words)) {
            Ok(cmd) => Input::Cmd(cmd),
            Err(e) => Input::Invalid(e.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::rc::SetAttr;

    #[test]
    fn test_parse() {
        assert_eq!(parse("   "), Input::Empty);
        assert_eq!(parse("quit"), Input::Quit);
        assert_eq!(parse(" status "), Input::Status);
        assert_eq!(
            parse("set target_speed 0.5"),
            Input::Cmd(RcCmd::Set { attr: SetAttr::TargetSpeed, value: 0.5 })
        );
        assert_eq!(
            parse("set direction -0.3"),
            Input::Cmd(RcCmd::Set { attr: SetAttr::Direction, value: -0.3 })
        );
        assert_eq!(
            parse("disable_sensor drive:random"),
            Input::Cmd(RcCmd::DisableSensor { name: "drive:random".into() })
        );
        assert_eq!(
            parse("set target_speed -0.5"),
            Input::Cmd(RcCmd::Set { attr: SetAttr::TargetSpeed, value: -0.5 })
        );
        assert!(matches!(parse("set colour 1.0"), Input::Invalid(_)));
        assert!(matches!(parse("set direction NaN"), Input::Invalid(_)));
        assert!(matches!(parse("set target_speed inf"), Input::Invalid(_)));
        assert!(matches!(parse("self_destruct"), Input::Invalid(_)));
    }

    #[test]
    fn test_default_params() {
        let params: RcExecParams = util::params::from_str(r#"
            [client]
            vehicle_addr = "192.168.1.20:9876"
        "#).unwrap();

        assert_eq!(params.client.vehicle_addr, "192.168.1.20:9876");
        assert_eq!(params.client.update_frequency_hz, 10.0);
        assert!(params.history_path.is_none());
    }
}
