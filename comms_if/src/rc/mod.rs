//! # Remote control module
//!
//! Commands are UTF-8 encoded JSON objects of the form `{"cmd": "...", ...}`, one per datagram.
//! Most commands get no answer, they are queued on the vehicle and applied on the next control
//! cycle. The three status queries are answered immediately with a `<query>_response` message
//! carrying a `data` payload.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod status;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use structopt::StructOpt;
use thiserror::Error;

// Internal
pub use status::*;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command sent from the remote controller to the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum RcCmd {
    /// Overwrite a vehicle attribute on the next control cycle.
    #[structopt(name = "set", setting = structopt::clap::AppSettings::AllowNegativeNumbers)]
    Set {
        /// The attribute to set, `target_speed` or `direction`.
        attr: SetAttr,

        /// The new value, between -1 and +1.
        #[serde(deserialize_with = "de_finite_number")]
        #[structopt(parse(try_from_str = parse_finite))]
        value: f64,
    },

    /// Activate a module of the vehicle.
    #[structopt(name = "enable_sensor")]
    EnableSensor {
        /// Name of the module, e.g. `drive:random`
        name: String,
    },

    /// Deactivate a module of the vehicle.
    #[structopt(name = "disable_sensor")]
    DisableSensor {
        /// Name of the module, e.g. `drive:random`
        name: String,
    },

    /// Start playing a sound file on the vehicle.
    #[structopt(name = "play_sound")]
    PlaySound {
        /// Name of the sound file
        name: String,
    },

    /// Stop playing a sound file on the vehicle.
    #[structopt(name = "stop_sound")]
    StopSound {
        /// Name of the sound file
        name: String,
    },

    /// Request the vehicle's control variables and motor speeds.
    #[structopt(name = "vehicle_status")]
    VehicleStatus,

    /// Request the active flag of every module.
    #[structopt(name = "sensor_status")]
    SensorStatus,

    /// Request the available and playing sound files.
    #[structopt(name = "sound_status")]
    SoundStatus,
}

/// Vehicle attributes which can be overwritten remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetAttr {
    TargetSpeed,
    Direction,
}

/// Response sent by the vehicle to a status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "data", rename_all = "snake_case")]
pub enum RcResponse {
    VehicleStatusResponse(VehicleStatus),
    SensorStatusResponse(SensorStatus),
    SoundStatusResponse(SoundStatus),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum RcParseError {
    #[error("Message contains invalid JSON or an unknown command: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Unknown attribute \"{0}\", expected target_speed or direction")]
    UnknownAttr(String),

    #[error("Invalid value \"{0}\", expected a finite number")]
    InvalidValue(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RcCmd {
    /// Parse a command from the raw bytes of a datagram.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RcParseError> {
        serde_json::from_slice(bytes).map_err(RcParseError::InvalidJson)
    }

    /// Returns true if the command is a status query which the vehicle answers immediately.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            RcCmd::VehicleStatus | RcCmd::SensorStatus | RcCmd::SoundStatus
        )
    }
}

impl RcResponse {
    /// Parse a response from the raw bytes of a datagram.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RcParseError> {
        serde_json::from_slice(bytes).map_err(RcParseError::InvalidJson)
    }
}

impl FromStr for SetAttr {
    type Err = RcParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "target_speed" => Ok(SetAttr::TargetSpeed),
            "direction" => Ok(SetAttr::Direction),
            _ => Err(RcParseError::UnknownAttr(s.to_string())),
        }
    }
}

impl fmt::Display for SetAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetAttr::TargetSpeed => write!(f, "target_speed"),
            SetAttr::Direction => write!(f, "direction"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a finite number typed on the command line.
fn parse_finite(s: &str) -> Result<f64, RcParseError> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RcParseError::InvalidValue(s.to_string()))
    }
}

/// Accept either a JSON number or a string holding a number, rejecting NaN and infinities.
fn de_finite_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }

    let value = match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(v) => v,
        NumOrStr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom)?,
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("value must be a finite number"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            RcCmd::from_bytes(br#"{"cmd": "set", "attr": "target_speed", "value": 0.5}"#).unwrap(),
            RcCmd::Set { attr: SetAttr::TargetSpeed, value: 0.5 }
        );
        assert_eq!(
            RcCmd::from_bytes(br#"{"cmd": "set", "attr": "direction", "value": "-0.3"}"#).unwrap(),
            RcCmd::Set { attr: SetAttr::Direction, value: -0.3 }
        );
        assert_eq!(
            RcCmd::from_bytes(br#"{"cmd": "set", "attr": "direction", "value": 1}"#).unwrap(),
            RcCmd::Set { attr: SetAttr::Direction, value: 1.0 }
        );
        assert_eq!(
            RcCmd::from_bytes(br#"{"cmd": "disable_sensor", "name": "drive:random"}"#).unwrap(),
            RcCmd::DisableSensor { name: "drive:random".into() }
        );
        assert_eq!(
            RcCmd::from_bytes(br#"{"cmd": "vehicle_status", "extra": true}"#).unwrap(),
            RcCmd::VehicleStatus
        );
        assert!(RcCmd::VehicleStatus.is_query());
        assert!(!RcCmd::PlaySound { name: "horn.wav".into() }.is_query());
    }

    #[test]
    fn test_reject_malformed() {
        let malformed: [&[u8]; 6] = [
            b"not json",
            br#"{"name": "sensor:line"}"#,
            br#"{"cmd": "self_destruct"}"#,
            br#"{"cmd": "set", "attr": "colour", "value": 1.0}"#,
            br#"{"cmd": "set", "attr": "direction", "value": "left"}"#,
            br#""just a string""#,
        ];

        for m in malformed.iter() {
            assert!(RcCmd::from_bytes(m).is_err(), "{:?} should not parse", m);
        }
    }

    #[test]
    fn test_response_format() {
        let response = RcResponse::SoundStatusResponse(SoundStatus {
            soundfiles: vec!["horn.wav".into()],
            playing: vec![],
        });

        let json: serde_json::Value = serde_json::to_value(&response).unwrap();
        assert_eq!(json["cmd"], "sound_status_response");
        assert_eq!(json["data"]["soundfiles"][0], "horn.wav");
        assert!(json["data"]["playing"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_structopt_parse() {
        let cmd = RcCmd::from_iter_safe(&["rc", "set", "direction", "-0.5"]).unwrap();
        assert_eq!(cmd, RcCmd::Set { attr: SetAttr::Direction, value: -0.5 });

        let cmd = RcCmd::from_iter_safe(&["rc", "enable_sensor", "drive:line"]).unwrap();
        assert_eq!(cmd, RcCmd::EnableSensor { name: "drive:line".into() });

        let cmd = RcCmd::from_iter_safe(&["rc", "set", "target_speed", "-1"]).unwrap();
        assert_eq!(cmd, RcCmd::Set { attr: SetAttr::TargetSpeed, value: -1.0 });

        assert!(RcCmd::from_iter_safe(&["rc", "set", "speed", "1.0"]).is_err());
        assert!(RcCmd::from_iter_safe(&["rc", "set", "direction", "NaN"]).is_err());
        assert!(RcCmd::from_iter_safe(&["rc", "set", "direction", "inf"]).is_err());
        assert!(RcCmd::from_iter_safe(&["rc", "set", "direction", "-inf"]).is_err());
    }
}
