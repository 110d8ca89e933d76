//! Textual request/response frames exchanged with remote controllers.
//!
//! ```text
//! client -> server   r                         reset
//!                    s-0.50t1.00               action (steering, throttle)
//! server -> client   o10,20,30,300,300         observation (reply to reset)
//!                    o10,20,30,300,300r12.34t0 step (reply to action)
//! ```
//!
//! Each frame travels in a single write. Surrounding whitespace is ignored when
//! decoding so line-terminated controllers work as well.

use crate::RADAR_COUNT;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sent by the server to every controller once the roster is complete.
pub const GO_TOKEN: &str = "go";
pub const RESET_TOKEN: &str = "r";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Empty frame")]
    Empty,

    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("Unrecognised frame: {0:?}")]
    Unrecognised(String),

    #[error("Frame is missing its '{0}' segment")]
    MissingSegment(char),

    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),

    #[error("Value {0} is outside [-1, 1]")]
    OutOfRange(f64),

    #[error("Expected five radar readings, got {0}")]
    RadarCount(usize),

    #[error("Invalid terminated flag: {0:?}")]
    InvalidFlag(String),
}

/// Requests a controller can make.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClientMessage {
    Reset,
    Action { steering: f64, throttle: f64 },
}

/// Replies the server sends.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Observation {
        radar: [u32; RADAR_COUNT],
    },
    Step {
        radar: [u32; RADAR_COUNT],
        reward: f64,
        terminated: bool,
    },
}

impl ClientMessage {
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        frame_text(frame)?.parse()
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl ServerMessage {
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        frame_text(frame)?.parse()
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    pub fn radar(&self) -> &[u32; RADAR_COUNT] {
        match self {
            ServerMessage::Observation { radar } | ServerMessage::Step { radar, .. } => radar,
        }
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMessage::Reset => f.write_str(RESET_TOKEN),
            ClientMessage::Action { steering, throttle } => {
                write!(f, "s{:.2}t{:.2}", steering, throttle)
            }
        }
    }
}

impl FromStr for ClientMessage {
    type Err = ProtocolError;

    fn from_str(frame: &str) -> Result<Self, Self::Err> {
        if frame.is_empty() {
            return Err(ProtocolError::Empty);
        }
        if frame == RESET_TOKEN {
            return Ok(ClientMessage::Reset);
        }

        let body = frame
            .strip_prefix('s')
            .ok_or_else(|| ProtocolError::Unrecognised(frame.to_string()))?;
        let (steering, throttle) = body
            .split_once('t')
            .ok_or(ProtocolError::MissingSegment('t'))?;

        Ok(ClientMessage::Action {
            steering: parse_unit(steering)?,
            throttle: parse_unit(throttle)?,
        })
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("o")?;
        for (index, distance) in self.radar().iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", distance)?;
        }
        if let ServerMessage::Step {
            reward, terminated, ..
        } = self
        {
            write!(f, "r{:.2}t{}", reward, u8::from(*terminated))?;
        }
        Ok(())
    }
}

impl FromStr for ServerMessage {
    type Err = ProtocolError;

    fn from_str(frame: &str) -> Result<Self, Self::Err> {
        if frame.is_empty() {
            return Err(ProtocolError::Empty);
        }
        let body = frame
            .strip_prefix('o')
            .ok_or_else(|| ProtocolError::Unrecognised(frame.to_string()))?;

        let Some((radar, tail)) = body.split_once('r') else {
            return Ok(ServerMessage::Observation {
                radar: parse_radar(body)?,
            });
        };

        let (reward, terminated) = tail
            .split_once('t')
            .ok_or(ProtocolError::MissingSegment('t'))?;
        let terminated = match terminated {
            "0" => false,
            "1" => true,
            other => return Err(ProtocolError::InvalidFlag(other.to_string())),
        };

        Ok(ServerMessage::Step {
            radar: parse_radar(radar)?,
            reward: parse_decimal(reward)?,
            terminated,
        })
    }
}

fn frame_text(frame: &[u8]) -> Result<&str, ProtocolError> {
    let text = std::str::from_utf8(frame).map_err(|_| ProtocolError::InvalidUtf8)?;
    Ok(text.trim())
}

fn parse_radar(text: &str) -> Result<[u32; RADAR_COUNT], ProtocolError> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != RADAR_COUNT {
        return Err(ProtocolError::RadarCount(parts.len()));
    }

    let mut radar = [0; RADAR_COUNT];
    for (slot, part) in radar.iter_mut().zip(parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidNumber(part.to_string()));
        }
        *slot = part
            .parse()
            .map_err(|_| ProtocolError::InvalidNumber(part.to_string()))?;
    }
    Ok(radar)
}

/// Plain signed decimal: optional sign, digits, optional fraction.
fn parse_decimal(text: &str) -> Result<f64, ProtocolError> {
    let invalid = || ProtocolError::InvalidNumber(text.to_string());

    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !fraction.map_or(true, digits) {
        return Err(invalid());
    }

    text.parse().map_err(|_| invalid())
}

fn parse_unit(text: &str) -> Result<f64, ProtocolError> {
    let value = parse_decimal(text)?;
    if !(-1.0..=1.0).contains(&value) {
        return Err(ProtocolError::OutOfRange(value));
    }
    Ok(value)
}
