//! Error types for the meshprobe-radio crate.

use thiserror::Error;

/// Why one connection strategy did not produce a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: String,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum RadioError {
    #[error("Device error: {0}")]
    Device(String),

    #[error("No device found ({})", describe_attempts(.attempts))]
    NoDevice { attempts: Vec<Attempt> },

    #[error("Not connected to a device")]
    NotConnected,

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Discovery error: {0}")]
    Discover(#[from] meshprobe_discover::error::DiscoverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RadioError>;

fn describe_attempts(attempts: &[Attempt]) -> String {
    if attempts.is_empty() {
        return "no strategies configured".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.strategy, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_device_message() {
        let err = RadioError::NoDevice {
            attempts: vec![
                Attempt {
                    strategy: "hostnames".to_string(),
                    reason: "nothing resolved".to_string(),
                },
                Attempt {
                    strategy: "serial".to_string(),
                    reason: "no serial ports".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "No device found (hostnames: nothing resolved; serial: no serial ports)"
        );
        assert_eq!(
            RadioError::NoDevice { attempts: vec![] }.to_string(),
            "No device found (no strategies configured)"
        );
    }
}
