// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Driver configuration.
//!
//! The drone side of every port is fixed by the firmware; only the
//! local command port is genuinely a choice. The drone remembers
//! whichever local port first talks to it until it powers down, so
//! only one client can drive it at a time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use tello_core::RetryPolicy;

/// IP of the command server running on the drone.
pub const TELLO_IP: &str = "192.168.10.1";

/// UDP port of the command server running on the drone.
pub const TELLO_COMMAND_PORT: u16 = 8889;

/// Default local port the command socket binds to.
pub const DEFAULT_LOCAL_COMMAND_PORT: u16 = 9000;

/// Local port the firmware pushes state datagrams to. Not negotiable.
pub const TELLO_STATE_PORT: u16 = 8890;

/// Local port the firmware pushes the raw video stream to after
/// `streamon`. The driver never reads it; a video consumer binds it
/// separately and receives frame bytes only.
pub const TELLO_VIDEO_PORT: u16 = 11111;

/// Everything [`crate::Tello::bind`] needs to know. No module-level
/// state; pass one of these to the constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Drone IP address (or hostname; resolved at bind time).
    pub ip: String,
    /// Remote command port.
    pub command_port: u16,
    /// Local command port; 0 lets the OS pick one.
    pub local_command_port: u16,
    /// Local state port; must stay 8890 against real hardware.
    pub state_port: u16,
    /// Video stream port, exposed for collaborators.
    pub video_port: u16,
    /// SDK-mode handshake attempts.
    pub handshake_attempts: u32,
    /// Interval between handshake attempts in milliseconds.
    pub handshake_interval_ms: u64,
    /// Response wait attempts per awaited command.
    pub response_attempts: u32,
    /// Length of each response wait in milliseconds.
    pub response_delay_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            ip: TELLO_IP.to_string(),
            command_port: TELLO_COMMAND_PORT,
            local_command_port: DEFAULT_LOCAL_COMMAND_PORT,
            state_port: TELLO_STATE_PORT,
            video_port: TELLO_VIDEO_PORT,
            handshake_attempts: 10,
            handshake_interval_ms: 1_000,
            response_attempts: 5,
            response_delay_ms: 200,
        }
    }
}

impl DriverConfig {
    /// `host:port` string for the drone's command server.
    pub fn remote_addr(&self) -> String {
        format!("{}:{}", self.ip, self.command_port)
    }

    pub fn handshake_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.handshake_attempts,
            Duration::from_millis(self.handshake_interval_ms),
        )
    }

    pub fn response_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.response_attempts,
            Duration::from_millis(self.response_delay_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_firmware_ports() {
        let config = DriverConfig::default();
        assert_eq!(config.remote_addr(), "192.168.10.1:8889");
        assert_eq!(config.state_port, 8890);
        assert_eq!(config.video_port, 11111);
    }

    #[test]
    fn policies_come_from_millis_fields() {
        let config = DriverConfig {
            handshake_attempts: 3,
            handshake_interval_ms: 1_000,
            ..DriverConfig::default()
        };
        let policy = config.handshake_policy();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(), Duration::from_secs(1));
    }
}
