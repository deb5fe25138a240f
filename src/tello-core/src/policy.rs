// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Retry behavior for commands and the SDK-mode handshake.

use std::time::Duration;

/// Fixed-delay retry policy: at most `max_attempts` waits of `delay`
/// each. Pure configuration, no mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Default for awaiting a response to an ordinary command.
    pub fn command_default() -> Self {
        Self::new(5, Duration::from_millis(200))
    }

    /// Default for the SDK-mode handshake. The drone may still be
    /// powering up, so this is expected to run for several seconds.
    pub fn handshake_default() -> Self {
        Self::new(10, Duration::from_secs(1))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::command_default()
    }
}
