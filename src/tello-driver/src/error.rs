// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

/// Driver error taxonomy.
///
/// `Bind` and `Resolve` are fatal at startup and never retried.
/// `Send` and `CommandTimeout` are per-call; the caller decides what
/// to do. `Handshake` means the retry budget ran out with the drone
/// never answering, which callers should treat as "device
/// unreachable" — distinct from a steady-state `CommandTimeout`,
/// which is usually a transient loss.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to bind {channel} socket to local port {port}: {source}")]
    Bind {
        channel: &'static str,
        port: u16,
        source: std::io::Error,
    },

    #[error("failed to resolve drone address {addr}: {reason}")]
    Resolve { addr: String, reason: String },

    #[error("command send failed: {0}")]
    Send(std::io::Error),

    #[error("no response to '{command}' after {attempts} attempts")]
    CommandTimeout { command: String, attempts: u32 },

    #[error("handshake got no answer after {attempts} attempts; drone unreachable")]
    Handshake { attempts: u32 },

    #[error("driver is shut down")]
    Closed,
}
