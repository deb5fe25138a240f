// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Background listener tasks.
//!
//! Each task exclusively owns the receive side of one socket and races
//! the receive against a shared shutdown signal, so stopping the
//! driver never waits on a datagram that may not come. A bad receive
//! or an unparseable datagram is logged and the loop keeps going; UDP
//! loss is routine and must not kill a listener.

use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use tello_core::{parse_state, TelemetryRecord};

/// Larger than any response or state datagram the firmware emits.
pub(crate) const MAX_DATAGRAM: usize = 1024;

fn should_stop(changed: Result<(), watch::error::RecvError>, shutdown: &watch::Receiver<bool>) -> bool {
    // A dropped sender means the driver is gone; stop either way.
    changed.is_err() || *shutdown.borrow()
}

/// Drain the command socket into the response queue (FIFO).
pub(crate) async fn run_response_listener(
    socket: Arc<UdpSocket>,
    responses: mpsc::Sender<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if should_stop(changed, &shutdown) {
                    debug!("response listener stopped");
                    return;
                }
            }
            received = socket.recv_from(&mut buf) => {
                match received {
                    Ok((len, from)) => {
                        let text = String::from_utf8_lossy(&buf[..len]).trim_end().to_string();
                        debug!("response from {}: '{}'", from, text);
                        match responses.try_send(text) {
                            Ok(()) => {}
                            Err(TrySendError::Full(text)) => {
                                warn!("response queue full, dropping '{}'", text);
                            }
                            Err(TrySendError::Closed(_)) => {
                                debug!("response listener stopped (queue closed)");
                                return;
                            }
                        }
                    }
                    Err(e) => warn!("command socket receive failed: {}", e),
                }
            }
        }
    }
}

/// Drain the state socket into the shared telemetry snapshot.
///
/// A successfully parsed datagram replaces the snapshot in one
/// `send_replace`; readers see the old record or the new one, never a
/// mix. Malformed datagrams leave the snapshot untouched.
pub(crate) async fn run_state_listener(
    socket: Arc<UdpSocket>,
    state_tx: watch::Sender<TelemetryRecord>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if should_stop(changed, &shutdown) {
                    debug!("state listener stopped");
                    return;
                }
            }
            received = socket.recv_from(&mut buf) => {
                match received {
                    Ok((len, _)) => {
                        let raw = String::from_utf8_lossy(&buf[..len]);
                        match parse_state(&raw) {
                            Ok(record) => {
                                state_tx.send_replace(record);
                            }
                            Err(e) => debug!("discarding state datagram: {}", e),
                        }
                    }
                    Err(e) => warn!("state socket receive failed: {}", e),
                }
            }
        }
    }
}
