// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! UDP driver for the DJI Ryze Tello.
//!
//! [`Tello::bind`] opens the command and state channels and spawns the
//! background listeners; [`Tello::handshake`] puts the drone into SDK
//! mode; after that commands go through [`Tello::send_command`] /
//! [`Tello::send_command_await_response`] and telemetry is read from
//! [`Tello::state`].

pub mod config;
pub mod driver;
pub mod error;
mod listener;

pub use config::DriverConfig;
pub use driver::{DroneInfo, Tello};
pub use error::DriverError;
pub use tello_core::{CommandResponse, RetryPolicy, TelemetryRecord, TelemetryValue};
