// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod policy;
pub mod response;
pub mod telemetry;

pub use policy::RetryPolicy;
pub use response::CommandResponse;
pub use telemetry::{parse_state, ParseError, TelemetryRecord, TelemetryValue};
