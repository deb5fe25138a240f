// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Command response classification.

use serde::Serialize;

/// One response datagram from the drone, trailing whitespace trimmed.
///
/// The wire protocol carries free text: `ok` on success, an error
/// message or error code otherwise. Whatever arrived is delivered to
/// the caller verbatim (after trimming); classification is advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    text: String,
}

impl CommandResponse {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed_len = text.trim_end().len();
        let mut text = text;
        text.truncate(trimmed_len);
        Self { text }
    }

    /// The literal response text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Whether the drone accepted the command.
    ///
    /// Success iff the trimmed text case-insensitively contains `ok`.
    /// A datagram that was only whitespace trims to empty and is a
    /// failure, not a valid acknowledgement.
    pub fn is_ok(&self) -> bool {
        !self.text.is_empty() && self.text.to_ascii_lowercase().contains("ok")
    }
}

impl std::fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_is_case_insensitive() {
        assert!(CommandResponse::new("ok").is_ok());
        assert!(CommandResponse::new("OK\r\n").is_ok());
        assert!(CommandResponse::new("Ok").is_ok());
    }

    #[test]
    fn error_text_is_failure_but_preserved() {
        let response = CommandResponse::new("error Motor stop\r\n");
        assert!(!response.is_ok());
        assert_eq!(response.as_str(), "error Motor stop");
    }

    #[test]
    fn whitespace_only_is_failure() {
        let response = CommandResponse::new(" \r\n");
        assert!(!response.is_ok());
        assert_eq!(response.as_str(), "");
    }

    #[test]
    fn numeric_answer_is_not_ok_but_delivered() {
        let response = CommandResponse::new("86\r\n");
        assert!(!response.is_ok());
        assert_eq!(response.as_str(), "86");
    }
}
