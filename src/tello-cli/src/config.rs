// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration for tello-cli, loaded from the `[tello-cli]` section
//! of `tello-rs.toml`.

use serde::{Deserialize, Serialize};

use tello_app::ConfigFile;
use tello_driver::DriverConfig;

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Driver settings (ports, drone address, retry behavior)
    pub driver: DriverConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

impl ConfigFile for CliConfig {
    fn section_key() -> &'static str {
        "tello-cli"
    }
}

impl CliConfig {
    /// Example `tello-rs.toml` contents with all defaults spelled out.
    pub fn example_toml() -> String {
        let section = toml::Value::try_from(Self::default())
            .unwrap_or(toml::Value::Table(toml::Table::new()));
        let mut root = toml::Table::new();
        root.insert(Self::section_key().to_string(), section);
        toml::to_string_pretty(&root).unwrap_or_default()
    }
}
