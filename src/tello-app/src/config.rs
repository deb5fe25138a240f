// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support.
//!
//! Each binary loads its own section of `tello-rs.toml`. Search
//! order: explicit `--config` path, then `./tello-rs.toml`, then
//! `~/.config/tello-rs/tello-rs.toml`, then
//! `/etc/tello-rs/tello-rs.toml`.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, String),
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("tello-rs.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("tello-rs").join("tello-rs.toml"));
    }
    paths.push(PathBuf::from("/etc/tello-rs/tello-rs.toml"));
    paths
}

/// Read `path` and deserialize its `[key]` section, or `None` when the
/// section is absent.
fn read_section<T: DeserializeOwned>(path: &Path, key: &str) -> Result<Option<T>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Read(path.to_path_buf(), e.to_string()))?;

    let table: toml::Table = toml::from_str(&content)
        .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;

    match table.get(key) {
        None => Ok(None),
        Some(section) => section
            .clone()
            .try_into::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string())),
    }
}

/// A `tello-rs.toml` section a binary can load itself from.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    /// Section key in `tello-rs.toml` (e.g. `"tello-cli"`).
    fn section_key() -> &'static str;

    /// Load the configuration, preferring `path` when given.
    ///
    /// With an explicit path the file must exist and carry the
    /// expected `[<section_key>]` header. Otherwise the default
    /// search paths are probed in order and the first file containing
    /// the section wins; when none does, defaults are returned.
    /// The second tuple element is the path actually used.
    fn load(path: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = path {
            let cfg = read_section::<Self>(path, Self::section_key())?.ok_or_else(|| {
                ConfigError::Parse(
                    path.to_path_buf(),
                    format!("missing [{}] section", Self::section_key()),
                )
            })?;
            return Ok((cfg, Some(path.to_path_buf())));
        }

        for path in search_paths() {
            if !path.exists() {
                continue;
            }
            if let Some(cfg) = read_section::<Self>(&path, Self::section_key())? {
                return Ok((cfg, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }
}
