// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! User configuration: which commands provide the external services, and
//! where implementation stores live.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command::{CommandAliasResolver, CommandFetcher, CommandSolver};
use crate::store::DirectoryStore;
use crate::{CONFIG_FILENAME, Error, Result};

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Command resolving an alias to a feed URL; the alias is appended.
    pub alias_command: Vec<String>,

    /// Command printing a selection document; the feed URL is appended.
    pub solver_command: Vec<String>,

    /// Command downloading a feed's missing implementations; the feed URL
    /// is appended.
    pub fetch_command: Vec<String>,

    /// Implementation store roots, searched in order.
    pub stores: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alias_command: argv(&["0alias", "-r"]),
            solver_command: argv(&["0launch", "--get-selections"]),
            fetch_command: argv(&["0launch", "--download-only"]),
            stores: default_stores(),
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn default_stores() -> Vec<PathBuf> {
    dirs::cache_dir()
        .map(|cache| cache.join("0install.net").join("implementations"))
        .into_iter()
        .collect()
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zpath").join(CONFIG_FILENAME))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if a file is there, and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => {
                    tracing::debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        let yaml = std::fs::read_to_string(&path).map_err(|error| Error::ReadFailed {
            path: path.clone(),
            error,
        })?;
        tracing::debug!(path = %path.display(), "loading config");
        Self::from_yaml(&yaml).map_err(|error| Error::InvalidYaml { path, error })
    }

    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty file is a valid, empty config.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    pub fn alias_resolver(&self) -> CommandAliasResolver {
        CommandAliasResolver {
            command: self.alias_command.clone(),
        }
    }

    pub fn solver(&self) -> CommandSolver {
        CommandSolver {
            command: self.solver_command.clone(),
        }
    }

    pub fn fetcher(&self) -> CommandFetcher {
        CommandFetcher {
            command: self.fetch_command.clone(),
        }
    }

    pub fn store(&self) -> DirectoryStore {
        DirectoryStore::new(self.stores.iter().cloned())
    }
}
