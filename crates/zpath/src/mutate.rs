// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Combining a new path segment with an existing variable value.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

#[cfg(test)]
#[path = "./mutate_test.rs"]
mod mutate_test;

/// Separator between entries of path-list variables such as `PATH`.
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: &str = ";";
/// Separator between entries of path-list variables such as `PATH`.
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: &str = ":";

/// How a new segment is inserted into an environment variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMode {
    #[default]
    Prepend,
    Append,
    Replace,
}

impl InsertMode {
    pub const ALL: [InsertMode; 3] = [Self::Prepend, Self::Append, Self::Replace];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prepend => "prepend",
            Self::Append => "append",
            Self::Replace => "replace",
        }
    }
}

impl std::fmt::Display for InsertMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsertMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                Error::Usage(format!(
                    "invalid mode '{s}' (expected one of: prepend, append, replace)"
                ))
            })
    }
}

/// Compute the new value of a variable using the platform separator.
///
/// An unset variable (`existing == None`) always takes `segment` as its
/// whole value, whatever the requested mode.
pub fn mutate(mode: InsertMode, existing: Option<&str>, segment: &str) -> String {
    mutate_with_separator(mode, existing, segment, PATH_LIST_SEPARATOR)
}

/// Like [`mutate`], with an explicit list separator.
pub fn mutate_with_separator(
    mode: InsertMode,
    existing: Option<&str>,
    segment: &str,
    separator: &str,
) -> String {
    let Some(existing) = existing else {
        return segment.to_string();
    };
    match mode {
        InsertMode::Replace => segment.to_string(),
        InsertMode::Prepend => format!("{segment}{separator}{existing}"),
        InsertMode::Append => format!("{existing}{separator}{segment}"),
    }
}

/// Join `subpath` beneath `root`.
///
/// An empty subpath yields `root` unchanged. Leading separators on the
/// subpath are ignored so that it can never replace the root.
pub fn join_subpath(root: &Path, subpath: &str) -> PathBuf {
    let relative = subpath.trim_start_matches(['/', std::path::MAIN_SEPARATOR]);
    if relative.is_empty() {
        return root.to_path_buf();
    }
    root.join(relative)
}

/// A user's request to insert an implementation path into a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionRequest {
    pub variable: String,
    pub mode: InsertMode,
    pub subpath: String,
}

impl InsertionRequest {
    pub fn new<S: Into<String>>(variable: S) -> Self {
        Self {
            variable: variable.into(),
            mode: InsertMode::default(),
            subpath: String::new(),
        }
    }

    pub fn with_mode(mut self, mode: InsertMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_subpath<S: Into<String>>(mut self, subpath: S) -> Self {
        self.subpath = subpath.into();
        self
    }
}
