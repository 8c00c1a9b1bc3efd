// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for zpath operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[cfg(test)]
#[path = "./error_test.rs"]
mod error_test;

/// Convenience Result type with zpath Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a feed and synthesizing its environment.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Bad or missing arguments
    #[error("{0}")]
    #[diagnostic(code(zpath::usage), help("Run 'zpath --help' for usage"))]
    Usage(String),

    /// Alias could not be turned into a feed URL
    #[error("Failed to resolve alias '{alias}': {reason}")]
    #[diagnostic(
        code(zpath::alias_resolution),
        help("Pass a full feed URL, or check that the alias is registered")
    )]
    AliasResolution { alias: String, reason: String },

    /// Feed could not be resolved to a selection graph
    #[error("Failed to get selections for {url}: {reason}")]
    #[diagnostic(code(zpath::resolution))]
    Resolution { url: String, reason: String },

    /// Solver output was not a valid selection document
    #[error("Invalid selection document: {error}")]
    #[diagnostic(
        code(zpath::invalid_selections),
        help("Selection documents need 'api: zpath/v0', an 'interface' and 'selections'")
    )]
    InvalidSelections {
        #[source]
        error: serde_yaml::Error,
        document: String,
    },

    /// Required implementations could not be downloaded
    #[error("Failed to download implementations for {url}: {reason}")]
    #[diagnostic(code(zpath::download))]
    Download { url: String, reason: String },

    /// No filesystem path could be determined for an implementation
    #[error("No implementation path found for {interface} (digests: {})", .digests.join(", "))]
    #[diagnostic(
        code(zpath::not_found),
        help("The implementation has no local path and none of its digests are in a store")
    )]
    NotFound {
        interface: String,
        digests: Vec<String>,
    },

    /// Selection binding is malformed
    #[error("Invalid environment binding for {interface}: {reason}")]
    #[diagnostic(code(zpath::invalid_binding))]
    InvalidBinding { interface: String, reason: String },

    /// External command exited unsuccessfully
    #[error("Command failed with {}: {command}{}", exit_description(.code), stderr_suffix(.stderr))]
    #[diagnostic(code(zpath::command_failed))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(zpath::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Invalid YAML in config file
    #[error("Invalid config file {path:?}: {error}")]
    #[diagnostic(code(zpath::invalid_yaml), help("Check YAML syntax of the config file"))]
    InvalidYaml {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(zpath::io_error))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Render this error and its chain of sources as a single line.
    pub fn to_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            let text = err.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = err.source();
        }
        message
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

/// Messages stay on one line so a failure renders as a single `echo`.
fn stderr_suffix(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        String::new()
    } else {
        format!(": {}", lines.join("; "))
    }
}
