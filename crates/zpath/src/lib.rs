// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! zpath - environment synthesis for resolved feeds
//!
//! This crate resolves a feed (or an alias for one) into a set of downloaded
//! implementations and computes the environment changes needed to use them
//! from a calling shell.
//!
//! # Overview
//!
//! A run is a single transaction: resolve the feed, get its selections,
//! download anything missing, apply the selections' own environment bindings,
//! optionally insert the root implementation's path into a requested
//! variable, and report every variable that changed as a shell statement.
//!
//! ```sh
//! eval "$(zpath --insert bin https://example.com/tool.xml PATH)"
//! ```
//!
//! Selection documents are YAML (or JSON):
//!
//! ```yaml
//! api: zpath/v0
//! interface: https://example.com/tool.xml
//! selections:
//!   - interface: https://example.com/tool.xml
//!     version: "1.2"
//!     digests:
//!       - sha256new_RPUJPVVHEWJ673N736OCN7EMESYAEYM2UAY6OJ4MDFGUZ7QACLKA
//!     environment:
//!       - prepend: PATH
//!         insert: bin
//! ```

pub mod capture;
pub mod command;
pub mod config;
pub mod diff;
pub mod environment;
pub mod error;
pub mod escape;
pub mod executor;
pub mod mutate;
pub mod orchestrate;
pub mod selections;
pub mod services;
pub mod snapshot;
pub mod store;

pub use capture::capture_output;
pub use command::{CommandAliasResolver, CommandFetcher, CommandSolver};
pub use config::Config;
pub use diff::{EnvChange, EnvDiff, Report, diff};
pub use environment::EnvOp;
pub use error::{Error, Result};
pub use escape::{echo_line, escape, export_line, unset_line};
pub use executor::{BindingExecutor, SelectionsExecutor};
pub use mutate::{InsertMode, InsertionRequest, PATH_LIST_SEPARATOR, join_subpath, mutate};
pub use orchestrate::{Orchestrator, Request, Stage, is_url};
pub use selections::{ApiVersion, ImplementationRecord, SelectionGraph};
pub use services::{AliasResolver, Blocker, Fetcher, Solver};
pub use snapshot::{EnvMutation, EnvSnapshot, LiveEnvironment};
pub use store::{DirectoryStore, ImplementationStore, is_present, resolve_path};

/// Well-known filename of the user configuration.
pub const CONFIG_FILENAME: &str = "config.yaml";
