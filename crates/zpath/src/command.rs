// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Services backed by external commands.

use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::selections::{ImplementationRecord, SelectionGraph};
use crate::services::{AliasResolver, Blocker, Fetcher, Solver};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./command_test.rs"]
mod command_test;

/// Build a command from `argv` followed by one extra argument.
///
/// Stdin is closed and both output streams are piped so that nothing the
/// child prints reaches our stdout.
fn build_command(argv: &[String], arg: &str) -> Result<Command> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::Usage("configured command is empty".to_string()))?;
    let mut cmd = Command::new(program);
    cmd.args(args)
        .arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    Ok(cmd)
}

fn describe(argv: &[String], arg: &str) -> String {
    let mut parts: Vec<&str> = argv.iter().map(String::as_str).collect();
    parts.push(arg);
    parts.join(" ")
}

fn spawn_failed(command: String, error: std::io::Error) -> Error {
    Error::CommandFailed {
        command,
        code: None,
        stderr: error.to_string(),
    }
}

/// Turn a finished child into its stdout, or an error if it failed.
fn check_output(command: String, output: Output) -> Result<String> {
    if !output.status.success() {
        return Err(Error::CommandFailed {
            command,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run `argv arg` to completion and return its stdout.
async fn run_command(argv: &[String], arg: &str) -> Result<String> {
    let description = describe(argv, arg);
    tracing::debug!(command = %description, "running");
    let output = build_command(argv, arg)?
        .output()
        .await
        .map_err(|e| spawn_failed(description.clone(), e))?;
    check_output(description, output)
}

/// Resolves aliases by running `<command> ALIAS` and reading the URL from
/// its stdout.
#[derive(Debug, Clone)]
pub struct CommandAliasResolver {
    pub command: Vec<String>,
}

#[async_trait]
impl AliasResolver for CommandAliasResolver {
    async fn resolve(&self, alias: &str) -> Result<String> {
        let stdout = run_command(&self.command, alias).await?;
        Ok(stdout.trim().to_string())
    }
}

/// Gets selections by running `<command> URL`, which must print a selection
/// document.
#[derive(Debug, Clone)]
pub struct CommandSolver {
    pub command: Vec<String>,
}

#[async_trait]
impl Solver for CommandSolver {
    async fn select(&self, url: &str) -> Result<SelectionGraph> {
        let stdout = run_command(&self.command, url).await?;
        SelectionGraph::from_yaml(stdout)
    }
}

/// Downloads missing implementations by running `<command> URL` for the
/// feed the selections were made for.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    pub command: Vec<String>,
}

#[async_trait]
impl Fetcher for CommandFetcher {
    async fn download_missing(
        &self,
        selections: &SelectionGraph,
        missing: &[&ImplementationRecord],
    ) -> Result<Option<Blocker>> {
        if missing.is_empty() {
            return Ok(None);
        }
        for record in missing {
            tracing::info!(interface = %record.interface, "missing implementation");
        }

        let description = describe(&self.command, &selections.interface);
        let child = build_command(&self.command, &selections.interface)?
            .spawn()
            .map_err(|e| spawn_failed(description.clone(), e))?;

        let name = description.clone();
        Ok(Some(Blocker::new(name, async move {
            let output = child
                .wait_with_output()
                .await
                .map_err(|e| spawn_failed(description.clone(), e))?;
            check_output(description, output).map(|_| ())
        })))
    }
}
