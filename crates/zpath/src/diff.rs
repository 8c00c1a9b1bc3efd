// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Differences between two environment snapshots, and their rendering as
//! shell statements.

use std::collections::BTreeSet;

use crate::escape::{echo_line, export_line, unset_line};
use crate::snapshot::EnvSnapshot;

#[cfg(test)]
#[path = "./diff_test.rs"]
mod diff_test;

/// One variable whose value differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvChange {
    pub name: String,
    /// The new value, or `None` when the variable became unset.
    pub value: Option<String>,
}

impl EnvChange {
    /// The shell statement that applies this change.
    pub fn to_shell(&self) -> String {
        match &self.value {
            Some(value) => export_line(&self.name, value),
            None => unset_line(&self.name),
        }
    }
}

/// Every variable that differs between two snapshots, each listed once.
pub type EnvDiff = Vec<EnvChange>;

/// Compute the changes that turn `before` into `after`.
pub fn diff(before: &EnvSnapshot, after: &EnvSnapshot) -> EnvDiff {
    let names: BTreeSet<&str> = before.keys().chain(after.keys()).collect();
    names
        .into_iter()
        .filter_map(|name| {
            let new = after.get(name);
            if before.get(name) == new {
                return None;
            }
            Some(EnvChange {
                name: name.to_string(),
                value: new.map(String::from),
            })
        })
        .collect()
}

/// Whether `name` can appear on the left of a shell assignment.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|ch| ch == '_' || ch.is_ascii_alphanumeric())
}

/// The outcome of one run: environment changes plus messages for the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub changes: EnvDiff,
    pub messages: Vec<String>,
}

impl Report {
    pub fn new(changes: EnvDiff) -> Self {
        Self {
            changes,
            messages: Vec::new(),
        }
    }

    /// Render as lines suitable for `eval` in a POSIX shell.
    ///
    /// Variables whose names the shell cannot assign are left out.
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.changes.len() + self.messages.len());
        for change in &self.changes {
            if !is_valid_name(&change.name) {
                tracing::warn!(name = %change.name, "cannot export variable with this name");
                continue;
            }
            lines.push(change.to_shell());
        }
        lines.extend(self.messages.iter().map(|m| echo_line(m)));
        lines
    }
}
