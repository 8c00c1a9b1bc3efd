// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Environment snapshots and the live working environment of a run.

use std::collections::BTreeMap;

#[cfg(test)]
#[path = "./snapshot_test.rs"]
mod snapshot_test;

/// An immutable capture of environment variables at one point in time.
///
/// An absent variable and a variable set to the empty string are distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the environment of the current process.
    ///
    /// Entries whose name or value is not valid unicode cannot be reproduced
    /// in `export` statements and are left out.
    pub fn capture() -> Self {
        let mut vars = BTreeMap::new();
        for (name, value) in std::env::vars_os() {
            match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => {
                    vars.insert(name, value);
                }
                (name, _) => {
                    tracing::warn!(?name, "skipping non-unicode environment variable");
                }
            }
        }
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A single change to the live environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvMutation {
    Set { name: String, value: String },
    Unset { name: String },
}

impl EnvMutation {
    pub fn set<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self::Set {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn unset<N: Into<String>>(name: N) -> Self {
        Self::Unset { name: name.into() }
    }

    /// Name of the variable this mutation touches.
    pub fn name(&self) -> &str {
        match self {
            Self::Set { name, .. } | Self::Unset { name } => name,
        }
    }
}

/// The working environment of one run.
///
/// Seeded from a snapshot and changed only through [`LiveEnvironment::apply`],
/// so that every write can be observed by a later [`LiveEnvironment::snapshot`].
/// The process environment itself is never modified.
#[derive(Debug, Clone, Default)]
pub struct LiveEnvironment {
    vars: BTreeMap<String, String>,
}

impl LiveEnvironment {
    pub fn new(baseline: &EnvSnapshot) -> Self {
        Self {
            vars: baseline.vars.clone(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn apply(&mut self, mutation: EnvMutation) {
        match mutation {
            EnvMutation::Set { name, value } => {
                tracing::trace!(%name, %value, "set");
                self.vars.insert(name, value);
            }
            EnvMutation::Unset { name } => {
                tracing::trace!(%name, "unset");
                self.vars.remove(&name);
            }
        }
    }

    pub fn snapshot(&self) -> EnvSnapshot {
        EnvSnapshot {
            vars: self.vars.clone(),
        }
    }
}
