// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Environment bindings declared by implementations in a selection document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mutate::{InsertMode, PATH_LIST_SEPARATOR, join_subpath, mutate_with_separator};
use crate::snapshot::{EnvMutation, LiveEnvironment};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./environment_test.rs"]
mod environment_test;

/// One environment operation of an implementation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum EnvOp {
    Comment(CommentEnv),
    Set(SetEnv),
    Prepend(PrependEnv),
    Append(AppendEnv),
}

/// A note for whoever reads the selections; has no effect.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CommentEnv {
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SetEnv {
    pub set: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PrependEnv {
    pub prepend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppendEnv {
    pub append: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

/// Resolve a binding's value: a literal `value`, or an `insert` path inside
/// the implementation. Exactly one of the two must be given.
fn resolve_source(
    interface: &str,
    value: Option<&str>,
    insert: Option<&str>,
    root: Option<&Path>,
) -> Result<String> {
    match (value, insert) {
        (Some(value), None) => Ok(value.to_string()),
        (None, Some(insert)) => {
            let root = root.ok_or_else(|| Error::InvalidBinding {
                interface: interface.to_string(),
                reason: format!("'insert: {insert}' needs an implementation path"),
            })?;
            Ok(join_subpath(root, insert).to_string_lossy().into_owned())
        }
        (Some(_), Some(_)) => Err(Error::InvalidBinding {
            interface: interface.to_string(),
            reason: "only one of 'value' or 'insert' may be given".to_string(),
        }),
        (None, None) => Err(Error::InvalidBinding {
            interface: interface.to_string(),
            reason: "one of 'value' or 'insert' is required".to_string(),
        }),
    }
}

impl EnvOp {
    /// Whether this operation refers to a path inside the implementation.
    pub fn needs_root(&self) -> bool {
        match self {
            Self::Comment(_) => false,
            Self::Set(op) => op.insert.is_some(),
            Self::Prepend(op) => op.insert.is_some(),
            Self::Append(op) => op.insert.is_some(),
        }
    }

    /// Compute the mutation this operation makes to `env`.
    ///
    /// `root` is the implementation path that `insert` values are joined
    /// onto. Comments produce no mutation.
    pub fn evaluate(
        &self,
        interface: &str,
        root: Option<&Path>,
        env: &LiveEnvironment,
    ) -> Result<Option<EnvMutation>> {
        let (name, mode, value, insert, separator) = match self {
            Self::Comment(_) => return Ok(None),
            Self::Set(op) => (&op.set, InsertMode::Replace, &op.value, &op.insert, None),
            Self::Prepend(op) => (
                &op.prepend,
                InsertMode::Prepend,
                &op.value,
                &op.insert,
                op.separator.as_deref(),
            ),
            Self::Append(op) => (
                &op.append,
                InsertMode::Append,
                &op.value,
                &op.insert,
                op.separator.as_deref(),
            ),
        };
        let segment = resolve_source(interface, value.as_deref(), insert.as_deref(), root)?;
        let value = mutate_with_separator(
            mode,
            env.get(name),
            &segment,
            separator.unwrap_or(PATH_LIST_SEPARATOR),
        );
        Ok(Some(EnvMutation::set(name.as_str(), value)))
    }
}
