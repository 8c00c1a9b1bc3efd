// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Selection documents: the resolved implementation of every interface a feed
//! needs.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::environment::EnvOp;

#[cfg(test)]
#[path = "./selections_test.rs"]
mod selections_test;

/// API version for selection documents.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "zpath/v0")]
    V0,
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ApiVersion,
}

/// One resolved implementation of an interface.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ImplementationRecord {
    /// URL of the interface this implementation was selected for.
    pub interface: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Development override that bypasses the implementation store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,

    /// Content digests identifying the implementation in a store, in
    /// preference order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub digests: Vec<String>,

    /// Environment bindings applied when the selections are run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvOp>,
}

impl ImplementationRecord {
    pub fn new<S: Into<String>>(interface: S) -> Self {
        Self {
            interface: interface.into(),
            ..Default::default()
        }
    }
}

/// On-disk shape of a selection document.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct SelectionDocument {
    #[serde(default)]
    api: ApiVersion,
    interface: String,
    #[serde(default)]
    selections: Vec<ImplementationRecord>,
}

/// The implementation chosen for every interface required by a feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "SelectionDocument", into = "SelectionDocument")]
pub struct SelectionGraph {
    /// URL of the feed these selections were made for.
    pub interface: String,
    selections: IndexMap<String, ImplementationRecord>,
}

impl TryFrom<SelectionDocument> for SelectionGraph {
    type Error = String;

    fn try_from(doc: SelectionDocument) -> Result<Self, Self::Error> {
        let mut selections = IndexMap::with_capacity(doc.selections.len());
        for record in doc.selections {
            if selections.contains_key(&record.interface) {
                return Err(format!(
                    "interface {} is selected more than once",
                    record.interface
                ));
            }
            selections.insert(record.interface.clone(), record);
        }
        Ok(Self {
            interface: doc.interface,
            selections,
        })
    }
}

impl From<SelectionGraph> for SelectionDocument {
    fn from(graph: SelectionGraph) -> Self {
        Self {
            api: ApiVersion::V0,
            interface: graph.interface,
            selections: graph.selections.into_values().collect(),
        }
    }
}

impl SelectionGraph {
    /// Build a graph from records; later records replace earlier ones for the
    /// same interface.
    pub fn new<S, I>(interface: S, records: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = ImplementationRecord>,
    {
        Self {
            interface: interface.into(),
            selections: records
                .into_iter()
                .map(|r| (r.interface.clone(), r))
                .collect(),
        }
    }

    /// Parse a selection document from YAML (or JSON).
    pub fn from_yaml<S: Into<String>>(yaml: S) -> crate::Result<Self> {
        let yaml = yaml.into();
        let invalid = |error| crate::Error::InvalidSelections {
            error,
            document: yaml.clone(),
        };

        // Stage 1: Parse to get API version
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).map_err(invalid)?;
        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(invalid)?;

        // Stage 2: Deserialize based on version
        match with_version.api {
            ApiVersion::V0 => serde_yaml::from_value(value).map_err(invalid),
        }
    }

    pub fn get(&self, interface: &str) -> Option<&ImplementationRecord> {
        self.selections.get(interface)
    }

    /// Implementations in document order.
    pub fn iter(&self) -> impl Iterator<Item = &ImplementationRecord> {
        self.selections.values()
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}
