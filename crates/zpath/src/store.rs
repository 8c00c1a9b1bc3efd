// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Content-addressed implementation stores, and resolving an implementation
//! to its path on disk.

use std::path::{Component, Path, PathBuf};

use crate::selections::ImplementationRecord;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./store_test.rs"]
mod store_test;

/// Looks up unpacked implementations by digest.
pub trait ImplementationStore: Send + Sync {
    /// Path of the implementation with this digest, if it is present.
    fn lookup(&self, digest: &str) -> Option<PathBuf>;
}

/// Stores laid out as one directory per digest under each root.
#[derive(Debug, Clone, Default)]
pub struct DirectoryStore {
    roots: Vec<PathBuf>,
}

impl DirectoryStore {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl ImplementationStore for DirectoryStore {
    fn lookup(&self, digest: &str) -> Option<PathBuf> {
        if !is_entry_name(digest) {
            tracing::warn!(%digest, "ignoring digest that is not a plain directory name");
            return None;
        }
        // `alg=value` digests may be unpacked as `alg_value`.
        let alternate = digest.replacen('=', "_", 1);
        for root in &self.roots {
            for name in [digest, alternate.as_str()] {
                let candidate = root.join(name);
                if candidate.is_dir() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

/// Whether `name` is a single entry beneath a store root. Absolute paths,
/// `..` and nested paths would escape or bypass the root.
fn is_entry_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Absolute filesystem root of an implementation.
///
/// A local path wins over the store. Otherwise digests are tried in the
/// order the record lists them and the first store hit is used.
pub fn resolve_path(
    record: &ImplementationRecord,
    store: &dyn ImplementationStore,
) -> Result<PathBuf> {
    if let Some(local) = &record.local_path {
        return Ok(local.clone());
    }
    record
        .digests
        .iter()
        .find_map(|digest| store.lookup(digest))
        .ok_or_else(|| Error::NotFound {
            interface: record.interface.clone(),
            digests: record.digests.clone(),
        })
}

/// Whether the implementation is available without downloading anything.
pub fn is_present(record: &ImplementationRecord, store: &dyn ImplementationStore) -> bool {
    resolve_path(record, store).is_ok()
}
