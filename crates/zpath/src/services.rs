// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Interfaces of the services a run depends on: alias resolution, solving
//! and downloading.

use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::Result;
use crate::selections::{ImplementationRecord, SelectionGraph};

/// Turns a short alias into a feed URL.
#[async_trait]
pub trait AliasResolver: Send + Sync {
    async fn resolve(&self, alias: &str) -> Result<String>;
}

/// Chooses an implementation for every interface a feed requires.
#[async_trait]
pub trait Solver: Send + Sync {
    async fn select(&self, url: &str) -> Result<SelectionGraph>;
}

/// Downloads implementations that are not yet in a store.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Start downloading `missing`.
    ///
    /// Returns a [`Blocker`] when the download continues in the background
    /// and must be waited on, or `None` if it already finished.
    async fn download_missing(
        &self,
        selections: &SelectionGraph,
        missing: &[&ImplementationRecord],
    ) -> Result<Option<Blocker>>;
}

/// Completion signal of work running outside the caller.
pub struct Blocker {
    name: String,
    future: BoxFuture<'static, Result<()>>,
}

impl Blocker {
    pub fn new<S, F>(name: S, future: F) -> Self
    where
        S: Into<String>,
        F: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            future: Box::pin(future),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait until the work signals completion. There is no timeout.
    pub async fn wait(self) -> Result<()> {
        self.future.await
    }
}

impl std::fmt::Debug for Blocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blocker").field("name", &self.name).finish()
    }
}
