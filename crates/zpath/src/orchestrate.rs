// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! The resolve-then-diff transaction behind one `zpath` invocation.

use std::collections::HashSet;

use crate::capture::capture_output;
use crate::diff::{Report, diff};
use crate::executor::SelectionsExecutor;
use crate::mutate::{InsertionRequest, join_subpath, mutate};
use crate::selections::{ImplementationRecord, SelectionGraph};
use crate::services::{AliasResolver, Fetcher, Solver};
use crate::snapshot::{EnvMutation, EnvSnapshot, LiveEnvironment};
use crate::store::{ImplementationStore, is_present, resolve_path};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./orchestrate_test.rs"]
mod orchestrate_test;

/// Steps of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingFeed,
    ResolvingSelections,
    Downloading,
    SnapshottingBefore,
    ApplyingBindings,
    MutatingRequestedVar,
    SnapshottingAfter,
    ReportingDiff,
    Done,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ResolvingFeed => "resolving feed",
            Self::ResolvingSelections => "resolving selections",
            Self::Downloading => "downloading",
            Self::SnapshottingBefore => "snapshotting environment",
            Self::ApplyingBindings => "applying bindings",
            Self::MutatingRequestedVar => "mutating requested variable",
            Self::SnapshottingAfter => "snapshotting result",
            Self::ReportingDiff => "reporting changes",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// A feed URL, or an alias for one.
    pub feed: String,
    /// Variable to insert the root implementation into, if any.
    pub insertion: Option<InsertionRequest>,
}

impl Request {
    pub fn new<S: Into<String>>(feed: S) -> Self {
        Self {
            feed: feed.into(),
            insertion: None,
        }
    }

    pub fn with_insertion(mut self, insertion: InsertionRequest) -> Self {
        self.insertion = Some(insertion);
        self
    }
}

/// Whether `feed` names a URL rather than an alias.
pub fn is_url(feed: &str) -> bool {
    feed.contains("://")
}

/// Sequences the services of one run.
pub struct Orchestrator {
    aliases: Box<dyn AliasResolver>,
    solver: Box<dyn Solver>,
    fetcher: Box<dyn Fetcher>,
    executor: Box<dyn SelectionsExecutor>,
    store: Box<dyn ImplementationStore>,
}

impl Orchestrator {
    pub fn new(
        aliases: impl AliasResolver + 'static,
        solver: impl Solver + 'static,
        fetcher: impl Fetcher + 'static,
        executor: impl SelectionsExecutor + 'static,
        store: impl ImplementationStore + 'static,
    ) -> Self {
        Self {
            aliases: Box::new(aliases),
            solver: Box::new(solver),
            fetcher: Box::new(fetcher),
            executor: Box::new(executor),
            store: Box::new(store),
        }
    }

    /// Run the whole transaction against `baseline`.
    ///
    /// Nothing outside this call observes a partial run: the result is
    /// either the complete report or the first error.
    pub async fn run(&self, request: &Request, baseline: EnvSnapshot) -> Result<Report> {
        let mut stage = Stage::ResolvingFeed;
        let result = self.run_stages(request, baseline, &mut stage).await;
        if let Err(err) = &result {
            tracing::debug!(%stage, error = %err, "run failed");
            enter(&mut stage, Stage::Failed);
        }
        result
    }

    async fn run_stages(
        &self,
        request: &Request,
        baseline: EnvSnapshot,
        stage: &mut Stage,
    ) -> Result<Report> {
        let url = self.resolve_feed(&request.feed).await?;

        enter(stage, Stage::ResolvingSelections);
        let selections = self.solver.select(&url).await.map_err(|err| match err {
            err @ (Error::Resolution { .. } | Error::InvalidSelections { .. }) => err,
            err => Error::Resolution {
                url: url.clone(),
                reason: err.to_message(),
            },
        })?;
        tracing::debug!(count = selections.len(), "got selections");

        enter(stage, Stage::Downloading);
        self.download_missing(&url, &selections).await?;

        enter(stage, Stage::SnapshottingBefore);
        let before = baseline;
        let mut live = LiveEnvironment::new(&before);

        enter(stage, Stage::ApplyingBindings);
        let (result, captured) = capture_output(|out| {
            self.executor
                .apply(&selections, &before, self.store.as_ref(), out)
        });
        if !captured.is_empty() {
            tracing::debug!(output = %captured.trim_end(), "bindings output");
        }
        let mut bound = HashSet::new();
        for mutation in result? {
            bound.insert(mutation.name().to_string());
            live.apply(mutation);
        }

        let mut messages = Vec::new();
        if let Some(insertion) = &request.insertion {
            enter(stage, Stage::MutatingRequestedVar);
            let mutation = self.insert_root(&url, &selections, insertion, &before)?;
            if bound.contains(&insertion.variable) {
                messages.push(format!(
                    "{} set by the selections was overridden by --mode {}",
                    insertion.variable, insertion.mode
                ));
            }
            live.apply(mutation);
        }

        enter(stage, Stage::SnapshottingAfter);
        let after = live.snapshot();

        enter(stage, Stage::ReportingDiff);
        let report = Report {
            changes: diff(&before, &after),
            messages,
        };

        enter(stage, Stage::Done);
        Ok(report)
    }

    async fn resolve_feed(&self, feed: &str) -> Result<String> {
        if is_url(feed) {
            return Ok(feed.to_string());
        }
        let resolution_failed = |reason: String| Error::AliasResolution {
            alias: feed.to_string(),
            reason,
        };
        let url = self.aliases.resolve(feed).await.map_err(|err| match err {
            err @ Error::AliasResolution { .. } => err,
            err => resolution_failed(err.to_message()),
        })?;
        if url.is_empty() {
            return Err(resolution_failed("resolved to an empty URL".to_string()));
        }
        tracing::debug!(alias = %feed, %url, "resolved alias");
        Ok(url)
    }

    async fn download_missing(&self, url: &str, selections: &SelectionGraph) -> Result<()> {
        let missing: Vec<&ImplementationRecord> = selections
            .iter()
            .filter(|record| !is_present(record, self.store.as_ref()))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let download_failed = |err: Error| match err {
            err @ Error::Download { .. } => err,
            err => Error::Download {
                url: url.to_string(),
                reason: err.to_message(),
            },
        };
        let blocker = self
            .fetcher
            .download_missing(selections, &missing)
            .await
            .map_err(download_failed)?;
        if let Some(blocker) = blocker {
            tracing::info!(
                count = missing.len(),
                download = blocker.name(),
                "Waiting for selected implementations to be downloaded..."
            );
            blocker.wait().await.map_err(download_failed)?;
        }
        Ok(())
    }

    /// The mutation inserting the root implementation's path into the
    /// requested variable, computed against the baseline value.
    fn insert_root(
        &self,
        url: &str,
        selections: &SelectionGraph,
        insertion: &InsertionRequest,
        before: &EnvSnapshot,
    ) -> Result<EnvMutation> {
        let root = selections.get(url).ok_or_else(|| Error::NotFound {
            interface: url.to_string(),
            digests: Vec::new(),
        })?;
        let path = resolve_path(root, self.store.as_ref())?;
        let segment = join_subpath(&path, &insertion.subpath);
        let value = mutate(
            insertion.mode,
            before.get(&insertion.variable),
            &segment.to_string_lossy(),
        );
        tracing::debug!(
            variable = %insertion.variable,
            mode = %insertion.mode,
            %value,
            "inserting root"
        );
        Ok(EnvMutation::set(insertion.variable.as_str(), value))
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    tracing::debug!(from = %stage, to = %next, "stage");
    *stage = next;
}
