// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Dry-run execution of the environment bindings in a selection graph.

use std::io::Write;

use crate::Result;
use crate::environment::EnvOp;
use crate::selections::SelectionGraph;
use crate::snapshot::{EnvMutation, EnvSnapshot, LiveEnvironment};
use crate::store::{ImplementationStore, resolve_path};

#[cfg(test)]
#[path = "./executor_test.rs"]
mod executor_test;

/// Computes the environment a set of selections would run with, without
/// launching anything.
pub trait SelectionsExecutor: Send + Sync {
    /// Return the mutations that turn `baseline` into the selections' run
    /// environment, in the order they apply. Diagnostic output goes to `out`.
    fn apply(
        &self,
        selections: &SelectionGraph,
        baseline: &EnvSnapshot,
        store: &dyn ImplementationStore,
        out: &mut dyn Write,
    ) -> Result<Vec<EnvMutation>>;
}

/// Applies the `environment` bindings of each implementation in document
/// order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingExecutor;

impl SelectionsExecutor for BindingExecutor {
    fn apply(
        &self,
        selections: &SelectionGraph,
        baseline: &EnvSnapshot,
        store: &dyn ImplementationStore,
        out: &mut dyn Write,
    ) -> Result<Vec<EnvMutation>> {
        let mut scratch = LiveEnvironment::new(baseline);
        let mut mutations = Vec::new();

        for record in selections.iter() {
            if record.environment.is_empty() {
                continue;
            }
            let root = if record.environment.iter().any(|op| op.needs_root()) {
                Some(resolve_path(record, store)?)
            } else {
                None
            };

            writeln!(out, "[{}]", record.interface)?;
            for op in &record.environment {
                if let EnvOp::Comment(comment) = op {
                    writeln!(out, "# {}", comment.comment)?;
                }
                let Some(mutation) = op.evaluate(&record.interface, root.as_deref(), &scratch)?
                else {
                    continue;
                };
                if let EnvMutation::Set { name, value } = &mutation {
                    writeln!(out, "{name}={value}")?;
                }
                scratch.apply(mutation.clone());
                mutations.push(mutation);
            }
        }

        Ok(mutations)
    }
}
