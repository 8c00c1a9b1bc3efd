// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `zpath` command.

use std::path::PathBuf;

use clap::Args;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use zpath::{
    BindingExecutor, Config, EnvSnapshot, InsertMode, InsertionRequest, Orchestrator, Request,
    Result,
};

/// Resolve a feed and report the environment changes it needs
#[derive(Debug, Args)]
pub struct CmdPath {
    /// Config file to use instead of the default location
    #[clap(long, env = "ZPATH_CONFIG")]
    pub config: Option<PathBuf>,

    /// How to insert the implementation path into ENVVAR
    #[clap(long, default_value_t, value_parser = mode_parser())]
    pub mode: InsertMode,

    /// Subpath of the implementation to insert
    #[clap(short, long, default_value = "")]
    pub insert: String,

    /// Feed URL, or an alias for one
    pub feed: String,

    /// Environment variable to insert the implementation path into
    pub envvar: Option<String>,
}

/// Accepts exactly the names of [`InsertMode`], listing them in `--help`.
fn mode_parser() -> impl TypedValueParser<Value = InsertMode> {
    PossibleValuesParser::new(InsertMode::ALL.map(|mode| mode.as_str()))
        .try_map(|name| name.parse::<InsertMode>())
}

impl CmdPath {
    /// The shell statements to print on success.
    pub async fn run(&self) -> Result<Vec<String>> {
        let config = Config::load(self.config.as_deref())?;

        let mut request = Request::new(self.feed.as_str());
        if let Some(envvar) = &self.envvar {
            request = request.with_insertion(
                InsertionRequest::new(envvar.as_str())
                    .with_mode(self.mode)
                    .with_subpath(self.insert.as_str()),
            );
        }

        let orchestrator = Orchestrator::new(
            config.alias_resolver(),
            config.solver(),
            config.fetcher(),
            BindingExecutor,
            config.store(),
        );
        let report = orchestrator.run(&request, EnvSnapshot::capture()).await?;
        Ok(report.render())
    }
}
