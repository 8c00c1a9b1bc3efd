// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! zpath - print shell environment changes for a resolved feed
//!
//! Everything written to stdout is meant to be `eval`ed by the calling
//! shell, so help text and errors are printed as `echo` statements too.

use clap::error::ErrorKind;
use clap::Parser;

mod cmd_path;

use cmd_path::CmdPath;

#[derive(Parser)]
#[clap(
    name = "zpath",
    about = "Insert a resolved feed's implementation path into an environment variable",
    version,
    long_about = "Resolve a feed (or an alias for one), download its implementations and \
                  print the environment changes as shell statements.\n\n\
                  Usage from a shell: eval \"$(zpath --insert bin FEED PATH)\""
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(flatten)]
    cmd: CmdPath,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long)]
    quiet: bool,
}

impl Opt {
    async fn run(self) -> i32 {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        match self.cmd.run().await {
            Ok(lines) => {
                for line in lines {
                    println!("{line}");
                }
                0
            }
            Err(err) => {
                println!("{}", zpath::echo_line(&err.to_message()));
                tracing::debug!("{:?}", miette::Report::new(err));
                1
            }
        }
    }
}

/// Turn a clap parse failure into shell statements and an exit code.
fn parse_failure(err: clap::Error) -> i32 {
    let text = err.render().to_string();
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            for line in text.trim_end().lines() {
                println!("{}", zpath::echo_line(line));
            }
            0
        }
        _ => {
            // One line, however many the rendered error spans.
            println!("{}", zpath::echo_line(&text));
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let code = match Opt::try_parse() {
        Ok(opt) => opt.run().await,
        Err(err) => parse_failure(err),
    };
    std::process::exit(code);
}
