// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! Scoped capture of diagnostic output that must not reach stdout.

use std::io::Write;

#[cfg(test)]
#[path = "./capture_test.rs"]
mod capture_test;

/// Run `f` with a writer that collects everything written to it.
///
/// The captured text is returned alongside the result of `f`, whether or not
/// `f` succeeded. Invalid UTF-8 is replaced rather than dropped.
pub fn capture_output<T, F>(f: F) -> (T, String)
where
    F: FnOnce(&mut dyn Write) -> T,
{
    let mut buffer = Vec::new();
    let result = f(&mut buffer);
    let text = String::from_utf8_lossy(&buffer).into_owned();
    (result, text)
}
