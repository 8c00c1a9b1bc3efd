// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

//! POSIX shell quoting for the statements zpath prints.

#[cfg(test)]
#[path = "./escape_test.rs"]
mod escape_test;

/// Quote `value` so that a POSIX shell parses it back as exactly `value`.
///
/// Values made only of characters with no special meaning to the shell are
/// returned bare; everything else is single-quoted, with embedded single
/// quotes written as `'"'"'`.
pub fn escape(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_shell_safe) {
        return value.to_string();
    }
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\"'\"'");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

fn is_shell_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(ch, '-' | '_' | '.' | '/' | ':' | ',' | '+' | '=' | '@' | '%')
}

/// `export NAME=VALUE`
pub fn export_line(name: &str, value: &str) -> String {
    format!("export {name}={}", escape(value))
}

/// `unset NAME`
pub fn unset_line(name: &str) -> String {
    format!("unset {name}")
}

/// `echo MESSAGE`, always on one line.
///
/// Multi-line messages are folded into one, joined by `; `. Shells disagree
/// on what `echo` does with backslashes and leading options (dash expands
/// `\n`, and takes a bare `-n` as a flag), so backslashes become `/` and a
/// leading `-` is padded with a space.
pub fn echo_line(message: &str) -> String {
    let mut text = single_line(message).replace('\\', "/");
    if text.starts_with('-') {
        text.insert(0, ' ');
    }
    format!("echo {}", escape(&text))
}

fn single_line(message: &str) -> String {
    if !message.contains('\n') {
        return message.to_string();
    }
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}
