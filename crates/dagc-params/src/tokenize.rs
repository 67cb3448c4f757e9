// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shell-like tokenizing for parameter strings.

/// Split `raw` into shell-quoted tokens.
///
/// # Errors
/// A message describing the unbalanced quote, if any.
pub fn tokenize(raw: &str) -> Result<Vec<String>, String> {
    shlex::split(raw).ok_or_else(|| format!("unbalanced quotes in '{raw}'"))
}
