// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::OsStr;

/// Return the subset of `names` that cannot be found, preserving order.
///
/// `search_path` overrides `$PATH` when given.
pub fn missing_tools<'a>(names: &[&'a str], search_path: Option<&OsStr>) -> Vec<&'a str> {
    names
        .iter()
        .copied()
        .filter(|name| match search_path {
            Some(paths) => which::which_in(name, Some(paths), ".").is_err(),
            None => which::which(name).is_err(),
        })
        .collect()
}
