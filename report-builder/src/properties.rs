// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolving property values by key.

use indexmap::IndexMap;
use std::{collections::BTreeMap, env, path::MAIN_SEPARATOR_STR};

/// Resolves the value of a report property from its key.
///
/// A missing value is not an error: the property is still written, without a value.
pub trait PropertyLookup {
    /// Returns the value for `key`, if there is one.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Looks up properties in the process environment.
///
/// An environment variable named exactly `key` wins. Otherwise a handful of platform keys are
/// answered from the running process:
///
/// | key | value |
/// |---|---|
/// | `os.name` | [`std::env::consts::OS`] |
/// | `os.arch` | [`std::env::consts::ARCH`] |
/// | `os.family` | [`std::env::consts::FAMILY`] |
/// | `user.dir` | the current directory |
/// | `file.separator` | the path component separator |
/// | `path.separator` | the `PATH` list separator |
/// | `line.separator` | the platform line ending |
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessLookup;

impl ProcessLookup {
    fn platform_value(key: &str) -> Option<String> {
        let value = match key {
            "os.name" => env::consts::OS,
            "os.arch" => env::consts::ARCH,
            "os.family" => env::consts::FAMILY,
            "user.dir" => {
                return env::current_dir()
                    .ok()
                    .map(|dir| dir.to_string_lossy().into_owned());
            }
            "file.separator" => MAIN_SEPARATOR_STR,
            "path.separator" => {
                if cfg!(windows) {
                    ";"
                } else {
                    ":"
                }
            }
            "line.separator" => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
            _ => return None,
        };
        Some(value.to_owned())
    }
}

impl PropertyLookup for ProcessLookup {
    fn lookup(&self, key: &str) -> Option<String> {
        env::var(key).ok().or_else(|| Self::platform_value(key))
    }
}

impl PropertyLookup for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl PropertyLookup for IndexMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: PropertyLookup + ?Sized> PropertyLookup for &T {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

impl<T: PropertyLookup + ?Sized> PropertyLookup for Box<T> {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}
