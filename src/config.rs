//! Filter configuration
//!
//! Three independent sources feed the registry:
//! - `PFLOG_FILTER`: names applied to both stdout and stderr
//! - `PFLOG_STDOUT_FILTER`: names applied to stdout only
//! - `PFLOG_STDERR_FILTER`: names applied to stderr only
//!
//! Each value is a `:` separated list of program short names.

use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;

use crate::filter::{FilterRegistry, Result, StreamKind, FILTER_DELIMITER};

/// Combined source, applied to both streams
pub const FILTER_ENV_VAR: &str = "PFLOG_FILTER";

/// Stdout-only source
pub const FILTER_STDOUT_ENV_VAR: &str = "PFLOG_STDOUT_FILTER";

/// Stderr-only source
pub const FILTER_STDERR_ENV_VAR: &str = "PFLOG_STDERR_FILTER";

/// Diagnostic verbosity of the preloaded library (EnvFilter syntax)
pub const LOG_ENV_VAR: &str = "PFLOG_LOG";

/// Iterator over the names of one configuration value
///
/// Yields the byte slices between `:` delimiters. The first empty token
/// ends the iteration, so `"a::b"` yields only `a` and a trailing
/// delimiter yields nothing extra.
#[derive(Debug, Clone)]
pub struct FilterTokens<'a> {
    rest: Option<&'a [u8]>,
}

impl<'a> FilterTokens<'a> {
    pub fn new(value: &'a [u8]) -> Self {
        Self { rest: Some(value) }
    }
}

impl<'a> Iterator for FilterTokens<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest?;
        let (token, remainder) = match rest.iter().position(|&b| b == FILTER_DELIMITER) {
            Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
            None => (rest, None),
        };

        if token.is_empty() {
            self.rest = None;
            return None;
        }

        self.rest = remainder;
        Some(token)
    }
}

/// Append every name of `value` to both lists
///
/// Stops at the first rejected name. Names accepted before it stay
/// registered. Returns how many names were appended.
pub fn parse_combined(registry: &mut FilterRegistry, value: &[u8]) -> Result<usize> {
    let mut appended = 0;
    for token in FilterTokens::new(value) {
        registry.append_both(token)?;
        appended += 1;
    }
    Ok(appended)
}

/// Append every name of `value` to the list for `stream`
///
/// Same truncation rules as [`parse_combined`].
pub fn parse_single(
    registry: &mut FilterRegistry,
    stream: StreamKind,
    value: &[u8],
) -> Result<usize> {
    let mut appended = 0;
    for token in FilterTokens::new(value) {
        registry.append(stream, token)?;
        appended += 1;
    }
    Ok(appended)
}

/// Raw values of the three configuration sources
///
/// A `None` source is skipped entirely. Values are kept as bytes so that
/// non-UTF-8 program names still compare exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    pub combined: Option<Vec<u8>>,
    pub stdout: Option<Vec<u8>>,
    pub stderr: Option<Vec<u8>>,
}

impl FilterConfig {
    /// Read the sources from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Read the sources through an arbitrary lookup (e.g. a map in tests)
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<OsString>,
    {
        let mut read = |key: &str| lookup(key).map(OsStringExt::into_vec);
        Self {
            combined: read(FILTER_ENV_VAR),
            stdout: read(FILTER_STDOUT_ENV_VAR),
            stderr: read(FILTER_STDERR_ENV_VAR),
        }
    }

    /// True when no source is present
    pub fn is_empty(&self) -> bool {
        self.combined.is_none() && self.stdout.is_none() && self.stderr.is_none()
    }

    /// Populate a fresh registry from the sources
    ///
    /// The combined source is parsed first so that its names occupy list
    /// capacity before the single-stream sources. Rejections are logged and
    /// end parsing of that source only.
    pub fn build_registry(&self) -> FilterRegistry {
        let mut registry = FilterRegistry::new();

        if let Some(value) = &self.combined {
            report(FILTER_ENV_VAR, parse_combined(&mut registry, value));
        }
        if let Some(value) = &self.stdout {
            report(
                FILTER_STDOUT_ENV_VAR,
                parse_single(&mut registry, StreamKind::Stdout, value),
            );
        }
        if let Some(value) = &self.stderr {
            report(
                FILTER_STDERR_ENV_VAR,
                parse_single(&mut registry, StreamKind::Stderr, value),
            );
        }

        tracing::debug!(
            stdout = registry.count(StreamKind::Stdout),
            stderr = registry.count(StreamKind::Stderr),
            "filter registry built"
        );
        registry
    }
}

fn report(source: &str, outcome: Result<usize>) {
    match outcome {
        Ok(appended) => tracing::trace!(source, appended, "parsed filter source"),
        Err(e) => tracing::warn!(source, "{}", e),
    }
}
