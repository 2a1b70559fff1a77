//! Filter registry and matcher
//!
//! Holds the program short names whose output should be discarded.
//! Two bounded lists are kept:
//! - stdout-list: names whose standard output is closed
//! - stderr-list: names whose standard error is closed
//!
//! Matching is exact byte equality on the short name (final path component).

use std::fmt;
use thiserror::Error;

/// Maximum length of a single filter name in bytes
pub const MAX_FILTER_NAME_LEN: usize = 256;

/// Maximum number of filter names per stream list
pub const MAX_FILTERS: usize = 256;

/// Reserved delimiter between names in a configuration value
pub const FILTER_DELIMITER: u8 = b':';

/// Errors raised while registering filter names
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Filter name {name} exceeds maximum size of {max} bytes")]
    NameTooLong { name: String, max: usize },

    #[error("Number of {stream} filters exceeds maximum which is {max}")]
    TooManyFilters { stream: StreamKind, max: usize },

    #[error("Filter name is empty")]
    EmptyName,

    #[error("Filter name {0} contains the ':' delimiter")]
    ContainsDelimiter(String),
}

pub type Result<T> = std::result::Result<T, FilterError>;

/// One of the two output streams a filter can gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    /// File descriptor backing this stream
    pub fn fd(self) -> libc::c_int {
        match self {
            StreamKind::Stdout => libc::STDOUT_FILENO,
            StreamKind::Stderr => libc::STDERR_FILENO,
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// Validated program short name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterName(Box<[u8]>);

impl FilterName {
    /// Validate and copy a name
    ///
    /// Rejects empty names, names longer than [`MAX_FILTER_NAME_LEN`] and
    /// names containing the `:` delimiter (they could never round-trip
    /// through a configuration value).
    pub fn new(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(FilterError::EmptyName);
        }
        if bytes.len() > MAX_FILTER_NAME_LEN {
            return Err(FilterError::NameTooLong {
                name: String::from_utf8_lossy(bytes).into_owned(),
                max: MAX_FILTER_NAME_LEN,
            });
        }
        if bytes.contains(&FILTER_DELIMITER) {
            return Err(FilterError::ContainsDelimiter(
                String::from_utf8_lossy(bytes).into_owned(),
            ));
        }
        Ok(Self(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FilterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Capacity-bounded, insertion-ordered list of filter names
#[derive(Debug, Clone, Default)]
pub struct FilterList {
    entries: Vec<FilterName>,
}

impl FilterList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_FILTERS
    }

    pub fn get(&self, index: usize) -> Option<&FilterName> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterName> {
        self.entries.iter()
    }

    /// Linear scan, stops at the first exact match
    pub fn contains(&self, name: &[u8]) -> bool {
        self.entries.iter().any(|entry| entry.as_bytes() == name)
    }

    fn push(&mut self, name: FilterName) {
        debug_assert!(!self.is_full());
        self.entries.push(name);
    }
}

/// Outcome of classifying a short name against the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    StdoutOnly,
    StderrOnly,
    Both,
}

impl MatchResult {
    /// Combine the per-list findings
    pub fn from_flags(stdout: bool, stderr: bool) -> Self {
        match (stdout, stderr) {
            (true, true) => MatchResult::Both,
            (true, false) => MatchResult::StdoutOnly,
            (false, true) => MatchResult::StderrOnly,
            (false, false) => MatchResult::NoMatch,
        }
    }

    pub fn is_match(self) -> bool {
        self != MatchResult::NoMatch
    }

    /// Whether this result closes the given stream
    pub fn suppresses(self, stream: StreamKind) -> bool {
        match (self, stream) {
            (MatchResult::Both, _) => true,
            (MatchResult::StdoutOnly, StreamKind::Stdout) => true,
            (MatchResult::StderrOnly, StreamKind::Stderr) => true,
            _ => false,
        }
    }
}

/// The stdout-list and stderr-list pair
///
/// Built once during initialization and read-only afterwards. Appends are
/// only performed by the configuration parser.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    stdout: FilterList,
    stderr: FilterList,
}

impl FilterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, stream: StreamKind) -> &FilterList {
        match stream {
            StreamKind::Stdout => &self.stdout,
            StreamKind::Stderr => &self.stderr,
        }
    }

    fn list_mut(&mut self, stream: StreamKind) -> &mut FilterList {
        match stream {
            StreamKind::Stdout => &mut self.stdout,
            StreamKind::Stderr => &mut self.stderr,
        }
    }

    /// Number of names registered for a stream
    pub fn count(&self, stream: StreamKind) -> usize {
        self.list(stream).len()
    }

    /// Name at `index` in a stream list
    pub fn entry(&self, stream: StreamKind, index: usize) -> Option<&FilterName> {
        self.list(stream).get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }

    /// Validate `name` and append it to one list
    ///
    /// The registry is left unchanged when the name is too long or the list
    /// is already at capacity.
    pub fn append(&mut self, stream: StreamKind, name: &[u8]) -> Result<()> {
        let name = FilterName::new(name)?;
        let list = self.list_mut(stream);
        if list.is_full() {
            return Err(FilterError::TooManyFilters {
                stream,
                max: MAX_FILTERS,
            });
        }
        list.push(name);
        Ok(())
    }

    /// Append one name to both lists, or to neither
    ///
    /// Capacity is checked on each list separately since the two lists may
    /// already differ in length.
    pub fn append_both(&mut self, name: &[u8]) -> Result<()> {
        let name = FilterName::new(name)?;
        for stream in [StreamKind::Stdout, StreamKind::Stderr] {
            if self.list(stream).is_full() {
                return Err(FilterError::TooManyFilters {
                    stream,
                    max: MAX_FILTERS,
                });
            }
        }
        self.stdout.push(name.clone());
        self.stderr.push(name);
        Ok(())
    }

    /// Classify a short name against both lists
    pub fn classify(&self, short_name: &[u8]) -> MatchResult {
        MatchResult::from_flags(
            self.stdout.contains(short_name),
            self.stderr.contains(short_name),
        )
    }
}

/// Final path component of `path`
///
/// Returns everything after the last `/`, or the whole input when there is
/// no separator.
pub fn short_name(path: &[u8]) -> &[u8] {
    match path.iter().rposition(|&b| b == b'/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}
