// src/agent/mod.rs
//! Splitting raw agent output into named string tables.
//!
//! Agent output is a sequence of sections, each introduced by a header line:
//!
//! ```text
//! <<<dfs_backlog:sep(59)>>>
//! FOO_DATA ( from foohost);0
//! ```
//!
//! The `sep(N)` header option sets the field separator to the ASCII character `N`. Sections
//! without it are split on whitespace.
//!
//! Data another host forwards through this agent is wrapped in `<<<<hostname>>>>` and `<<<<>>>>`.
//! Those blocks belong to that host and are skipped.

use std::collections::HashMap;
use std::io::{self, BufRead};

use log::{debug, trace, warn};

const HEADER_PREFIX: &str = "<<<";
const HEADER_SUFFIX: &str = ">>>";
const PIGGYBACK_PREFIX: &str = "<<<<";
const PIGGYBACK_SUFFIX: &str = ">>>>";

/// Configuration for [`read_sections`].
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// The field separator for sections whose header has no `sep(N)` option.
    ///
    /// Fields are split on whitespace if this is `None`.
    pub default_separator: Option<char>,
}

/// The string tables of all sections found in some agent output.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct Sections {
    tables: HashMap<String, Vec<Vec<String>>>,
}

impl Sections {
    /// The rows of the section called `name`, if it was present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[Vec<String>]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    /// The number of sections found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no sections were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Return the host of a `<<<<host>>>>` marker, or `None` if `line` is not one.
///
/// The closing marker `<<<<>>>>` yields an empty host.
fn piggyback_host(line: &str) -> Option<&str> {
    line.strip_prefix(PIGGYBACK_PREFIX)?
        .strip_suffix(PIGGYBACK_SUFFIX)
}

#[derive(Debug, Eq, PartialEq)]
struct Header<'line> {
    name: &'line str,
    separator: Option<char>,
}

impl<'line> Header<'line> {
    /// Parse a `<<<name:opt:opt>>>` header, or return `None` if `line` is not a header.
    fn parse(line: &'line str) -> Option<Self> {
        let inner = line
            .strip_prefix(HEADER_PREFIX)?
            .strip_suffix(HEADER_SUFFIX)?;

        let mut parts = inner.split(':');

        // `unwrap` is OK since `split` always yields at least one item.
        let name = parts.next().unwrap();

        let mut separator = None;
        for option in parts {
            match option
                .strip_prefix("sep(")
                .and_then(|code| code.strip_suffix(')'))
            {
                Some(code) => match code.parse::<u8>() {
                    Ok(code) => separator = Some(char::from(code)),
                    Err(_) => warn!("Ignoring invalid separator in section header {:?}", line),
                },
                None => trace!("Ignoring section option {:?}", option),
            }
        }

        Some(Header { name, separator })
    }
}

/// Split agent output into string tables, keyed by section name.
///
/// Lines before the first header and lines after an empty `<<<>>>` header are ignored. Empty lines
/// are skipped. A section that appears more than once accumulates the rows of every occurrence.
/// Everything between `<<<<host>>>>` and `<<<<>>>>` belongs to another host and is ignored.
///
/// # Errors
///
/// Propagates any `io::Error`s that occur while reading.
pub fn read_sections(reader: impl BufRead, config: &Config) -> io::Result<Sections> {
    let mut sections = Sections::default();
    let mut current: Option<(String, Option<char>)> = None;
    let mut piggyback = false;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');

        if let Some(host) = piggyback_host(line) {
            if host.is_empty() {
                debug!("Leaving piggyback data");
                piggyback = false;
            } else {
                debug!("Skipping piggyback data for host {:?}", host);
                piggyback = true;
            }
            current = None;
            continue;
        }

        if piggyback {
            trace!("Ignoring piggyback line {:?}", line);
            continue;
        }

        if let Some(header) = Header::parse(line) {
            debug!("Entering section {:?}", header.name);
            current = if header.name.is_empty() {
                None
            } else {
                sections
                    .tables
                    .entry(header.name.to_string())
                    .or_insert_with(Vec::new);
                Some((
                    header.name.to_string(),
                    header.separator.or(config.default_separator),
                ))
            };
            continue;
        }

        if line.is_empty() {
            continue;
        }

        let (name, separator) = match &current {
            Some(current) => current,
            None => {
                debug!("Ignoring line outside of a section: {:?}", line);
                continue;
            }
        };

        let row: Vec<String> = match separator {
            Some(separator) => line.split(*separator).map(str::to_string).collect(),
            None => line.split_whitespace().map(str::to_string).collect(),
        };

        sections
            .tables
            .entry(name.clone())
            .or_default()
            .push(row);
    }

    Ok(sections)
}
