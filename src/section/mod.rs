// src/section/mod.rs
//! Parsing of the `dfs_backlog` agent section.
//!
//! The agent emits one line per replication connection, separated by a semicolon:
//!
//! ```text
//! <<<dfs_backlog:sep(59)>>>
//! FOO_DATA ( from foohost);0
//! FOO_DATA ( to foohost);0
//! Archive ( from foohost);NULL
//! ```
//!
//! [`agent::read_sections`](crate::agent::read_sections) splits those lines into rows of fields,
//! and [`parse`] turns the rows into [`ReplicationRecord`]s.

use std::num::ParseIntError;

use log::{debug, trace, warn};

/// The backlog value the agent reports for a disabled replication.
const DISABLED_SENTINEL: &str = "NULL";

/// A single replication connection, as reported by the agent.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReplicationRecord {
    /// `"<share> <direction> <host>"`, e.g. `"FOO_DATA from foohost"`.
    ///
    /// This is the item of the discovered service.
    pub description: String,

    /// The number of pending replication operations.
    ///
    /// Always 0 for disabled replications. The agent should never report a negative count, but
    /// one is kept as-is so that only the check for that item fails.
    pub backlog_count: i64,

    /// Whether the agent reported the replication as disabled (`NULL` backlog).
    pub disabled: bool,
}

impl ReplicationRecord {
    /// Construct an enabled record with the given `backlog_count`.
    pub fn new(description: impl Into<String>, backlog_count: i64) -> Self {
        Self {
            description: description.into(),
            backlog_count,
            disabled: false,
        }
    }

    /// Construct a disabled record.
    pub fn disabled(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            backlog_count: 0,
            disabled: true,
        }
    }

    fn from_row(row: &[String]) -> Result<Self, ErrorKind> {
        let (descriptor, backlog) = match row {
            [descriptor, backlog, rest @ ..] => {
                if !rest.is_empty() {
                    warn!("Ignoring {} extra field(s) in row {:?}", rest.len(), row);
                }
                (descriptor, backlog)
            }
            _ => return Err(ErrorKind::MissingField { fields: row.len() }),
        };

        let description = parse_descriptor(descriptor)?;

        if backlog == DISABLED_SENTINEL {
            debug!("Replication {:?} is disabled", description);
            return Ok(Self::disabled(description));
        }

        let backlog_count = backlog
            .parse::<i64>()
            .map_err(|error| ErrorKind::InvalidBacklog {
                value: backlog.clone(),
                error,
            })?;

        Ok(Self::new(description, backlog_count))
    }
}

/// Turn a descriptor like `"FOO_DATA ( from foohost)"` into `"FOO_DATA from foohost"`.
///
/// Token 1 is the literal `(` and is dropped, as is the `)` stuck to the host name.
fn parse_descriptor(descriptor: &str) -> Result<String, ErrorKind> {
    let tokens: Vec<_> = descriptor.split_whitespace().collect();
    let (share, direction, host) = match tokens.as_slice() {
        [share, _, direction, host, ..] => (share, direction, host.trim_end_matches(')')),
        _ => {
            return Err(ErrorKind::MalformedDescriptor {
                descriptor: descriptor.to_string(),
            })
        }
    };

    Ok(format!("{} {} {}", share, direction, host))
}

/// An error that occurred while parsing the agent section.
///
/// Any malformed row fails the whole section, since a partial list of records would make missing
/// services look like vanished replications.
#[derive(Debug)]
pub struct ParseError {
    /// The zero-based index of the offending row.
    pub row: usize,

    /// What was wrong with the row.
    pub kind: ErrorKind,
}

/// The ways a row of the agent section can be malformed.
#[derive(Debug)]
pub enum ErrorKind {
    /// The row had fewer than the two expected fields.
    MissingField {
        /// The number of fields in the row.
        fields: usize,
    },

    /// The descriptor did not have the `<share> ( <direction> <host>)` layout.
    MalformedDescriptor {
        /// The raw descriptor.
        descriptor: String,
    },

    /// The backlog field was neither `NULL` nor an integer.
    InvalidBacklog {
        /// The raw backlog field.
        value: String,

        /// The underlying integer parse failure.
        error: ParseIntError,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "malformed {} row {}: ", crate::CHECK_NAME, self.row)?;
        match &self.kind {
            ErrorKind::MissingField { fields } => {
                write!(f, "expected 2 fields, found {}", fields)
            }
            ErrorKind::MalformedDescriptor { descriptor } => {
                write!(f, "invalid descriptor {:?}", descriptor)
            }
            ErrorKind::InvalidBacklog { value, .. } => {
                write!(f, "invalid backlog count {:?}", value)
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::InvalidBacklog { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Parse the rows of the `dfs_backlog` agent section into records.
///
/// Each row must be `[descriptor, backlog]`. Input order is preserved and duplicates are kept.
///
/// # Errors
///
/// Returns a [`ParseError`] for the first malformed row. No records are returned in that case.
pub fn parse(string_table: &[Vec<String>]) -> Result<Vec<ReplicationRecord>, ParseError> {
    trace!("Parsing {} row(s)", string_table.len());

    string_table
        .iter()
        .enumerate()
        .map(|(row, fields)| {
            ReplicationRecord::from_row(fields).map_err(|kind| ParseError { row, kind })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use crate::check::{check, State};
    use crate::test::{self, string_table};

    use super::{parse, ErrorKind, ReplicationRecord};

    #[test]
    fn parse_empty() -> test::Result {
        assert_eq!(parse(&[])?, vec![]);
        Ok(())
    }

    #[test]
    fn parse_single_row() -> test::Result {
        let records = parse(&string_table(&[&["FOO_DATA ( from foohost)", "0"]]))?;
        assert_eq!(
            records,
            vec![ReplicationRecord::new("FOO_DATA from foohost", 0)]
        );
        Ok(())
    }

    #[test]
    fn parse_disabled() -> test::Result {
        let records = parse(&string_table(&[&["FOO_DATA ( from foohost)", "NULL"]]))?;
        assert_eq!(
            records,
            vec![ReplicationRecord {
                description: "FOO_DATA from foohost".to_string(),
                backlog_count: 0,
                disabled: true,
            }]
        );
        Ok(())
    }

    #[test]
    fn parse_preserves_order_and_leading_zeros() -> test::Result {
        let records = parse(&string_table(&[
            &["FOO_DATA ( from foohost)", "10"],
            &["FOO_DATA ( to foohost)", "5923"],
            &["Archive ( from foohost)", "00"],
            &["Archive ( to foohost)", "875"],
        ]))?;
        assert_eq!(
            records,
            vec![
                ReplicationRecord::new("FOO_DATA from foohost", 10),
                ReplicationRecord::new("FOO_DATA to foohost", 5923),
                ReplicationRecord::new("Archive from foohost", 0),
                ReplicationRecord::new("Archive to foohost", 875),
            ]
        );
        Ok(())
    }

    #[test]
    fn parse_keeps_duplicates() -> test::Result {
        let records = parse(&string_table(&[
            &["FOO_DATA ( from foohost)", "1"],
            &["FOO_DATA ( from foohost)", "2"],
        ]))?;
        assert_eq!(
            records,
            vec![
                ReplicationRecord::new("FOO_DATA from foohost", 1),
                ReplicationRecord::new("FOO_DATA from foohost", 2),
            ]
        );
        Ok(())
    }

    #[test]
    fn parse_invalid_backlog() {
        let error = parse(&string_table(&[
            &["FOO_DATA ( from foohost)", "1"],
            &["FOO_DATA ( to foohost)", "lots"],
        ]))
        .unwrap_err();

        assert_eq!(error.row, 1);
        assert!(matches!(error.kind, ErrorKind::InvalidBacklog { .. }));
        assert!(error.source().is_some());
        assert_eq!(
            &format!("{}", error),
            "malformed dfs_backlog row 1: invalid backlog count \"lots\""
        );
    }

    #[test]
    fn parse_negative_backlog() -> test::Result {
        let records = parse(&string_table(&[
            &["FOO_DATA ( from foohost)", "10"],
            &["TEST_REPLICA ( from win_nt_host)", "-7"],
        ]))?;
        assert_eq!(
            records,
            vec![
                ReplicationRecord::new("FOO_DATA from foohost", 10),
                ReplicationRecord::new("TEST_REPLICA from win_nt_host", -7),
            ]
        );

        // Only the check for the negative item fails; its neighbour is unaffected.
        assert_eq!(check("FOO_DATA from foohost", &records)?.state, State::Ok);
        let error = check("TEST_REPLICA from win_nt_host", &records).unwrap_err();
        assert_eq!(&format!("{}", error), "Backlog count is negative! count=-7");

        Ok(())
    }

    #[test]
    fn parse_malformed_descriptor() {
        let error = parse(&string_table(&[&["FOO_DATA", "0"]])).unwrap_err();
        assert_eq!(error.row, 0);
        assert!(matches!(error.kind, ErrorKind::MalformedDescriptor { .. }));
    }

    #[test]
    fn parse_missing_field() {
        let error = parse(&string_table(&[&["FOO_DATA ( from foohost)"]])).unwrap_err();
        assert!(matches!(error.kind, ErrorKind::MissingField { fields: 1 }));
        assert_eq!(
            &format!("{}", error),
            "malformed dfs_backlog row 0: expected 2 fields, found 1"
        );
    }
}
