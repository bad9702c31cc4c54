// src/check/mod.rs
//! Discovery and checking of DFS replication backlogs.

use log::{debug, trace};

use crate::ReplicationRecord;

/// Backlog counts above this are [`State::Warn`].
pub const WARN_LEVEL: i64 = 300;

/// Backlog counts above this are [`State::Crit`].
pub const CRIT_LEVEL: i64 = 1000;

/// The name of the metric emitted for enabled replications.
pub const METRIC_NAME: &str = "count";

/// The state of a checked service.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    /// Everything is fine.
    Ok,

    /// The backlog is above [`WARN_LEVEL`].
    Warn,

    /// The backlog is above [`CRIT_LEVEL`].
    Crit,

    /// The state could not be determined, e.g. because the item vanished.
    Unknown,
}

impl State {
    /// The conventional plugin exit code for this state.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            State::Ok => 0,
            State::Warn => 1,
            State::Crit => 2,
            State::Unknown => 3,
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(match self {
            State::Ok => "OK",
            State::Warn => "WARN",
            State::Crit => "CRIT",
            State::Unknown => "UNKNOWN",
        })
    }
}

/// A warn/crit threshold pair attached to a [`Metric`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Levels {
    /// The warning threshold.
    pub warn: f64,

    /// The critical threshold.
    pub crit: f64,
}

/// The fixed backlog thresholds, as attached to the emitted metric.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn levels() -> Levels {
    Levels {
        warn: WARN_LEVEL as f64,
        crit: CRIT_LEVEL as f64,
    }
}

/// A named numeric value for graphing and alerting.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Metric {
    /// The metric name.
    pub name: String,

    /// The measured value.
    pub value: f64,

    /// The thresholds the value was classified against, if any.
    pub levels: Option<Levels>,
}

/// The outcome of checking one item.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CheckResult {
    /// The service state.
    pub state: State,

    /// A human-readable summary.
    pub summary: String,

    /// The backlog metric, only present for enabled replications.
    pub metric: Option<Metric>,
}

/// A service found by [`discover`].
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Service {
    /// The item identifying this service in later [`check`] calls.
    pub item: String,
}

impl Service {
    /// The service name, built by substituting `%s` in `template` with the item.
    #[must_use]
    pub fn name(&self, template: &str) -> String {
        template.replacen("%s", &self.item, 1)
    }
}

/// An error that occurred while checking an item.
#[derive(Debug, Eq, PartialEq)]
pub enum CheckError {
    /// The record for the item had a negative backlog count.
    ///
    /// The agent should never report one, so this indicates corrupt agent output.
    NegativeBacklog(i64),
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CheckError::NegativeBacklog(count) => {
                write!(f, "Backlog count is negative! count={}", count)
            }
        }
    }
}

impl std::error::Error for CheckError {}

/// Classify a backlog count against [`WARN_LEVEL`] and [`CRIT_LEVEL`].
///
/// # Errors
///
/// Returns [`CheckError::NegativeBacklog`] if `count` is negative.
pub fn classify(count: i64) -> Result<State, CheckError> {
    if count < 0 {
        Err(CheckError::NegativeBacklog(count))
    } else if count > CRIT_LEVEL {
        Ok(State::Crit)
    } else if count > WARN_LEVEL {
        Ok(State::Warn)
    } else {
        Ok(State::Ok)
    }
}

/// Discover one service per record, keyed by the record's description.
#[must_use]
pub fn discover(records: &[ReplicationRecord]) -> Vec<Service> {
    records
        .iter()
        .map(|record| Service {
            item: record.description.clone(),
        })
        .collect()
}

/// Check the first record whose description is `item`.
///
/// A missing item is [`State::Unknown`] and a disabled replication is always [`State::Ok`].
/// Otherwise the backlog count is classified and emitted as the `count` metric.
///
/// # Errors
///
/// Returns [`CheckError::NegativeBacklog`] if the matching record has a negative backlog count.
#[allow(clippy::cast_precision_loss)]
pub fn check(item: &str, records: &[ReplicationRecord]) -> Result<CheckResult, CheckError> {
    let record = match records.iter().find(|record| record.description == item) {
        Some(record) => record,
        None => {
            debug!("Item {:?} not found in {} record(s)", item, records.len());
            return Ok(CheckResult {
                state: State::Unknown,
                summary: "item not found".to_string(),
                metric: None,
            });
        }
    };

    if record.disabled {
        return Ok(CheckResult {
            state: State::Ok,
            summary: "DFSR Disabled".to_string(),
            metric: None,
        });
    }

    let state = classify(record.backlog_count)?;
    trace!("Classified {:?} as {}", record, state);

    Ok(CheckResult {
        state,
        summary: format!("Backlog count: {}", record.backlog_count),
        metric: Some(Metric {
            name: METRIC_NAME.to_string(),
            value: record.backlog_count as f64,
            levels: Some(levels()),
        }),
    })
}
