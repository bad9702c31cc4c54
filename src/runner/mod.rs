// src/runner/mod.rs
//! Running the plugin against raw agent output, as the `dfs-backlog` binary does.

use std::error::Error;
use std::io::BufRead;

use log::{debug, error, warn};
use structopt::StructOpt;

use crate::agent;
use crate::check::State;
use crate::output::{self, Format};
use crate::plugin::Registry;
use crate::ReplicationRecord;

/// What to do with the agent output.
#[derive(Debug, StructOpt)]
pub enum Command {
    /// List the services found in the agent output.
    Discover,

    /// Check a single item, e.g. "FOO_DATA from foohost".
    Check {
        /// The item to check.
        item: String,
    },
}

/// The rendered result of a run, and the state that decides the exit code.
#[derive(Debug, Eq, PartialEq)]
pub struct Outcome {
    /// The state of the run.
    pub state: State,

    /// What to print on stdout.
    pub output: String,
}

impl Outcome {
    /// An `UNKNOWN` outcome describing a failed run.
    pub fn failure(error: &dyn Error) -> Self {
        error!("{}", error);
        Self {
            state: State::Unknown,
            output: format!("{} - {}", State::Unknown, error),
        }
    }

    /// The exit code for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }
}

/// Run `command` against the agent output read from `reader`.
///
/// An absent `dfs_backlog` section counts as an empty one. Read, parse and check failures are
/// reported as an `UNKNOWN` outcome carrying the error message.
pub fn run(reader: impl BufRead, command: &Command, format: Format) -> Outcome {
    match try_run(reader, command, format) {
        Ok(outcome) => outcome,
        Err(error) => Outcome::failure(&*error),
    }
}

fn try_run(
    reader: impl BufRead,
    command: &Command,
    format: Format,
) -> Result<Outcome, Box<dyn Error>> {
    let mut registry = Registry::new();
    crate::register(&mut registry);

    let plugin = registry
        .check_plugin(crate::CHECK_NAME)
        .ok_or("check plugin is not registered")?;
    let section_name = plugin
        .sections
        .first()
        .ok_or("check plugin consumes no agent section")?;
    let section = registry
        .agent_section(section_name)
        .ok_or_else(|| format!("agent section {} is not registered", section_name))?;

    let sections = agent::read_sections(reader, &agent::Config::default())?;

    let records: Vec<ReplicationRecord> = match sections.get(section.name) {
        Some(table) => (section.parse_function)(table)?,
        None => {
            warn!("No {} section in agent output", section.name);
            Vec::new()
        }
    };
    debug!("Parsed {} record(s)", records.len());

    match command {
        Command::Discover => {
            let services = (plugin.discovery_function)(&records);
            Ok(Outcome {
                state: State::Ok,
                output: output::services(&services, plugin.service_name, format)?,
            })
        }
        Command::Check { item } => {
            let result = (plugin.check_function)(item, &records)?;
            Ok(Outcome {
                state: result.state,
                output: output::check_result(&result, format)?,
            })
        }
    }
}
