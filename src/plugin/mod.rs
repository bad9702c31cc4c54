// src/plugin/mod.rs
//! The registry through which a monitoring host finds agent sections and check plugins.
//!
//! The host owns a [`Registry`] and asks each plugin to register itself into it (see
//! [`register`](crate::register)). The functions stored here know nothing about the registry.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::check::{CheckError, CheckResult, Service};
use crate::section::ParseError;

/// Turns the string table of an agent section into a parsed section of type `S`.
pub type ParseFunction<S> = fn(&[Vec<String>]) -> Result<S, ParseError>;

/// Enumerates the services present in a parsed section.
pub type DiscoveryFunction<S> = fn(&S) -> Vec<Service>;

/// Checks one item against a parsed section.
pub type CheckFunction<S> = fn(&str, &S) -> Result<CheckResult, CheckError>;

/// A named agent section handler.
pub struct AgentSection<S> {
    /// The section name, as it appears in the `<<<name>>>` header.
    pub name: &'static str,

    /// The function that parses the section.
    pub parse_function: ParseFunction<S>,
}

/// A named check plugin.
pub struct CheckPlugin<S> {
    /// The plugin name.
    pub name: &'static str,

    /// The agent sections this plugin consumes.
    pub sections: &'static [&'static str],

    /// The service name template. `%s` is replaced with the item.
    pub service_name: &'static str,

    /// The function that discovers services.
    pub discovery_function: DiscoveryFunction<S>,

    /// The function that checks a single service.
    pub check_function: CheckFunction<S>,
}

/// Agent sections and check plugins, keyed by name.
pub struct Registry<S> {
    agent_sections: BTreeMap<&'static str, AgentSection<S>>,
    check_plugins: BTreeMap<&'static str, CheckPlugin<S>>,
}

impl<S> Registry<S> {
    /// Construct an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent_sections: BTreeMap::new(),
            check_plugins: BTreeMap::new(),
        }
    }

    /// Register an agent section, replacing any earlier section with the same name.
    pub fn register_agent_section(&mut self, section: AgentSection<S>) {
        debug!("Registering agent section {}", section.name);
        if self.agent_sections.insert(section.name, section).is_some() {
            warn!("Replaced a previously registered agent section");
        }
    }

    /// Register a check plugin, replacing any earlier plugin with the same name.
    pub fn register_check_plugin(&mut self, plugin: CheckPlugin<S>) {
        debug!("Registering check plugin {}", plugin.name);
        if self.check_plugins.insert(plugin.name, plugin).is_some() {
            warn!("Replaced a previously registered check plugin");
        }
    }

    /// Look up an agent section by name.
    #[must_use]
    pub fn agent_section(&self, name: &str) -> Option<&AgentSection<S>> {
        self.agent_sections.get(name)
    }

    /// Look up a check plugin by name.
    #[must_use]
    pub fn check_plugin(&self, name: &str) -> Option<&CheckPlugin<S>> {
        self.check_plugins.get(name)
    }

    /// The names of all registered check plugins, in order.
    pub fn check_plugin_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.check_plugins.keys().copied()
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::check::{CheckResult, Service, State};
    use crate::test::{self, string_table};

    use super::{AgentSection, CheckPlugin, Registry};

    fn count_rows(table: &[Vec<String>]) -> Result<usize, crate::section::ParseError> {
        Ok(table.len())
    }

    fn no_services(_: &usize) -> Vec<Service> {
        vec![]
    }

    fn always_ok(_: &str, _: &usize) -> Result<CheckResult, crate::check::CheckError> {
        Ok(CheckResult {
            state: State::Ok,
            summary: "fine".to_string(),
            metric: None,
        })
    }

    #[test]
    fn empty_registry() {
        let registry = Registry::<usize>::default();
        assert!(registry.agent_section("dfs_backlog").is_none());
        assert!(registry.check_plugin("dfs_backlog").is_none());
        assert_eq!(registry.check_plugin_names().count(), 0);
    }

    #[test]
    fn register_and_lookup() -> test::Result {
        let mut registry = Registry::new();
        registry.register_agent_section(AgentSection {
            name: "rows",
            parse_function: count_rows,
        });
        registry.register_check_plugin(CheckPlugin {
            name: "rows",
            sections: &["rows"],
            service_name: "Rows %s",
            discovery_function: no_services,
            check_function: always_ok,
        });

        let section = registry.agent_section("rows").expect("section registered");
        let parsed = (section.parse_function)(&string_table(&[&["a"], &["b"]]))?;
        assert_eq!(parsed, 2);

        let plugin = registry.check_plugin("rows").expect("plugin registered");
        assert_eq!(plugin.sections, &["rows"]);
        assert_eq!((plugin.check_function)("x", &parsed)?.state, State::Ok);
        assert_eq!(registry.check_plugin_names().collect::<Vec<_>>(), vec!["rows"]);

        Ok(())
    }

    #[test]
    fn register_replaces_by_name() {
        let mut registry = Registry::new();
        crate::register(&mut registry);
        crate::register(&mut registry);
        assert_eq!(
            registry.check_plugin_names().collect::<Vec<_>>(),
            vec![crate::CHECK_NAME]
        );
    }
}
