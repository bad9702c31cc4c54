// lib.rs

//! The elements that drive the `dfs-backlog` monitoring plugin.
//!
//! The plugin has two halves:
//!
//! - [`section`] turns the rows of the `dfs_backlog` agent section into [`ReplicationRecord`]s.
//! - [`check`] discovers one service per record and classifies a record's backlog into a
//!   [`State`](check::State).
//!
//! [`register`] binds both halves into a host-owned [`plugin::Registry`], and [`runner`] drives
//! them from raw agent output.

#![warn(
    explicit_outlives_requirements,
    macro_use_extern_crate,
    meta_variable_misuse,
    missing_crate_level_docs,
    missing_docs,
    private_doc_tests,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_lifetimes,
    variant_size_differences,
    clippy::cargo,
    clippy::pedantic
)]

pub mod agent;
pub mod check;
pub mod output;
pub mod plugin;
pub mod runner;
pub mod section;


pub use section::ReplicationRecord;

/// The name shared by the agent section and the check plugin.
pub const CHECK_NAME: &str = "dfs_backlog";

/// The service name template for discovered items.
///
/// `%s` is replaced with the item (the record's description).
pub const SERVICE_NAME: &str = "DFS Backlog: %s";

/// Register the `dfs_backlog` agent section and check plugin with `registry`.
pub fn register(registry: &mut plugin::Registry<Vec<ReplicationRecord>>) {
    registry.register_agent_section(plugin::AgentSection {
        name: CHECK_NAME,
        parse_function: section::parse,
    });

    registry.register_check_plugin(plugin::CheckPlugin {
        name: CHECK_NAME,
        sections: &[CHECK_NAME],
        service_name: SERVICE_NAME,
        discovery_function: |records| check::discover(records),
        check_function: |item, records| check::check(item, records),
    });
}
