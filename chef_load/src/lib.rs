//! The chef-load synthetic load generation tool.
//!
//! This library supports the chef-load binary found elsewhere in this
//! project. It fabricates plausible Chef Infra change-events and streams
//! them at an Automate data-collector endpoint to exercise ingestion.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions)]

pub mod client;
pub mod config;
pub mod generator;
