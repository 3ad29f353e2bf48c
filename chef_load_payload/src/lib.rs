//! The chef-load payloads
//!
//! This library supports fabrication of Chef Infra change-events for the
//! chef-load project. Events produced here are structurally valid against the
//! Automate data-collector "action" wire schema but carry randomized,
//! plausible-looking data.

#![deny(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

pub use chef_action::{ActionEvent, ChefAction, EntityKind, TaskKind};
pub use facts::{FactKind, FactPools};

pub mod chef_action;
pub mod facts;

/// Errors related to payload generation
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A candidate fact list was configured empty
    #[error("Candidate list for {0} facts is empty")]
    EmptyFacts(FactKind),
}

/// Generate instances of `Self::Output` from a source of randomness.
///
/// Implementations hold no per-call state; repeated calls with the same rng
/// state produce the same output.
pub trait Generator<'a> {
    /// The generated unit.
    type Output: 'a;
    /// Error produced during generation.
    type Error: 'a;

    /// Generate one instance of `Self::Output`.
    ///
    /// # Errors
    ///
    /// Implementations fail only when their backing candidate data cannot
    /// satisfy the request.
    fn generate<R>(&'a self, rng: &mut R) -> Result<Self::Output, Self::Error>
    where
        R: rand::Rng + ?Sized;
}
