//! Core of the birthday calendar generator.
//!
//! Keeps a remote calendar collection in sync with the birthdays found in an
//! address book:
//! - `identity` derives the stable key that ties a contact to its event
//! - `ics` encodes birthday events and decodes managed entries back
//! - `remote` describes the store collaborator and takes the snapshot
//! - `diff` computes the reconciliation plan
//! - `apply` executes a plan with per-item failure isolation
//! - `guard` probes the store before anything is touched
//! - `sync` wires the stages into one run

pub mod apply;
pub mod config;
pub mod contact;
pub mod diff;
pub mod error;
pub mod guard;
pub mod ics;
pub mod identity;
pub mod remote;
pub mod source;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use contact::Contact;
pub use error::{BdayCalError, BdayCalResult};
pub use identity::{Identifier, identify};
