//! Persisted user state: conversations and generated assignments.
//!
//! Both collections follow the same persistence strategy: the entire
//! collection is serialized and rewritten on every mutation, keyed by
//! the owning user. The [`StateStore`] trait is the seam between that
//! strategy and the actual storage backend.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod assignments;
mod conversations;
mod records;
mod state;

pub use assignments::*;
pub use conversations::*;
pub use records::*;
pub use state::*;
