//! An abstraction layer for the generation endpoints.
//!
//! This crate establishes a unified protocol for the app to talk to
//! the hosted generation endpoints (chat and assignment), so that the
//! session logic can run against a real HTTP backend or a scripted
//! test backend without modification.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod gateway;
mod request;
mod response;

pub use error::*;
pub use gateway::*;
pub use request::*;
pub use response::*;
