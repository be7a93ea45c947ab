//! Core logic: the type-erased gateway client, the per-user session,
//! and the demo account directory.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod auth;
mod gateway_client;
mod session;

pub use gateway_client::{GatewayClient, GenerationStream};
pub use session::{DEFAULT_MODEL, Session, SessionBuilder, SessionError};
