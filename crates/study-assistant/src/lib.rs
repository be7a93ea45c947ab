//! A study assistant with streaming chat and assignment generation.
//!
//! The crate includes a CLI tool for using in the terminal. And you can
//! also use it as a library to bring the session into your own host
//! apps.

#![deny(missing_docs)]

pub use study_assistant_core::{
    DEFAULT_MODEL, Session, SessionBuilder, SessionError,
};
pub use study_assistant_http_gateway::{GatewayConfigBuilder, HttpGateway};

/// Re-exports of [`study_assistant_core`] crate.
pub mod core {
    pub use study_assistant_core::*;
}

/// Re-exports of [`study_assistant_gateway`] crate.
pub mod gateway {
    pub use study_assistant_gateway::*;
}

/// Re-exports of [`study_assistant_store`] crate.
pub mod store {
    pub use study_assistant_store::*;
}
