//! A gateway implementation for the hosted generation endpoints.
//!
//! The endpoints answer with a chunked, line-framed text stream where
//! text-delta lines carry a `0:` prefix followed by a quoted fragment.
//! This crate consumes that framing and exposes the deltas through the
//! [`GenerationResponse`](study_assistant_gateway::GenerationResponse)
//! contract.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use reqwest::{Client, Response, header};
use study_assistant_gateway::{
    ErrorKind, Gateway, GatewayError, GenerationRequest,
};

pub use config::{GatewayConfig, GatewayConfigBuilder};
use io::{Chunks, DeltaLines};
use response::HttpResponse;

/// Error type for [`HttpGateway`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl GatewayError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A [`Gateway`] backed by the HTTP generation endpoints.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: Client,
    config: Arc<GatewayConfig>,
}

impl HttpGateway {
    /// Creates a new `HttpGateway` with the given configuration.
    #[inline]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl Gateway for HttpGateway {
    type Error = Error;
    type Response = HttpResponse;

    fn send_request(
        &self,
        req: &GenerationRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let request_builder = match req {
            GenerationRequest::Chat(chat) => self
                .client
                .post(self.config.chat_url())
                .json(&proto::chat_request(chat)),
            GenerationRequest::Assignment(assignment) => self
                .client
                .post(self.config.assignment_url())
                .json(&proto::assignment_request(assignment)),
        };
        let resp_fut = request_builder
            .header(header::CONTENT_TYPE, "application/json")
            .send();

        async move {
            // Any transport error or non-success status collapses into
            // one generic failure; there is no partial recovery.
            let resp = match resp_fut.await.and_then(Response::error_for_status)
            {
                Ok(resp) => resp,
                Err(err) => {
                    error!("generation request failed: {err}");
                    return Err(Error::new(
                        "generation failed",
                        ErrorKind::Transport,
                    ));
                }
            };

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let deltas = DeltaLines::new(chunks);
            Ok(HttpResponse::from_deltas(deltas))
        }
    }
}
