use std::error::Error;

use crate::error::ErrorKind;
use crate::request::GenerationRequest;
use crate::response::GenerationResponse;

/// The error type for a gateway.
pub trait GatewayError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a generation gateway, which is the entry for
/// sending chat and assignment requests.
///
/// Once the gateway is created, it should behave like a stateless
/// object. It can still have internal state, but callers should not
/// rely on it, and the gateway should be prepared for being dropped
/// anytime.
pub trait Gateway: Send + Sync {
    /// The error type that may be returned by the gateway.
    type Error: GatewayError;

    /// The response type for this gateway.
    type Response: GenerationResponse<Error = Self::Error>;

    /// Sends a request to the generation endpoint.
    fn send_request(
        &self,
        req: &GenerationRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
