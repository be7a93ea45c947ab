use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use study_assistant_gateway::{
    Gateway, GatewayError, GenerationEvent, GenerationRequest,
    GenerationResponse,
};
use tracing::Instrument;

type SendRequestResult = Result<GenerationStream, Box<dyn GatewayError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(GenerationRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a gateway that maintains an execution environment
/// for the gateway and provides a type-erased interface for the other
/// modules.
#[derive(Clone)]
pub struct GatewayClient {
    handler_fn: HandlerFn,
}

impl GatewayClient {
    /// Creates a client wrapping the given gateway.
    #[inline]
    pub fn new<G: Gateway + 'static>(gateway: G) -> Self {
        // We have to erase the type `G`, since `GatewayClient` doesn't
        // have a generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = gateway.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp = match fut.await {
                        Ok(resp) => resp,
                        Err(err) => {
                            error!("got an error: {err:?}");
                            return Err(Box::new(err) as Box<dyn GatewayError>);
                        }
                    };
                    Ok(GenerationStream::from_response(resp))
                }
                .instrument(trace_span!("gateway client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the delta stream.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. Dropping the returned stream stops
    /// pulling further events from the response.
    #[inline]
    pub async fn send_request(
        &self,
        req: GenerationRequest,
    ) -> SendRequestResult {
        (self.handler_fn)(req).await
    }
}

trait ErasedResponse: Send {
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<GenerationEvent>, Box<dyn GatewayError>>>;
}

impl<R: GenerationResponse> ErasedResponse for R {
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<GenerationEvent>, Box<dyn GatewayError>>> {
        GenerationResponse::poll_next_event(self, cx).map(|result| {
            result.map_err(|err| Box::new(err) as Box<dyn GatewayError>)
        })
    }
}

/// A monotonically growing text accumulator over a streaming
/// generation response.
///
/// The accumulator is exposed after every recognized delta, not just
/// at the end, which is what enables live-typing UI updates.
pub struct GenerationStream {
    resp: Pin<Box<dyn ErasedResponse>>,
    accumulated: String,
    finished: bool,
}

impl GenerationStream {
    fn from_response<R: GenerationResponse>(resp: R) -> Self {
        Self {
            resp: Box::pin(resp),
            accumulated: String::new(),
            finished: false,
        }
    }

    /// Pulls the next text delta and returns the full accumulated
    /// text after appending it.
    ///
    /// Returns `Ok(None)` once the stream completes. An error is
    /// terminal: the stream yields no further deltas, and whatever was
    /// accumulated so far stays available through
    /// [`accumulated`](Self::accumulated).
    pub async fn next_delta(
        &mut self,
    ) -> Result<Option<String>, Box<dyn GatewayError>> {
        if self.finished {
            return Ok(None);
        }
        let event = poll_fn(|cx| self.resp.as_mut().poll_next_event(cx)).await;
        match event {
            Ok(Some(GenerationEvent::TextDelta(delta))) => {
                self.accumulated.push_str(&delta);
                Ok(Some(self.accumulated.clone()))
            }
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(err) => {
                self.finished = true;
                error!("got an error: {err:?}");
                Err(err)
            }
        }
    }

    /// Returns the text accumulated so far.
    #[inline]
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }
}
