//! A local fake gateway for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use study_assistant_gateway::{
    ErrorKind, Gateway, GatewayError, GenerationEvent, GenerationRequest,
    GenerationResponse,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl GatewayError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct TestGatewayResponse {
    preset: PresetResponse,
    delay: Duration,
    delta_idx: usize,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl GenerationResponse for TestGatewayResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<GenerationEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if this.preset.fail_after == Some(this.delta_idx) {
                return Poll::Ready(Err(Error {
                    message: "scripted stream failure",
                    kind: ErrorKind::Transport,
                }));
            }
            if this.delta_idx < this.preset.deltas.len() {
                let delta = this.preset.deltas[this.delta_idx].clone();
                this.delta_idx += 1;
                return Poll::Ready(Ok(Some(GenerationEvent::TextDelta(
                    delta,
                ))));
            }
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

/// A local fake gateway for testing purpose.
///
/// Before sending requests, you need to push the scripted responses.
/// Each request consumes one scripted response from the front of the
/// queue; sending with an empty queue is an error. The gateway is
/// cheaply cloneable and clones share the queue.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy
/// memory copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestGateway {
    script: Arc<Mutex<VecDeque<PresetResponse>>>,
    delay: Option<Duration>,
}

impl TestGateway {
    #[inline]
    pub fn push_response(&self, preset: PresetResponse) {
        self.script
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push_back(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }
}

impl Gateway for TestGateway {
    type Error = crate::Error;
    type Response = TestGatewayResponse;

    fn send_request(
        &self,
        _req: &GenerationRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let preset = self
            .script
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .pop_front();
        let result = match preset {
            Some(preset) => Ok(TestGatewayResponse {
                preset,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                delta_idx: 0,
                sleep: None,
            }),
            None => Err(Error {
                message: "no scripted response left",
                kind: ErrorKind::Other,
            }),
        };
        ready(result)
    }
}
