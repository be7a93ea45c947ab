use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use study_assistant_gateway::{
    ErrorKind, GenerationEvent, GenerationResponse,
};

use crate::Error;
use crate::io::{DeltaLines, DeltaLinesError};

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextDelta = Result<(Option<String>, DeltaLines), Error>;

pin_project! {
    /// A streaming response from a generation endpoint.
    pub struct HttpResponse {
        next_delta_fut: Option<PinnedFuture<NextDelta>>,
    }
}

impl HttpResponse {
    #[inline]
    pub(crate) fn from_deltas(deltas: DeltaLines) -> Self {
        let next_delta_fut = async move { next_delta(deltas).await };
        Self {
            next_delta_fut: Some(Box::pin(next_delta_fut)),
        }
    }
}

impl GenerationResponse for HttpResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<GenerationEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_delta_fut) = this.next_delta_fut else {
            // The stream has been exhausted.
            return Poll::Ready(Ok(None));
        };
        let (delta, deltas) = match ready!(next_delta_fut.as_mut().poll(cx)) {
            Ok((Some(delta), deltas)) => (delta, deltas),
            Ok((None, _)) => {
                *this.next_delta_fut = None;
                return Poll::Ready(Ok(None));
            }
            Err(err) => {
                *this.next_delta_fut = None;
                return Poll::Ready(Err(err));
            }
        };

        // The stream may still have more data to pull, create a new
        // future for the next delta.
        let next_delta_fut = async move { next_delta(deltas).await };
        *this.next_delta_fut = Some(Box::pin(next_delta_fut));

        Poll::Ready(Ok(Some(GenerationEvent::TextDelta(delta))))
    }
}

async fn next_delta(mut deltas: DeltaLines) -> NextDelta {
    let delta = match deltas.next_delta().await {
        Ok(delta) => delta,
        Err(DeltaLinesError::ChunksError(_)) => {
            return Err(Error::new("generation failed", ErrorKind::Transport));
        }
        Err(DeltaLinesError::InvalidPayload) => {
            return Err(Error::new(
                "generation failed",
                ErrorKind::InvalidPayload,
            ));
        }
    };
    if let Some(delta) = &delta {
        trace!("got text delta: {delta}");
    }
    Ok((delta, deltas))
}
