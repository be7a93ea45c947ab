use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use study_assistant_gateway::{
    ChatRequest, ChatTurn, ErrorKind, Gateway, GatewayError,
    GenerationEvent, GenerationRequest, GenerationResponse, Role,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeGatewayError(ErrorKind);

impl Display for FakeGatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeGatewayError {}

impl GatewayError for FakeGatewayError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Debug)]
struct FakeGatewayResponse {
    fake_items: VecDeque<String>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeGatewayResponse {
    fn new(input: &str) -> Self {
        let fake_items = format!("You asked {}", input)
            .split(" ")
            .map(ToString::to_string)
            .collect();
        Self {
            fake_items,
            sleep: None,
        }
    }
}

impl GenerationResponse for FakeGatewayResponse {
    type Error = FakeGatewayError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<GenerationEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if let Some(mut this_item) = this.fake_items.pop_front() {
                let need_space = !this.fake_items.is_empty();
                if need_space {
                    this_item.push(' ');
                }
                return Poll::Ready(Ok(Some(GenerationEvent::TextDelta(
                    this_item,
                ))));
            }

            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

struct FakeGateway;

impl Gateway for FakeGateway {
    type Error = FakeGatewayError;
    type Response = FakeGatewayResponse;

    fn send_request(
        &self,
        req: &GenerationRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = 'blk: {
            let GenerationRequest::Chat(chat) = req else {
                break 'blk Err(FakeGatewayError(ErrorKind::Other));
            };
            if chat.messages.is_empty() {
                break 'blk Err(FakeGatewayError(ErrorKind::Transport));
            }

            let content = chat
                .messages
                .last()
                .map(|turn| turn.content.as_str())
                .unwrap_or("");
            Ok(FakeGatewayResponse::new(content))
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    #[tokio::test]
    async fn test_completion() {
        let gateway = FakeGateway;
        let req = GenerationRequest::Chat(ChatRequest {
            messages: vec![ChatTurn {
                role: Role::User,
                content: "about tides".to_string(),
            }],
            model: "claude-3-5-sonnet".to_string(),
        });
        let mut resp = gateway.send_request(&req).await.unwrap();

        let mut resp_text = String::new();
        loop {
            let resp_fut =
                poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx));
            match resp_fut.await {
                Ok(Some(GenerationEvent::TextDelta(delta))) => {
                    resp_text.push_str(&delta);
                }
                Ok(None) => break,
                Err(err) => unreachable!("unexpected error: {err:?}"),
            }
        }

        assert_eq!(resp_text, "You asked about tides");
    }

    #[tokio::test]
    async fn test_error() {
        let gateway = FakeGateway;
        let req = GenerationRequest::Chat(ChatRequest {
            messages: vec![],
            model: "claude-3-5-sonnet".to_string(),
        });
        let result = gateway.send_request(&req).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
