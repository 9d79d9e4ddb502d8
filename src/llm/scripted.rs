use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;

use super::{
    Completion, CompletionRequest, LlmError, LlmGateway, Provider, ProviderAvailability,
};

/// In-process gateway that replays canned replies in order and records every
/// request it receives. Used by `AppState::fake()` and the test suites.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedGateway {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let gw = Self::default();
        for r in replies {
            gw.push_reply(r);
        }
        gw
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.replies).push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, err: LlmError) {
        lock(&self.replies).push_back(Err(err));
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::EmptyMessages);
        }
        let provider = request.provider.unwrap_or(Provider::OpenAi);
        let model = request.model.clone().unwrap_or_else(|| "scripted".into());
        lock(&self.requests).push(request);

        let next = lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("no scripted reply left".into())));
        next.map(|text| Completion {
            text,
            finish_reason: Some("stop".into()),
            usage: None,
            id: None,
            provider,
            model,
        })
    }

    fn availability(&self) -> ProviderAvailability {
        ProviderAvailability { openai: true, anthropic: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    #[tokio::test]
    async fn replays_in_order_then_runs_dry() {
        let gw = ScriptedGateway::new(["one", "two"]);
        let req = || CompletionRequest::new(vec![ChatMessage::user("x")]);
        assert_eq!(gw.complete(req()).await.unwrap().text, "one");
        assert_eq!(gw.complete(req()).await.unwrap().text, "two");
        assert!(gw.complete(req()).await.is_err());
        assert_eq!(gw.requests().len(), 3);
    }
}
