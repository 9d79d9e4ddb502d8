use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::gateway::{RawCompletion, ResolvedRequest};
use super::{ChatMessage, LlmError, TokenUsage};

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    id: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

fn build_body<'a>(req: &ResolvedRequest<'a>) -> ChatCompletionBody<'a> {
    ChatCompletionBody {
        model: req.model,
        messages: req.messages,
        max_completion_tokens: req.max_tokens,
        temperature: req.temperature,
    }
}

fn parse_response(body: &str) -> Result<RawCompletion, LlmError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("openai response: {e}")))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("openai response has no choices".into()))?;
    Ok(RawCompletion {
        text: choice.message.content.unwrap_or_default(),
        finish_reason: choice.finish_reason,
        usage: parsed.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
        id: parsed.id,
    })
}

pub(super) async fn complete(
    client: &Client,
    req: &ResolvedRequest<'_>,
) -> Result<RawCompletion, LlmError> {
    let url = format!("{}/chat/completions", req.base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .bearer_auth(req.api_key)
        .json(&build_body(req))
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(LlmError::Api { status: status.as_u16(), body: text });
    }
    parse_response(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved<'a>(messages: &'a [ChatMessage], temperature: Option<f32>) -> ResolvedRequest<'a> {
        ResolvedRequest {
            base_url: "http://localhost",
            api_key: "k",
            model: "gpt-4o-mini",
            messages,
            max_tokens: Some(500),
            temperature,
        }
    }

    #[test]
    fn body_omits_absent_temperature() {
        let msgs = [ChatMessage::system("s"), ChatMessage::user("u")];
        let json = serde_json::to_value(build_body(&resolved(&msgs, None))).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_completion_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        }"#;
        let raw = parse_response(body).unwrap();
        assert_eq!(raw.text, "Hello!");
        assert_eq!(raw.finish_reason.as_deref(), Some("stop"));
        assert_eq!(raw.usage.unwrap().total_tokens, 12);
        assert_eq!(raw.id.as_deref(), Some("chatcmpl-1"));
    }

    #[test]
    fn empty_choices_is_invalid() {
        let err = parse_response(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
