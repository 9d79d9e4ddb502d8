use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::gateway::{RawCompletion, ResolvedRequest};
use super::{ChatRole, LlmError, TokenUsage};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<TurnBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct TurnBody<'a> {
    role: ChatRole,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    id: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

// The messages API takes system instructions out of band.
fn build_body<'a>(req: &ResolvedRequest<'a>) -> MessagesBody<'a> {
    let system: Vec<&str> = req
        .messages
        .iter()
        .filter(|m| m.role == ChatRole::System)
        .map(|m| m.content.as_str())
        .collect();
    let messages = req
        .messages
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .map(|m| TurnBody { role: m.role, content: &m.content })
        .collect();

    MessagesBody {
        model: req.model,
        max_tokens: req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        system: (!system.is_empty()).then(|| system.join("\n\n")),
        messages,
        temperature: req.temperature,
    }
}

fn parse_response(body: &str) -> Result<RawCompletion, LlmError> {
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("anthropic response: {e}")))?;
    let text: String = parsed
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect();
    Ok(RawCompletion {
        text,
        finish_reason: parsed.stop_reason,
        usage: parsed.usage.map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        }),
        id: parsed.id,
    })
}

pub(super) async fn complete(
    client: &Client,
    req: &ResolvedRequest<'_>,
) -> Result<RawCompletion, LlmError> {
    let url = format!("{}/v1/messages", req.base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .header("x-api-key", req.api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
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
    use crate::llm::ChatMessage;

    #[test]
    fn system_messages_move_to_top_level() {
        let msgs = [
            ChatMessage::system("be brief"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("plan my week"),
        ];
        let req = ResolvedRequest {
            base_url: "http://localhost",
            api_key: "k",
            model: "claude-3-5-haiku-latest",
            messages: &msgs,
            max_tokens: None,
            temperature: Some(0.7),
        };
        let json = serde_json::to_value(build_body(&req)).unwrap();
        assert_eq!(json["system"], "be brief");
        assert_eq!(json["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(json["messages"].as_array().unwrap().len(), 3);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn joins_text_blocks_and_sums_usage() {
        let body = r#"{
            "id": "msg_1",
            "content": [{"type": "text", "text": "Hello "}, {"type": "text", "text": "there"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 7, "output_tokens": 3}
        }"#;
        let raw = parse_response(body).unwrap();
        assert_eq!(raw.text, "Hello there");
        assert_eq!(raw.finish_reason.as_deref(), Some("end_turn"));
        assert_eq!(raw.usage.unwrap().total_tokens, 10);
    }
}
