use serde_json::Value;
use sift_config::LlmProviderConfig;
use sift_domain::message::Message;

use crate::{Error, Result};

pub const CLASSIFIER_PROMPT: &str = r#"You decide whether answering the conversation below needs retrieved context.
Available sources: "web" (public internet), "kb" (internal knowledge base), "db" (structured business records).
Reply with JSON only, no prose:
{"need_search": true|false, "search_types": ["web"|"kb"|"db", ...], "confidence": 0.0-1.0, "reason": "short explanation"}
Use an empty search_types list to allow every source. Greetings, small talk and questions answerable from the conversation itself need no search."#;

/// Runs one classification completion and returns the raw content for the caller to parse.
pub async fn classify(cfg: &LlmProviderConfig, messages: &[Message]) -> Result<String> {
	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut payload = Vec::with_capacity(messages.len() + 1);

	payload.push(serde_json::to_value(Message::system(CLASSIFIER_PROMPT))?);

	for message in messages {
		payload.push(serde_json::to_value(message)?);
	}

	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": payload,
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_classifier_response(&json)
}

fn parse_classifier_response(json: &Value) -> Result<String> {
	crate::completion_content(json).map(str::to_string).ok_or_else(|| Error::InvalidResponse {
		message: "Classifier response is missing completion content.".to_string(),
	})
}
