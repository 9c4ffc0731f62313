use serde_json::Value;
use sift_config::LlmProviderConfig;
use sift_domain::{
	intent::strip_code_fence,
	keyword::{self, Keyword},
};

use crate::{Error, Result};

const KEYWORD_PROMPT: &str = r#"Extract search keywords from the user query for a web search engine.
Reply with JSON only: {"keywords": [{"keyword": "...", "weight": 0.0-1.0}]}
Order does not matter. Use higher weights for terms that matter more. Return at most MAX keywords."#;

pub async fn extract(
	cfg: &LlmProviderConfig,
	query: &str,
	max_keywords: u32,
) -> Result<Vec<Keyword>> {
	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": [
			{ "role": "system", "content": KEYWORD_PROMPT.replace("MAX", &max_keywords.to_string()) },
			{ "role": "user", "content": query },
		],
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let mut keywords = parse_keyword_json(&json)?;

	keywords.truncate(max_keywords as usize);

	Ok(keywords)
}

fn parse_keyword_json(json: &Value) -> Result<Vec<Keyword>> {
	let parsed = match crate::completion_content(json) {
		Some(content) => serde_json::from_str(strip_code_fence(content)).map_err(|_| {
			Error::InvalidResponse { message: "Keyword content is not valid JSON.".to_string() }
		})?,
		None if json.is_object() => json.clone(),
		None =>
			return Err(Error::InvalidResponse {
				message: "Keyword response is missing JSON content.".to_string(),
			}),
	};

	Ok(keyword::parse_keywords(&parsed))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_fenced_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "```json\n{\"keywords\": [{\"keyword\": \"tokio\", \"weight\": 0.9}]}\n```" } }
			]
		});
		let keywords = parse_keyword_json(&json).expect("parse failed");

		assert_eq!(keywords, vec![Keyword::new("tokio", 0.9)]);
	}

	#[test]
	fn rejects_non_json_content() {
		let json = serde_json::json!({
			"choices": [{ "message": { "content": "tokio, rust" } }]
		});

		assert!(parse_keyword_json(&json).is_err());
	}
}
