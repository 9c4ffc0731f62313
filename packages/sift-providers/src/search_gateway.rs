use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;
use sift_config::ProviderConfig;
use sift_domain::{
	request::SearchRequest,
	result::{ResultItem, SearchResult},
};

use crate::{Error, Result};

#[derive(Debug, Default, Deserialize)]
struct GatewayResponse {
	#[serde(default)]
	items: Vec<GatewayItem>,
	#[serde(default)]
	total: Option<usize>,
	#[serde(default)]
	generated_query: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct GatewayItem {
	#[serde(default)]
	citation_id: Option<String>,
	#[serde(default)]
	weight: Option<f32>,
	#[serde(default)]
	score: Option<f32>,
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	content: Option<String>,
	#[serde(default)]
	url: Option<String>,
}

/// Posts one typed request to `{api_base}{path}/{type}` and maps the returned items back onto
/// the request's source type and origin.
pub async fn search(cfg: &ProviderConfig, request: &SearchRequest) -> Result<SearchResult> {
	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}/{}", cfg.api_base, cfg.path, request.search_type());
	let started = Instant::now();
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(request)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let mut result = parse_search_response(json, request)?;

	result.duration_ms = started.elapsed().as_millis() as u64;

	Ok(result)
}

fn parse_search_response(json: Value, request: &SearchRequest) -> Result<SearchResult> {
	if !json.is_object() {
		return Err(Error::InvalidResponse {
			message: "Search gateway response must be a JSON object.".to_string(),
		});
	}

	let response: GatewayResponse = serde_json::from_value(json)?;
	let items: Vec<ResultItem> = response
		.items
		.into_iter()
		.filter(|item| item.content.as_deref().is_some_and(|content| !content.trim().is_empty()))
		.map(|item| ResultItem {
			citation_id: item.citation_id.unwrap_or_default(),
			search_type: request.search_type(),
			source: request.source(),
			weight: item.weight.unwrap_or(0.0),
			score: item.score.unwrap_or(0.0),
			title: item.title.unwrap_or_default(),
			content: item.content.unwrap_or_default(),
			url: item.url.unwrap_or_default(),
		})
		.collect();
	let total = response.total.unwrap_or(items.len());

	Ok(SearchResult {
		search_type: request.search_type(),
		query: request.query().to_string(),
		source: request.source(),
		items,
		total,
		duration_ms: 0,
		generated_query: response.generated_query,
	})
}
