use serde_json::Value;
use sift_config::ProviderConfig;

use crate::{Error, Result};

/// Fetches the raw record of one knowledge-base collection.
pub async fn get_collection(cfg: &ProviderConfig, collection_id: &str) -> Result<Value> {
	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}/{}", cfg.api_base, cfg.path, collection_id);
	let res = client
		.get(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_collection(json)
}

fn parse_collection(json: Value) -> Result<Value> {
	let Value::Object(mut map) = json else {
		return Err(Error::InvalidResponse {
			message: "Collection response must be a JSON object.".to_string(),
		});
	};

	if map.get("collection").is_some_and(Value::is_object) {
		return Ok(map.remove("collection").unwrap_or_default());
	}

	Ok(Value::Object(map))
}
