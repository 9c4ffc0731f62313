//! Assistant configuration merged with the global search defaults, cached per assistant.

use std::sync::Arc;

use moka::sync::Cache;
use serde::Serialize;
use serde_json::Value;
use sift_config::{Assistant, Citation, Search, SourceWeights, Uses};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebSettings {
	pub provider: String,
	pub limit: u32,
}

/// Effective search settings for one assistant. Also the config snapshot stored in audit records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedSearch {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub web: Option<WebSettings>,
	pub kb_limit: u32,
	pub kb_threshold: f32,
	pub kb_graph: bool,
	pub db_limit: u32,
	pub context_turns: u32,
	pub snippet_chars: usize,
	pub max_keywords: u32,
	pub citation: Citation,
	pub weights: SourceWeights,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledAssistant {
	pub id: String,
	pub fingerprint: String,
	pub uses: Uses,
	pub search: MergedSearch,
	pub collections: Vec<String>,
	pub models: Vec<String>,
	has_search_block: bool,
}
impl CompiledAssistant {
	pub fn compile(id: &str, assistant: &Assistant, global: &Search) -> Self {
		let overrides = assistant.search.as_ref();
		let web = overrides.and_then(|search| search.web.as_ref()).map(|web| WebSettings {
			provider: web.provider.clone(),
			limit: web.max_results.filter(|limit| *limit > 0).unwrap_or(global.web_limit),
		});
		let kb = overrides.and_then(|search| search.kb.as_ref());
		let db = overrides.and_then(|search| search.db.as_ref());
		let mut citation = global.citation.clone();

		if let Some(upper) = overrides.and_then(|search| search.citation.as_ref()) {
			if upper.format.is_some() {
				citation.format = upper.format.clone();
			}
			if upper.custom_prompt.is_some() {
				citation.custom_prompt = upper.custom_prompt.clone();
			}
		}

		let search = MergedSearch {
			web,
			kb_limit: kb.and_then(|kb| kb.limit).filter(|limit| *limit > 0).unwrap_or(global.kb_limit),
			kb_threshold: kb
				.and_then(|kb| kb.threshold)
				.filter(|threshold| *threshold > 0.0)
				.unwrap_or(global.kb_threshold),
			kb_graph: kb.map(|kb| kb.graph).unwrap_or(false),
			db_limit: db
				.and_then(|db| db.max_results)
				.filter(|limit| *limit > 0)
				.unwrap_or(global.db_limit),
			context_turns: global.context_turns,
			snippet_chars: global.snippet_chars,
			max_keywords: global.keyword.max_keywords,
			citation,
			weights: overrides.and_then(|search| search.weights).unwrap_or(global.weights),
		};

		Self {
			id: id.to_string(),
			fingerprint: fingerprint(assistant),
			uses: assistant.uses.clone().unwrap_or_default(),
			search,
			collections: assistant.kb.as_ref().map(|kb| kb.collections.clone()).unwrap_or_default(),
			models: assistant.db.as_ref().map(|db| db.models.clone()).unwrap_or_default(),
			has_search_block: assistant.search.is_some(),
		}
	}

	/// A search block or at least one KB collection or DB model.
	pub fn has_static_search(&self) -> bool {
		self.has_search_block || !self.collections.is_empty() || !self.models.is_empty()
	}

	pub fn config_snapshot(&self) -> Value {
		serde_json::to_value(&self.search).unwrap_or(Value::Null)
	}
}

pub fn fingerprint(assistant: &Assistant) -> String {
	let encoded = serde_json::to_vec(assistant).unwrap_or_default();

	blake3::hash(&encoded).to_hex().to_string()
}

/// Bounded cache of compiled assistants, owned by the composition root.
///
/// Entries are keyed by assistant id and config fingerprint, so a changed definition compiles
/// fresh instead of serving the stale entry.
pub struct AssistantCache {
	cache: Cache<String, Arc<CompiledAssistant>>,
}
impl AssistantCache {
	pub fn new(capacity: u64) -> Self {
		Self { cache: Cache::builder().max_capacity(capacity).build() }
	}

	pub fn get_or_compile(
		&self,
		assistant_id: &str,
		assistant: &Assistant,
		global: &Search,
	) -> Arc<CompiledAssistant> {
		let key = format!("{assistant_id}:{}", fingerprint(assistant));

		self.cache.get_with(key, || Arc::new(CompiledAssistant::compile(assistant_id, assistant, global)))
	}

	pub fn clear(&self) {
		self.cache.invalidate_all();
	}
}
