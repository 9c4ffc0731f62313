use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel accepted in `uses.search` that turns auto search off for an assistant.
pub const SEARCH_DISABLED: &str = "disabled";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub audit: Audit,
	#[serde(default)]
	pub providers: Providers,
	/// Keyed by assistant id.
	#[serde(default)]
	pub assistants: BTreeMap<String, Assistant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	pub web_limit: u32,
	pub kb_limit: u32,
	pub kb_threshold: f32,
	pub db_limit: u32,
	/// Number of most recent non-system turns handed to the intent classifier.
	pub context_turns: u32,
	pub snippet_chars: usize,
	pub keyword: KeywordSearch,
	pub timeouts: SearchTimeouts,
	pub citation: Citation,
	pub weights: SourceWeights,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			web_limit: 10,
			kb_limit: 10,
			kb_threshold: 0.7,
			db_limit: 20,
			context_turns: 5,
			snippet_chars: 200,
			keyword: KeywordSearch::default(),
			timeouts: SearchTimeouts::default(),
			citation: Citation::default(),
			weights: SourceWeights::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeywordSearch {
	pub max_keywords: u32,
}
impl Default for KeywordSearch {
	fn default() -> Self {
		Self { max_keywords: 8 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchTimeouts {
	pub classifier_ms: u64,
	pub keyword_ms: u64,
	pub metadata_ms: u64,
	pub executor_ms: u64,
}
impl Default for SearchTimeouts {
	fn default() -> Self {
		Self { classifier_ms: 30_000, keyword_ms: 10_000, metadata_ms: 5_000, executor_ms: 60_000 }
	}
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Citation {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub format: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub custom_prompt: Option<String>,
}

/// Default weight of a reference by where its request came from.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SourceWeights {
	pub user: f32,
	pub hook: f32,
	pub auto: f32,
}
impl Default for SourceWeights {
	fn default() -> Self {
		Self { user: 1.0, hook: 0.8, auto: 0.6 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cache {
	pub assistants_capacity: u64,
}
impl Default for Cache {
	fn default() -> Self {
		Self { assistants_capacity: 256 }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Audit {
	/// JSONL file receiving one search execution record per line.
	pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Providers {
	pub classifier: Option<LlmProviderConfig>,
	pub keyword: Option<LlmProviderConfig>,
	pub collections: Option<ProviderConfig>,
	pub search_gateway: Option<ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Assistant {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uses: Option<Uses>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub search: Option<AssistantSearch>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kb: Option<KnowledgeBase>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub db: Option<Database>,
}

/// Wrapper selection for search-related tools. `None` leaves the lower layer in place.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Uses {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub search: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub web: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub keyword: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub query_dsl: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rerank: Option<String>,
}
impl Uses {
	/// Fields set on `upper` replace the ones in `self`.
	pub fn overlay(&mut self, upper: &Uses) {
		for (slot, value) in [
			(&mut self.search, &upper.search),
			(&mut self.web, &upper.web),
			(&mut self.keyword, &upper.keyword),
			(&mut self.query_dsl, &upper.query_dsl),
			(&mut self.rerank, &upper.rerank),
		] {
			if let Some(value) = value.as_ref().filter(|value| !value.trim().is_empty()) {
				*slot = Some(value.clone());
			}
		}
	}

	pub fn search_disabled(&self) -> bool {
		self.search.as_deref() == Some(SEARCH_DISABLED)
	}

	pub fn search_configured(&self) -> bool {
		self.search.as_deref().map(|value| !value.trim().is_empty()).unwrap_or(false)
	}

	pub fn keyword_configured(&self) -> bool {
		self.keyword.as_deref().map(|value| !value.trim().is_empty()).unwrap_or(false)
	}
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AssistantSearch {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub web: Option<WebSearch>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kb: Option<KbSearch>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub db: Option<DbSearch>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub citation: Option<Citation>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub weights: Option<SourceWeights>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct WebSearch {
	#[serde(default)]
	pub provider: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_results: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct KbSearch {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub limit: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub threshold: Option<f32>,
	#[serde(default)]
	pub graph: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct DbSearch {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_results: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct KnowledgeBase {
	#[serde(default)]
	pub collections: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Database {
	#[serde(default)]
	pub models: Vec<String>,
}
