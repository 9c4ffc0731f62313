use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{intent::SearchType, request::Source};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
	#[serde(rename = "type")]
	pub search_type: SearchType,
	#[serde(default)]
	pub query: String,
	#[serde(default)]
	pub source: Source,
	#[serde(default)]
	pub items: Vec<ResultItem>,
	#[serde(default)]
	pub total: usize,
	#[serde(default)]
	pub duration_ms: u64,
	/// Query representation generated for structured search, kept for audit.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub generated_query: Option<Value>,
}
impl SearchResult {
	pub fn empty(search_type: SearchType, query: &str, source: Source) -> Self {
		Self {
			search_type,
			query: query.to_string(),
			source,
			items: Vec::new(),
			total: 0,
			duration_ms: 0,
			generated_query: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
	#[serde(default)]
	pub citation_id: String,
	#[serde(rename = "type")]
	pub search_type: SearchType,
	#[serde(default)]
	pub source: Source,
	#[serde(default)]
	pub weight: f32,
	#[serde(default)]
	pub score: f32,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub content: String,
	#[serde(default)]
	pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
	pub id: String,
	/// 1-based position in the reference list.
	pub index: usize,
	#[serde(rename = "type")]
	pub search_type: SearchType,
	pub source: Source,
	pub weight: f32,
	pub score: f32,
	pub title: String,
	pub url: String,
	pub snippet: String,
	pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceContext {
	pub references: Vec<Reference>,
	pub markup: String,
	pub prompt: String,
}
impl ReferenceContext {
	pub fn is_empty(&self) -> bool {
		self.references.is_empty()
	}
}
