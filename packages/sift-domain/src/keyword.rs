use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::loose;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
	pub text: String,
	#[serde(default = "default_weight")]
	pub weight: f32,
}
impl Keyword {
	pub fn new(text: impl Into<String>, weight: f32) -> Self {
		Self { text: text.into(), weight }
	}
}

/// Keyword texts by descending weight. The sort is stable, so ties keep extraction order.
pub fn ordered(keywords: &[Keyword]) -> Vec<String> {
	let mut sorted: Vec<&Keyword> =
		keywords.iter().filter(|keyword| !keyword.text.trim().is_empty()).collect();

	sorted.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));

	sorted.into_iter().map(|keyword| keyword.text.trim().to_string()).collect()
}

/// Lexical query for web search, or `None` when there is nothing to join.
pub fn rewrite_query(keywords: &[Keyword]) -> Option<String> {
	let ordered = ordered(keywords);

	(!ordered.is_empty()).then(|| ordered.join(" "))
}

/// Accepts `{"keywords": [...]}` or a bare array whose entries are strings or
/// `{"keyword"|"text": .., "weight": ..}` objects.
pub fn parse_keywords(value: &Value) -> Vec<Keyword> {
	let items = match value {
		Value::Array(items) => items.as_slice(),
		Value::Object(map) => match map.get("keywords") {
			Some(Value::Array(items)) => items.as_slice(),
			_ => &[],
		},
		_ => &[],
	};
	let mut keywords: Vec<Keyword> = Vec::with_capacity(items.len());

	for item in items {
		let parsed = match item {
			Value::String(text) => Some(Keyword::new(text.trim(), default_weight())),
			Value::Object(map) => map
				.get("keyword")
				.or_else(|| map.get("text"))
				.and_then(Value::as_str)
				.map(|text| {
					let weight =
						map.get("weight").and_then(loose::number).map(|w| w as f32).unwrap_or(default_weight());

					Keyword::new(text.trim(), weight)
				}),
			_ => None,
		};
		let Some(keyword) = parsed.filter(|keyword| !keyword.text.is_empty()) else {
			continue;
		};

		if keywords.iter().any(|existing| existing.text.eq_ignore_ascii_case(&keyword.text)) {
			continue;
		}

		keywords.push(keyword);
	}

	keywords
}

fn default_weight() -> f32 {
	1.0
}
