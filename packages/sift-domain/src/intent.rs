use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::{Map, Value};

use crate::loose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
	Web,
	Kb,
	Db,
}
impl SearchType {
	pub const ALL: [Self; 3] = [Self::Web, Self::Kb, Self::Db];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Web => "web",
			Self::Kb => "kb",
			Self::Db => "db",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"web" => Some(Self::Web),
			"kb" => Some(Self::Kb),
			"db" => Some(Self::Db),
			_ => None,
		}
	}
}
impl Display for SearchType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Decision of whether and what to search for one turn.
///
/// An empty `search_types` with `need_search` set allows every source type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIntent {
	pub need_search: bool,
	#[serde(default)]
	pub search_types: Vec<SearchType>,
	#[serde(default)]
	pub confidence: f32,
	#[serde(default)]
	pub reason: String,
}
impl SearchIntent {
	pub fn enabled() -> Self {
		Self {
			need_search: true,
			search_types: SearchType::ALL.to_vec(),
			confidence: 1.0,
			reason: String::new(),
		}
	}

	pub fn disabled() -> Self {
		Self { need_search: false, search_types: Vec::new(), confidence: 1.0, reason: String::new() }
	}

	/// The answer used whenever classification cannot produce one.
	pub fn no_search() -> Self {
		Self { need_search: false, search_types: Vec::new(), confidence: 0.0, reason: String::new() }
	}

	pub fn allows(&self, search_type: SearchType) -> bool {
		self.need_search && (self.search_types.is_empty() || self.search_types.contains(&search_type))
	}

	fn normalized(mut self) -> Self {
		if self.need_search {
			let mut seen = Vec::with_capacity(self.search_types.len());

			self.search_types.retain(|search_type| {
				if seen.contains(search_type) {
					false
				} else {
					seen.push(*search_type);

					true
				}
			});
		} else {
			self.search_types.clear();
		}
		if !self.confidence.is_finite() {
			self.confidence = 0.0;
		}

		self
	}
}

/// Intent value supplied by a hook or per-call option.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HookIntent {
	Flag(bool),
	Typed(SearchIntent),
	Untyped(Map<String, Value>),
}
impl HookIntent {
	pub fn from_bool(flag: bool) -> Self {
		Self::Flag(flag)
	}

	pub fn from_struct(intent: SearchIntent) -> Self {
		Self::Typed(intent)
	}

	pub fn from_untyped_map(map: Map<String, Value>) -> Self {
		Self::Untyped(map)
	}

	pub fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Bool(flag) => Some(Self::from_bool(*flag)),
			Value::Object(map) => Some(Self::from_untyped_map(map.clone())),
			_ => None,
		}
	}

	/// `None` when an untyped map lacks a boolean `need_search`.
	pub fn normalize(&self) -> Option<SearchIntent> {
		match self {
			Self::Flag(true) => Some(SearchIntent::enabled()),
			Self::Flag(false) => Some(SearchIntent::disabled()),
			Self::Typed(intent) => Some(intent.clone().normalized()),
			Self::Untyped(map) => intent_from_map(map),
		}
	}
}
impl<'de> Deserialize<'de> for HookIntent {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = Value::deserialize(deserializer)?;

		Self::from_value(&value)
			.ok_or_else(|| D::Error::custom("Search intent must be a boolean or an object."))
	}
}

/// Parses a classifier answer. The structured payload wins over completion text; text goes
/// through fence stripping and then a best-effort brace match.
pub fn parse_classifier_output(
	next: Option<&Value>,
	completion: Option<&str>,
) -> Option<SearchIntent> {
	if let Some(intent) = next.and_then(intent_from_payload) {
		return Some(intent);
	}

	completion.and_then(intent_from_text)
}

/// Removes one surrounding Markdown fence (plain or tagged `json`).
pub fn strip_code_fence(raw: &str) -> &str {
	let trimmed = raw.trim();
	let body = if let Some(rest) = trimmed.strip_prefix("```json") {
		rest
	} else if let Some(rest) = trimmed.strip_prefix("```") {
		rest
	} else {
		return trimmed;
	};

	body.strip_suffix("```").unwrap_or(body).trim()
}

fn intent_from_text(raw: &str) -> Option<SearchIntent> {
	if let Ok(value) = serde_json::from_str::<Value>(strip_code_fence(raw))
		&& let Some(intent) = intent_from_payload(&value)
	{
		return Some(intent);
	}

	let start = raw.find('{')?;
	let end = raw.rfind('}')?;

	if end <= start {
		return None;
	}

	let value = serde_json::from_str::<Value>(&raw[start..=end]).ok()?;

	intent_from_payload(&value)
}

fn intent_from_payload(value: &Value) -> Option<SearchIntent> {
	let map = value.as_object()?;
	let data = map.get("data").and_then(Value::as_object).unwrap_or(map);

	intent_from_map(data)
}

fn intent_from_map(map: &Map<String, Value>) -> Option<SearchIntent> {
	let need_search = map.get("need_search")?.as_bool()?;
	let search_types = map
		.get("search_types")
		.and_then(Value::as_array)
		.map(|types| types.iter().filter_map(Value::as_str).filter_map(SearchType::parse).collect())
		.unwrap_or_default();
	let confidence = map.get("confidence").and_then(loose::number).unwrap_or(0.0) as f32;
	let reason = map.get("reason").and_then(Value::as_str).unwrap_or_default().to_string();

	Some(SearchIntent { need_search, search_types, confidence, reason }.normalized())
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn boolean_hook_intents_round_trip() {
		let enabled = HookIntent::from_bool(true).normalize().expect("intent");
		let disabled = HookIntent::from_bool(false).normalize().expect("intent");

		assert!(enabled.need_search);
		assert_eq!(enabled.search_types, SearchType::ALL.to_vec());
		assert_eq!(enabled.confidence, 1.0);
		assert!(!disabled.need_search);
		assert!(disabled.search_types.is_empty());
		assert_eq!(disabled.confidence, 1.0);
	}

	#[test]
	fn untyped_map_filters_unknown_types() {
		let hook = HookIntent::from_value(&json!({
			"need_search": true,
			"search_types": ["web", "image", "KB", 3, "web"],
			"confidence": 0.7,
			"reason": "fresh data",
		}))
		.expect("hook intent");
		let intent = hook.normalize().expect("intent");

		assert_eq!(intent.search_types, vec![SearchType::Web, SearchType::Kb]);
		assert!((intent.confidence - 0.7).abs() < f32::EPSILON);
		assert_eq!(intent.reason, "fresh data");
	}

	#[test]
	fn untyped_map_without_flag_is_unusable() {
		let hook = HookIntent::from_untyped_map(json!({ "search_types": ["web"] }).as_object().cloned().expect("map"));

		assert_eq!(hook.normalize(), None);
	}

	#[test]
	fn typed_intent_drops_types_when_search_is_off() {
		let hook = HookIntent::from_struct(SearchIntent {
			need_search: false,
			search_types: vec![SearchType::Db],
			confidence: 0.2,
			reason: String::new(),
		});

		assert!(hook.normalize().expect("intent").search_types.is_empty());
	}

	#[test]
	fn hook_intent_deserializes_from_bool_or_object() {
		let flag: HookIntent = serde_json::from_value(json!(false)).expect("flag");
		let map: HookIntent = serde_json::from_value(json!({ "need_search": true })).expect("map");

		assert_eq!(flag, HookIntent::Flag(false));
		assert!(matches!(map, HookIntent::Untyped(_)));
		assert!(serde_json::from_value::<HookIntent>(json!("yes")).is_err());
	}

	#[test]
	fn structured_payload_wins_over_text() {
		let next = json!({ "data": { "need_search": true, "search_types": ["db"] } });
		let intent =
			parse_classifier_output(Some(&next), Some(r#"{"need_search": false}"#)).expect("intent");

		assert_eq!(intent.search_types, vec![SearchType::Db]);
	}

	#[test]
	fn fenced_completion_is_parsed() {
		let text = "```json\n{\"need_search\": true, \"search_types\": [\"web\"], \"confidence\": 0.9}\n```";
		let intent = parse_classifier_output(None, Some(text)).expect("intent");

		assert!(intent.need_search);
		assert_eq!(intent.search_types, vec![SearchType::Web]);
	}

	#[test]
	fn embedded_json_is_found_in_prose() {
		let text = "Sure. {\"need_search\": false, \"reason\": \"chit-chat\"} Hope that helps.";
		let intent = parse_classifier_output(None, Some(text)).expect("intent");

		assert!(!intent.need_search);
		assert_eq!(intent.reason, "chit-chat");
	}

	#[test]
	fn unparsable_completion_yields_none() {
		assert_eq!(parse_classifier_output(None, Some("I think you should search.")), None);
		assert_eq!(parse_classifier_output(Some(&json!("nope")), None), None);
	}

	#[test]
	fn empty_types_allow_everything() {
		let intent = SearchIntent { search_types: Vec::new(), ..SearchIntent::enabled() };

		assert!(SearchType::ALL.iter().all(|search_type| intent.allows(*search_type)));
		assert!(!SearchIntent::no_search().allows(SearchType::Web));
	}
}
