use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	System,
	User,
	Assistant,
	Tool,
}
impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::System => "system",
			Self::User => "user",
			Self::Assistant => "assistant",
			Self::Tool => "tool",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
	Text(String),
	Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub text: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
	pub role: Role,
	pub content: Content,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}
impl Message {
	pub fn new(role: Role, text: impl Into<String>) -> Self {
		Self { role, content: Content::Text(text.into()), name: None }
	}

	pub fn system(text: impl Into<String>) -> Self {
		Self::new(Role::System, text)
	}

	pub fn user(text: impl Into<String>) -> Self {
		Self::new(Role::User, text)
	}

	pub fn assistant(text: impl Into<String>) -> Self {
		Self::new(Role::Assistant, text)
	}

	/// The string content, or the first `text` part of multi-part content.
	pub fn first_text(&self) -> Option<&str> {
		match &self.content {
			Content::Text(text) => Some(text.as_str()),
			Content::Parts(parts) =>
				parts.iter().find(|part| part.kind == "text").and_then(|part| part.text.as_deref()),
		}
	}

	/// All text parts joined with newlines.
	pub fn joined_text(&self) -> String {
		match &self.content {
			Content::Text(text) => text.clone(),
			Content::Parts(parts) => parts
				.iter()
				.filter(|part| part.kind == "text")
				.filter_map(|part| part.text.as_deref())
				.collect::<Vec<_>>()
				.join("\n"),
		}
	}
}

/// Text of the latest user message that carries any text.
pub fn last_user_query(messages: &[Message]) -> Option<&str> {
	messages
		.iter()
		.rev()
		.filter(|message| message.role == Role::User)
		.filter_map(Message::first_text)
		.map(str::trim)
		.find(|text| !text.is_empty())
}

/// Folds the most recent `turns` non-system messages into one user message with
/// `role: text` lines in chronological order.
pub fn intent_context(messages: &[Message], turns: usize) -> Option<Message> {
	let recent: Vec<&Message> =
		messages.iter().filter(|message| message.role != Role::System).collect();
	let start = recent.len().saturating_sub(turns);
	let lines: Vec<String> = recent[start..]
		.iter()
		.filter_map(|message| {
			let text = message.joined_text();
			let text = text.trim();

			(!text.is_empty()).then(|| format!("{}: {text}", message.role.as_str()))
		})
		.collect();

	if lines.is_empty() {
		return None;
	}

	Some(Message::user(lines.join("\n")))
}
