use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sift_domain::{
	intent::SearchType,
	request::Source,
	result::{Reference, ReferenceContext},
};
use time::OffsetDateTime;
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};
use uuid::Uuid;

use crate::{AuditSink, BoxFuture, Error, Result};

/// One search attempt, successful or not. Written once and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchExecutionRecord {
	pub id: Uuid,
	pub request_id: String,
	pub chat_id: String,
	pub assistant_id: String,
	pub source: Source,
	/// Query before keyword rewriting.
	pub query: String,
	pub keywords: Vec<String>,
	pub search_types: Vec<SearchType>,
	pub config: Value,
	pub duration_ms: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	pub references: Vec<StoredReference>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub generated_queries: Vec<Value>,
	pub markup: String,
	pub prompt: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReference {
	pub index: usize,
	#[serde(rename = "type")]
	pub search_type: SearchType,
	pub source: Source,
	pub weight: f32,
	pub score: f32,
	pub title: String,
	pub url: String,
	pub snippet: String,
}
impl StoredReference {
	pub fn from_reference(reference: &Reference) -> Self {
		Self {
			index: reference.index,
			search_type: reference.search_type,
			source: reference.source,
			weight: reference.weight,
			score: reference.score,
			title: reference.title.clone(),
			url: reference.url.clone(),
			snippet: reference.snippet.clone(),
		}
	}
}

pub(crate) struct RecordDraft<'a> {
	pub(crate) request_id: &'a str,
	pub(crate) chat_id: &'a str,
	pub(crate) assistant_id: &'a str,
	pub(crate) query: &'a str,
	pub(crate) keywords: &'a [String],
	pub(crate) search_types: Vec<SearchType>,
	pub(crate) config: Value,
	pub(crate) duration_ms: u64,
}

impl SearchExecutionRecord {
	pub(crate) fn failure(draft: RecordDraft<'_>, error: &str) -> Self {
		Self::from_draft(draft, Some(error.to_string()), None, Vec::new())
	}

	pub(crate) fn success(
		draft: RecordDraft<'_>,
		context: &ReferenceContext,
		generated_queries: Vec<Value>,
	) -> Self {
		Self::from_draft(draft, None, Some(context), generated_queries)
	}

	fn from_draft(
		draft: RecordDraft<'_>,
		error: Option<String>,
		context: Option<&ReferenceContext>,
		generated_queries: Vec<Value>,
	) -> Self {
		let RecordDraft {
			request_id,
			chat_id,
			assistant_id,
			query,
			keywords,
			search_types,
			config,
			duration_ms,
		} = draft;

		Self {
			id: Uuid::new_v4(),
			request_id: request_id.to_string(),
			chat_id: chat_id.to_string(),
			assistant_id: assistant_id.to_string(),
			source: Source::Auto,
			query: query.to_string(),
			keywords: keywords.to_vec(),
			search_types,
			config,
			duration_ms,
			error,
			references: context
				.map(|context| context.references.iter().map(StoredReference::from_reference).collect())
				.unwrap_or_default(),
			generated_queries,
			markup: context.map(|context| context.markup.clone()).unwrap_or_default(),
			prompt: context.map(|context| context.prompt.clone()).unwrap_or_default(),
			created_at: OffsetDateTime::now_utc(),
		}
	}
}

/// Appends records as JSON lines.
pub struct JsonlAuditSink {
	path: PathBuf,
	lock: Mutex<()>,
}
impl JsonlAuditSink {
	pub fn new(path: PathBuf) -> Self {
		Self { path, lock: Mutex::new(()) }
	}

	async fn append(&self, record: &SearchExecutionRecord) -> Result<()> {
		let mut line = serde_json::to_vec(record)
			.map_err(|err| Error::Audit { message: format!("Failed to encode record: {err}.") })?;

		line.push(b'\n');

		let _guard = self.lock.lock().await;
		let mut file =
			OpenOptions::new().create(true).append(true).open(&self.path).await.map_err(|err| {
				Error::Audit {
					message: format!("Failed to open {}: {err}.", self.path.display()),
				}
			})?;

		file.write_all(&line).await.map_err(|err| Error::Audit {
			message: format!("Failed to append to {}: {err}.", self.path.display()),
		})?;

		file.flush().await.map_err(|err| Error::Audit {
			message: format!("Failed to flush {}: {err}.", self.path.display()),
		})
	}
}
impl AuditSink for JsonlAuditSink {
	fn save<'a>(&'a self, record: &'a SearchExecutionRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.append(record))
	}
}

/// Emits records through `tracing` when no audit file is configured.
pub struct LogAuditSink;
impl AuditSink for LogAuditSink {
	fn save<'a>(&'a self, record: &'a SearchExecutionRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			tracing::info!(
				record_id = %record.id,
				request_id = %record.request_id,
				assistant_id = %record.assistant_id,
				references = record.references.len(),
				duration_ms = record.duration_ms,
				error = record.error.as_deref().unwrap_or(""),
				"Search execution recorded."
			);

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn draft() -> RecordDraft<'static> {
		RecordDraft {
			request_id: "req-1",
			chat_id: "chat-1",
			assistant_id: "support",
			query: "refund policy",
			keywords: &[],
			search_types: vec![SearchType::Kb],
			config: serde_json::json!({ "kb_limit": 10 }),
			duration_ms: 12,
		}
	}

	#[tokio::test]
	async fn jsonl_sink_appends_one_line_per_record() {
		let path = std::env::temp_dir().join(format!("sift_audit_{}.jsonl", Uuid::new_v4()));
		let sink = JsonlAuditSink::new(path.clone());

		sink.save(&SearchExecutionRecord::failure(draft(), "web search failed")).await.expect("save");
		sink.save(&SearchExecutionRecord::failure(draft(), "kb search failed")).await.expect("save");

		let raw = tokio::fs::read_to_string(&path).await.expect("read audit file");
		let records: Vec<SearchExecutionRecord> = raw
			.lines()
			.map(|line| serde_json::from_str(line).expect("record line"))
			.collect();

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].error.as_deref(), Some("web search failed"));
		assert_eq!(records[1].query, "refund policy");
		assert!(records[1].references.is_empty());

		let _ = tokio::fs::remove_file(&path).await;
	}
}
