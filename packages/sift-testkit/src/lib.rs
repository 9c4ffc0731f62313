//! In-memory collaborators for exercising `sift-service` without network access.

use std::{
	collections::{HashMap, HashSet},
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::Value;
use sift_config::Config;
use sift_domain::{
	keyword::Keyword,
	message::Message,
	request::SearchRequest,
	result::{ResultItem, SearchResult},
};
use sift_service::{
	AssistantCache, AuditSink, BoxFuture, ClassifierAgent, ClassifierAnswer, CollectionSource,
	Error, ExecutionMode, KeywordExtractor, OutputChannel, OutputSignal, Providers, Result,
	SearchExecutionRecord, SearchExecutor, SiftService,
};

const HANG: Duration = Duration::from_secs(30);

/// Parses `raw` through the real loader so fixtures get defaults and validation.
pub fn config(raw: &str) -> Config {
	sift_config::from_toml(raw).unwrap_or_else(|err| panic!("Invalid test config: {err}"))
}

pub fn service(cfg: Config, providers: Providers) -> SiftService {
	let capacity = cfg.cache.assistants_capacity;

	SiftService::new(cfg, providers, Arc::new(AssistantCache::new(capacity)))
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}

/// Collection records keyed by id. Ids marked failing return a provider error.
#[derive(Default)]
pub struct StaticCollections {
	records: HashMap<String, Value>,
	failing: HashSet<String>,
	calls: Mutex<Vec<String>>,
}
impl StaticCollections {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, collection_id: &str, record: Value) -> Self {
		self.records.insert(collection_id.to_string(), record);

		self
	}

	pub fn failing(mut self, collection_id: &str) -> Self {
		self.failing.insert(collection_id.to_string());

		self
	}

	pub fn calls(&self) -> Vec<String> {
		lock(&self.calls).clone()
	}
}
impl CollectionSource for StaticCollections {
	fn get_collection<'a>(&'a self, collection_id: &'a str) -> BoxFuture<'a, Result<Value>> {
		lock(&self.calls).push(collection_id.to_string());

		let outcome = if self.failing.contains(collection_id) {
			Err(Error::Provider { message: format!("Metadata store rejected {collection_id}.") })
		} else {
			self.records.get(collection_id).cloned().ok_or_else(|| Error::NotFound {
				message: format!("Collection {collection_id} does not exist."),
			})
		};

		Box::pin(async move { outcome })
	}
}

enum ClassifierScript {
	Answer(ClassifierAnswer),
	Fail(String),
	Hang,
}

/// Classifier returning one scripted answer and recording every invocation.
pub struct ScriptedClassifier {
	script: ClassifierScript,
	calls: Mutex<Vec<(Vec<Message>, ExecutionMode)>>,
}
impl ScriptedClassifier {
	fn scripted(script: ClassifierScript) -> Self {
		Self { script, calls: Mutex::new(Vec::new()) }
	}

	pub fn completion(text: &str) -> Self {
		Self::scripted(ClassifierScript::Answer(ClassifierAnswer {
			next: None,
			completion: Some(text.to_string()),
		}))
	}

	pub fn structured(next: Value) -> Self {
		Self::scripted(ClassifierScript::Answer(ClassifierAnswer { next: Some(next), completion: None }))
	}

	pub fn failing(message: &str) -> Self {
		Self::scripted(ClassifierScript::Fail(message.to_string()))
	}

	pub fn hanging() -> Self {
		Self::scripted(ClassifierScript::Hang)
	}

	pub fn call_count(&self) -> usize {
		lock(&self.calls).len()
	}

	pub fn modes(&self) -> Vec<ExecutionMode> {
		lock(&self.calls).iter().map(|(_, mode)| *mode).collect()
	}

	pub fn messages(&self) -> Vec<Vec<Message>> {
		lock(&self.calls).iter().map(|(messages, _)| messages.clone()).collect()
	}
}
impl ClassifierAgent for ScriptedClassifier {
	fn invoke<'a>(
		&'a self,
		messages: &'a [Message],
		mode: ExecutionMode,
	) -> BoxFuture<'a, Result<ClassifierAnswer>> {
		lock(&self.calls).push((messages.to_vec(), mode));

		Box::pin(async move {
			match &self.script {
				ClassifierScript::Answer(answer) => Ok(answer.clone()),
				ClassifierScript::Fail(message) => Err(Error::Provider { message: message.clone() }),
				ClassifierScript::Hang => {
					tokio::time::sleep(HANG).await;

					Err(Error::Provider { message: "Classifier never answered.".to_string() })
				},
			}
		})
	}
}

/// Keyword extractor with a fixed answer.
pub struct FixedKeywords {
	keywords: Option<Vec<Keyword>>,
	calls: AtomicUsize,
}
impl FixedKeywords {
	pub fn new(keywords: Vec<Keyword>) -> Self {
		Self { keywords: Some(keywords), calls: AtomicUsize::new(0) }
	}

	pub fn failing() -> Self {
		Self { keywords: None, calls: AtomicUsize::new(0) }
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl KeywordExtractor for FixedKeywords {
	fn extract<'a>(
		&'a self,
		_query: &'a str,
		max_keywords: u32,
	) -> BoxFuture<'a, Result<Vec<Keyword>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let outcome = match self.keywords.as_ref() {
			Some(keywords) => Ok(keywords.iter().take(max_keywords as usize).cloned().collect()),
			None => Err(Error::Provider { message: "Keyword model is unavailable.".to_string() }),
		};

		Box::pin(async move { outcome })
	}
}

enum ExecutorScript {
	Echo,
	Fail(String),
	Empty,
}

/// Executor recording every batch. `echo` answers one item per request.
pub struct ScriptedExecutor {
	script: ExecutorScript,
	batches: Mutex<Vec<Vec<SearchRequest>>>,
}
impl ScriptedExecutor {
	fn scripted(script: ExecutorScript) -> Self {
		Self { script, batches: Mutex::new(Vec::new()) }
	}

	pub fn echo() -> Self {
		Self::scripted(ExecutorScript::Echo)
	}

	pub fn failing(message: &str) -> Self {
		Self::scripted(ExecutorScript::Fail(message.to_string()))
	}

	pub fn empty() -> Self {
		Self::scripted(ExecutorScript::Empty)
	}

	pub fn batches(&self) -> Vec<Vec<SearchRequest>> {
		lock(&self.batches).clone()
	}
}
impl SearchExecutor for ScriptedExecutor {
	fn run_all<'a>(
		&'a self,
		requests: &'a [SearchRequest],
	) -> BoxFuture<'a, Result<Vec<SearchResult>>> {
		lock(&self.batches).push(requests.to_vec());

		let outcome = match &self.script {
			ExecutorScript::Echo => Ok(requests.iter().map(echo_result).collect()),
			ExecutorScript::Fail(message) => Err(Error::Executor { message: message.clone() }),
			ExecutorScript::Empty => Ok(requests
				.iter()
				.map(|request| {
					SearchResult::empty(request.search_type(), request.query(), request.source())
				})
				.collect()),
		};

		Box::pin(async move { outcome })
	}
}

fn echo_result(request: &SearchRequest) -> SearchResult {
	let item = ResultItem {
		citation_id: String::new(),
		search_type: request.search_type(),
		source: request.source(),
		weight: 0.0,
		score: 0.5,
		title: format!("{} hit", request.search_type()),
		content: format!("{} result for {}", request.search_type(), request.query()),
		url: String::new(),
	};

	SearchResult {
		items: vec![item],
		total: 1,
		..SearchResult::empty(request.search_type(), request.query(), request.source())
	}
}

#[derive(Default)]
pub struct RecordingAudit {
	records: Mutex<Vec<SearchExecutionRecord>>,
	fail: bool,
}
impl RecordingAudit {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records nothing and reports every save as failed.
	pub fn failing() -> Self {
		Self { records: Mutex::new(Vec::new()), fail: true }
	}

	pub fn records(&self) -> Vec<SearchExecutionRecord> {
		lock(&self.records).clone()
	}
}
impl AuditSink for RecordingAudit {
	fn save<'a>(&'a self, record: &'a SearchExecutionRecord) -> BoxFuture<'a, Result<()>> {
		let outcome = if self.fail {
			Err(Error::Audit { message: "Audit store is read-only.".to_string() })
		} else {
			lock(&self.records).push(record.clone());

			Ok(())
		};

		Box::pin(async move { outcome })
	}
}

/// Output channel handing out sequential message ids.
#[derive(Default)]
pub struct RecordingOutput {
	events: Mutex<Vec<(String, OutputSignal)>>,
	next_id: AtomicUsize,
}
impl RecordingOutput {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<(String, OutputSignal)> {
		lock(&self.events).clone()
	}
}
impl OutputChannel for RecordingOutput {
	fn open(&self, signal: &OutputSignal) -> Option<String> {
		let message_id = format!("msg-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);

		lock(&self.events).push((message_id.clone(), signal.clone()));

		Some(message_id)
	}

	fn update(&self, message_id: &str, signal: &OutputSignal) {
		lock(&self.events).push((message_id.to_string(), signal.clone()));
	}
}
