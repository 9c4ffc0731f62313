pub mod access;
pub mod assistant;
pub mod audit;
pub mod auto_search;
pub mod executor;
pub mod intent;
pub mod output;
pub mod references;
pub mod request;
pub mod rewrite;

mod error;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::Value;

pub use assistant::{AssistantCache, CompiledAssistant, MergedSearch, WebSettings};
pub use audit::{JsonlAuditSink, LogAuditSink, SearchExecutionRecord, StoredReference};
pub use auto_search::{HookResponse, SearchPlan, Skip, Turn, TurnOptions, inject_references};
pub use error::{Error, Result};
pub use executor::{FanOutExecutor, GatewaySearchHandler};
pub use output::{NullOutput, OutputSignal};
pub use references::CitationAggregator;
pub use request::BuiltRequests;
pub use rewrite::Rewrite;
use sift_config::{Config, LlmProviderConfig, ProviderConfig};
use sift_domain::{
	intent::SearchType,
	keyword::Keyword,
	message::Message,
	request::SearchRequest,
	result::{ReferenceContext, SearchResult},
};
use sift_providers::{classifier, collections, keyword};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Capabilities granted to an agent invocation.
///
/// Nested invocations made on behalf of auto search receive [`ExecutionMode::CLASSIFIER`], which
/// forbids them from searching again, persisting history or writing to the user's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionMode {
	pub allow_search: bool,
	pub write_history: bool,
	pub emit_output: bool,
}
impl ExecutionMode {
	pub const CLASSIFIER: Self = Self { allow_search: false, write_history: false, emit_output: false };
	pub const HEADLESS: Self = Self { allow_search: true, write_history: false, emit_output: false };
	pub const INTERACTIVE: Self = Self { allow_search: true, write_history: true, emit_output: true };
}

/// A classifier reply. `next` is the structured hook payload, `completion` the raw text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierAnswer {
	pub next: Option<Value>,
	pub completion: Option<String>,
}

pub trait ClassifierAgent
where
	Self: Send + Sync,
{
	fn invoke<'a>(
		&'a self,
		messages: &'a [Message],
		mode: ExecutionMode,
	) -> BoxFuture<'a, Result<ClassifierAnswer>>;
}

pub trait KeywordExtractor
where
	Self: Send + Sync,
{
	fn extract<'a>(&'a self, query: &'a str, max_keywords: u32)
	-> BoxFuture<'a, Result<Vec<Keyword>>>;
}

pub trait CollectionSource
where
	Self: Send + Sync,
{
	fn get_collection<'a>(&'a self, collection_id: &'a str) -> BoxFuture<'a, Result<Value>>;
}

/// Runs every request and returns results in request order, or one error for the whole batch.
pub trait SearchExecutor
where
	Self: Send + Sync,
{
	fn run_all<'a>(
		&'a self,
		requests: &'a [SearchRequest],
	) -> BoxFuture<'a, Result<Vec<SearchResult>>>;
}

/// Serves one source type for [`FanOutExecutor`].
pub trait SearchHandler
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, request: &'a SearchRequest) -> BoxFuture<'a, Result<SearchResult>>;
}

pub trait ReferenceAggregator
where
	Self: Send + Sync,
{
	fn build(&self, results: &[SearchResult], search: &MergedSearch) -> ReferenceContext;
}

pub trait AuditSink
where
	Self: Send + Sync,
{
	fn save<'a>(&'a self, record: &'a SearchExecutionRecord) -> BoxFuture<'a, Result<()>>;
}

/// Fire-and-forget UI channel. `open` returns the id later updates refer to.
pub trait OutputChannel
where
	Self: Send + Sync,
{
	fn open(&self, signal: &OutputSignal) -> Option<String>;

	fn update(&self, message_id: &str, signal: &OutputSignal);
}

#[derive(Clone)]
pub struct Providers {
	pub classifier: Option<Arc<dyn ClassifierAgent>>,
	pub keywords: Option<Arc<dyn KeywordExtractor>>,
	pub collections: Option<Arc<dyn CollectionSource>>,
	pub executor: Arc<dyn SearchExecutor>,
	pub aggregator: Arc<dyn ReferenceAggregator>,
	pub audit: Arc<dyn AuditSink>,
	pub output: Arc<dyn OutputChannel>,
}
impl Providers {
	pub fn new(executor: Arc<dyn SearchExecutor>) -> Self {
		Self {
			classifier: None,
			keywords: None,
			collections: None,
			executor,
			aggregator: Arc::new(CitationAggregator),
			audit: Arc::new(LogAuditSink),
			output: Arc::new(NullOutput),
		}
	}

	/// HTTP collaborators for every configured provider section.
	pub fn from_config(cfg: &Config) -> Self {
		let mut executor = FanOutExecutor::new();

		if let Some(gateway) = cfg.providers.search_gateway.as_ref() {
			let handler = Arc::new(GatewaySearchHandler::new(gateway.clone()));

			for search_type in SearchType::ALL {
				executor = executor.with_handler(search_type, handler.clone());
			}
		}

		let audit: Arc<dyn AuditSink> = match cfg.audit.path.as_ref() {
			Some(path) => Arc::new(JsonlAuditSink::new(path.clone())),
			None => Arc::new(LogAuditSink),
		};
		let mut providers = Self::new(Arc::new(executor)).with_audit(audit);

		if let Some(provider) = cfg.providers.classifier.as_ref() {
			providers =
				providers.with_classifier(Arc::new(DefaultClassifier { cfg: provider.clone() }));
		}
		if let Some(provider) = cfg.providers.keyword.as_ref() {
			providers = providers.with_keywords(Arc::new(DefaultKeywords { cfg: provider.clone() }));
		}
		if let Some(provider) = cfg.providers.collections.as_ref() {
			providers =
				providers.with_collections(Arc::new(DefaultCollections { cfg: provider.clone() }));
		}

		providers
	}

	pub fn with_classifier(mut self, classifier: Arc<dyn ClassifierAgent>) -> Self {
		self.classifier = Some(classifier);

		self
	}

	pub fn with_keywords(mut self, keywords: Arc<dyn KeywordExtractor>) -> Self {
		self.keywords = Some(keywords);

		self
	}

	pub fn with_collections(mut self, collections: Arc<dyn CollectionSource>) -> Self {
		self.collections = Some(collections);

		self
	}

	pub fn with_aggregator(mut self, aggregator: Arc<dyn ReferenceAggregator>) -> Self {
		self.aggregator = aggregator;

		self
	}

	pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
		self.audit = audit;

		self
	}

	pub fn with_output(mut self, output: Arc<dyn OutputChannel>) -> Self {
		self.output = output;

		self
	}
}

pub struct SiftService {
	pub cfg: Config,
	pub providers: Providers,
	pub assistants: Arc<AssistantCache>,
}
impl SiftService {
	pub fn new(cfg: Config, providers: Providers, assistants: Arc<AssistantCache>) -> Self {
		Self { cfg, providers, assistants }
	}

	/// Compiled configuration of a registered assistant, served from the shared cache.
	pub fn assistant(&self, assistant_id: &str) -> Result<Arc<CompiledAssistant>> {
		let assistant = self.cfg.assistants.get(assistant_id).ok_or_else(|| Error::NotFound {
			message: format!("Assistant {assistant_id} is not configured."),
		})?;

		Ok(self.assistants.get_or_compile(assistant_id, assistant, &self.cfg.search))
	}
}

/// Chat-completions classifier. It has no history, tools or output of its own, so the
/// execution mode has nothing to restrict.
struct DefaultClassifier {
	cfg: LlmProviderConfig,
}
impl ClassifierAgent for DefaultClassifier {
	fn invoke<'a>(
		&'a self,
		messages: &'a [Message],
		_mode: ExecutionMode,
	) -> BoxFuture<'a, Result<ClassifierAnswer>> {
		Box::pin(async move {
			let completion = classifier::classify(&self.cfg, messages).await?;

			Ok(ClassifierAnswer { next: None, completion: Some(completion) })
		})
	}
}

struct DefaultKeywords {
	cfg: LlmProviderConfig,
}
impl KeywordExtractor for DefaultKeywords {
	fn extract<'a>(
		&'a self,
		query: &'a str,
		max_keywords: u32,
	) -> BoxFuture<'a, Result<Vec<Keyword>>> {
		Box::pin(async move { Ok(keyword::extract(&self.cfg, query, max_keywords).await?) })
	}
}

struct DefaultCollections {
	cfg: ProviderConfig,
}
impl CollectionSource for DefaultCollections {
	fn get_collection<'a>(&'a self, collection_id: &'a str) -> BoxFuture<'a, Result<Value>> {
		Box::pin(async move { Ok(collections::get_collection(&self.cfg, collection_id).await?) })
	}
}

/// Bounds `fut` by `timeout_ms`. Expiry becomes [`Error::Timeout`] naming `stage`.
pub(crate) async fn with_timeout<T, F>(stage: &str, timeout_ms: u64, fut: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
		Ok(result) => result,
		Err(_) => Err(Error::Timeout { stage: stage.to_string(), timeout_ms }),
	}
}
