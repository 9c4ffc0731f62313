use std::{sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sift_config::Uses;
use sift_domain::{
	auth::AuthorizationContext,
	intent::{HookIntent, SearchIntent, SearchType},
	loose,
	message::{self, Message, Role},
	policy,
	request::SearchRequest,
	result::ReferenceContext,
};

use crate::{
	CompiledAssistant, ExecutionMode, OutputSignal, Result, SiftService,
	audit::{RecordDraft, SearchExecutionRecord},
	intent::IntentInput,
	output::OpenMessage,
	with_timeout,
};

/// Caller metadata flag that turns auto search off. Loosely typed.
pub const DISABLE_SEARCH_KEY: &str = "__disable_search";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skip {
	#[serde(default)]
	pub search: bool,
	#[serde(default)]
	pub keyword: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnOptions {
	#[serde(default)]
	pub skip: Skip,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub search: Option<HookIntent>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uses: Option<Uses>,
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub metadata: Map<String, Value>,
}
impl TurnOptions {
	pub fn metadata_disables_search(&self) -> bool {
		self.metadata.get(DISABLE_SEARCH_KEY).map(loose::truthy).unwrap_or(false)
	}
}

/// What the create hook returned for this turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookResponse {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub search: Option<HookIntent>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uses: Option<Uses>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Turn {
	pub assistant_id: String,
	#[serde(default)]
	pub request_id: String,
	#[serde(default)]
	pub chat_id: String,
	pub messages: Vec<Message>,
	#[serde(default)]
	pub options: TurnOptions,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hook: Option<HookResponse>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub auth: Option<AuthorizationContext>,
}

/// Intent and requests for a turn, before anything is dispatched.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPlan {
	pub query: String,
	pub intent: SearchIntent,
	pub uses: Uses,
	pub requests: Vec<SearchRequest>,
	pub keywords: Vec<String>,
	#[serde(skip)]
	pub assistant: Arc<CompiledAssistant>,
}

impl SiftService {
	/// Resolves intent and builds requests. `Ok(None)` means the turn is not augmented.
	pub async fn plan(&self, turn: &Turn, mode: ExecutionMode) -> Result<Option<SearchPlan>> {
		if !mode.allow_search {
			tracing::debug!("Search is not allowed in this execution mode.");

			return Ok(None);
		}
		if turn.options.skip.search {
			tracing::debug!(assistant_id = %turn.assistant_id, "Search skipped by per-call option.");

			return Ok(None);
		}

		let assistant = self.assistant(&turn.assistant_id)?;
		let Some(query) = message::last_user_query(&turn.messages) else {
			tracing::debug!(assistant_id = %turn.assistant_id, "No user query; skipping search.");

			return Ok(None);
		};
		let mut uses = assistant.uses.clone();

		if let Some(option_uses) = turn.options.uses.as_ref() {
			uses.overlay(option_uses);
		}
		if let Some(hook_uses) = turn.hook.as_ref().and_then(|hook| hook.uses.as_ref()) {
			uses.overlay(hook_uses);
		}

		let hook_intent = turn
			.hook
			.as_ref()
			.and_then(|hook| hook.search.as_ref())
			.or(turn.options.search.as_ref());
		let input = IntentInput {
			messages: &turn.messages,
			skip_search: turn.options.skip.search,
			metadata_disabled: turn.options.metadata_disables_search(),
			hook_intent,
			uses: &uses,
			search_configured: assistant.has_static_search() || uses.search_configured(),
			context_turns: assistant.search.context_turns as usize,
			emit_output: mode.emit_output,
		};
		let Some(intent) = self.resolve_intent(input).await else {
			return Ok(None);
		};
		let built = self
			.build_requests(
				query,
				&assistant,
				&uses,
				&intent,
				turn.auth.as_ref(),
				turn.options.skip.keyword,
			)
			.await;

		Ok(Some(SearchPlan {
			query: query.to_string(),
			intent,
			uses,
			requests: built.requests,
			keywords: built.keywords,
			assistant,
		}))
	}

	/// Plans, dispatches and aggregates search for one turn.
	///
	/// Never fails the turn: every problem is logged and degrades to `None`. Each dispatched
	/// attempt writes exactly one audit record.
	pub async fn run_auto_search(&self, turn: &Turn, mode: ExecutionMode) -> Option<ReferenceContext> {
		let plan = match self.plan(turn, mode).await {
			Ok(Some(plan)) => plan,
			Ok(None) => return None,
			Err(err) => {
				tracing::warn!(
					error = %err,
					assistant_id = %turn.assistant_id,
					"Search planning failed; continuing without references."
				);

				return None;
			},
		};

		if plan.requests.is_empty() {
			tracing::debug!(assistant_id = %turn.assistant_id, "No search requests to dispatch.");

			return None;
		}

		let search_types: Vec<SearchType> =
			plan.requests.iter().map(SearchRequest::search_type).collect();
		let signal = OpenMessage::open(
			&*self.providers.output,
			mode.emit_output,
			OutputSignal::SearchLoading { search_types: search_types.clone() },
		);
		let started = Instant::now();
		let executed = with_timeout(
			"Search execution",
			self.cfg.search.timeouts.executor_ms,
			self.providers.executor.run_all(&plan.requests),
		)
		.await;
		let draft = RecordDraft {
			request_id: &turn.request_id,
			chat_id: &turn.chat_id,
			assistant_id: &turn.assistant_id,
			query: &plan.query,
			keywords: &plan.keywords,
			search_types,
			config: plan.assistant.config_snapshot(),
			duration_ms: started.elapsed().as_millis() as u64,
		};

		match executed {
			Err(err) => {
				tracing::error!(
					error = %err,
					assistant_id = %turn.assistant_id,
					policy = ?policy::SEARCH_EXECUTION,
					"Search execution failed; continuing without references."
				);

				let error = err.to_string();

				signal.update(OutputSignal::SearchFailed { error: error.clone() });
				self.save_record(SearchExecutionRecord::failure(draft, &error)).await;

				None
			},
			Ok(results) => {
				let context = self.providers.aggregator.build(&results, &plan.assistant.search);
				let count = context.references.len();
				let generated_queries =
					results.iter().filter_map(|result| result.generated_query.clone()).collect();

				signal.update(OutputSignal::SearchFound { count });
				self.save_record(SearchExecutionRecord::success(draft, &context, generated_queries))
					.await;
				signal.update(OutputSignal::SearchDone { count });

				if context.is_empty() {
					tracing::info!(assistant_id = %turn.assistant_id, "Search found no references.");

					return None;
				}

				Some(context)
			},
		}
	}

	async fn save_record(&self, record: SearchExecutionRecord) {
		if let Err(err) = self.providers.audit.save(&record).await {
			tracing::warn!(error = %err, record_id = %record.id, "Failed to save search record.");
		}
	}
}

/// Inserts the citation prompt and markup as one system message after the leading system
/// messages. Absent or empty contexts leave `messages` untouched.
pub fn inject_references(messages: &mut Vec<Message>, context: Option<&ReferenceContext>) {
	let Some(context) = context.filter(|context| !context.is_empty()) else {
		return;
	};
	let position =
		messages.iter().position(|message| message.role != Role::System).unwrap_or(messages.len());

	messages.insert(position, Message::system(format!("{}\n\n{}", context.prompt, context.markup)));
}
