use sift_config::Uses;
use sift_domain::{
	intent::{self, HookIntent, SearchIntent},
	message::{self, Message},
	policy,
};

use crate::{
	Error, ExecutionMode, OutputSignal, Result, SiftService, output::OpenMessage, with_timeout,
};

/// Everything the resolver looks at, already decoded into strict types.
#[derive(Debug, Clone, Copy)]
pub struct IntentInput<'a> {
	pub messages: &'a [Message],
	pub skip_search: bool,
	pub metadata_disabled: bool,
	pub hook_intent: Option<&'a HookIntent>,
	/// Assistant defaults overlaid by per-call options and the hook response.
	pub uses: &'a Uses,
	pub search_configured: bool,
	pub context_turns: usize,
	pub emit_output: bool,
}

impl SiftService {
	/// Decides whether and what to search. `None` means no search at all for this turn.
	///
	/// The first matching rule wins: per-call skip, metadata skip, hook intent, disabled `uses`,
	/// missing search configuration, and finally the classifier.
	pub async fn resolve_intent(&self, input: IntentInput<'_>) -> Option<SearchIntent> {
		if input.skip_search {
			tracing::debug!("Search skipped by per-call option.");

			return None;
		}
		if input.metadata_disabled {
			tracing::debug!("Search skipped by caller metadata.");

			return None;
		}
		if let Some(intent) = input.hook_intent.and_then(HookIntent::normalize) {
			tracing::debug!(need_search = intent.need_search, "Search intent supplied by hook.");

			return Some(intent);
		}
		if input.uses.search_disabled() {
			tracing::debug!("Search disabled by uses configuration.");

			return None;
		}
		if !input.search_configured {
			tracing::debug!("No search configuration; skipping search.");

			return None;
		}

		Some(self.classify(input.messages, input.context_turns, input.emit_output).await)
	}

	async fn classify(&self, messages: &[Message], turns: usize, emit_output: bool) -> SearchIntent {
		let Some(classifier) = self.providers.classifier.as_ref() else {
			tracing::debug!(
				policy = ?policy::INTENT_RESOLUTION,
				"No intent classifier is registered; continuing without search."
			);

			return SearchIntent::no_search();
		};
		let Some(context) = message::intent_context(messages, turns) else {
			return SearchIntent::no_search();
		};
		let signal = OpenMessage::open(&*self.providers.output, emit_output, OutputSignal::IntentLoading);
		let timeout_ms = self.cfg.search.timeouts.classifier_ms;
		let answer = with_timeout(
			"Intent classification",
			timeout_ms,
			classifier.invoke(std::slice::from_ref(&context), ExecutionMode::CLASSIFIER),
		)
		.await;
		let parsed: Result<SearchIntent> = answer.and_then(|answer| {
			intent::parse_classifier_output(answer.next.as_ref(), answer.completion.as_deref())
				.ok_or_else(|| Error::Provider {
					message: "Classifier answer carries no usable intent.".to_string(),
				})
		});
		let resolved = match parsed {
			Ok(intent) => intent,
			Err(err) => {
				tracing::warn!(
					error = %err,
					policy = ?policy::INTENT_RESOLUTION,
					"Intent classification failed; continuing without search."
				);

				SearchIntent::no_search()
			},
		};

		signal.update(OutputSignal::IntentDone { need_search: resolved.need_search });

		resolved
	}
}
