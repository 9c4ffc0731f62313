use serde::Serialize;
use sift_domain::intent::SearchType;

use crate::OutputChannel;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OutputSignal {
	IntentLoading,
	IntentDone { need_search: bool },
	SearchLoading { search_types: Vec<SearchType> },
	SearchFound { count: usize },
	SearchDone { count: usize },
	SearchFailed { error: String },
}

/// Channel for headless callers.
pub struct NullOutput;
impl OutputChannel for NullOutput {
	fn open(&self, _signal: &OutputSignal) -> Option<String> {
		None
	}

	fn update(&self, _message_id: &str, _signal: &OutputSignal) {}
}

/// A message opened on the channel. Updates are dropped when the channel gave no id.
pub(crate) struct OpenMessage<'a> {
	channel: &'a dyn OutputChannel,
	message_id: Option<String>,
}
impl<'a> OpenMessage<'a> {
	pub(crate) fn open(channel: &'a dyn OutputChannel, enabled: bool, signal: OutputSignal) -> Self {
		let message_id = if enabled { channel.open(&signal) } else { None };

		Self { channel, message_id }
	}

	pub(crate) fn update(&self, signal: OutputSignal) {
		if let Some(message_id) = self.message_id.as_deref() {
			self.channel.update(message_id, &signal);
		}
	}
}
