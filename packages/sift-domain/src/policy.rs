//! Named failure policies for the stages that talk to collaborators.
//!
//! Intent resolution and authorization disagree on purpose: a broken classifier degrades to
//! answering without retrieval, while a missing authorization proof denies the collection.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
	/// Carry on as if the stage had declined.
	FailOpen,
	/// Exclude whatever the failed call was about.
	FailClosed,
}

/// Classifier missing, failing, timing out or answering garbage: no search for this turn.
pub const INTENT_RESOLUTION: FailurePolicy = FailurePolicy::FailOpen;

/// Keyword extraction failing: the original query is used.
pub const KEYWORD_EXTRACTION: FailurePolicy = FailurePolicy::FailOpen;

/// Collection metadata fetch failing: the candidate is dropped.
pub const COLLECTION_METADATA: FailurePolicy = FailurePolicy::FailClosed;

/// Executor failing: no references are injected, even from sources that succeeded.
pub const SEARCH_EXECUTION: FailurePolicy = FailurePolicy::FailClosed;
