use sift_domain::{
	citation,
	result::{ReferenceContext, SearchResult},
};

use crate::{MergedSearch, ReferenceAggregator};

/// Default aggregator rendering `<references>` markup with citation instructions.
pub struct CitationAggregator;
impl ReferenceAggregator for CitationAggregator {
	fn build(&self, results: &[SearchResult], search: &MergedSearch) -> ReferenceContext {
		citation::build_context(
			results,
			Some(&search.citation),
			&search.weights,
			search.snippet_chars,
		)
	}
}
