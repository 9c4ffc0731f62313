use sift_config::Uses;
use sift_domain::{keyword, policy};

use crate::{SiftService, with_timeout};

/// Query for lexical search plus the keywords that produced it, ordered by weight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rewrite {
	pub keywords: Vec<String>,
	pub query: String,
}

impl SiftService {
	/// Derives a keyword query for web search. Any failure keeps `query` unchanged.
	pub async fn rewrite_query(
		&self,
		query: &str,
		uses: &Uses,
		skip: bool,
		max_keywords: u32,
	) -> Rewrite {
		let unchanged = Rewrite { keywords: Vec::new(), query: query.to_string() };

		if skip || !uses.keyword_configured() {
			return unchanged;
		}

		let Some(extractor) = self.providers.keywords.as_ref() else {
			return unchanged;
		};
		let extracted = with_timeout(
			"Keyword extraction",
			self.cfg.search.timeouts.keyword_ms,
			extractor.extract(query, max_keywords),
		)
		.await;

		match extracted {
			Ok(keywords) => match keyword::rewrite_query(&keywords) {
				Some(rewritten) => Rewrite { keywords: keyword::ordered(&keywords), query: rewritten },
				None => unchanged,
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					policy = ?policy::KEYWORD_EXTRACTION,
					"Keyword extraction failed; using the original query."
				);

				unchanged
			},
		}
	}
}
