use sift_config::Uses;
use sift_domain::{
	auth::{self, AuthorizationContext},
	intent::{SearchIntent, SearchType},
	request::{DbRequest, KbRequest, SearchRequest, Source, WebRequest},
};

use crate::{CompiledAssistant, SiftService};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltRequests {
	pub requests: Vec<SearchRequest>,
	pub keywords: Vec<String>,
}

impl SiftService {
	/// One request per source type that is both configured on the assistant and allowed by
	/// `intent`, in web, kb, db order.
	///
	/// `uses` is the merged selection for this turn. Only the web request uses the keyword
	/// query. A KB request whose collections are all filtered out is omitted.
	pub async fn build_requests(
		&self,
		query: &str,
		assistant: &CompiledAssistant,
		uses: &Uses,
		intent: &SearchIntent,
		auth: Option<&AuthorizationContext>,
		skip_keyword: bool,
	) -> BuiltRequests {
		let mut built = BuiltRequests::default();

		if !intent.need_search {
			return built;
		}

		if let Some(web) = assistant.search.web.as_ref()
			&& intent.allows(SearchType::Web)
		{
			let rewrite = self
				.rewrite_query(query, uses, skip_keyword, assistant.search.max_keywords)
				.await;
			let provider = uses
				.web
				.clone()
				.or_else(|| (!web.provider.trim().is_empty()).then(|| web.provider.clone()));

			built.keywords = rewrite.keywords;
			built.requests.push(SearchRequest::Web(WebRequest {
				query: rewrite.query,
				limit: web.limit,
				provider,
				source: Source::Auto,
			}));
		}
		if !assistant.collections.is_empty() && intent.allows(SearchType::Kb) {
			let collections = self.filter_collections(auth, &assistant.collections).await;

			if collections.is_empty() {
				tracing::debug!("No accessible collections; omitting knowledge base search.");
			} else {
				built.requests.push(SearchRequest::Kb(KbRequest {
					query: query.to_string(),
					limit: assistant.search.kb_limit,
					collections,
					threshold: assistant.search.kb_threshold,
					graph: assistant.search.kb_graph,
					source: Source::Auto,
				}));
			}
		}
		if !assistant.models.is_empty() && intent.allows(SearchType::Db) {
			built.requests.push(SearchRequest::Db(DbRequest {
				query: query.to_string(),
				limit: assistant.search.db_limit,
				models: assistant.models.clone(),
				predicate: auth::row_predicate(auth),
				source: Source::Auto,
			}));
		}

		built
	}
}
