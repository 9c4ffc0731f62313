use std::{collections::HashMap, sync::Arc};

use sift_config::ProviderConfig;
use sift_domain::{intent::SearchType, request::SearchRequest, result::SearchResult};
use sift_providers::search_gateway;
use tokio::task::JoinSet;

use crate::{BoxFuture, Error, Result, SearchExecutor, SearchHandler};

/// Dispatches every request concurrently to the handler registered for its source type.
///
/// All or nothing: the first failure aborts the outstanding requests and fails the batch.
#[derive(Clone, Default)]
pub struct FanOutExecutor {
	handlers: HashMap<SearchType, Arc<dyn SearchHandler>>,
}
impl FanOutExecutor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_handler(mut self, search_type: SearchType, handler: Arc<dyn SearchHandler>) -> Self {
		self.handlers.insert(search_type, handler);

		self
	}

	async fn dispatch(&self, requests: &[SearchRequest]) -> Result<Vec<SearchResult>> {
		let mut tasks = JoinSet::new();

		for (index, request) in requests.iter().enumerate() {
			let handler = self.handlers.get(&request.search_type()).cloned().ok_or_else(|| {
				Error::Executor {
					message: format!("No search handler registered for {}.", request.search_type()),
				}
			})?;
			let request = request.clone();

			tasks.spawn(async move { (index, handler.search(&request).await) });
		}

		let mut slots: Vec<Option<SearchResult>> = vec![None; requests.len()];

		while let Some(joined) = tasks.join_next().await {
			let (index, outcome) = match joined {
				Ok(joined) => joined,
				Err(err) => {
					tasks.abort_all();

					return Err(Error::Executor { message: format!("Search task failed: {err}.") });
				},
			};

			match outcome {
				Ok(result) => slots[index] = Some(result),
				Err(err) => {
					tasks.abort_all();

					return Err(Error::Executor {
						message: format!(
							"{} search failed: {}.",
							requests[index].search_type(),
							err.to_string().trim_end_matches('.'),
						),
					});
				},
			}
		}

		Ok(slots.into_iter().flatten().collect())
	}
}
impl SearchExecutor for FanOutExecutor {
	fn run_all<'a>(
		&'a self,
		requests: &'a [SearchRequest],
	) -> BoxFuture<'a, Result<Vec<SearchResult>>> {
		Box::pin(self.dispatch(requests))
	}
}

/// Handler backed by the HTTP search gateway.
pub struct GatewaySearchHandler {
	cfg: ProviderConfig,
}
impl GatewaySearchHandler {
	pub fn new(cfg: ProviderConfig) -> Self {
		Self { cfg }
	}
}
impl SearchHandler for GatewaySearchHandler {
	fn search<'a>(&'a self, request: &'a SearchRequest) -> BoxFuture<'a, Result<SearchResult>> {
		Box::pin(async move { Ok(search_gateway::search(&self.cfg, request).await?) })
	}
}
