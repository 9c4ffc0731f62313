use sift_domain::{
	auth::{self, AuthorizationContext, CollectionMetadata},
	policy,
};

use crate::{Error, Result, SiftService, with_timeout};

impl SiftService {
	/// Candidate collections the caller may read, in input order.
	///
	/// Metadata is fetched one collection at a time. A failed fetch drops only that candidate.
	pub async fn filter_collections(
		&self,
		auth: Option<&AuthorizationContext>,
		candidates: &[String],
	) -> Vec<String> {
		let Some(auth) = auth.filter(|auth| auth::needs_collection_check(Some(*auth))) else {
			return candidates.to_vec();
		};
		let mut allowed = Vec::with_capacity(candidates.len());

		for collection_id in candidates {
			match self.collection_metadata(collection_id).await {
				Ok(meta) if auth::collection_allowed(auth, &meta) => allowed.push(collection_id.clone()),
				Ok(_) => {
					tracing::debug!(collection_id = %collection_id, "Collection denied by constraints.");
				},
				Err(err) => {
					tracing::warn!(
						collection_id = %collection_id,
						error = %err,
						policy = ?policy::COLLECTION_METADATA,
						"Collection metadata fetch failed; excluding collection."
					);
				},
			}
		}

		allowed
	}

	async fn collection_metadata(&self, collection_id: &str) -> Result<CollectionMetadata> {
		let source = self.providers.collections.as_ref().ok_or_else(|| Error::Config {
			message: "No collection metadata source is configured.".to_string(),
		})?;
		let record = with_timeout(
			"Collection metadata fetch",
			self.cfg.search.timeouts.metadata_ms,
			source.get_collection(collection_id),
		)
		.await?;

		Ok(CollectionMetadata::from_record(&record))
	}
}
