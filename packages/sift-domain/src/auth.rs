//! Collection-level and row-level access decisions for a caller's team/owner constraints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{loose, predicate::Predicate};

pub const PUBLIC_FIELD: &str = "public";
pub const SHARE_FIELD: &str = "share";
pub const TEAM_FIELD: &str = "__yao_team_id";
pub const CREATOR_FIELD: &str = "__yao_created_by";
pub const SHARE_TEAM: &str = "team";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
	#[serde(default)]
	pub team_only: bool,
	#[serde(default)]
	pub owner_only: bool,
}

/// Attributes decided upstream by the identity layer. `None` at call sites means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationContext {
	#[serde(default)]
	pub user_id: String,
	#[serde(default)]
	pub team_id: String,
	#[serde(default)]
	pub constraints: Constraints,
}
impl AuthorizationContext {
	pub fn new(user_id: &str, team_id: &str, constraints: Constraints) -> Self {
		Self { user_id: user_id.to_string(), team_id: team_id.to_string(), constraints }
	}

	pub fn team_only(user_id: &str, team_id: &str) -> Self {
		Self::new(user_id, team_id, Constraints { team_only: true, owner_only: false })
	}

	pub fn owner_only(user_id: &str) -> Self {
		Self::new(user_id, "", Constraints { team_only: false, owner_only: true })
	}

	pub fn enforces_any(&self) -> bool {
		self.constraints.team_only || self.constraints.owner_only
	}

	/// `team_only` with a team id to compare against.
	pub fn team_applies(&self) -> bool {
		self.constraints.team_only && !self.team_id.is_empty()
	}

	/// `owner_only` with a user id to compare against.
	pub fn owner_applies(&self) -> bool {
		self.constraints.owner_only && !self.user_id.is_empty()
	}
}

/// Whether collection candidates have to be checked one by one. Constraints whose identifier
/// is empty do not apply.
pub fn needs_collection_check(auth: Option<&AuthorizationContext>) -> bool {
	auth.map(|auth| auth.team_applies() || auth.owner_applies()).unwrap_or(false)
}

/// Access-relevant attributes of a knowledge-base collection, decoded once from its raw record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionMetadata {
	pub public: bool,
	pub share: Option<String>,
	pub team_id: Option<String>,
	pub created_by: Option<String>,
}
impl CollectionMetadata {
	pub fn from_record(record: &Value) -> Self {
		let Some(map) = record.as_object() else {
			return Self::default();
		};
		let text = |key| loose::nested_or_top(map, key).and_then(loose::text).filter(|v| !v.is_empty());

		Self {
			public: loose::nested_or_top(map, PUBLIC_FIELD).map(loose::truthy).unwrap_or(false),
			share: text(SHARE_FIELD),
			team_id: text(TEAM_FIELD),
			created_by: text(CREATOR_FIELD),
		}
	}

	fn created_by_user(&self, user_id: &str) -> bool {
		!user_id.is_empty() && self.created_by.as_deref() == Some(user_id)
	}
}

/// Grants access when the collection is public or one of the caller's applicable constraints
/// accepts it. A context where no constraint applies is open access.
pub fn collection_allowed(auth: &AuthorizationContext, meta: &CollectionMetadata) -> bool {
	if !needs_collection_check(Some(auth)) || meta.public {
		return true;
	}

	let team_grant = auth.team_applies()
		&& meta.team_id.as_deref() == Some(auth.team_id.as_str())
		&& (meta.created_by_user(&auth.user_id) || meta.share.as_deref() == Some(SHARE_TEAM));
	let owner_grant = auth.owner_applies() && meta.created_by_user(&auth.user_id);

	team_grant || owner_grant
}

/// Compiles the row filter for structured queries.
///
/// Returns `None` when no constraint applies, including a required identifier being empty.
/// `team_only` wins when both flags are set.
pub fn row_predicate(auth: Option<&AuthorizationContext>) -> Option<Predicate> {
	let auth = auth?;

	if auth.constraints.team_only {
		if auth.team_id.is_empty() {
			return None;
		}

		return Some(Predicate::group(vec![
			Predicate::eq(PUBLIC_FIELD, true),
			Predicate::group(vec![
				Predicate::eq(TEAM_FIELD, auth.team_id.as_str()),
				Predicate::group(vec![
					Predicate::eq(CREATOR_FIELD, auth.user_id.as_str()),
					Predicate::eq(SHARE_FIELD, SHARE_TEAM).or(),
				]),
			])
			.or(),
		]));
	}
	if auth.constraints.owner_only {
		if auth.user_id.is_empty() {
			return None;
		}

		return Some(Predicate::group(vec![
			Predicate::eq(PUBLIC_FIELD, true),
			Predicate::group(vec![
				Predicate::is_null(TEAM_FIELD),
				Predicate::eq(CREATOR_FIELD, auth.user_id.as_str()),
			])
			.or(),
		]));
	}

	None
}
