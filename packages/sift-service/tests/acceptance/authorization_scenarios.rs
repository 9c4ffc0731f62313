use std::sync::Arc;

use serde_json::json;

use sift_domain::{
	auth::{self, AuthorizationContext, Constraints},
	request::SearchRequest,
};
use sift_service::ExecutionMode;
use sift_testkit::{ScriptedExecutor, StaticCollections};

fn kb_collections(requests: &[SearchRequest]) -> Option<Vec<String>> {
	requests.iter().find_map(|request| match request {
		SearchRequest::Kb(kb) => Some(kb.collections.clone()),
		_ => None,
	})
}

fn candidates() -> Vec<String> {
	["team1-coll", "team2-coll", "a-team2-coll"].map(str::to_string).to_vec()
}

#[tokio::test]
async fn team_member_sees_only_own_team_collections() {
	let service = super::service_with(Arc::new(ScriptedExecutor::echo()), super::collections());
	let turn = super::searching_turn("support", Some(AuthorizationContext::team_only("A", "team1")));
	let plan = service
		.plan(&turn, ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert_eq!(kb_collections(&plan.requests), Some(vec!["team1-coll".to_string()]));
}

#[tokio::test]
async fn owner_sees_own_collections_across_teams() {
	let service = super::service_with(Arc::new(ScriptedExecutor::echo()), super::collections());
	let turn = super::searching_turn("library", Some(AuthorizationContext::owner_only("A")));
	let plan = service
		.plan(&turn, ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert_eq!(
		kb_collections(&plan.requests),
		Some(vec!["team1-coll".to_string(), "a-team2-coll".to_string()])
	);
}

#[tokio::test]
async fn unrestricted_callers_skip_metadata_lookups() {
	let collections = Arc::new(super::collections());
	let service = sift_testkit::service(
		super::test_config(),
		sift_service::Providers::new(Arc::new(ScriptedExecutor::echo()))
			.with_collections(collections.clone()),
	);
	let unconstrained = AuthorizationContext::new("A", "team1", Constraints::default());

	assert_eq!(service.filter_collections(None, &candidates()).await, candidates());
	assert_eq!(service.filter_collections(Some(&unconstrained), &candidates()).await, candidates());
	assert!(collections.calls().is_empty());
}

#[tokio::test]
async fn metadata_failure_drops_only_that_collection() {
	let collections = super::collections()
		.with("shared", json!({ "public": "1" }))
		.failing("team1-coll");
	let service = super::service_with(Arc::new(ScriptedExecutor::echo()), collections);
	let auth = AuthorizationContext::team_only("A", "team1");
	let input = ["team1-coll", "shared", "missing"].map(str::to_string).to_vec();

	assert_eq!(service.filter_collections(Some(&auth), &input).await, vec!["shared".to_string()]);
}

#[tokio::test]
async fn missing_metadata_source_denies_every_candidate() {
	let service = sift_testkit::service(
		super::test_config(),
		sift_service::Providers::new(Arc::new(ScriptedExecutor::echo())),
	);
	let turn = super::searching_turn("support", Some(AuthorizationContext::owner_only("A")));
	let plan = service
		.plan(&turn, ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert_eq!(kb_collections(&plan.requests), None);
	assert_eq!(plan.requests.len(), 2);
}

#[tokio::test]
async fn filtering_is_repeatable() {
	let service = super::service_with(Arc::new(ScriptedExecutor::echo()), super::collections());
	let auth = AuthorizationContext::team_only("A", "team1");
	let first = service.filter_collections(Some(&auth), &candidates()).await;
	let second = service.filter_collections(Some(&auth), &candidates()).await;

	assert_eq!(first, second);
}

#[tokio::test]
async fn inapplicable_constraints_pass_everything_through() {
	let collections = Arc::new(StaticCollections::new());
	let service = sift_testkit::service(
		super::test_config(),
		sift_service::Providers::new(Arc::new(ScriptedExecutor::echo()))
			.with_collections(collections.clone()),
	);

	for context in [AuthorizationContext::team_only("A", ""), AuthorizationContext::owner_only("")] {
		assert_eq!(auth::row_predicate(Some(&context)), None);
		assert_eq!(service.filter_collections(Some(&context), &candidates()).await, candidates());
	}

	assert!(collections.calls().is_empty());
}

#[tokio::test]
async fn db_request_carries_row_predicate_only_when_constrained() {
	let service = super::service_with(Arc::new(ScriptedExecutor::echo()), super::collections());
	let constrained = super::searching_turn("support", Some(AuthorizationContext::team_only("A", "team1")));
	let open = super::searching_turn("support", None);
	let predicate_of = |requests: &[SearchRequest]| {
		requests.iter().find_map(|request| match request {
			SearchRequest::Db(db) => Some(db.predicate.clone()),
			_ => None,
		})
	};
	let constrained_plan =
		service.plan(&constrained, ExecutionMode::HEADLESS).await.expect("plan").expect("plan");
	let open_plan = service.plan(&open, ExecutionMode::HEADLESS).await.expect("plan").expect("plan");

	assert_eq!(
		predicate_of(&constrained_plan.requests),
		Some(auth::row_predicate(Some(&AuthorizationContext::team_only("A", "team1"))))
	);
	assert_eq!(predicate_of(&open_plan.requests), Some(None));
}
