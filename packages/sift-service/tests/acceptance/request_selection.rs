use std::sync::Arc;

use sift_domain::{
	intent::{HookIntent, SearchIntent, SearchType},
	keyword::Keyword,
	request::SearchRequest,
};
use sift_service::{ExecutionMode, HookResponse, Providers, Skip};
use sift_testkit::{FixedKeywords, ScriptedExecutor};

fn with_intent(intent: SearchIntent) -> sift_service::Turn {
	let mut turn = super::searching_turn("support", None);

	turn.hook = Some(HookResponse { search: Some(HookIntent::from_struct(intent)), uses: None });

	turn
}

fn types(requests: &[SearchRequest]) -> Vec<SearchType> {
	requests.iter().map(SearchRequest::search_type).collect()
}

#[tokio::test]
async fn empty_type_list_builds_every_configured_source() {
	let service = super::service_with(Arc::new(ScriptedExecutor::echo()), super::collections());
	let intent = SearchIntent { search_types: Vec::new(), ..SearchIntent::enabled() };
	let plan = service
		.plan(&with_intent(intent), ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert_eq!(types(&plan.requests), vec![SearchType::Web, SearchType::Kb, SearchType::Db]);
}

#[tokio::test]
async fn type_list_restricts_sources() {
	let service = super::service_with(Arc::new(ScriptedExecutor::echo()), super::collections());
	let intent = SearchIntent { search_types: vec![SearchType::Web], ..SearchIntent::enabled() };
	let plan = service
		.plan(&with_intent(intent), ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert_eq!(types(&plan.requests), vec![SearchType::Web]);
}

#[tokio::test]
async fn negative_intent_builds_nothing() {
	let service = super::service_with(Arc::new(ScriptedExecutor::echo()), super::collections());
	let plan = service
		.plan(&with_intent(SearchIntent::disabled()), ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert!(plan.requests.is_empty());
}

#[tokio::test]
async fn unconfigured_sources_are_never_requested() {
	let service = super::service_with(Arc::new(ScriptedExecutor::echo()), super::collections());
	let plan = service
		.plan(&super::searching_turn("library", None), ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert_eq!(types(&plan.requests), vec![SearchType::Kb]);
}

#[tokio::test]
async fn defaults_apply_to_kb_and_db_limits() {
	let service = super::service_with(Arc::new(ScriptedExecutor::echo()), super::collections());
	let plan = service
		.plan(&super::searching_turn("support", None), ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	for request in &plan.requests {
		match request {
			SearchRequest::Web(web) => {
				assert_eq!(web.limit, 10);
				assert_eq!(web.provider.as_deref(), Some("tavily"));
			},
			SearchRequest::Kb(kb) => {
				assert_eq!(kb.limit, 10);
				assert_eq!(kb.threshold, 0.7);
			},
			SearchRequest::Db(db) => assert_eq!(db.limit, 20),
		}
	}
}

#[tokio::test]
async fn keywords_rewrite_only_the_web_query() {
	let keywords = Arc::new(FixedKeywords::new(vec![
		Keyword::new("orders", 0.4),
		Keyword::new("refund", 0.9),
	]));
	let providers = Providers::new(Arc::new(ScriptedExecutor::echo()))
		.with_collections(Arc::new(super::collections()))
		.with_keywords(keywords.clone());
	let service = sift_testkit::service(super::test_config(), providers);
	let plan = service
		.plan(&super::searching_turn("support", None), ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert_eq!(keywords.call_count(), 1);
	assert_eq!(plan.keywords, vec!["refund".to_string(), "orders".to_string()]);
	assert_eq!(plan.query, "refund policy for orders");

	for request in &plan.requests {
		let expected =
			if request.search_type() == SearchType::Web { "refund orders" } else { "refund policy for orders" };

		assert_eq!(request.query(), expected);
	}
}

#[tokio::test]
async fn keyword_skip_and_failure_keep_the_original_query() {
	let failing = Arc::new(FixedKeywords::failing());
	let providers = Providers::new(Arc::new(ScriptedExecutor::echo()))
		.with_collections(Arc::new(super::collections()))
		.with_keywords(failing.clone());
	let service = sift_testkit::service(super::test_config(), providers);
	let mut skipped = super::searching_turn("support", None);

	skipped.options.skip = Skip { search: false, keyword: true };

	let skipped_plan =
		service.plan(&skipped, ExecutionMode::HEADLESS).await.expect("plan").expect("plan");

	assert_eq!(failing.call_count(), 0);
	assert_eq!(skipped_plan.requests[0].query(), "refund policy for orders");

	let failed_plan = service
		.plan(&super::searching_turn("support", None), ExecutionMode::HEADLESS)
		.await
		.expect("plan")
		.expect("plan");

	assert_eq!(failing.call_count(), 1);
	assert!(failed_plan.keywords.is_empty());
	assert_eq!(failed_plan.requests[0].query(), "refund policy for orders");
}

#[tokio::test]
async fn keyword_extraction_requires_uses_keyword() {
	let keywords = Arc::new(FixedKeywords::new(vec![Keyword::new("refund", 1.0)]));
	let providers = Providers::new(Arc::new(ScriptedExecutor::echo()))
		.with_collections(Arc::new(super::collections()))
		.with_keywords(keywords.clone());
	let mut cfg = super::test_config();

	if let Some(support) = cfg.assistants.get_mut("support") {
		support.uses = None;
	}

	let service = sift_testkit::service(cfg, providers);
	let plan = service
		.plan(&super::searching_turn("support", None), ExecutionMode::HEADLESS)
		.await
		.expect("plan")
		.expect("plan");

	assert_eq!(keywords.call_count(), 0);
	assert_eq!(plan.requests[0].query(), "refund policy for orders");
}

#[tokio::test]
async fn zero_overrides_use_default_limits_and_threshold() {
	let cfg = sift_testkit::config(
		r#"
[service]
log_level = "debug"

[assistants.zeroes]
kb = { collections = ["team1-coll"] }
db = { models = ["orders"] }

[assistants.zeroes.search]
kb = { threshold = 0.0 }
db = { max_results = 0 }
"#,
	);
	let providers = Providers::new(Arc::new(ScriptedExecutor::echo()))
		.with_collections(Arc::new(super::collections()));
	let service = sift_testkit::service(cfg, providers);
	let plan = service
		.plan(&super::searching_turn("zeroes", None), ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert_eq!(types(&plan.requests), vec![SearchType::Kb, SearchType::Db]);

	for request in &plan.requests {
		match request {
			SearchRequest::Kb(kb) => {
				assert_eq!(kb.limit, 10);
				assert_eq!(kb.threshold, 0.7);
			},
			SearchRequest::Db(db) => assert_eq!(db.limit, 20),
			SearchRequest::Web(_) => panic!("No web search is configured."),
		}
	}
}
