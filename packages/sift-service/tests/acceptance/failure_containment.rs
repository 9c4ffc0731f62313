use std::{sync::Arc, time::Instant};

use sift_domain::{intent::SearchIntent, message::Message};
use sift_service::{Error, ExecutionMode, OutputSignal, Providers, Turn};
use sift_testkit::{
	RecordingAudit, RecordingOutput, ScriptedClassifier, ScriptedExecutor, StaticCollections,
};

/// Turn with no hook so the classifier decides.
fn classified_turn() -> Turn {
	Turn {
		assistant_id: "support".to_string(),
		request_id: "req-2".to_string(),
		chat_id: "chat-2".to_string(),
		messages: vec![Message::user("what is the refund window?")],
		..Turn::default()
	}
}

fn service_with_classifier(
	classifier: Arc<ScriptedClassifier>,
	executor: Arc<ScriptedExecutor>,
) -> sift_service::SiftService {
	let providers = Providers::new(executor)
		.with_classifier(classifier)
		.with_collections(Arc::new(super::collections()));

	sift_testkit::service(super::test_config(), providers)
}

#[tokio::test]
async fn unparsable_classifier_output_means_no_search() {
	let classifier = Arc::new(ScriptedClassifier::completion("I think you should search, maybe."));
	let executor = Arc::new(ScriptedExecutor::echo());
	let service = service_with_classifier(classifier.clone(), executor.clone());
	let plan = service
		.plan(&classified_turn(), ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert_eq!(classifier.call_count(), 1);
	assert_eq!(plan.intent, SearchIntent::no_search());
	assert!(plan.requests.is_empty());
	assert!(service.run_auto_search(&classified_turn(), ExecutionMode::HEADLESS).await.is_none());
	assert!(executor.batches().is_empty());
}

#[tokio::test]
async fn classifier_errors_mean_no_search() {
	let classifier = Arc::new(ScriptedClassifier::failing("model overloaded"));
	let service = service_with_classifier(classifier, Arc::new(ScriptedExecutor::echo()));
	let plan = service
		.plan(&classified_turn(), ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert_eq!(plan.intent, SearchIntent::no_search());
}

#[tokio::test]
async fn hanging_classifier_is_bounded_by_its_timeout() {
	let classifier = Arc::new(ScriptedClassifier::hanging());
	let service = service_with_classifier(classifier, Arc::new(ScriptedExecutor::echo()));
	let started = Instant::now();
	let plan = service
		.plan(&classified_turn(), ExecutionMode::HEADLESS)
		.await
		.expect("Planning failed.")
		.expect("Expected a plan.");

	assert_eq!(plan.intent, SearchIntent::no_search());
	assert!(started.elapsed().as_secs() < 5);
}

#[tokio::test]
async fn executor_failure_is_contained_and_recorded_once() {
	let audit = Arc::new(RecordingAudit::new());
	let output = Arc::new(RecordingOutput::new());
	let providers = Providers::new(Arc::new(ScriptedExecutor::failing("gateway unreachable")))
		.with_collections(Arc::new(super::collections()))
		.with_audit(audit.clone())
		.with_output(output.clone());
	let service = sift_testkit::service(super::test_config(), providers);
	let context =
		service.run_auto_search(&super::searching_turn("support", None), ExecutionMode::INTERACTIVE).await;

	assert!(context.is_none());

	let records = audit.records();

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].request_id, "req-1");
	assert_eq!(records[0].query, "refund policy for orders");
	assert!(records[0].references.is_empty());

	let error = records[0].error.clone().expect("Failure record must carry the error.");

	assert!(error.contains("gateway unreachable"), "{error}");

	let events = output.events();

	assert_eq!(events.len(), 2);
	assert!(matches!(events[0].1, OutputSignal::SearchLoading { .. }));
	assert_eq!(events[1], ("msg-1".to_string(), OutputSignal::SearchFailed { error }));
}

#[tokio::test]
async fn empty_results_are_recorded_without_references() {
	let audit = Arc::new(RecordingAudit::new());
	let providers = Providers::new(Arc::new(ScriptedExecutor::empty()))
		.with_collections(Arc::new(super::collections()))
		.with_audit(audit.clone());
	let service = sift_testkit::service(super::test_config(), providers);
	let context =
		service.run_auto_search(&super::searching_turn("support", None), ExecutionMode::HEADLESS).await;

	assert!(context.is_none());

	let records = audit.records();

	assert_eq!(records.len(), 1);
	assert!(records[0].error.is_none());
	assert!(records[0].references.is_empty());
	assert!(records[0].markup.is_empty());
}

#[tokio::test]
async fn audit_failure_does_not_drop_references() {
	let providers = Providers::new(Arc::new(ScriptedExecutor::echo()))
		.with_collections(Arc::new(super::collections()))
		.with_audit(Arc::new(RecordingAudit::failing()));
	let service = sift_testkit::service(super::test_config(), providers);
	let context = service
		.run_auto_search(&super::searching_turn("support", None), ExecutionMode::HEADLESS)
		.await
		.expect("References should survive a failed audit write.");

	assert_eq!(context.references.len(), 3);
}

#[tokio::test]
async fn unknown_assistant_fails_planning_but_not_the_turn() {
	let audit = Arc::new(RecordingAudit::new());
	let providers = Providers::new(Arc::new(ScriptedExecutor::echo()))
		.with_collections(Arc::new(StaticCollections::new()))
		.with_audit(audit.clone());
	let service = sift_testkit::service(super::test_config(), providers);
	let turn = super::searching_turn("ghost", None);

	assert!(matches!(
		service.plan(&turn, ExecutionMode::HEADLESS).await,
		Err(Error::NotFound { .. })
	));
	assert!(service.run_auto_search(&turn, ExecutionMode::HEADLESS).await.is_none());
	assert!(audit.records().is_empty());
}
