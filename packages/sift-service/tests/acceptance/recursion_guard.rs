use std::sync::{
	Arc, Mutex, OnceLock, Weak,
	atomic::{AtomicUsize, Ordering},
};

use serde_json::json;
use sift_domain::message::Message;
use sift_service::{
	BoxFuture, ClassifierAgent, ClassifierAnswer, ExecutionMode, Providers, Result, SiftService, Turn,
};
use sift_testkit::{ScriptedClassifier, ScriptedExecutor};

/// Classifier that, like a real agent, tries to run auto search for its own invocation.
#[derive(Default)]
struct ReentrantClassifier {
	service: OnceLock<Weak<SiftService>>,
	turn: Turn,
	invocations: AtomicUsize,
	nested: Mutex<Vec<bool>>,
}
impl ClassifierAgent for ReentrantClassifier {
	fn invoke<'a>(
		&'a self,
		_messages: &'a [Message],
		mode: ExecutionMode,
	) -> BoxFuture<'a, Result<ClassifierAnswer>> {
		Box::pin(async move {
			self.invocations.fetch_add(1, Ordering::SeqCst);

			if let Some(service) = self.service.get().and_then(Weak::upgrade) {
				let nested = service.run_auto_search(&self.turn, mode).await;

				self.nested.lock().unwrap_or_else(|err| err.into_inner()).push(nested.is_some());
			}

			Ok(ClassifierAnswer {
				next: Some(json!({ "need_search": true, "search_types": ["kb"] })),
				completion: None,
			})
		})
	}
}

fn classified_turn() -> Turn {
	Turn {
		assistant_id: "support".to_string(),
		messages: vec![Message::user("refund policy for orders")],
		..Turn::default()
	}
}

#[tokio::test]
async fn classifier_cannot_trigger_nested_search() {
	let classifier = Arc::new(ReentrantClassifier { turn: classified_turn(), ..Default::default() });
	let executor = Arc::new(ScriptedExecutor::echo());
	let providers = Providers::new(executor.clone())
		.with_classifier(classifier.clone())
		.with_collections(Arc::new(super::collections()));
	let service = Arc::new(sift_testkit::service(super::test_config(), providers));

	let _ = classifier.service.set(Arc::downgrade(&service));

	let context = service.run_auto_search(&classified_turn(), ExecutionMode::HEADLESS).await;

	assert!(context.is_some());
	assert_eq!(classifier.invocations.load(Ordering::SeqCst), 1);
	assert_eq!(*classifier.nested.lock().expect("nested results"), vec![false]);
	assert_eq!(executor.batches().len(), 1);
}

#[tokio::test]
async fn classifier_is_invoked_in_classifier_mode() {
	let classifier = Arc::new(ScriptedClassifier::structured(json!({ "need_search": false })));
	let providers = Providers::new(Arc::new(ScriptedExecutor::echo())).with_classifier(classifier.clone());
	let service = sift_testkit::service(super::test_config(), providers);

	service.run_auto_search(&classified_turn(), ExecutionMode::INTERACTIVE).await;

	assert_eq!(classifier.modes(), vec![ExecutionMode::CLASSIFIER]);
}

#[tokio::test]
async fn classifier_mode_never_searches() {
	let classifier = Arc::new(ScriptedClassifier::structured(json!({ "need_search": true })));
	let executor = Arc::new(ScriptedExecutor::echo());
	let providers = Providers::new(executor.clone()).with_classifier(classifier.clone());
	let service = sift_testkit::service(super::test_config(), providers);

	assert!(service.run_auto_search(&classified_turn(), ExecutionMode::CLASSIFIER).await.is_none());
	assert!(
		service
			.plan(&super::searching_turn("support", None), ExecutionMode::CLASSIFIER)
			.await
			.expect("plan")
			.is_none()
	);
	assert_eq!(classifier.call_count(), 0);
	assert!(executor.batches().is_empty());
}
