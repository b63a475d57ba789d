use async_trait::async_trait;
use anyhow::{Result, anyhow};
use chainflow::compiler::aggregator::ExecutionPayload;
use chainflow::dsl::{NodeData, PipelineKind};
use chainflow::error::{ChainError, ValidationError};
use chainflow::nodes::Vocabulary;
use chainflow::runtime::executor::{ExecutionResult, Executor};
use chainflow::runtime::session::{PipelineSession, RunError, RunStatus};
use chainflow::runtime::storage::{BackupStore, InMemoryBackupStore};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy)]
enum Behaviour {
    Succeed,
    Reject,
    Unreachable,
}

#[derive(Debug)]
struct MockExecutor {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl MockExecutor {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self { behaviour, calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn execute(&self, pipeline: PipelineKind, payload: &ExecutionPayload) -> Result<ExecutionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Succeed => Ok(ExecutionResult::ok(json!({
                "pipeline": pipeline.as_str(),
                "echo": payload,
            }))),
            Behaviour::Reject => Ok(ExecutionResult::failed("dataset is empty")),
            Behaviour::Unreachable => Err(anyhow!("connection refused")),
        }
    }
}

fn session(executor: Arc<MockExecutor>, backup: Arc<InMemoryBackupStore>) -> PipelineSession {
    let vocabulary = Arc::new(Vocabulary::for_kind(PipelineKind::Preprocessing));
    PipelineSession::new(vocabulary, executor, backup).unwrap()
}

/// Start -> Import -> Resize -> End through the session's own API.
fn build_chain(session: &mut PipelineSession) {
    session.relink("start", "end").unwrap();
    session.insert_with_id("imp", "Import", Some("start")).unwrap();
    session
        .update_data("imp", NodeData::Import { dataset_id: Some("ds-1".to_string()) })
        .unwrap();
    session.insert_with_id("r1", "Resize", Some("imp")).unwrap();
}

#[tokio::test]
async fn test_validation_tracks_mutations() {
    let mut session = session(MockExecutor::new(Behaviour::Succeed), Arc::new(InMemoryBackupStore::new()));
    assert!(!session.can_run());
    assert_eq!(session.validation(), &Err(ValidationError::NoCompleteChain));

    session.relink("start", "end").unwrap();
    assert_eq!(
        session.validation(),
        &Err(ValidationError::Domain("Add an Import node to choose the dataset to preprocess".to_string()))
    );

    session.insert_with_id("imp", "Import", Some("start")).unwrap();
    session.insert_with_id("r1", "Resize", Some("imp")).unwrap();
    assert!(session.can_run());
    assert_eq!(
        session.validation().as_ref().unwrap(),
        &vec!["start".to_string(), "imp".to_string(), "r1".to_string(), "end".to_string()]
    );

    session.disconnect("imp").unwrap();
    assert!(!session.can_run());
}

#[tokio::test]
async fn test_failed_mutation_leaves_state_alone() {
    let mut session = session(MockExecutor::new(Behaviour::Succeed), Arc::new(InMemoryBackupStore::new()));
    build_chain(&mut session);
    let before = session.store().snapshot();

    assert_eq!(session.remove("start").unwrap_err(), ChainError::Immortal("start".to_string()));
    assert!(session.insert("Import", None).is_err());
    assert_eq!(session.store().snapshot(), before);
    assert!(session.can_run());
}

#[tokio::test]
async fn test_run_dispatches_payload_and_caches_artifact() {
    let executor = MockExecutor::new(Behaviour::Succeed);
    let mut session = session(executor.clone(), Arc::new(InMemoryBackupStore::new()));
    build_chain(&mut session);

    let result = session.run("end").await.unwrap();
    assert!(result.success);
    assert_eq!(result.result["pipeline"], json!("preprocessing"));
    assert_eq!(result.result["echo"]["resize"], json!(28));
    assert_eq!(session.status(), &RunStatus::Succeeded);
    assert_eq!(executor.calls(), 1);

    let cache = session.cache();
    assert_eq!(cache.processed_for(), Some(&json!({ "kind": "import", "dataset_id": "ds-1" })));
    assert_eq!(cache.processed_with(), Some(&session.payload().unwrap()));

    // Same chain: served from the cache
    let again = session.run("end").await.unwrap();
    assert_eq!(again.result, result.result);
    assert_eq!(executor.calls(), 1);
    assert_eq!(session.status(), &RunStatus::Succeeded);
}

#[tokio::test]
async fn test_changing_options_invalidates_artifact() {
    let executor = MockExecutor::new(Behaviour::Succeed);
    let mut session = session(executor.clone(), Arc::new(InMemoryBackupStore::new()));
    build_chain(&mut session);
    session.run("end").await.unwrap();
    assert!(session.cache().artifact().is_some());

    // Writing the same value keeps the artifact
    session.update_data("r1", NodeData::Resize { size: 28 }).unwrap();
    assert!(session.cache().artifact().is_some());

    session.update_data("r1", NodeData::Resize { size: 64 }).unwrap();
    assert!(session.cache().artifact().is_none());
    assert!(session.cache().processed_with().is_none());

    session.run("end").await.unwrap();
    assert_eq!(executor.calls(), 2);

    // Deleting the source drops it as well
    session.remove("imp").unwrap();
    assert!(session.cache().artifact().is_none());
}

#[tokio::test]
async fn test_run_requires_valid_chain() {
    let executor = MockExecutor::new(Behaviour::Succeed);
    let mut session = session(executor.clone(), Arc::new(InMemoryBackupStore::new()));

    let err = session.run("end").await.unwrap_err();
    assert!(matches!(err, RunError::Validation(ValidationError::NoCompleteChain)));
    assert_eq!(executor.calls(), 0);
    assert_eq!(session.status(), &RunStatus::Idle);
}

#[tokio::test]
async fn test_rejected_run_backs_up_payload() {
    let backup = Arc::new(InMemoryBackupStore::new());
    let mut session = session(MockExecutor::new(Behaviour::Reject), backup.clone());
    build_chain(&mut session);

    let result = session.run("end").await.unwrap();
    assert!(!result.success);
    assert_eq!(session.status(), &RunStatus::Failed("dataset is empty".to_string()));
    assert!(session.cache().artifact().is_none());

    let saved = backup.load_payload(PipelineKind::Preprocessing).await.unwrap();
    assert_eq!(saved, Some(session.payload().unwrap()));
}

#[tokio::test]
async fn test_unreachable_service_backs_up_payload() {
    let backup = Arc::new(InMemoryBackupStore::new());
    let mut session = session(MockExecutor::new(Behaviour::Unreachable), backup.clone());
    build_chain(&mut session);
    let before = session.store().snapshot();

    let err = session.run("end").await.unwrap_err();
    assert!(matches!(err, RunError::Dispatch(ref msg) if msg.contains("connection refused")));
    assert!(matches!(session.status(), RunStatus::Failed(_)));
    assert_eq!(session.store().snapshot(), before);

    let restored = session.restore_backup().await.unwrap().unwrap();
    assert_eq!(restored.get("resize"), Some(&json!(28)));
}

#[tokio::test]
async fn test_layout_snapshot_restores_session() {
    let mut session = session(MockExecutor::new(Behaviour::Succeed), Arc::new(InMemoryBackupStore::new()));
    build_chain(&mut session);
    let layout = session.layout("page-1");
    assert_eq!(layout.pipeline, PipelineKind::Preprocessing);

    let vocabulary = Arc::new(Vocabulary::for_kind(layout.pipeline));
    let restored = PipelineSession::from_nodes(
        vocabulary,
        layout.nodes.clone(),
        MockExecutor::new(Behaviour::Succeed),
        Arc::new(InMemoryBackupStore::new()),
    )
    .unwrap();
    assert!(restored.can_run());
    assert_eq!(restored.store().snapshot(), layout.nodes);
    assert_eq!(restored.payload().unwrap(), session.payload().unwrap());
}
