use chainflow::compiler::loader::{load_layout_from_yaml, save_layout_to_yaml};
use chainflow::config::Settings;
use chainflow::dsl::{Layout, NodeData, PipelineKind};
use chainflow::nodes::Vocabulary;
use serde_json::json;
use std::fs;
use std::path::Path;

#[test]
fn test_load_simple_yaml_layout() {
    let yaml_content = r#"
id: "yaml-layout"
pipeline: preprocessing
nodes:
  - id: "start"
    type: "Start"
    data: { kind: empty }
    successor: "imp"
  - id: "imp"
    type: "Import"
    data: { kind: import, dataset_id: "ds-7" }
    predecessor: "start"
    successor: "end"
  - id: "end"
    type: "End"
    data: { kind: empty }
    predecessor: "imp"
"#;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("layout.yaml");
    fs::write(&file_path, yaml_content).expect("Failed to write temp file");

    let layout = load_layout_from_yaml(&file_path).expect("Failed to load layout from YAML");
    assert_eq!(layout.id, "yaml-layout");
    assert_eq!(layout.pipeline, PipelineKind::Preprocessing);
    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.nodes[1].data, NodeData::Import { dataset_id: Some("ds-7".to_string()) });

    let vocabulary = Vocabulary::for_kind(layout.pipeline);
    let store = vocabulary.restore(layout.nodes).expect("Layout should restore");
    assert!(vocabulary.validate(&store).is_ok());
}

#[test]
fn test_save_then_load_preserves_nodes() {
    let vocabulary = Vocabulary::for_kind(PipelineKind::Training);
    let mut store = vocabulary.new_store().unwrap();
    store.relink("start", "end").unwrap();
    store.insert_with_id("imp", "Import", Some("start")).unwrap();
    store.insert_with_id("lr", "LearningRate", Some("imp")).unwrap();
    store.insert_with_id("stray", "Augment", None).unwrap();

    let layout = Layout {
        id: "train-page".to_string(),
        pipeline: PipelineKind::Training,
        nodes: store.snapshot(),
    };

    let temp_dir = tempfile::tempdir().unwrap();
    let file_path = temp_dir.path().join("train.yaml");
    save_layout_to_yaml(&layout, &file_path).unwrap();

    let loaded = load_layout_from_yaml(&file_path).unwrap();
    assert_eq!(loaded, layout);
}

#[test]
fn test_missing_file_reports_path() {
    let err = load_layout_from_yaml("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.yaml"));
}

#[test]
fn test_bundled_examples() {
    let layout = load_layout_from_yaml(Path::new("dsl_examples").join("preprocessing.yaml")).unwrap();
    let vocabulary = Vocabulary::for_kind(layout.pipeline);
    let store = vocabulary.restore(layout.nodes).unwrap();
    let run = vocabulary.validate(&store).unwrap();
    let payload = vocabulary.aggregate(&run, "end").unwrap();
    assert_eq!(payload.get("resize"), Some(&json!(16)));
    assert_eq!(payload.get("grayscale"), Some(&json!(true)));
    // The unlinked Flip is not part of the run
    assert_eq!(payload.get("flip"), Some(&json!(false)));

    let layout = load_layout_from_yaml(Path::new("dsl_examples").join("prediction.yaml")).unwrap();
    let vocabulary = Vocabulary::for_kind(layout.pipeline);
    let store = vocabulary.restore(layout.nodes).unwrap();
    let run = vocabulary.validate(&store).unwrap();
    let payload = vocabulary.aggregate(&run, "end").unwrap();
    assert_eq!(payload.get("model"), Some(&json!("cnn")));
    assert_eq!(payload.get("checkpoint"), Some(&json!("digits-v2")));
    assert_eq!(payload.get("resize"), Some(&json!(28)));
}

#[test]
fn test_settings_defaults_and_overrides() {
    let defaults = Settings::default();
    assert_eq!(defaults.executor.endpoint, "http://127.0.0.1:8000");
    assert_eq!(defaults.executor.timeout_secs, 30);
    assert!(defaults.storage.redis_url.is_none());
    assert_eq!(defaults.log_level(), tracing::Level::INFO);

    let temp_dir = tempfile::tempdir().unwrap();
    let file_path = temp_dir.path().join("settings.yaml");
    fs::write(&file_path, "executor:\n  timeout_secs: 5\nlog_level: debug\n").unwrap();

    let settings = Settings::load(&file_path).unwrap();
    assert_eq!(settings.executor.timeout_secs, 5);
    assert_eq!(settings.executor.endpoint, "http://127.0.0.1:8000");
    assert_eq!(settings.log_level(), tracing::Level::DEBUG);

    let bundled = Settings::load(Path::new("dsl_examples").join("settings.yaml")).unwrap();
    assert_eq!(bundled.executor.timeout_secs, 60);
}
