use chainflow::compiler::aggregator::{aggregate, OptionRules, SOURCE_KEY};
use chainflow::dsl::builder::ChainBuilder;
use chainflow::dsl::{NodeData, PipelineKind};
use chainflow::error::AggregateError;
use chainflow::nodes::Vocabulary;
use chainflow::runtime::chain::ChainStore;
use serde_json::json;

fn import_data() -> NodeData {
    NodeData::Import { dataset_id: Some("ds-42".to_string()) }
}

fn preprocessing_store(middle: &[(&str, &str, Option<NodeData>)]) -> (Vocabulary, ChainStore) {
    let vocabulary = Vocabulary::for_kind(PipelineKind::Preprocessing);
    let mut builder = ChainBuilder::new(vocabulary.registry.clone())
        .start("start")
        .node_with("imp", "Import", import_data());
    let mut ids = vec!["start", "imp"];
    for (id, tag, data) in middle {
        builder = match data {
            Some(data) => builder.node_with(id, tag, data.clone()),
            None => builder.node(id, tag),
        };
        ids.push(*id);
    }
    ids.push("end");
    let store = builder.end("end").chain(&ids).build().unwrap();
    (vocabulary, store)
}

#[test]
fn test_last_resize_wins() {
    let (vocabulary, store) = preprocessing_store(&[
        ("r1", "Resize", Some(NodeData::Resize { size: 16 })),
        ("r2", "Resize", Some(NodeData::Resize { size: 32 })),
    ]);
    let run = vocabulary.validate(&store).unwrap();
    let payload = vocabulary.aggregate(&run, "end").unwrap();
    assert_eq!(payload.get("resize"), Some(&json!(32)));
}

#[test]
fn test_grayscale_is_or_not_count() {
    let (vocabulary, none) = preprocessing_store(&[]);
    let (_, one) = preprocessing_store(&[("g1", "Grayscale", None)]);
    let (_, two) = preprocessing_store(&[
        ("g1", "Grayscale", None),
        ("r1", "Resize", None),
        ("g2", "Grayscale", None),
    ]);

    let flag = |store: &ChainStore| {
        let run = vocabulary.validate(store).unwrap();
        vocabulary.aggregate(&run, "end").unwrap().get("grayscale").cloned()
    };
    assert_eq!(flag(&none), Some(json!(false)));
    assert_eq!(flag(&one), Some(json!(true)));
    assert_eq!(flag(&two), Some(json!(true)));
}

#[test]
fn test_source_data_is_attached() {
    let (vocabulary, store) = preprocessing_store(&[]);
    let run = vocabulary.validate(&store).unwrap();
    let payload = vocabulary.aggregate(&run, "end").unwrap();
    assert_eq!(payload.get(SOURCE_KEY), Some(&serde_json::to_value(import_data()).unwrap()));
    assert_eq!(payload.source(), payload.get("source"));
}

#[test]
fn test_options_before_the_source_are_ignored() {
    let vocabulary = Vocabulary::for_kind(PipelineKind::Preprocessing);
    let store = ChainBuilder::new(vocabulary.registry.clone())
        .start("start")
        .node_with("r1", "Resize", NodeData::Resize { size: 8 })
        .node("g1", "Grayscale")
        .node_with("imp", "Import", import_data())
        .node("flip", "Flip")
        .end("end")
        .chain(&["start", "r1", "g1", "imp", "flip", "end"])
        .build()
        .unwrap();

    let run = vocabulary.validate(&store).unwrap();
    let payload = vocabulary.aggregate(&run, "end").unwrap();
    assert!(!payload.contains_key("resize"));
    assert_eq!(payload.get("grayscale"), Some(&json!(false)));
    assert_eq!(payload.get("flip"), Some(&json!(true)));
}

#[test]
fn test_crop_sets_two_keys() {
    let (vocabulary, store) = preprocessing_store(&[(
        "c1",
        "Crop",
        Some(NodeData::Crop { width: 20, height: 10 }),
    )]);
    let run = vocabulary.validate(&store).unwrap();
    let payload = vocabulary.aggregate(&run, "end").unwrap();
    assert_eq!(payload.get("crop_width"), Some(&json!(20)));
    assert_eq!(payload.get("crop_height"), Some(&json!(10)));
}

#[test]
fn test_trigger_must_be_terminal() {
    let (vocabulary, store) = preprocessing_store(&[("r1", "Resize", None)]);
    let run = vocabulary.validate(&store).unwrap();

    assert!(matches!(
        vocabulary.aggregate(&run, "r1").unwrap_err(),
        AggregateError::NotTerminal(id) if id == "r1"
    ));
    assert!(matches!(
        vocabulary.aggregate(&run, "ghost").unwrap_err(),
        AggregateError::UnknownNode(id) if id == "ghost"
    ));
}

#[test]
fn test_missing_source() {
    let (vocabulary, store) = preprocessing_store(&[]);
    let run = vocabulary.validate(&store).unwrap();

    // Same run, but nothing counts as a source.
    let err = aggregate(&run, "end", &["DoodlePad"], &OptionRules::new()).unwrap_err();
    assert!(matches!(err, AggregateError::MissingSource(id) if id == "end"));
}

#[test]
fn test_nearest_source_wins_in_prediction() {
    let vocabulary = Vocabulary::for_kind(PipelineKind::Prediction);
    let store = ChainBuilder::new(vocabulary.registry.clone())
        .start("start")
        .node_with("imp", "Import", import_data())
        .node_with("r1", "Resize", NodeData::Resize { size: 64 })
        .node_with("pad", "DoodlePad", NodeData::DoodlePad { image: Some("abc".to_string()) })
        .node("model", "Model")
        .end("end")
        .chain(&["start", "imp", "r1", "pad", "model", "end"])
        .build()
        .unwrap();

    let run = vocabulary.validate(&store).unwrap();
    let payload = vocabulary.aggregate(&run, "end").unwrap();
    assert_eq!(payload.source(), Some(&json!({ "kind": "doodle_pad", "image": "abc" })));
    assert!(!payload.contains_key("resize"));
    assert_eq!(payload.get("model"), Some(&json!("cnn")));
    assert!(!payload.contains_key("checkpoint"));
}
