use chainflow::dsl::{NodeData, PipelineKind};
use chainflow::error::ChainError;
use chainflow::nodes::Vocabulary;
use chainflow::runtime::registry::{NodeRegistry, NodeTypeDescriptor, START, END};

#[test]
fn test_describe_unknown_type() {
    let registry = NodeRegistry::new().with(START, NodeTypeDescriptor::start());
    assert!(registry.describe(START).is_ok());
    assert_eq!(
        registry.describe("Blur").unwrap_err(),
        ChainError::UnknownType("Blur".to_string())
    );
}

#[test]
fn test_registration_order_is_kept() {
    let registry = NodeRegistry::new()
        .with(START, NodeTypeDescriptor::start())
        .with("Grayscale", NodeTypeDescriptor::marker())
        .with(END, NodeTypeDescriptor::end());

    let tags: Vec<_> = registry.type_tags().collect();
    assert_eq!(tags, vec![START, "Grayscale", END]);
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_terminal_descriptors() {
    let start = NodeTypeDescriptor::start();
    assert!(!start.accepts_input);
    assert!(start.accepts_output);
    assert!(start.immortal);
    assert_eq!(start.instance_limit, Some(1));

    let end = NodeTypeDescriptor::end();
    assert!(end.accepts_input);
    assert!(!end.accepts_output);
    assert!(end.immortal);
}

#[test]
fn test_every_pipeline_has_terminals_and_a_source() {
    for kind in PipelineKind::ALL {
        let vocabulary = Vocabulary::for_kind(kind);
        assert_eq!(vocabulary.kind, kind);
        assert!(vocabulary.registry.describe(START).unwrap().immortal, "{kind}");
        assert!(vocabulary.registry.describe(END).unwrap().immortal, "{kind}");
        assert!(!vocabulary.source_category.is_empty(), "{kind}");
        for source in &vocabulary.source_category {
            assert!(vocabulary.registry.contains(source), "{kind}: {source}");
        }
    }
}

#[test]
fn test_default_data_factories() {
    let vocabulary = Vocabulary::for_kind(PipelineKind::Preprocessing);
    let resize = vocabulary.registry.describe("Resize").unwrap();
    assert_eq!(resize.default_data(), NodeData::Resize { size: 28 });
    let import = vocabulary.registry.describe("Import").unwrap();
    assert_eq!(import.default_data(), NodeData::Import { dataset_id: None });
    assert_eq!(import.instance_limit, Some(1));
}

#[test]
fn test_pipeline_kind_parsing() {
    assert_eq!("training".parse::<PipelineKind>(), Ok(PipelineKind::Training));
    assert_eq!("Prediction".parse::<PipelineKind>(), Ok(PipelineKind::Prediction));
    assert!("clustering".parse::<PipelineKind>().is_err());
}
