use crate::compiler::aggregator::OptionRules;
use crate::compiler::validator::{RequireAfterSource, RequireAny};
use crate::dsl::PipelineKind;
use crate::nodes::Vocabulary;
use crate::nodes::common::{self, IMPORT, MODEL};
use crate::runtime::registry::NodeTypeDescriptor;
use std::sync::Arc;

pub const ACCURACY: &str = "Accuracy";
pub const PRECISION: &str = "Precision";
pub const RECALL: &str = "Recall";
pub const CONFUSION_MATRIX: &str = "ConfusionMatrix";

pub fn vocabulary() -> Vocabulary {
    let registry = common::base_registry()
        .with(IMPORT, common::import())
        .with(MODEL, common::model())
        .with(ACCURACY, NodeTypeDescriptor::marker())
        .with(PRECISION, NodeTypeDescriptor::marker())
        .with(RECALL, NodeTypeDescriptor::marker())
        .with(CONFUSION_MATRIX, NodeTypeDescriptor::marker());

    let option_rules = OptionRules::new()
        .scalar(MODEL, "model", common::model_architecture)
        .scalar(MODEL, "checkpoint", common::model_checkpoint)
        .flag(ACCURACY, "accuracy")
        .flag(PRECISION, "precision")
        .flag(RECALL, "recall")
        .flag(CONFUSION_MATRIX, "confusion_matrix");

    Vocabulary {
        kind: PipelineKind::Testing,
        registry: Arc::new(registry),
        source_category: vec![IMPORT],
        option_rules,
        chain_rules: vec![
            Box::new(RequireAny::new(&[IMPORT], "Add an Import node to choose the test dataset")),
            Box::new(RequireAny::new(&[MODEL], "Add a Model node to choose what to evaluate")),
            Box::new(RequireAny::new(
                &[ACCURACY, PRECISION, RECALL, CONFUSION_MATRIX],
                "Add at least one metric node",
            )),
            Box::new(RequireAfterSource::new(&[IMPORT], &[MODEL], "Move the Model node after the Import node")),
            Box::new(RequireAfterSource::new(
                &[IMPORT],
                &[ACCURACY, PRECISION, RECALL, CONFUSION_MATRIX],
                "Place at least one metric node after the Import node",
            )),
        ],
    }
}
