use crate::compiler::aggregator::OptionRules;
use crate::compiler::validator::{RequireAfterSource, RequireAny};
use crate::dsl::{NodeData, PipelineKind};
use crate::nodes::Vocabulary;
use crate::nodes::common::{self, IMPORT, RESIZE, GRAYSCALE, MODEL};
use crate::runtime::registry::NodeTypeDescriptor;
use std::sync::Arc;

pub const DOODLE_PAD: &str = "DoodlePad";

pub fn vocabulary() -> Vocabulary {
    let registry = common::base_registry()
        .with(DOODLE_PAD, NodeTypeDescriptor::step(|| NodeData::DoodlePad { image: None }).limit(1))
        .with(IMPORT, common::import())
        .with(MODEL, common::model())
        .with(RESIZE, common::resize())
        .with(GRAYSCALE, NodeTypeDescriptor::marker());

    let option_rules = OptionRules::new()
        .scalar(MODEL, "model", common::model_architecture)
        .scalar(MODEL, "checkpoint", common::model_checkpoint)
        .scalar(RESIZE, "resize", common::resize_size)
        .flag(GRAYSCALE, "grayscale");

    Vocabulary {
        kind: PipelineKind::Prediction,
        registry: Arc::new(registry),
        source_category: vec![DOODLE_PAD, IMPORT],
        option_rules,
        chain_rules: vec![
            Box::new(RequireAny::new(
                &[DOODLE_PAD, IMPORT],
                "Draw on a DoodlePad or import an image to predict on",
            )),
            Box::new(RequireAny::new(&[MODEL], "Add a Model node to choose the predictor")),
            Box::new(RequireAfterSource::new(
                &[DOODLE_PAD, IMPORT],
                &[MODEL],
                "Move the Model node after the DoodlePad or Import node",
            )),
        ],
    }
}
