use serde_json::{Value, json};
use crate::compiler::aggregator::OptionRules;
use crate::compiler::validator::RequireAny;
use crate::dsl::{NodeData, PipelineKind};
use crate::nodes::Vocabulary;
use crate::nodes::common::{self, IMPORT, RESIZE, GRAYSCALE};
use crate::runtime::registry::NodeTypeDescriptor;
use std::sync::Arc;

pub const ROTATE: &str = "Rotate";
pub const CROP: &str = "Crop";
pub const NORMALIZE: &str = "Normalize";
pub const FLIP: &str = "Flip";

fn rotate_degrees(data: &NodeData) -> Option<Value> {
    match data {
        NodeData::Rotate { degrees } => Some(json!(degrees)),
        _ => None,
    }
}

fn crop_width(data: &NodeData) -> Option<Value> {
    match data {
        NodeData::Crop { width, .. } => Some(json!(width)),
        _ => None,
    }
}

fn crop_height(data: &NodeData) -> Option<Value> {
    match data {
        NodeData::Crop { height, .. } => Some(json!(height)),
        _ => None,
    }
}

pub fn vocabulary() -> Vocabulary {
    let registry = common::base_registry()
        .with(IMPORT, common::import())
        .with(RESIZE, common::resize())
        .with(ROTATE, NodeTypeDescriptor::step(|| NodeData::Rotate { degrees: 90 }))
        .with(CROP, NodeTypeDescriptor::step(|| NodeData::Crop { width: 24, height: 24 }))
        .with(GRAYSCALE, NodeTypeDescriptor::marker())
        .with(NORMALIZE, NodeTypeDescriptor::marker())
        .with(FLIP, NodeTypeDescriptor::marker());

    let option_rules = OptionRules::new()
        .scalar(RESIZE, "resize", common::resize_size)
        .scalar(ROTATE, "rotate", rotate_degrees)
        .scalar(CROP, "crop_width", crop_width)
        .scalar(CROP, "crop_height", crop_height)
        .flag(GRAYSCALE, "grayscale")
        .flag(NORMALIZE, "normalize")
        .flag(FLIP, "flip");

    Vocabulary {
        kind: PipelineKind::Preprocessing,
        registry: Arc::new(registry),
        source_category: vec![IMPORT],
        option_rules,
        chain_rules: vec![Box::new(RequireAny::new(
            &[IMPORT],
            "Add an Import node to choose the dataset to preprocess",
        ))],
    }
}
