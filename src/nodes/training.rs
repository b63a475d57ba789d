use serde_json::{Value, json};
use crate::compiler::aggregator::OptionRules;
use crate::compiler::validator::{RequireAfterSource, RequireAny};
use crate::dsl::{NodeData, PipelineKind};
use crate::nodes::Vocabulary;
use crate::nodes::common::{self, IMPORT, MODEL};
use crate::runtime::registry::NodeTypeDescriptor;
use std::sync::Arc;

pub const EPOCHS: &str = "Epochs";
pub const BATCH_SIZE: &str = "BatchSize";
pub const LEARNING_RATE: &str = "LearningRate";
pub const OPTIMIZER: &str = "Optimizer";
pub const AUGMENT: &str = "Augment";

fn epochs(data: &NodeData) -> Option<Value> {
    match data {
        NodeData::Epochs { count } => Some(json!(count)),
        _ => None,
    }
}

fn batch_size(data: &NodeData) -> Option<Value> {
    match data {
        NodeData::BatchSize { size } => Some(json!(size)),
        _ => None,
    }
}

fn learning_rate(data: &NodeData) -> Option<Value> {
    match data {
        NodeData::LearningRate { rate } => Some(json!(rate)),
        _ => None,
    }
}

fn optimizer(data: &NodeData) -> Option<Value> {
    match data {
        NodeData::Optimizer { name } => Some(json!(name)),
        _ => None,
    }
}

pub fn vocabulary() -> Vocabulary {
    let registry = common::base_registry()
        .with(IMPORT, common::import())
        .with(MODEL, common::model())
        .with(EPOCHS, NodeTypeDescriptor::step(|| NodeData::Epochs { count: 10 }).limit(1))
        .with(BATCH_SIZE, NodeTypeDescriptor::step(|| NodeData::BatchSize { size: 32 }).limit(1))
        .with(LEARNING_RATE, NodeTypeDescriptor::step(|| NodeData::LearningRate { rate: 0.001 }).limit(1))
        .with(OPTIMIZER, NodeTypeDescriptor::step(|| NodeData::Optimizer { name: "adam".to_string() }).limit(1))
        .with(AUGMENT, NodeTypeDescriptor::marker());

    let option_rules = OptionRules::new()
        .scalar(MODEL, "model", common::model_architecture)
        .scalar(MODEL, "checkpoint", common::model_checkpoint)
        .scalar(EPOCHS, "epochs", epochs)
        .scalar(BATCH_SIZE, "batch_size", batch_size)
        .scalar(LEARNING_RATE, "learning_rate", learning_rate)
        .scalar(OPTIMIZER, "optimizer", optimizer)
        .flag(AUGMENT, "augment");

    Vocabulary {
        kind: PipelineKind::Training,
        registry: Arc::new(registry),
        source_category: vec![IMPORT],
        option_rules,
        chain_rules: vec![
            Box::new(RequireAny::new(&[IMPORT], "Add an Import node to choose the training dataset")),
            Box::new(RequireAny::new(&[MODEL], "Add a Model node to choose what to train")),
            Box::new(RequireAfterSource::new(&[IMPORT], &[MODEL], "Move the Model node after the Import node")),
        ],
    }
}
