//! Node types shared by several pipelines.

use serde_json::{Value, json};
use crate::dsl::NodeData;
use crate::runtime::registry::{NodeRegistry, NodeTypeDescriptor, START, END};

pub const IMPORT: &str = "Import";
pub const RESIZE: &str = "Resize";
pub const GRAYSCALE: &str = "Grayscale";
pub const MODEL: &str = "Model";

pub const DEFAULT_RESIZE: u32 = 28;
pub const DEFAULT_ARCHITECTURE: &str = "cnn";

/// Start and End, which every pipeline has.
pub fn base_registry() -> NodeRegistry {
    NodeRegistry::new()
        .with(START, NodeTypeDescriptor::start())
        .with(END, NodeTypeDescriptor::end())
}

pub fn import() -> NodeTypeDescriptor {
    NodeTypeDescriptor::step(|| NodeData::Import { dataset_id: None }).limit(1)
}

pub fn resize() -> NodeTypeDescriptor {
    NodeTypeDescriptor::step(|| NodeData::Resize { size: DEFAULT_RESIZE })
}

pub fn model() -> NodeTypeDescriptor {
    NodeTypeDescriptor::step(|| NodeData::Model {
        architecture: DEFAULT_ARCHITECTURE.to_string(),
        checkpoint: None,
    })
    .limit(1)
}

pub fn resize_size(data: &NodeData) -> Option<Value> {
    match data {
        NodeData::Resize { size } => Some(json!(size)),
        _ => None,
    }
}

pub fn model_architecture(data: &NodeData) -> Option<Value> {
    match data {
        NodeData::Model { architecture, .. } => Some(json!(architecture)),
        _ => None,
    }
}

pub fn model_checkpoint(data: &NodeData) -> Option<Value> {
    match data {
        NodeData::Model { checkpoint: Some(checkpoint), .. } => Some(json!(checkpoint)),
        _ => None,
    }
}
