use std::collections::HashMap;
use crate::dsl::NodeData;
use crate::error::ChainError;

pub const START: &str = "Start";
pub const END: &str = "End";

/// 节点类型描述符
/// Capabilities the chain engine consults instead of branching on pipeline identity.
#[derive(Debug, Clone)]
pub struct NodeTypeDescriptor {
    pub accepts_input: bool,
    pub accepts_output: bool,
    pub instance_limit: Option<usize>,
    pub immortal: bool,
    pub create_default_data: fn() -> NodeData,
}

fn empty_data() -> NodeData {
    NodeData::Empty
}

impl NodeTypeDescriptor {
    /// An ordinary mid-chain step: linkable on both sides, unlimited, deletable.
    pub fn step(create_default_data: fn() -> NodeData) -> Self {
        Self {
            accepts_input: true,
            accepts_output: true,
            instance_limit: None,
            immortal: false,
            create_default_data,
        }
    }

    /// A step whose presence alone means something (a boolean option).
    pub fn marker() -> Self {
        Self::step(empty_data)
    }

    pub fn start() -> Self {
        Self {
            accepts_input: false,
            accepts_output: true,
            instance_limit: Some(1),
            immortal: true,
            create_default_data: empty_data,
        }
    }

    pub fn end() -> Self {
        Self {
            accepts_input: true,
            accepts_output: false,
            instance_limit: Some(1),
            immortal: true,
            create_default_data: empty_data,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.instance_limit = Some(limit);
        self
    }

    pub fn default_data(&self) -> NodeData {
        (self.create_default_data)()
    }
}

/// Registry for one pipeline's node vocabulary
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    entries: HashMap<String, NodeTypeDescriptor>,
    /// Registration order, used for listing.
    order: Vec<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_tag: &str, descriptor: NodeTypeDescriptor) {
        if self.entries.insert(type_tag.to_string(), descriptor).is_none() {
            self.order.push(type_tag.to_string());
        }
    }

    pub fn with(mut self, type_tag: &str, descriptor: NodeTypeDescriptor) -> Self {
        self.register(type_tag, descriptor);
        self
    }

    pub fn describe(&self, type_tag: &str) -> Result<&NodeTypeDescriptor, ChainError> {
        self.entries
            .get(type_tag)
            .ok_or_else(|| ChainError::UnknownType(type_tag.to_string()))
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.entries.contains_key(type_tag)
    }

    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeTypeDescriptor)> {
        self.order
            .iter()
            .filter_map(|tag| self.entries.get(tag).map(|d| (tag.as_str(), d)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
