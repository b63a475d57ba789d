use crate::dsl::NodeData;
use crate::error::ChainError;
use crate::runtime::chain::ChainStore;
use crate::runtime::registry::{NodeRegistry, START, END};
use std::sync::Arc;

/// Fluent construction of a chain store; nodes are placed first, then linked
/// through the same checks as an operator connect.
pub struct ChainBuilder {
    registry: Arc<NodeRegistry>,
    nodes: Vec<(String, String, Option<NodeData>)>,
    links: Vec<(String, String)>,
}

impl ChainBuilder {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn start(self, id: &str) -> Self {
        self.node(id, START)
    }

    pub fn end(self, id: &str) -> Self {
        self.node(id, END)
    }

    /// A node with its type's default data.
    pub fn node(mut self, id: &str, type_tag: &str) -> Self {
        self.nodes.push((id.to_string(), type_tag.to_string(), None));
        self
    }

    pub fn node_with(mut self, id: &str, type_tag: &str, data: NodeData) -> Self {
        self.nodes.push((id.to_string(), type_tag.to_string(), Some(data)));
        self
    }

    pub fn connect(mut self, source: &str, target: &str) -> Self {
        self.links.push((source.to_string(), target.to_string()));
        self
    }

    /// Connect each id to the next.
    pub fn chain(mut self, ids: &[&str]) -> Self {
        for pair in ids.windows(2) {
            self.links.push((pair[0].to_string(), pair[1].to_string()));
        }
        self
    }

    pub fn build(self) -> Result<ChainStore, ChainError> {
        let mut store = ChainStore::new(self.registry);

        for (id, type_tag, data) in self.nodes {
            store.insert_with_id(&id, &type_tag, None)?;
            if let Some(data) = data {
                store.update_data(&id, data)?;
            }
        }

        for (source, target) in &self.links {
            store.relink(source, target)?;
        }

        Ok(store)
    }
}
