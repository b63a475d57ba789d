use std::collections::{HashMap, HashSet};
use std::mem;
use std::sync::Arc;
use uuid::Uuid;
use tracing::debug;
use crate::dsl::{Node, NodeData};
use crate::error::{ChainError, LinkSide};
use crate::runtime::registry::NodeRegistry;

/// 链式存储 (Chain Store)
/// Arena of nodes linked by id. After every public mutation returns, for all
/// nodes A and B: `A.successor == B.id` iff `B.predecessor == A.id`.
/// A failed mutation leaves the store untouched.
#[derive(Debug, Clone)]
pub struct ChainStore {
    registry: Arc<NodeRegistry>,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl ChainStore {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// A fresh page: one unlinked instance of every immortal type, with the
    /// lowercased type tag as its id (`start`, `end`).
    pub fn with_terminals(registry: Arc<NodeRegistry>) -> Result<Self, ChainError> {
        let mut store = Self::new(registry.clone());
        for (tag, descriptor) in registry.iter() {
            if descriptor.immortal {
                store.insert_with_id(&tag.to_lowercase(), tag, None)?;
            }
        }
        Ok(store)
    }

    /// Rebuild a store from a persisted snapshot, rejecting anything that
    /// could not have been produced through the mutation API.
    pub fn restore(registry: Arc<NodeRegistry>, nodes: Vec<Node>) -> Result<Self, ChainError> {
        let mut store = Self::new(registry);
        let mut counts: HashMap<&str, usize> = HashMap::new();

        for (idx, node) in nodes.iter().enumerate() {
            let descriptor = store.registry.describe(&node.type_tag)?;
            if mem::discriminant(&node.data) != mem::discriminant(&descriptor.default_data()) {
                return Err(data_mismatch(&node.id, &node.type_tag));
            }
            if store.index.insert(node.id.clone(), idx).is_some() {
                return Err(ChainError::DuplicateId(node.id.clone()));
            }
            let count = counts.entry(node.type_tag.as_str()).or_default();
            *count += 1;
            if let Some(limit) = descriptor.instance_limit {
                if *count > limit {
                    return Err(ChainError::LimitExceeded {
                        type_tag: node.type_tag.clone(),
                        limit,
                    });
                }
            }
        }
        store.nodes = nodes;

        store.verify_links()?;
        for node in &store.nodes {
            if let Some(next) = &node.successor {
                store.check_capability(&node.id, next)?;
            }
        }
        crate::compiler::extractor::extract_runs(&store)?;

        Ok(store)
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn count_of(&self, type_tag: &str) -> usize {
        self.nodes.iter().filter(|n| n.type_tag == type_tag).count()
    }

    pub fn snapshot(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    /// Insert a node of `type_tag` with a generated id.
    pub fn insert(&mut self, type_tag: &str, after_id: Option<&str>) -> Result<&Node, ChainError> {
        let id = Uuid::new_v4().to_string();
        self.insert_with_id(&id, type_tag, after_id)
    }

    /// Insert a node with a caller-chosen id. With `after_id` the node is
    /// spliced between `after_id` and its current successor; without it the
    /// node starts a new fragment.
    pub fn insert_with_id(&mut self, id: &str, type_tag: &str, after_id: Option<&str>) -> Result<&Node, ChainError> {
        let descriptor = self.registry.describe(type_tag)?;

        if self.index.contains_key(id) {
            return Err(ChainError::DuplicateId(id.to_string()));
        }
        if let Some(limit) = descriptor.instance_limit {
            if self.count_of(type_tag) >= limit {
                return Err(ChainError::LimitExceeded {
                    type_tag: type_tag.to_string(),
                    limit,
                });
            }
        }

        let mut node = Node::new(id, type_tag, descriptor.default_data());

        // 1. Check every side of the splice before touching any pointer
        let next = match after_id {
            Some(after) => {
                let prev = self.lookup(after)?;
                let prev_descriptor = self.registry.describe(&prev.type_tag)?;
                if !prev_descriptor.accepts_output {
                    return Err(mismatch(after, id, format!("'{}' has no output", prev.type_tag)));
                }
                if !descriptor.accepts_input {
                    return Err(mismatch(after, id, format!("'{}' has no input", type_tag)));
                }
                if let Some(next) = &prev.successor {
                    if !descriptor.accepts_output {
                        return Err(mismatch(id, next, format!("'{}' has no output", type_tag)));
                    }
                }
                prev.successor.clone()
            }
            None => None,
        };

        // 2. Splice
        if let Some(after) = after_id {
            node.predecessor = Some(after.to_string());
            node.successor = next.clone();
            self.node_mut(after)?.successor = Some(id.to_string());
            if let Some(next) = &next {
                self.node_mut(next)?.predecessor = Some(id.to_string());
            }
        }

        debug!(node_id = %id, type_tag = %type_tag, after = ?after_id, "Inserted node");

        let idx = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(id.to_string(), idx);
        Ok(&self.nodes[idx])
    }

    /// Remove a node, bridging its predecessor directly to its successor.
    pub fn remove(&mut self, id: &str) -> Result<Node, ChainError> {
        let node = self.lookup(id)?;
        if self.registry.describe(&node.type_tag)?.immortal {
            return Err(ChainError::Immortal(id.to_string()));
        }
        let prev = node.predecessor.clone();
        let next = node.successor.clone();

        if let Some(prev) = &prev {
            self.node_mut(prev)?.successor = next.clone();
        }
        if let Some(next) = &next {
            self.node_mut(next)?.predecessor = prev.clone();
        }

        let idx = self.index[id];
        let removed = self.nodes.remove(idx);
        self.reindex();

        debug!(node_id = %id, bridged = prev.is_some() && next.is_some(), "Removed node");
        Ok(removed)
    }

    /// Operator-initiated connect. Both endpoints must be free on the side
    /// being linked.
    pub fn relink(&mut self, source_id: &str, target_id: &str) -> Result<(), ChainError> {
        self.check_link(source_id, target_id)?;

        let source = self.lookup(source_id)?;
        if source.successor.is_some() {
            return Err(ChainError::AlreadyLinked {
                node_id: source_id.to_string(),
                side: LinkSide::Output,
            });
        }
        if self.lookup(target_id)?.predecessor.is_some() {
            return Err(ChainError::AlreadyLinked {
                node_id: target_id.to_string(),
                side: LinkSide::Input,
            });
        }

        self.link(source_id, target_id)
    }

    /// Drag-and-drop reconnect: the source's old successor and the target's
    /// old predecessor are disconnected, then the two are linked.
    pub fn rewire(&mut self, source_id: &str, target_id: &str) -> Result<(), ChainError> {
        self.check_link(source_id, target_id)?;

        if self.lookup(source_id)?.successor.as_deref() == Some(target_id) {
            return Ok(());
        }

        self.disconnect(source_id)?;
        let prev = self.lookup(target_id)?.predecessor.clone();
        if let Some(prev) = prev {
            self.disconnect(&prev)?;
        }
        self.link(source_id, target_id)
    }

    /// Drop the outgoing link of `source_id`, returning the old successor.
    pub fn disconnect(&mut self, source_id: &str) -> Result<Option<String>, ChainError> {
        let next = self.lookup(source_id)?.successor.clone();
        if let Some(next) = &next {
            self.node_mut(next)?.predecessor = None;
            self.node_mut(source_id)?.successor = None;
            debug!(source = %source_id, target = %next, "Disconnected nodes");
        }
        Ok(next)
    }

    /// Replace a node's data. The variant must be the one its type creates.
    pub fn update_data(&mut self, id: &str, data: NodeData) -> Result<(), ChainError> {
        let node = self.lookup(id)?;
        let expected = self.registry.describe(&node.type_tag)?.default_data();
        if mem::discriminant(&data) != mem::discriminant(&expected) {
            return Err(data_mismatch(id, &node.type_tag));
        }
        self.node_mut(id)?.data = data;
        debug!(node_id = %id, "Updated node data");
        Ok(())
    }

    /// Every pointer must name an existing node that points back.
    pub fn verify_links(&self) -> Result<(), ChainError> {
        for node in &self.nodes {
            if let Some(next) = &node.successor {
                let mirrored = self.get(next).and_then(|n| n.predecessor.as_deref()) == Some(node.id.as_str());
                if !mirrored {
                    return Err(broken(&node.id, next));
                }
            }
            if let Some(prev) = &node.predecessor {
                let mirrored = self.get(prev).and_then(|n| n.successor.as_deref()) == Some(node.id.as_str());
                if !mirrored {
                    return Err(broken(prev, &node.id));
                }
            }
        }
        Ok(())
    }

    /// Checks shared by `relink` and `rewire`: existence, capability, and
    /// that the new link would not close a loop.
    fn check_link(&self, source_id: &str, target_id: &str) -> Result<(), ChainError> {
        if source_id == target_id {
            return Err(ChainError::CycleDetected(source_id.to_string()));
        }
        self.check_capability(source_id, target_id)?;

        // Walk downstream from the target; reaching the source means a loop.
        let mut visited = HashSet::new();
        let mut cursor = Some(target_id);
        while let Some(id) = cursor {
            if id == source_id {
                return Err(ChainError::CycleDetected(source_id.to_string()));
            }
            if !visited.insert(id) {
                return Err(ChainError::CycleDetected(id.to_string()));
            }
            cursor = self.lookup(id)?.successor.as_deref();
        }
        Ok(())
    }

    fn check_capability(&self, source_id: &str, target_id: &str) -> Result<(), ChainError> {
        let source = self.lookup(source_id)?;
        let target = self.lookup(target_id)?;
        if !self.registry.describe(&source.type_tag)?.accepts_output {
            return Err(mismatch(source_id, target_id, format!("'{}' has no output", source.type_tag)));
        }
        if !self.registry.describe(&target.type_tag)?.accepts_input {
            return Err(mismatch(source_id, target_id, format!("'{}' has no input", target.type_tag)));
        }
        Ok(())
    }

    fn link(&mut self, source_id: &str, target_id: &str) -> Result<(), ChainError> {
        self.node_mut(source_id)?.successor = Some(target_id.to_string());
        self.node_mut(target_id)?.predecessor = Some(source_id.to_string());
        debug!(source = %source_id, target = %target_id, "Linked nodes");
        Ok(())
    }

    fn lookup(&self, id: &str) -> Result<&Node, ChainError> {
        self.get(id).ok_or_else(|| ChainError::UnknownNode(id.to_string()))
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node, ChainError> {
        let idx = *self.index.get(id).ok_or_else(|| ChainError::UnknownNode(id.to_string()))?;
        Ok(&mut self.nodes[idx])
    }

    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, n)| (n.id.clone(), idx))
            .collect();
    }
}

fn mismatch(source_id: &str, target_id: &str, reason: String) -> ChainError {
    ChainError::CapabilityMismatch {
        source_id: source_id.to_string(),
        target_id: target_id.to_string(),
        reason,
    }
}

fn data_mismatch(node_id: &str, type_tag: &str) -> ChainError {
    ChainError::DataMismatch {
        node_id: node_id.to_string(),
        type_tag: type_tag.to_string(),
    }
}

fn broken(from: &str, to: &str) -> ChainError {
    ChainError::BrokenLink {
        from: from.to_string(),
        to: to.to_string(),
    }
}
