use std::collections::HashSet;
use crate::dsl::Node;
use crate::error::ChainError;
use crate::runtime::chain::ChainStore;
use crate::runtime::registry::{START, END};

/// A maximal ordered run of linked nodes, borrowed from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Run<'a> {
    nodes: Vec<&'a Node>,
}

impl<'a> Run<'a> {
    pub fn nodes(&self) -> &[&'a Node] {
        &self.nodes
    }

    pub fn head(&self) -> &'a Node {
        self.nodes[0]
    }

    pub fn tail(&self) -> &'a Node {
        self.nodes[self.nodes.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Runs always hold at least one node.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Starts at a Start node and ends at an End node.
    pub fn is_complete(&self) -> bool {
        self.head().type_tag == START && self.tail().type_tag == END
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn type_tags(&self) -> Vec<&'a str> {
        self.nodes.iter().map(|n| n.type_tag.as_str()).collect()
    }
}

/// Partition the store into runs, one per head (a node with no predecessor),
/// in store order. Every node lands in exactly one run.
pub fn extract_runs(store: &ChainStore) -> Result<Vec<Run<'_>>, ChainError> {
    // 1. Heads
    let has_predecessor: HashSet<&str> = store
        .nodes()
        .iter()
        .filter_map(|n| n.successor.as_deref())
        .collect();

    let mut visited: HashSet<&str> = HashSet::with_capacity(store.len());
    let mut runs = Vec::new();

    // 2. Follow successors from each head
    for head in store.nodes().iter().filter(|n| !has_predecessor.contains(n.id.as_str())) {
        let mut nodes = Vec::new();
        let mut cursor = Some(head);

        while let Some(node) = cursor {
            if !visited.insert(node.id.as_str()) {
                return Err(ChainError::CycleDetected(node.id.clone()));
            }
            nodes.push(node);
            cursor = match &node.successor {
                Some(next) => Some(store.get(next).ok_or_else(|| ChainError::BrokenLink {
                    from: node.id.clone(),
                    to: next.clone(),
                })?),
                None => None,
            };
        }
        runs.push(Run { nodes });
    }

    // 3. Anything unreached sits on a loop with no head
    if let Some(stray) = store.nodes().iter().find(|n| !visited.contains(n.id.as_str())) {
        return Err(ChainError::CycleDetected(stray.id.clone()));
    }

    Ok(runs)
}

/// Runs that do not form a complete Start..End chain.
pub fn orphans<'r, 'a>(runs: &'r [Run<'a>]) -> impl Iterator<Item = &'r Run<'a>> {
    runs.iter().filter(|r| !r.is_complete())
}
