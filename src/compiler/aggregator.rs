use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use tracing::debug;
use crate::compiler::validator::ValidRun;
use crate::dsl::NodeData;
use crate::error::AggregateError;

/// Key under which the source node's own data is attached.
pub const SOURCE_KEY: &str = "source";

/// How one node type contributes to the execution payload
#[derive(Debug, Clone)]
pub enum OptionRule {
    /// Sets `key` from the node's data; a later node overrides an earlier one.
    Scalar {
        key: &'static str,
        extract: fn(&NodeData) -> Option<Value>,
    },
    /// `key` is true if the type appears anywhere in range, false otherwise.
    Flag { key: &'static str },
}

/// Option rules keyed by type tag
#[derive(Debug, Clone, Default)]
pub struct OptionRules {
    rules: HashMap<String, Vec<OptionRule>>,
}

impl OptionRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, type_tag: &str, key: &'static str, extract: fn(&NodeData) -> Option<Value>) -> Self {
        self.rules
            .entry(type_tag.to_string())
            .or_default()
            .push(OptionRule::Scalar { key, extract });
        self
    }

    pub fn flag(mut self, type_tag: &str, key: &'static str) -> Self {
        self.rules
            .entry(type_tag.to_string())
            .or_default()
            .push(OptionRule::Flag { key });
        self
    }

    pub fn get(&self, type_tag: &str) -> &[OptionRule] {
        self.rules.get(type_tag).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn flag_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.values().flatten().filter_map(|rule| match rule {
            OptionRule::Flag { key } => Some(*key),
            OptionRule::Scalar { .. } => None,
        })
    }
}

/// 执行请求负载
/// Option key to value; rebuilt on every run action, never persisted by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionPayload(Map<String, Value>);

impl ExecutionPayload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn source(&self) -> Option<&Value> {
        self.0.get(SOURCE_KEY)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }
}

/// Build the payload for a run triggered from its terminal node.
///
/// Scans backward from the trigger for the nearest node in `source_category`,
/// then forward from that source up to the trigger applying `rules`.
pub fn aggregate(
    run: &ValidRun<'_>,
    trigger_id: &str,
    source_category: &[&str],
    rules: &OptionRules,
) -> Result<ExecutionPayload, AggregateError> {
    let nodes = run.nodes();

    // 1. Trigger must be the terminal node
    let trigger_pos = run
        .position(trigger_id)
        .ok_or_else(|| AggregateError::UnknownNode(trigger_id.to_string()))?;
    if trigger_pos != nodes.len() - 1 {
        return Err(AggregateError::NotTerminal(trigger_id.to_string()));
    }

    // 2. Backward scan for the source
    let source_pos = (0..trigger_pos)
        .rev()
        .find(|&i| source_category.iter().any(|tag| *tag == nodes[i].type_tag))
        .ok_or_else(|| AggregateError::MissingSource(trigger_id.to_string()))?;

    // 3. Forward scan applying option rules
    let mut payload = ExecutionPayload::default();
    for key in rules.flag_keys() {
        payload.insert(key, Value::Bool(false));
    }
    for node in &nodes[source_pos..trigger_pos] {
        for rule in rules.get(&node.type_tag) {
            match rule {
                OptionRule::Scalar { key, extract } => {
                    if let Some(value) = extract(&node.data) {
                        payload.insert(key, value);
                    }
                }
                OptionRule::Flag { key } => payload.insert(key, Value::Bool(true)),
            }
        }
    }

    // 4. Source data
    let source = nodes[source_pos];
    payload.insert(SOURCE_KEY, serde_json::to_value(&source.data)?);

    debug!(trigger = %trigger_id, source = %source.id, keys = payload.len(), "Aggregated payload");
    Ok(payload)
}
