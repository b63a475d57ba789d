pub mod common;
pub mod preprocessing;
pub mod training;
pub mod testing;
pub mod prediction;

use std::sync::Arc;
use crate::compiler::aggregator::{self, ExecutionPayload, OptionRules};
use crate::compiler::validator::{self, ChainRule, ValidRun};
use crate::dsl::{Node, PipelineKind};
use crate::error::{AggregateError, ChainError, ValidationError};
use crate::runtime::chain::ChainStore;
use crate::runtime::registry::NodeRegistry;

/// 流水线词汇表
/// Everything that differs between pipelines: node types, which of them supply
/// the input artifact, how options are read, and extra structural rules.
/// The chain engine itself only ever sees these through this bundle.
#[derive(Debug)]
pub struct Vocabulary {
    pub kind: PipelineKind,
    pub registry: Arc<NodeRegistry>,
    pub source_category: Vec<&'static str>,
    pub option_rules: OptionRules,
    pub chain_rules: Vec<Box<dyn ChainRule>>,
}

impl Vocabulary {
    pub fn for_kind(kind: PipelineKind) -> Self {
        match kind {
            PipelineKind::Preprocessing => preprocessing::vocabulary(),
            PipelineKind::Training => training::vocabulary(),
            PipelineKind::Testing => testing::vocabulary(),
            PipelineKind::Prediction => prediction::vocabulary(),
        }
    }

    /// An empty page holding only the immortal Start and End nodes.
    pub fn new_store(&self) -> Result<ChainStore, ChainError> {
        ChainStore::with_terminals(self.registry.clone())
    }

    pub fn restore(&self, nodes: Vec<Node>) -> Result<ChainStore, ChainError> {
        ChainStore::restore(self.registry.clone(), nodes)
    }

    pub fn validate<'a>(&self, store: &'a ChainStore) -> Result<ValidRun<'a>, ValidationError> {
        validator::validate_store(store, &self.chain_rules)
    }

    pub fn aggregate(&self, run: &ValidRun<'_>, trigger_id: &str) -> Result<ExecutionPayload, AggregateError> {
        aggregator::aggregate(run, trigger_id, &self.source_category, &self.option_rules)
    }
}
