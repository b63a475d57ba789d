use std::collections::HashMap;
use std::fmt::Debug;
use std::ops::Deref;
use crate::compiler::extractor::{Run, extract_runs};
use crate::error::ValidationError;
use crate::runtime::chain::ChainStore;
use crate::runtime::registry::NodeRegistry;

/// The single complete run of a store that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRun<'a>(Run<'a>);

impl<'a> ValidRun<'a> {
    pub fn into_inner(self) -> Run<'a> {
        self.0
    }
}

impl<'a> Deref for ValidRun<'a> {
    type Target = Run<'a>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// 领域规则接口
/// Pipeline-specific structural checks run after the generic ones.
/// A failing rule returns the message shown to the user.
pub trait ChainRule: Send + Sync + Debug {
    fn check(&self, run: &ValidRun<'_>) -> Result<(), String>;
}

/// Requires at least one node of any of the listed types.
#[derive(Debug, Clone)]
pub struct RequireAny {
    pub type_tags: Vec<&'static str>,
    pub message: &'static str,
}

impl RequireAny {
    pub fn new(type_tags: &[&'static str], message: &'static str) -> Self {
        Self {
            type_tags: type_tags.to_vec(),
            message,
        }
    }
}

impl ChainRule for RequireAny {
    fn check(&self, run: &ValidRun<'_>) -> Result<(), String> {
        let found = run
            .nodes()
            .iter()
            .any(|n| self.type_tags.iter().any(|t| *t == n.type_tag));
        if found {
            Ok(())
        } else {
            Err(self.message.to_string())
        }
    }
}

/// Requires a node of one of `type_tags` between the nearest source and the
/// terminal node, the range the aggregator reads options from.
#[derive(Debug, Clone)]
pub struct RequireAfterSource {
    pub source_category: Vec<&'static str>,
    pub type_tags: Vec<&'static str>,
    pub message: &'static str,
}

impl RequireAfterSource {
    pub fn new(source_category: &[&'static str], type_tags: &[&'static str], message: &'static str) -> Self {
        Self {
            source_category: source_category.to_vec(),
            type_tags: type_tags.to_vec(),
            message,
        }
    }
}

impl ChainRule for RequireAfterSource {
    fn check(&self, run: &ValidRun<'_>) -> Result<(), String> {
        let nodes = run.nodes();
        let tail = nodes.len() - 1;
        let source = (0..tail)
            .rev()
            .find(|&i| self.source_category.iter().any(|t| *t == nodes[i].type_tag));

        let found = source.is_some_and(|pos| {
            nodes[pos + 1..tail]
                .iter()
                .any(|n| self.type_tags.iter().any(|t| *t == n.type_tag))
        });
        if found {
            Ok(())
        } else {
            Err(self.message.to_string())
        }
    }
}

/// Decide whether `runs` define exactly one executable pipeline.
/// Pure; the same input always yields the same result.
pub fn validate<'a>(
    runs: &[Run<'a>],
    registry: &NodeRegistry,
    rules: &[Box<dyn ChainRule>],
) -> Result<ValidRun<'a>, ValidationError> {
    // 1. Exactly one complete run
    let mut complete = runs.iter().filter(|r| r.is_complete());
    let run = match (complete.next(), complete.count()) {
        (None, _) => return Err(ValidationError::NoCompleteChain),
        (Some(run), 0) => run.clone(),
        (Some(_), rest) => return Err(ValidationError::MultipleChains(rest + 1)),
    };

    // 2. Instance limits within the run
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for node in run.nodes() {
        let count = counts.entry(node.type_tag.as_str()).or_default();
        *count += 1;
        if let Some(limit) = registry.describe(&node.type_tag)?.instance_limit {
            if *count > limit {
                return Err(ValidationError::LimitExceeded {
                    type_tag: node.type_tag.clone(),
                    limit,
                });
            }
        }
    }

    // 3. Domain rules
    let valid = ValidRun(run);
    for rule in rules {
        rule.check(&valid).map_err(ValidationError::Domain)?;
    }

    Ok(valid)
}

/// Extract and validate in one step.
pub fn validate_store<'a>(
    store: &'a ChainStore,
    rules: &[Box<dyn ChainRule>],
) -> Result<ValidRun<'a>, ValidationError> {
    let runs = extract_runs(store)?;
    validate(&runs, store.registry(), rules)
}
