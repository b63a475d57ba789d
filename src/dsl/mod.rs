pub mod builder;

use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

/// 四种流水线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    Preprocessing,
    Training,
    Testing,
    Prediction,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 4] = [
        PipelineKind::Preprocessing,
        PipelineKind::Training,
        PipelineKind::Testing,
        PipelineKind::Prediction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Preprocessing => "preprocessing",
            PipelineKind::Training => "training",
            PipelineKind::Testing => "testing",
            PipelineKind::Prediction => "prediction",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown pipeline '{}' (expected one of preprocessing, training, testing, prediction)", s))
    }
}

/// 节点配置数据
/// The chain engine never looks inside; only option rules and the UI do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeData {
    /// Marker types (Start, End, boolean options) carry nothing.
    Empty,
    Import {
        dataset_id: Option<String>,
    },
    DoodlePad {
        /// Encoded canvas contents, absent until the user draws.
        image: Option<String>,
    },
    Resize {
        size: u32,
    },
    Rotate {
        degrees: i32,
    },
    Crop {
        width: u32,
        height: u32,
    },
    Model {
        architecture: String,
        checkpoint: Option<String>,
    },
    Epochs {
        count: u32,
    },
    BatchSize {
        size: u32,
    },
    LearningRate {
        rate: f64,
    },
    Optimizer {
        name: String,
    },
}

/// 链中的节点
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predecessor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successor: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, type_tag: impl Into<String>, data: NodeData) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            data,
            predecessor: None,
            successor: None,
        }
    }
}

/// Flat persisted snapshot of one pipeline page's chain store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layout {
    pub id: String,
    pub pipeline: PipelineKind,
    pub nodes: Vec<Node>,
}
