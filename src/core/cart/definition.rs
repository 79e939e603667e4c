//! Serializable decision tree definitions
//!
//! A tree is described as a flat list of nodes in preorder. Decision nodes
//! name their two children by index; the compile step in the parent module
//! checks that every child index points forward, which rules out cycles.
//!
//! ```yaml
//! name: duration
//! nodes:
//!   - type: decision
//!     feature: name
//!     op: "="
//!     value: pau
//!     yes: 1
//!     no: 2
//!   - type: leaf
//!     value: -0.5
//!   - type: leaf
//!     value: 0.25
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::CartError;
use crate::core::features::FeatureValue;

/// Comparison applied at a decision node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=", alias = "equals")]
    Equals,
    #[serde(rename = "<", alias = "less_than")]
    LessThan,
    #[serde(rename = ">", alias = "greater_than")]
    GreaterThan,
    #[serde(rename = "matches")]
    Matches,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Equals => "=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::Matches => "matches",
        })
    }
}

/// One node of a tree definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeDefinition {
    Decision {
        feature: String,
        op: Operator,
        value: FeatureValue,
        /// Child taken when the predicate holds
        yes: usize,
        /// Child taken otherwise
        no: usize,
    },
    Leaf {
        value: FeatureValue,
    },
}

impl NodeDefinition {
    pub fn decision(
        feature: impl Into<String>,
        op: Operator,
        value: impl Into<FeatureValue>,
        yes: usize,
        no: usize,
    ) -> Self {
        Self::Decision {
            feature: feature.into(),
            op,
            value: value.into(),
            yes,
            no,
        }
    }

    pub fn leaf(value: impl Into<FeatureValue>) -> Self {
        Self::Leaf {
            value: value.into(),
        }
    }
}

/// Complete tree definition (root is node 0)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartDefinition {
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<NodeDefinition>,
}

impl CartDefinition {
    pub fn new(name: impl Into<String>, nodes: Vec<NodeDefinition>) -> Self {
        Self {
            name: name.into(),
            nodes,
        }
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, CartError> {
        serde_yaml::from_str(source).map_err(|e| CartError::Parse(e.to_string()))
    }

    pub fn from_json_str(source: &str) -> Result<Self, CartError> {
        serde_json::from_str(source).map_err(|e| CartError::Parse(e.to_string()))
    }

    /// Load a definition from a `.json` or YAML file
    pub fn from_file(path: &Path) -> Result<Self, CartError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CartError::Parse(format!("{}: {e}", path.display())))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_yaml_str(&source),
        }
    }
}
