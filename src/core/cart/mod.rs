//! Classification and regression tree (CART) evaluator
//!
//! A [`DecisionTree`] is compiled once from a [`CartDefinition`] and then
//! evaluated read-only against any [`FeatureSource`]. Evaluation starts at
//! the root, looks up the node's feature, applies the node's predicate and
//! follows the matching child until a leaf is reached.
//!
//! Compilation guarantees every decision node's children have a larger index
//! than the node itself, so evaluation always terminates.

mod definition;

pub use definition::{CartDefinition, NodeDefinition, Operator};

use std::path::Path;

use regex::Regex;
use thiserror::Error;

use super::features::{FeatureSource, FeatureValue};

/// Result type for tree construction and evaluation
pub type CartResult<T> = Result<T, CartError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CartError {
    /// Definition could not be parsed
    #[error("Failed to parse decision tree definition: {0}")]
    Parse(String),

    #[error("Decision tree '{0}' has no nodes")]
    EmptyTree(String),

    /// Child index out of range or not after its parent
    #[error("Node {node} references invalid child {child}")]
    InvalidChild { node: usize, child: usize },

    #[error("Node {node} has an invalid operand: {reason}")]
    InvalidOperand { node: usize, reason: String },

    #[error("Node {node} has an invalid pattern '{pattern}': {error}")]
    InvalidPattern {
        node: usize,
        pattern: String,
        error: String,
    },

    /// Predicate references a feature the item does not carry
    #[error("Feature '{feature}' required by node {node} is missing")]
    MissingFeature { feature: String, node: usize },

    #[error("Leaf value '{0}' is not numeric")]
    NonNumericLeaf(String),
}

#[derive(Debug)]
enum Predicate {
    Equals(FeatureValue),
    LessThan(f32),
    GreaterThan(f32),
    Matches(Regex),
}

impl Predicate {
    fn test(&self, value: &FeatureValue) -> bool {
        match self {
            Self::Equals(operand) if operand.is_numeric() => {
                match (value.as_f32(), operand.as_f32()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            Self::Equals(operand) => value.to_string() == operand.to_string(),
            Self::LessThan(bound) => value.as_f32().is_some_and(|v| v < *bound),
            Self::GreaterThan(bound) => value.as_f32().is_some_and(|v| v > *bound),
            Self::Matches(pattern) => pattern.is_match(&value.to_string()),
        }
    }
}

#[derive(Debug)]
enum Node {
    Decision {
        feature: String,
        predicate: Predicate,
        yes: usize,
        no: usize,
    },
    Leaf(FeatureValue),
}

/// Immutable, shareable decision tree
#[derive(Debug)]
pub struct DecisionTree {
    name: String,
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Validate and compile a definition
    pub fn compile(definition: CartDefinition) -> CartResult<Self> {
        if definition.nodes.is_empty() {
            return Err(CartError::EmptyTree(definition.name));
        }

        let count = definition.nodes.len();
        let mut nodes = Vec::with_capacity(count);

        for (index, node) in definition.nodes.into_iter().enumerate() {
            let compiled = match node {
                NodeDefinition::Leaf { value } => Node::Leaf(value),
                NodeDefinition::Decision {
                    feature,
                    op,
                    value,
                    yes,
                    no,
                } => {
                    for child in [yes, no] {
                        if child <= index || child >= count {
                            return Err(CartError::InvalidChild { node: index, child });
                        }
                    }
                    Node::Decision {
                        feature,
                        predicate: Self::compile_predicate(index, op, value)?,
                        yes,
                        no,
                    }
                }
            };
            nodes.push(compiled);
        }

        Ok(Self {
            name: definition.name,
            nodes,
        })
    }

    fn compile_predicate(node: usize, op: Operator, value: FeatureValue) -> CartResult<Predicate> {
        let numeric = || {
            value.as_f32().ok_or_else(|| CartError::InvalidOperand {
                node,
                reason: format!("operator '{op}' needs a numeric operand, got '{value}'"),
            })
        };

        Ok(match op {
            Operator::Equals => Predicate::Equals(value.clone()),
            Operator::LessThan => Predicate::LessThan(numeric()?),
            Operator::GreaterThan => Predicate::GreaterThan(numeric()?),
            Operator::Matches => {
                let pattern = value.to_string();
                let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
                    CartError::InvalidPattern {
                        node,
                        pattern: pattern.clone(),
                        error: e.to_string(),
                    }
                })?;
                Predicate::Matches(regex)
            }
        })
    }

    pub fn from_yaml_str(source: &str) -> CartResult<Self> {
        Self::compile(CartDefinition::from_yaml_str(source)?)
    }

    pub fn from_file(path: &Path) -> CartResult<Self> {
        Self::compile(CartDefinition::from_file(path)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Walk the tree for `item` and return the leaf value reached
    pub fn interpret<S: FeatureSource + ?Sized>(&self, item: &S) -> CartResult<&FeatureValue> {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf(value) => return Ok(value),
                Node::Decision {
                    feature,
                    predicate,
                    yes,
                    no,
                } => {
                    let value = item.find_feature(feature).ok_or_else(|| {
                        CartError::MissingFeature {
                            feature: feature.clone(),
                            node: index,
                        }
                    })?;
                    index = if predicate.test(&value) { *yes } else { *no };
                }
            }
        }
    }

    /// Walk the tree and return the leaf as a float
    pub fn interpret_f32<S: FeatureSource + ?Sized>(&self, item: &S) -> CartResult<f32> {
        let value = self.interpret(item)?;
        value
            .as_f32()
            .ok_or_else(|| CartError::NonNumericLeaf(value.to_string()))
    }
}
