//! Per-request synthesis context
//!
//! An [`Utterance`] is created for every synthesis request and threaded through
//! each pipeline stage. It carries:
//!
//! - the input text and a back-reference to the owning [`Voice`]
//! - named relations: ordered, arena-backed item sequences (e.g. `Segment`)
//! - a loosely typed property bag used as a side channel between stages
//!
//! Items reference their neighbours by index into the relation arena rather
//! than by pointer, so a stage can hold an immutable [`ItemRef`] for feature
//! evaluation and then write back through [`Relation::features_mut`].

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use super::features::{FeatureSet, FeatureSource, FeatureValue};
use super::voice::Voice;

/// Well-known relation names
pub mod relation_names {
    /// Tokens produced from the input text
    pub const TOKEN: &str = "Token";
    /// Phonetic segments
    pub const SEGMENT: &str = "Segment";
}

/// Well-known side-channel property keys
pub mod property_keys {
    /// Ordered list of raw PCM chunks produced by an external synthesizer
    pub const PCM_AUDIO: &str = "pcm_audio";
    /// Total byte length across all [`PCM_AUDIO`] chunks
    pub const PCM_AUDIO_LENGTH: &str = "pcm_audio_length";
}

/// Index of an item inside its relation's arena
pub type ItemId = usize;

/// Value stored in an utterance's property bag
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Float(f32),
    Str(String),
    Chunks(Vec<Bytes>),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Chunks(_) => "chunks",
        }
    }
}

/// Property bag access failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    #[error("Utterance property '{0}' is not set")]
    Missing(String),

    #[error("Utterance property '{key}' holds {actual}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl PropertyError {
    fn mismatch(key: &str, expected: &'static str, actual: &PropertyValue) -> Self {
        Self::TypeMismatch {
            key: key.to_string(),
            expected,
            actual: actual.type_name(),
        }
    }
}

#[derive(Debug, Clone)]
struct Item {
    features: FeatureSet,
    prev: Option<ItemId>,
    next: Option<ItemId>,
}

/// Named, ordered sequence of items
#[derive(Debug, Clone)]
pub struct Relation {
    name: String,
    items: Vec<Item>,
    head: Option<ItemId>,
    tail: Option<ItemId>,
}

impl Relation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
            head: None,
            tail: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an item at the tail and return its id
    pub fn append(&mut self, features: FeatureSet) -> ItemId {
        let id = self.items.len();
        self.items.push(Item {
            features,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.items[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    pub fn head(&self) -> Option<ItemRef<'_>> {
        self.head.map(|id| ItemRef { relation: self, id })
    }

    pub fn tail(&self) -> Option<ItemRef<'_>> {
        self.tail.map(|id| ItemRef { relation: self, id })
    }

    pub fn item(&self, id: ItemId) -> Option<ItemRef<'_>> {
        (id < self.items.len()).then_some(ItemRef { relation: self, id })
    }

    pub fn features_mut(&mut self, id: ItemId) -> Option<&mut FeatureSet> {
        self.items.get_mut(id).map(|item| &mut item.features)
    }

    /// Items in head-to-tail order
    pub fn iter(&self) -> RelationIter<'_> {
        RelationIter {
            relation: self,
            cursor: self.head,
        }
    }

    /// Item ids in head-to-tail order
    pub fn ids(&self) -> Vec<ItemId> {
        self.iter().map(|item| item.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Head-to-tail iterator over a relation
pub struct RelationIter<'a> {
    relation: &'a Relation,
    cursor: Option<ItemId>,
}

impl<'a> Iterator for RelationIter<'a> {
    type Item = ItemRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        self.cursor = self.relation.items[id].next;
        Some(ItemRef {
            relation: self.relation,
            id,
        })
    }
}

/// Borrowed view of one item and its neighbours
#[derive(Clone, Copy)]
pub struct ItemRef<'a> {
    relation: &'a Relation,
    id: ItemId,
}

impl<'a> ItemRef<'a> {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn features(&self) -> &'a FeatureSet {
        &self.relation.items[self.id].features
    }

    pub fn next(&self) -> Option<ItemRef<'a>> {
        self.relation.items[self.id].next.map(|id| ItemRef {
            relation: self.relation,
            id,
        })
    }

    pub fn prev(&self) -> Option<ItemRef<'a>> {
        self.relation.items[self.id].prev.map(|id| ItemRef {
            relation: self.relation,
            id,
        })
    }

    /// Convenience accessor for the `name` feature
    pub fn name(&self) -> Option<&'a str> {
        self.features().get("name").and_then(FeatureValue::as_str)
    }
}

impl std::fmt::Debug for ItemRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemRef")
            .field("relation", &self.relation.name)
            .field("id", &self.id)
            .finish()
    }
}

impl FeatureSource for ItemRef<'_> {
    /// Resolve `name`, honouring `p.`, `pp.`, `n.` and `nn.` navigation
    /// prefixes. Stepping off either end of the relation yields `"0"`;
    /// a feature absent on an existing item yields `None`.
    fn find_feature(&self, name: &str) -> Option<FeatureValue> {
        let mut parts: Vec<&str> = name.split('.').collect();
        let feature = parts.pop()?;

        let mut current = Some(*self);
        for step in parts {
            let item = current?;
            current = match step {
                "p" => item.prev(),
                "pp" => item.prev().and_then(|i| i.prev()),
                "n" => item.next(),
                "nn" => item.next().and_then(|i| i.next()),
                _ => return None,
            };
            if current.is_none() {
                return Some(FeatureValue::Str("0".to_string()));
            }
        }

        current.and_then(|item| item.features().get(feature).cloned())
    }
}

/// One synthesis request and its accumulated intermediate data
#[derive(Debug)]
pub struct Utterance {
    id: Uuid,
    voice: Arc<Voice>,
    input_text: String,
    relations: HashMap<String, Relation>,
    properties: HashMap<String, PropertyValue>,
}

impl Utterance {
    pub fn new(voice: Arc<Voice>, input_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            voice,
            input_text: input_text.into(),
            relations: HashMap::new(),
            properties: HashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn voice(&self) -> &Arc<Voice> {
        &self.voice
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Relations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create (or replace) an empty relation and return it for filling
    pub fn create_relation(&mut self, name: &str) -> &mut Relation {
        let slot = self
            .relations
            .entry(name.to_string())
            .or_insert_with(|| Relation::new(name));
        *slot = Relation::new(name);
        slot
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn relation_mut(&mut self, name: &str) -> Option<&mut Relation> {
        self.relations.get_mut(name)
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Property bag
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_property(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.properties.insert(key.into(), value);
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.remove(key)
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.set_property(key, PropertyValue::Int(value));
    }

    pub fn get_int(&self, key: &str) -> Result<i64, PropertyError> {
        match self.properties.get(key) {
            Some(PropertyValue::Int(v)) => Ok(*v),
            Some(other) => Err(PropertyError::mismatch(key, "int", other)),
            None => Err(PropertyError::Missing(key.to_string())),
        }
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f32) {
        self.set_property(key, PropertyValue::Float(value));
    }

    pub fn get_float(&self, key: &str) -> Result<f32, PropertyError> {
        match self.properties.get(key) {
            Some(PropertyValue::Float(v)) => Ok(*v),
            Some(other) => Err(PropertyError::mismatch(key, "float", other)),
            None => Err(PropertyError::Missing(key.to_string())),
        }
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set_property(key, PropertyValue::Str(value.into()));
    }

    pub fn get_string(&self, key: &str) -> Result<&str, PropertyError> {
        match self.properties.get(key) {
            Some(PropertyValue::Str(v)) => Ok(v),
            Some(other) => Err(PropertyError::mismatch(key, "string", other)),
            None => Err(PropertyError::Missing(key.to_string())),
        }
    }

    pub fn set_chunks(&mut self, key: impl Into<String>, chunks: Vec<Bytes>) {
        self.set_property(key, PropertyValue::Chunks(chunks));
    }

    pub fn get_chunks(&self, key: &str) -> Result<&[Bytes], PropertyError> {
        match self.properties.get(key) {
            Some(PropertyValue::Chunks(v)) => Ok(v),
            Some(other) => Err(PropertyError::mismatch(key, "chunks", other)),
            None => Err(PropertyError::Missing(key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::NullAudioPlayer;

    fn test_voice() -> Arc<Voice> {
        Arc::new(Voice::new("test", Arc::new(NullAudioPlayer::new())))
    }

    fn phones(names: &[&str]) -> Relation {
        let mut relation = Relation::new(relation_names::SEGMENT);
        for name in names {
            relation.append(FeatureSet::new().with("name", *name));
        }
        relation
    }

    #[test]
    fn test_relation_order_and_links() {
        let relation = phones(&["pau", "hh", "ax"]);
        let names: Vec<_> = relation.iter().filter_map(|i| i.name()).collect();
        assert_eq!(names, vec!["pau", "hh", "ax"]);

        let head = relation.head().unwrap();
        assert!(head.prev().is_none());
        assert_eq!(head.next().unwrap().name(), Some("hh"));
        assert_eq!(relation.tail().unwrap().prev().unwrap().name(), Some("hh"));
        assert_eq!(relation.ids(), vec![0, 1, 2]);
    }

    #[test]
    fn test_path_features() {
        let relation = phones(&["pau", "hh", "ax"]);
        let middle = relation.item(1).unwrap();

        assert_eq!(middle.find_feature("name"), Some(FeatureValue::from("hh")));
        assert_eq!(middle.find_feature("p.name"), Some(FeatureValue::from("pau")));
        assert_eq!(middle.find_feature("n.name"), Some(FeatureValue::from("ax")));
        assert_eq!(middle.find_feature("nn.name"), Some(FeatureValue::from("0")));
        assert_eq!(middle.find_feature("stress"), None);
        assert_eq!(middle.find_feature("x.name"), None);
    }

    #[test]
    fn test_features_mut_writes_through() {
        let mut relation = phones(&["aa"]);
        relation.features_mut(0).unwrap().set_float("end", 0.1);
        assert_eq!(relation.head().unwrap().features().get_float("end").unwrap(), 0.1);
        assert!(relation.features_mut(7).is_none());
    }

    #[test]
    fn test_property_bag_typed_access() {
        let mut utt = Utterance::new(test_voice(), "hello");
        utt.set_int(property_keys::PCM_AUDIO_LENGTH, 4);
        utt.set_chunks(property_keys::PCM_AUDIO, vec![Bytes::from_static(&[0, 1, 2, 3])]);

        assert_eq!(utt.get_int(property_keys::PCM_AUDIO_LENGTH).unwrap(), 4);
        assert_eq!(utt.get_chunks(property_keys::PCM_AUDIO).unwrap().len(), 1);
        assert_eq!(
            utt.get_string(property_keys::PCM_AUDIO_LENGTH).unwrap_err(),
            PropertyError::TypeMismatch {
                key: property_keys::PCM_AUDIO_LENGTH.to_string(),
                expected: "string",
                actual: "int",
            }
        );
        assert_eq!(
            utt.get_float("missing").unwrap_err(),
            PropertyError::Missing("missing".to_string())
        );
    }

    #[test]
    fn test_create_relation_replaces() {
        let mut utt = Utterance::new(test_voice(), "");
        utt.create_relation(relation_names::SEGMENT)
            .append(FeatureSet::new().with("name", "aa"));
        assert_eq!(utt.relation(relation_names::SEGMENT).unwrap().len(), 1);

        utt.create_relation(relation_names::SEGMENT);
        assert!(utt.relation(relation_names::SEGMENT).unwrap().is_empty());
    }
}
