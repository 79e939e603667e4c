//! Voice, utterance and duration-model fixtures
//!
//! A three-phone toy voice: phones `a`, `b`, `c` with fixed duration
//! statistics and a small CART that predicts a z-score from the phone name
//! and its right neighbour.

use std::sync::Arc;

use waav_synth::core::features::FeatureSet;
use waav_synth::core::utterance::relation_names;
use waav_synth::{AudioPlayer, DecisionTree, PhoneDurationTable, Utterance, Voice};

/// Duration table resource in the plain `name mean stddev` format
pub const DURATION_TABLE: &str = "\
# phone  mean   stddev
a        0.100  0.020
b        0.200  0.040
c        0.050  0.010
pau      0.250  0.000
";

/// z = 1.0 for `a` before `b`, -1.0 for any other `a`, 0.0 otherwise
pub const DURATION_CART_YAML: &str = r#"
name: toy_durations
nodes:
  - type: decision
    feature: name
    op: "="
    value: a
    yes: 1
    no: 4
  - type: decision
    feature: n.name
    op: "="
    value: b
    yes: 2
    no: 3
  - type: leaf
    value: 1.0
  - type: leaf
    value: -1.0
  - type: leaf
    value: 0.0
"#;

pub fn duration_table() -> Arc<PhoneDurationTable> {
    Arc::new(PhoneDurationTable::from_reader(DURATION_TABLE.as_bytes()).unwrap())
}

pub fn duration_cart() -> Arc<DecisionTree> {
    Arc::new(DecisionTree::from_yaml_str(DURATION_CART_YAML).unwrap())
}

pub fn voice(player: Arc<dyn AudioPlayer>, rate: f32) -> Arc<Voice> {
    Arc::new(Voice::new("toy", player).with_rate(rate))
}

/// Utterance with one `Segment` item per phone
pub fn utterance_with_segments(voice: Arc<Voice>, phones: &[&str]) -> Utterance {
    let mut utterance = Utterance::new(voice, phones.join(" "));
    let relation = utterance.create_relation(relation_names::SEGMENT);
    for phone in phones {
        relation.append(FeatureSet::new().with("name", *phone));
    }
    utterance
}

/// `end` feature of every segment, in order
pub fn segment_ends(utterance: &Utterance) -> Vec<Option<f32>> {
    utterance
        .relation(relation_names::SEGMENT)
        .map(|relation| {
            relation
                .iter()
                .map(|item| item.features().get_float("end").ok())
                .collect()
        })
        .unwrap_or_default()
}
