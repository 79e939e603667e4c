pub mod audio;
pub mod cart;
pub mod duration;
pub mod features;
pub mod tokenizer;
pub mod utterance;
pub mod voice;

// Re-export commonly used types for convenience
pub use audio::{
    AudioFormat, AudioPlayer, ByteOrder, EXTERNAL_SYNTH_FORMAT, NullAudioPlayer,
    RawFileAudioPlayer, SampleEncoding, SinkKind, StreamingAudioPlayer, StreamingOptions,
    TIME_UNSUPPORTED, WavFileAudioPlayer, create_audio_player,
};

pub use cart::{CartDefinition, CartError, CartResult, DecisionTree, NodeDefinition, Operator};

pub use duration::{DurationTableError, PhoneDuration, PhoneDurationTable};

pub use features::{FeatureError, FeatureSet, FeatureSource, FeatureValue};

pub use tokenizer::{SymbolClasses, Token, Tokenizer, is_break_between};

pub use utterance::{
    ItemId, ItemRef, PropertyError, PropertyValue, Relation, Utterance, property_keys,
    relation_names,
};

pub use voice::Voice;
