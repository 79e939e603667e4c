use tracing::debug;

use crate::core::features::FeatureSet;
use crate::core::tokenizer::{SymbolClasses, Token, Tokenizer};
use crate::core::utterance::{Utterance, relation_names};
use crate::pipeline::UtteranceProcessor;
use crate::pipeline::error::ProcessResult;

/// Lexes the utterance's input text into the `Token` relation
///
/// Each non-empty token becomes one item with `name`, `whitespace`,
/// `prepunctuation`, `punc`, `position`, `line` and `break` (1 when a sentence
/// boundary precedes the token) features. Tokens with an empty word carry
/// only trailing whitespace and are dropped.
#[derive(Debug, Clone, Default)]
pub struct TokenizerStage {
    symbols: SymbolClasses,
}

impl TokenizerStage {
    pub fn new(symbols: SymbolClasses) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &SymbolClasses {
        &self.symbols
    }
}

fn token_features(token: &Token, is_break: bool) -> FeatureSet {
    FeatureSet::new()
        .with("name", token.word())
        .with("whitespace", token.whitespace())
        .with("prepunctuation", token.prepunctuation())
        .with("punc", token.postpunctuation())
        .with("position", token.position() as i64)
        .with("line", token.line_number() as i64)
        .with("break", i64::from(is_break))
}

impl UtteranceProcessor for TokenizerStage {
    fn name(&self) -> &str {
        "tokenizer"
    }

    fn process_utterance(&self, utterance: &mut Utterance) -> ProcessResult<()> {
        let mut tokenizer = Tokenizer::from_text(utterance.input_text()).with_symbols(self.symbols.clone());

        let mut items = Vec::new();
        while tokenizer.has_more_tokens() {
            let token = tokenizer.next_token();
            if token.word().is_empty() {
                continue;
            }
            items.push(token_features(&token, tokenizer.is_break()));
        }

        let count = items.len();
        let relation = utterance.create_relation(relation_names::TOKEN);
        for features in items {
            relation.append(features);
        }

        debug!(utterance_id = %utterance.id(), tokens = count, "Tokenized utterance");
        Ok(())
    }
}
