//! Text tokenizer
//!
//! Splits a character stream into [`Token`]s using four configurable symbol
//! classes (whitespace, single-character symbols, pre-punctuation and
//! post-punctuation). The lexer keeps exactly one character of lookahead;
//! end of input is represented by `None` so it can never collide with a real
//! character.
//!
//! Read failures on a stream source are not raised. The error text is
//! recorded (see [`Tokenizer::has_errors`]) and the source is treated as
//! exhausted from then on.
//!
//! # Example
//!
//! ```rust
//! use waav_synth::core::tokenizer::Tokenizer;
//!
//! let words: Vec<String> = Tokenizer::from_text("Hello, world!")
//!     .map(|token| token.word().to_string())
//!     .collect();
//! assert_eq!(words, vec!["Hello", "world"]);
//! ```

use std::collections::VecDeque;
use std::io::BufRead;

use serde::{Deserialize, Serialize};

pub const DEFAULT_WHITESPACE_SYMBOLS: &str = " \t\n\r";
pub const DEFAULT_SINGLE_CHAR_SYMBOLS: &str = "(){}[]";
pub const DEFAULT_PREPUNCTUATION_SYMBOLS: &str = "\"'`({[";
pub const DEFAULT_POSTPUNCTUATION_SYMBOLS: &str = "\"'`.,:;!?(){}[]";

/// The four character classes that drive tokenization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolClasses {
    pub whitespace: String,
    pub single_char: String,
    pub prepunctuation: String,
    pub postpunctuation: String,
}

impl Default for SymbolClasses {
    fn default() -> Self {
        Self {
            whitespace: DEFAULT_WHITESPACE_SYMBOLS.to_string(),
            single_char: DEFAULT_SINGLE_CHAR_SYMBOLS.to_string(),
            prepunctuation: DEFAULT_PREPUNCTUATION_SYMBOLS.to_string(),
            postpunctuation: DEFAULT_POSTPUNCTUATION_SYMBOLS.to_string(),
        }
    }
}

/// One lexical token and the text that surrounded it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Token {
    word: String,
    whitespace: String,
    prepunctuation: String,
    postpunctuation: String,
    position: usize,
    line_number: usize,
}

impl Token {
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Whitespace preceding the token
    pub fn whitespace(&self) -> &str {
        &self.whitespace
    }

    pub fn prepunctuation(&self) -> &str {
        &self.prepunctuation
    }

    pub fn postpunctuation(&self) -> &str {
        &self.postpunctuation
    }

    /// Number of characters consumed from the source when the word ended
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Source text covered by this token, in order
    pub fn source_text(&self) -> String {
        let mut text = String::with_capacity(
            self.whitespace.len()
                + self.prepunctuation.len()
                + self.word.len()
                + self.postpunctuation.len(),
        );
        text.push_str(&self.whitespace);
        text.push_str(&self.prepunctuation);
        text.push_str(&self.word);
        text.push_str(&self.postpunctuation);
        text
    }
}

/// Heuristic sentence boundary between two consecutive tokens
///
/// A break is reported when:
/// - the current token is preceded by a blank line (two or more newlines)
/// - the previous token's post-punctuation contains `:`, `?` or `!`
/// - the previous token's post-punctuation contains `.` and the current word
///   starts with an uppercase letter, provided either more than one
///   whitespace character separates them or the previous word does not end
///   in an uppercase letter
pub fn is_break_between(previous: &Token, current: &Token) -> bool {
    if current.whitespace.matches('\n').count() >= 2 {
        return true;
    }

    let post = previous.postpunctuation.as_str();
    if post.contains([':', '?', '!']) {
        return true;
    }

    if post.contains('.') {
        let starts_upper = current
            .word
            .chars()
            .next()
            .is_some_and(char::is_uppercase);
        if !starts_upper {
            return false;
        }
        if current.whitespace.chars().count() > 1 {
            return true;
        }
        let previous_ends_upper = previous
            .word
            .chars()
            .last()
            .is_some_and(char::is_uppercase);
        return !previous_ends_upper;
    }

    false
}

enum CharSource {
    Exhausted,
    Text {
        chars: Vec<char>,
        index: usize,
    },
    Reader {
        reader: Box<dyn BufRead + Send>,
        pending: VecDeque<char>,
        /// Read failure to report once `pending` drains
        failure: Option<String>,
    },
}

#[derive(Clone, Copy)]
enum SymbolClass {
    Whitespace,
    Prepunctuation,
}

/// Stateful lexer over one character source
pub struct Tokenizer {
    symbols: SymbolClasses,
    source: CharSource,
    /// Lookahead character; `None` once the source is exhausted
    current: Option<char>,
    position: usize,
    line_number: usize,
    error_description: Option<String>,
    token: Option<Token>,
    last_token: Option<Token>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            symbols: SymbolClasses::default(),
            source: CharSource::Exhausted,
            current: None,
            position: 0,
            line_number: 0,
            error_description: None,
            token: None,
            last_token: None,
        }
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("symbols", &self.symbols)
            .field("current", &self.current)
            .field("position", &self.position)
            .field("line_number", &self.line_number)
            .field("error_description", &self.error_description)
            .finish()
    }
}

impl Tokenizer {
    /// Tokenizer with no input; reports no tokens until a source is set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        let mut tokenizer = Self::new();
        tokenizer.set_input_text(text);
        tokenizer
    }

    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        let mut tokenizer = Self::new();
        tokenizer.set_input_reader(reader);
        tokenizer
    }

    /// Replace all four symbol classes
    pub fn with_symbols(mut self, symbols: SymbolClasses) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn symbols(&self) -> &SymbolClasses {
        &self.symbols
    }

    pub fn set_whitespace_symbols(&mut self, symbols: impl Into<String>) {
        self.symbols.whitespace = symbols.into();
    }

    pub fn set_single_char_symbols(&mut self, symbols: impl Into<String>) {
        self.symbols.single_char = symbols.into();
    }

    pub fn set_prepunctuation_symbols(&mut self, symbols: impl Into<String>) {
        self.symbols.prepunctuation = symbols.into();
    }

    pub fn set_postpunctuation_symbols(&mut self, symbols: impl Into<String>) {
        self.symbols.postpunctuation = symbols.into();
    }

    /// Start a new session over an in-memory string
    pub fn set_input_text(&mut self, text: &str) {
        self.reset_session(CharSource::Text {
            chars: text.chars().collect(),
            index: 0,
        });
    }

    /// Start a new session over a character stream
    pub fn set_input_reader(&mut self, reader: impl BufRead + Send + 'static) {
        self.reset_session(CharSource::Reader {
            reader: Box::new(reader),
            pending: VecDeque::new(),
            failure: None,
        });
    }

    fn reset_session(&mut self, source: CharSource) {
        self.source = source;
        self.position = 0;
        self.line_number = 0;
        self.error_description = None;
        self.token = None;
        self.last_token = None;
        self.advance();
    }

    /// Whether the lookahead character is not end of input
    pub fn has_more_tokens(&self) -> bool {
        self.current.is_some()
    }

    pub fn has_errors(&self) -> bool {
        self.error_description.is_some()
    }

    pub fn error_description(&self) -> Option<&str> {
        self.error_description.as_deref()
    }

    /// Lex the next token
    ///
    /// Once input is exhausted this keeps returning empty tokens.
    pub fn next_token(&mut self) -> Token {
        self.last_token = self.token.take();

        let line_number = self.line_number;
        let whitespace = self.take_class(SymbolClass::Whitespace, true);
        let prepunctuation = self.take_class(SymbolClass::Prepunctuation, true);

        let raw_word = match self.current {
            Some(c) if self.symbols.single_char.contains(c) => {
                self.advance();
                c.to_string()
            }
            _ => self.take_class(SymbolClass::Whitespace, false),
        };
        let position = self.position;

        let (word, postpunctuation) = self.split_postpunctuation(raw_word);

        let token = Token {
            word,
            whitespace,
            prepunctuation,
            postpunctuation,
            position,
            line_number,
        };
        self.token = Some(token.clone());
        token
    }

    /// Sentence-break heuristic over the two most recently produced tokens
    pub fn is_break(&self) -> bool {
        match (&self.last_token, &self.token) {
            (Some(previous), Some(current)) => is_break_between(previous, current),
            _ => false,
        }
    }

    fn class_contains(&self, class: SymbolClass, c: char) -> bool {
        match class {
            SymbolClass::Whitespace => self.symbols.whitespace.contains(c),
            SymbolClass::Prepunctuation => self.symbols.prepunctuation.contains(c),
        }
    }

    /// Consume characters while their membership in `class` equals `inside`,
    /// always stopping at single-character symbols and end of input
    fn take_class(&mut self, class: SymbolClass, inside: bool) -> String {
        let mut buffer = String::new();
        while let Some(c) = self.current {
            if self.class_contains(class, c) != inside || self.symbols.single_char.contains(c) {
                break;
            }
            buffer.push(c);
            self.advance();
        }
        buffer
    }

    /// Scan backward over trailing post-punctuation. The first character is
    /// never stripped, so a lone punctuation mark stays a word.
    fn split_postpunctuation(&self, word: String) -> (String, String) {
        let boundaries: Vec<usize> = word.char_indices().map(|(i, _)| i).collect();
        let Some(last) = boundaries.len().checked_sub(1) else {
            return (word, String::new());
        };

        let mut keep = last;
        while keep > 0 {
            let c = word[boundaries[keep]..].chars().next();
            match c {
                Some(c) if self.symbols.postpunctuation.contains(c) => keep -= 1,
                _ => break,
            }
        }

        if keep == last {
            return (word, String::new());
        }
        let split = boundaries[keep + 1];
        let postpunctuation = word[split..].to_string();
        let mut word = word;
        word.truncate(split);
        (word, postpunctuation)
    }

    fn advance(&mut self) {
        self.current = self.read_char();
        if let Some(c) = self.current {
            self.position += 1;
            if c == '\n' {
                self.line_number += 1;
            }
        }
    }

    fn read_char(&mut self) -> Option<char> {
        let error = match &mut self.source {
            CharSource::Exhausted => return None,
            CharSource::Text { chars, index } => {
                let c = chars.get(*index).copied();
                if c.is_some() {
                    *index += 1;
                }
                return c;
            }
            CharSource::Reader {
                reader,
                pending,
                failure,
            } => loop {
                if let Some(c) = pending.pop_front() {
                    return Some(c);
                }
                if let Some(error) = failure.take() {
                    break error;
                }
                if !fill_pending(reader.as_mut(), pending, failure) {
                    return None;
                }
            },
        };

        tracing::warn!(error = %error, "Tokenizer source read failed");
        self.error_description = Some(error);
        self.source = CharSource::Exhausted;
        None
    }
}

/// Read one line into `pending`, keeping every character decoded before a
/// failure. Returns `false` at a clean end of input.
fn fill_pending(
    reader: &mut (dyn BufRead + Send),
    pending: &mut VecDeque<char>,
    failure: &mut Option<String>,
) -> bool {
    let mut bytes = Vec::new();
    let read = reader.read_until(b'\n', &mut bytes);

    let valid_len = match std::str::from_utf8(&bytes) {
        Ok(_) => bytes.len(),
        Err(e) => e.valid_up_to(),
    };
    pending.extend(String::from_utf8_lossy(&bytes[..valid_len]).chars());

    match read {
        Err(e) => *failure = Some(e.to_string()),
        Ok(_) if valid_len < bytes.len() => {
            *failure = Some(format!(
                "stream did not contain valid UTF-8 after {} bytes of the line",
                valid_len
            ));
        }
        Ok(_) => {}
    }

    !pending.is_empty() || failure.is_some()
}

impl Iterator for Tokenizer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.has_more_tokens().then(|| self.next_token())
    }
}
