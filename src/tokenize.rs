//! Token extraction on top of an external morphological analyzer.
//!
//! The analyzer itself is pluggable through [`Analyzer`]. This module only
//! decides which morphemes become tokens: content words (noun, verb,
//! adjective) in base form, longer than one character, not stopwords, and
//! containing Japanese script.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rayon::prelude::*;

use crate::error::{NetworkError, Result};

/// Default Japanese stopwords: particles, auxiliaries, honorifics and survey filler.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "の", "に", "は", "を", "た", "が", "で", "て", "と", "し", "れ", "さ", "ある", "いる", "も",
    "する", "から", "な", "こと", "として", "い", "や", "れる", "など", "ない", "この", "ため",
    "その", "よう", "また", "もの", "ます", "です", "さん", "ちゃん", "くん", "あっ", "あり",
    "いっ", "う", "か", "せる", "たい", "だけ", "たち", "ついて", "でき", "なり", "ばかり", "ほど",
    "まで", "まま", "より", "わたし", "それ", "これ", "回答", "なし", "特になし", "特に", "てき",
    "それら",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Other(String),
}

impl PartOfSpeech {
    /// Accepts English tags and the Japanese IPA top-level categories.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "noun" | "n" | "名詞" => PartOfSpeech::Noun,
            "verb" | "v" | "動詞" => PartOfSpeech::Verb,
            "adjective" | "adj" | "形容詞" => PartOfSpeech::Adjective,
            other => PartOfSpeech::Other(other.to_string()),
        }
    }

    pub fn is_content_word(&self) -> bool {
        matches!(
            self,
            PartOfSpeech::Noun | PartOfSpeech::Verb | PartOfSpeech::Adjective
        )
    }
}

/// One analyzed word: its dictionary form and part of speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    pub base_form: String,
    pub pos: PartOfSpeech,
}

/// A morphological analyzer. Must be shareable across threads since records
/// are analyzed in parallel.
pub trait Analyzer: Sync {
    fn analyze(&self, text: &str) -> Vec<Morpheme>;
}

/// Analyzer for text that was segmented upstream.
///
/// Words are separated by whitespace (including the ideographic space).
/// A word may carry its part of speech after a slash, `走る/動詞`; untagged
/// words are treated as nouns. Surrounding punctuation is stripped.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceAnalyzer;

const PUNCTUATION: &[char] = &[
    '、', '。', '，', '．', '！', '？', '「', '」', '『', '』', '（', '）', '【', '】', '・', '…',
    ',', '.', '!', '?', '(', ')', '"', '\'', ':', ';', '[', ']',
];

impl Analyzer for WhitespaceAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Morpheme> {
        text.split_whitespace()
            .filter_map(|word| {
                let (base, pos) = match word.rsplit_once('/') {
                    Some((base, tag)) if !base.is_empty() => {
                        (base, PartOfSpeech::parse(tag.trim_matches(PUNCTUATION)))
                    }
                    _ => (word, PartOfSpeech::Noun),
                };
                let base = base.trim_matches(PUNCTUATION);
                (!base.is_empty()).then(|| Morpheme {
                    base_form: base.to_string(),
                    pos,
                })
            })
            .collect()
    }
}

/// True for hiragana, katakana and CJK unified ideographs.
pub fn is_japanese_char(c: char) -> bool {
    matches!(c, 'ぁ'..='ん' | 'ァ'..='ン' | '一'..='龥')
}

/// The token predicates: content word, length, stopwords, script.
#[derive(Debug, Clone, Default)]
pub struct TokenFilter {
    stopwords: HashSet<String>,
}

impl TokenFilter {
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TokenFilter {
            stopwords: stopwords.into_iter().map(Into::into).collect(),
        }
    }

    /// Filter with [`DEFAULT_STOPWORDS`] plus `extra`.
    pub fn with_defaults<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = TokenFilter::new(DEFAULT_STOPWORDS.iter().copied());
        filter.stopwords.extend(extra.into_iter().map(Into::into));
        filter
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    pub fn stopword_count(&self) -> usize {
        self.stopwords.len()
    }

    pub fn accepts(&self, morpheme: &Morpheme) -> bool {
        let base = morpheme.base_form.as_str();
        morpheme.pos.is_content_word()
            && base.chars().count() > 1
            && !self.is_stopword(base)
            && base.chars().any(is_japanese_char)
    }
}

///Turns raw text into the ordered list of accepted base forms.
/// # Example
/// ```
/// use text_network::{tokenize, TokenFilter, WhitespaceAnalyzer};
/// let filter = TokenFilter::with_defaults(Vec::<String>::new());
/// let tokens = tokenize(&WhitespaceAnalyzer, "駅 が 近い/形容詞 ok 便利", &filter);
/// assert_eq!(tokens, vec!["近い".to_string(), "便利".to_string()]);
/// ```
pub fn tokenize<A: Analyzer + ?Sized>(analyzer: &A, text: &str, filter: &TokenFilter) -> Vec<String> {
    analyzer
        .analyze(text)
        .into_iter()
        .filter(|m| filter.accepts(m))
        .map(|m| m.base_form)
        .collect()
}

/// Tokenizes every record in parallel. Output order matches input order.
pub fn tokenize_all<A, S>(analyzer: &A, texts: &[S], filter: &TokenFilter) -> Vec<Vec<String>>
where
    A: Analyzer + ?Sized,
    S: AsRef<str> + Sync,
{
    texts
        .par_iter()
        .map(|text| tokenize(analyzer, text.as_ref(), filter))
        .collect()
}

///Parses a user-entered stopword string. Full-width spaces separate words too; duplicates keep their first position.
/// # Example
/// ```
/// use text_network::parse_stopword_input;
/// let words = parse_stopword_input("私　思う アンケート 思う");
/// assert_eq!(words, vec!["私", "思う", "アンケート"]);
/// ```
pub fn parse_stopword_input(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    input
        .replace('\u{3000}', " ")
        .split_whitespace()
        .filter(|w| seen.insert(w.to_string()))
        .map(String::from)
        .collect()
}

/// Reads a stopword file: words separated by newlines or spaces.
pub fn load_stopwords(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| NetworkError::io(e, path))?;
    Ok(parse_stopword_input(&content))
}
