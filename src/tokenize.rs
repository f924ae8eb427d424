use itertools::Itertools;
use std::ops::Deref;
use thiserror::Error;

use crate::corpus::{cmp_numeric_keys, TextStore};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("{}", not_found_message(.book, .chapter.as_deref()))]
    NotFound {
        book: String,
        chapter: Option<String>,
    },
    #[error("No text found for {book} {chapter}.")]
    EmptyChapter { book: String, chapter: String },
}

fn not_found_message(book: &str, chapter: Option<&str>) -> String {
    match chapter {
        Some(chapter) => format!("Chapter {chapter} not found for {book}."),
        None => format!("Book \"{book}\" not found."),
    }
}

/// Non-empty, ordered words of one chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordSequence(Vec<String>);

impl Deref for WordSequence {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Keeps contractions and hyphenated words, strips surrounding punctuation.
/// Tokens with any non-ASCII character are left as they are.
pub fn clean_token(token: &str) -> String {
    if !token.is_ascii() {
        return token.to_string();
    }
    token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '\'' | '-'))
        .collect()
}

/// Splits already-joined text into cleaned, non-empty words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(clean_token)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Builds the word sequence for one chapter, verses in numeric order.
pub fn prepare_text(
    store: &TextStore,
    book: &str,
    chapter: &str,
) -> Result<WordSequence, TokenizeError> {
    let verses = store
        .book(book)
        .ok_or_else(|| TokenizeError::NotFound {
            book: book.to_string(),
            chapter: None,
        })?
        .get(chapter)
        .ok_or_else(|| TokenizeError::NotFound {
            book: book.to_string(),
            chapter: Some(chapter.to_string()),
        })?;

    let full_text = verses
        .iter()
        .sorted_by(|(a, _), (b, _)| cmp_numeric_keys(a, b))
        .map(|(_, text)| text.replace('\n', " ").trim().to_string())
        .join(" ");

    let words = tokenize(&full_text);
    log::debug!("{book} {chapter}: {} verses, {} words", verses.len(), words.len());

    if words.is_empty() {
        return Err(TokenizeError::EmptyChapter {
            book: book.to_string(),
            chapter: chapter.to_string(),
        });
    }
    Ok(WordSequence(words))
}
