use std::fmt;

use crate::corpus::TextStore;

/// A (book, chapter) address in a [`TextStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChapterRef {
    pub book: String,
    pub chapter: String,
}

impl ChapterRef {
    pub fn new(book: impl Into<String>, chapter: impl Into<String>) -> Self {
        Self {
            book: book.into(),
            chapter: chapter.into(),
        }
    }
}

impl fmt::Display for ChapterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.book, self.chapter)
    }
}

/// The chapter that follows `current_chapter` of `current_book`.
///
/// Chapter `n + 1` of the same book wins; otherwise the first chapter of the
/// next book in `book_order` that has any. `None` at the end of the corpus.
pub fn next_chapter(
    store: &TextStore,
    current_book: &str,
    current_chapter: &str,
    book_order: &[String],
) -> Option<ChapterRef> {
    if let Some(n) = current_chapter
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_add(1))
    {
        let candidate = n.to_string();
        if store.has_chapter(current_book, &candidate) {
            return Some(ChapterRef::new(current_book, candidate));
        }
    }

    let position = book_order.iter().position(|b| b == current_book)?;
    book_order[position + 1..].iter().find_map(|book| {
        store
            .first_chapter(book)
            .map(|chapter| ChapterRef::new(book.as_str(), chapter))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TextStore {
        TextStore::from_json(
            "TEST",
            r#"{
                "Genesis": { "1": {"1": "a"}, "2": {"1": "b"}, "4": {"1": "d"} },
                "Exodus": {},
                "Ruth": { "3": {"1": "r"}, "1": {"1": "q"} },
                "Jonah": { "1": {"1": "Now the word of the LORD came unto Jonah"} }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_next_chapter_same_book() {
        let s = store();
        let order = s.book_order();
        assert_eq!(
            next_chapter(&s, "Genesis", "1", &order),
            Some(ChapterRef::new("Genesis", "2"))
        );
    }

    #[test]
    fn test_gap_moves_to_next_book_first_chapter() {
        let s = store();
        let order = s.book_order();
        // Genesis 3 is missing: no skipping ahead to 4 within the book
        assert_eq!(
            next_chapter(&s, "Genesis", "2", &order),
            Some(ChapterRef::new("Ruth", "1"))
        );
    }

    #[test]
    fn test_skips_books_without_chapters() {
        let s = store();
        let order = vec!["Genesis".to_string(), "Exodus".to_string(), "Jonah".to_string()];
        assert_eq!(
            next_chapter(&s, "Genesis", "4", &order),
            Some(ChapterRef::new("Jonah", "1"))
        );
    }

    #[test]
    fn test_end_of_corpus() {
        let s = store();
        let order = s.book_order();
        assert_eq!(next_chapter(&s, "Jonah", "1", &order), None);
    }

    #[test]
    fn test_unknown_book_has_no_successor() {
        let s = store();
        let order = s.book_order();
        assert_eq!(next_chapter(&s, "Tobit", "1", &order), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ChapterRef::new("Psalms", "23").to_string(), "Psalms 23");
    }
}
