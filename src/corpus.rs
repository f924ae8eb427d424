use include_dir::{include_dir, Dir};
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::canon::{canonical_position, BOOK_ORDER};

static CORPUS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/corpus");

/// verse number -> verse text
pub type Chapter = BTreeMap<String, String>;
/// chapter number -> chapter
pub type Book = BTreeMap<String, Chapter>;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed corpus {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Orders numeric keys ("9" before "10"); anything non-numeric sorts last.
pub fn cmp_numeric_keys(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u32>(), b.trim().parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// One translation of the corpus: book -> chapter -> verse -> text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStore {
    name: String,
    books: BTreeMap<String, Book>,
}

impl TextStore {
    pub fn new(name: impl Into<String>, books: BTreeMap<String, Book>) -> Self {
        Self {
            name: name.into(),
            books,
        }
    }

    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, CorpusError> {
        let name = name.into();
        let books = serde_json::from_str::<BTreeMap<String, Book>>(json).map_err(|source| {
            CorpusError::Parse {
                name: name.clone(),
                source,
            }
        })?;
        Ok(Self { name, books })
    }

    /// Loads a corpus file; the version name is the upper-cased file stem.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(version_name(path), &json)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn book(&self, book: &str) -> Option<&Book> {
        self.books.get(book)
    }

    pub fn chapter(&self, book: &str, chapter: &str) -> Option<&Chapter> {
        self.books.get(book).and_then(|b| b.get(chapter))
    }

    pub fn has_chapter(&self, book: &str, chapter: &str) -> bool {
        self.chapter(book, chapter).is_some()
    }

    /// Chapter keys of `book` in ascending numeric order.
    pub fn chapter_numbers(&self, book: &str) -> Vec<&str> {
        self.books
            .get(book)
            .map(|b| {
                b.keys()
                    .map(String::as_str)
                    .sorted_by(|a, b| cmp_numeric_keys(a, b))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn first_chapter(&self, book: &str) -> Option<&str> {
        self.chapter_numbers(book).into_iter().next()
    }

    pub fn chapter_count(&self, book: &str) -> usize {
        self.books.get(book).map_or(0, |b| b.len())
    }

    pub fn total_chapters(&self) -> usize {
        self.books.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_chapters() == 0
    }

    /// Books that have at least one chapter, canonical books first in
    /// canonical order, then the rest by name.
    pub fn book_order(&self) -> Vec<String> {
        let canonical = BOOK_ORDER
            .iter()
            .filter(|b| self.chapter_count(b) > 0)
            .map(|b| b.to_string());
        let others = self
            .books
            .iter()
            .filter(|(name, chapters)| !chapters.is_empty() && canonical_position(name).is_none())
            .map(|(name, _)| name.clone());
        canonical.chain(others).collect()
    }
}

fn version_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_else(|| "CUSTOM".to_string())
}

/// All loaded versions, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Library {
    versions: BTreeMap<String, Arc<TextStore>>,
}

impl Library {
    /// The sample corpus compiled into the binary.
    pub fn embedded() -> Self {
        let mut library = Self::default();
        for file in CORPUS_DIR.files() {
            let Some(json) = file.contents_utf8() else {
                continue;
            };
            match TextStore::from_json(version_name(file.path()), json) {
                Ok(store) => library.insert(store),
                Err(e) => log::error!("embedded corpus {}: {e}", file.path().display()),
            }
        }
        library
    }

    /// Loads every `*.json` file of `dir`. A missing directory is not an error.
    pub fn load_dir<P: AsRef<Path>>(&mut self, dir: P) -> Vec<CorpusError> {
        let dir = dir.as_ref();
        let Ok(entries) = fs::read_dir(dir) else {
            log::debug!("no versions directory at {}", dir.display());
            return Vec::new();
        };

        let mut errors = Vec::new();
        for path in entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .sorted()
        {
            match TextStore::load(&path) {
                Ok(store) => self.insert(store),
                Err(e) => errors.push(e),
            }
        }
        errors
    }

    /// Adds a version, replacing any version of the same name.
    pub fn insert(&mut self, store: TextStore) {
        log::info!(
            "loaded version {} ({} books, {} chapters)",
            store.name(),
            store.book_order().len(),
            store.total_chapters()
        );
        self.versions.insert(store.name().to_string(), Arc::new(store));
    }

    pub fn get(&self, name: &str) -> Option<Arc<TextStore>> {
        self.versions
            .get(name)
            .or_else(|| self.versions.get(&name.to_uppercase()))
            .cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.versions.keys().map(String::as_str).collect()
    }

    /// Version after `current` in name order, wrapping around.
    pub fn next_name(&self, current: &str) -> Option<&str> {
        let names = self.names();
        let idx = names.iter().position(|n| *n == current)?;
        names.get((idx + 1) % names.len()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.values().all(|v| v.is_empty())
    }
}
