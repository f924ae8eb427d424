//! Optimal recognition point: the character a reader's eye should fixate on.

/// Character index to emphasize in `word`.
///
/// Counts Unicode scalar values, so the index is valid for `chars().nth()`
/// on any script. Callers never pass an empty word.
pub fn orp_index(word: &str) -> usize {
    let len = word.chars().count();
    match len {
        0 | 1 => 0,
        2 | 3 => 1,
        _ => (len as f64 * 0.35).floor() as usize,
    }
}

/// One revealed word, split around its ORP, plus where it sits in the chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordFrame {
    pub before: String,
    pub emphasized: char,
    pub after: String,
    /// 1-based position of this word in the chapter.
    pub progress_current: usize,
    pub progress_total: usize,
    pub location_label: String,
}

impl WordFrame {
    pub fn new(word: &str, progress_current: usize, progress_total: usize, location: &str) -> Self {
        let orp = orp_index(word);
        let mut chars = word.chars();
        let before: String = chars.by_ref().take(orp).collect();
        let emphasized = chars.next().unwrap_or(' ');
        let after: String = chars.collect();

        Self {
            before,
            emphasized,
            after,
            progress_current,
            progress_total,
            location_label: location.to_string(),
        }
    }

    pub fn word(&self) -> String {
        format!("{}{}{}", self.before, self.emphasized, self.after)
    }

    /// Fraction of the chapter shown so far, in `0.0..=1.0`.
    pub fn ratio(&self) -> f64 {
        if self.progress_total == 0 {
            0.0
        } else {
            (self.progress_current as f64 / self.progress_total as f64).clamp(0.0, 1.0)
        }
    }
}
