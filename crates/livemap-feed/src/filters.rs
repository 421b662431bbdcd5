/// Phrases excluded when no configuration overrides them: the upstream
/// placeholder item and routine prescribed burns.
pub const DEFAULT_EXCLUDE_PHRASES: [&str; 2] = ["insert filters", "burn off"];

/// Case-insensitive title substrings that keep an entry out of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionFilters {
    phrases: Vec<String>,
}

impl ExclusionFilters {
    #[must_use]
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    /// Filters that let every entry through.
    #[must_use]
    pub fn none() -> Self {
        Self {
            phrases: Vec::new(),
        }
    }

    /// Returns the first configured phrase contained in `title`, if any.
    #[must_use]
    pub fn matching_phrase(&self, title: &str) -> Option<&str> {
        if self.phrases.is_empty() {
            return None;
        }
        let lower = title.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| lower.contains(phrase.as_str()))
            .map(String::as_str)
    }

    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

impl Default for ExclusionFilters {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDE_PHRASES)
    }
}
