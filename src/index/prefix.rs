//! Ordered prefix index.
//!
//! Every word contributes all of its prefixes (including the empty
//! string and the word itself) plus a terminal marker `word + SENTINEL`.
//! The deduplicated entries are kept in ascending byte order, so all
//! entries starting with a given prefix form one contiguous block that
//! begins at the prefix's own rank. A query is a rank lookup followed by a
//! bounded forward scan over that block.

use std::collections::BTreeSet;

use crate::index::{canonical_word, SeedError, SENTINEL};

/// Immutable, sorted set of prefix entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixIndex {
    entries: Vec<String>,
    words: u64,
}

/// Result of a windowed scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixScan {
    pub matches: Vec<String>,
    /// The window ran out while the matching block continued past it.
    pub truncated: bool,
}

impl PrefixIndex {
    /// Build an index from raw words.
    ///
    /// Words are canonicalized to upper case. Duplicate words and shared
    /// prefixes collapse into single entries.
    pub fn build<I, S>(words: I) -> Result<Self, SeedError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = BTreeSet::new();
        let mut terminals: u64 = 0;

        for raw in words {
            let word = canonical_word(raw.as_ref())?;

            for (offset, _) in word.char_indices() {
                entries.insert(word[..offset].to_string());
            }
            entries.insert(word.clone());

            let mut terminal = word;
            terminal.push(SENTINEL);
            if entries.insert(terminal) {
                terminals += 1;
            }
        }

        Ok(Self {
            entries: entries.into_iter().collect(),
            words: terminals,
        })
    }

    /// Rebuild an index from entries that are already sorted, e.g. a
    /// persisted snapshot. Returns `None` if the entries are not strictly
    /// ascending.
    pub fn from_sorted_entries(entries: Vec<String>) -> Option<Self> {
        if entries.windows(2).any(|pair| pair[0] >= pair[1]) {
            return None;
        }

        let words = entries.iter().filter(|e| e.ends_with(SENTINEL)).count() as u64;
        Some(Self { entries, words })
    }

    /// All entries in ascending order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of distinct words (terminal markers).
    pub fn word_count(&self) -> u64 {
        self.words
    }

    /// Zero-based position of `value` in the index, if present.
    pub fn rank(&self, value: &str) -> Option<usize> {
        self.entries
            .binary_search_by(|entry| entry.as_str().cmp(value))
            .ok()
    }

    /// Collect completed words starting with `prefix`, scanning at most
    /// `window` entries from the prefix's rank.
    ///
    /// `prefix` must already be canonical. A prefix that is not itself an
    /// entry, or that contains the terminal marker, has no completions.
    ///
    /// Matches come back in ascending word order.
    pub fn scan(&self, prefix: &str, window: usize) -> PrefixScan {
        if prefix.contains(SENTINEL) {
            return PrefixScan::default();
        }

        let Some(rank) = self.rank(prefix) else {
            return PrefixScan::default();
        };

        let end = rank.saturating_add(window).min(self.entries.len());
        let mut matches = Vec::new();

        let mut truncated = true;

        for entry in &self.entries[rank..end] {
            if !entry.starts_with(prefix) {
                truncated = false;
                break;
            }

            if let Some(word) = entry.strip_suffix(SENTINEL) {
                matches.push(word.to_string());
            }
        }

        if truncated {
            truncated = self
                .entries
                .get(end)
                .is_some_and(|next| next.starts_with(prefix));
        }

        // A word's terminal sorts after the words extending it
        // ("NIGERIA" before "NIGER"), so restore plain word order.
        matches.sort_unstable();

        PrefixScan { matches, truncated }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal(word: &str) -> String {
        format!("{word}{SENTINEL}")
    }

    #[test]
    fn build_emits_every_prefix_and_one_terminal() {
        let index = PrefixIndex::build(["Chad"]).expect("index");

        let expected: Vec<String> = vec![
            String::new(),
            "C".to_string(),
            "CH".to_string(),
            "CHA".to_string(),
            "CHAD".to_string(),
            terminal("CHAD"),
        ];
        assert_eq!(index.entries(), expected.as_slice());
        assert_eq!(index.word_count(), 1);
    }

    #[test]
    fn shared_prefixes_collapse_into_single_entries() {
        let index = PrefixIndex::build(["Mali", "Malta", "mali"]).expect("index");

        let count = |value: &str| index.entries().iter().filter(|e| *e == value).count();
        assert_eq!(count("MAL"), 1);
        assert_eq!(count(&terminal("MALI")), 1);
        assert_eq!(index.word_count(), 2);
    }

    #[test]
    fn terminal_sorts_after_longer_words_sharing_the_prefix() {
        let index = PrefixIndex::build(["Niger", "Nigeria"]).expect("index");

        let niger_terminal = index.rank(&terminal("NIGER")).expect("terminal rank");
        let nigeria = index.rank("NIGERIA").expect("longer word rank");
        assert!(nigeria < niger_terminal);
    }

    #[test]
    fn scan_returns_completions_in_alphabetical_order() {
        let index = PrefixIndex::build(["Nigeria", "Niger", "Nicaragua", "Norway"]).expect("index");

        let scan = index.scan("NI", 100);
        assert_eq!(scan.matches, vec!["NICARAGUA", "NIGER", "NIGERIA"]);
        assert!(!scan.truncated);
    }

    #[test]
    fn scan_of_absent_prefix_is_empty() {
        let index = PrefixIndex::build(["France", "Germany"]).expect("index");

        assert_eq!(index.scan("Z", 100), PrefixScan::default());
        assert_eq!(index.scan("FRX", 100), PrefixScan::default());
    }

    #[test]
    fn scan_flags_truncation_when_window_is_exhausted() {
        let index = PrefixIndex::build(["Samoa", "San Marino", "Saudi Arabia"]).expect("index");

        let full = index.scan("SA", 100);
        assert_eq!(full.matches, vec!["SAMOA", "SAN MARINO", "SAUDI ARABIA"]);
        assert!(!full.truncated);

        let partial = index.scan("SA", 4);
        assert!(partial.truncated);
        assert!(partial.matches.len() < full.matches.len());
    }

    #[test]
    fn scan_filling_the_window_exactly_is_not_truncated() {
        let index = PrefixIndex::build(["Chad", "Chile", "Cuba"]).expect("index");

        // "CH", "CHA", "CHAD", "CHAD+", "CHI", "CHIL", "CHILE", "CHILE+"
        let block = index
            .entries()
            .iter()
            .filter(|e| e.starts_with("CH"))
            .count();
        assert_eq!(block, 8);

        let exact = index.scan("CH", block);
        assert_eq!(exact.matches, vec!["CHAD", "CHILE"]);
        assert!(!exact.truncated);

        let short = index.scan("CH", block - 1);
        assert!(short.truncated);
    }

    #[test]
    fn scan_of_prefix_containing_the_sentinel_is_empty() {
        let index = PrefixIndex::build(["France"]).expect("index");

        assert_eq!(index.scan(&terminal("FRANCE"), 100), PrefixScan::default());
    }

    #[test]
    fn scan_handles_non_ascii_words() {
        let index = PrefixIndex::build(["Côte d'Ivoire", "Curaçao"]).expect("index");

        assert_eq!(index.scan("CÔ", 100).matches, vec!["CÔTE D'IVOIRE"]);
        assert_eq!(index.scan("C", 100).matches, vec!["CURAÇAO", "CÔTE D'IVOIRE"]);
    }

    #[test]
    fn build_rejects_words_containing_the_sentinel() {
        let word = format!("BAD{SENTINEL}WORD");
        let err = PrefixIndex::build([word]).expect_err("sentinel must be rejected");
        assert!(matches!(err, SeedError::InvalidWord { .. }));
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let words = ["France", "Germany", "France"];
        let first = PrefixIndex::build(words).expect("first");
        let second = PrefixIndex::build(words).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn from_sorted_entries_rejects_unsorted_input() {
        let entries = vec!["B".to_string(), "A".to_string()];
        assert!(PrefixIndex::from_sorted_entries(entries).is_none());

        let built = PrefixIndex::build(["Peru"]).expect("index");
        let restored =
            PrefixIndex::from_sorted_entries(built.entries().to_vec()).expect("restored");
        assert_eq!(restored, built);
    }
}
