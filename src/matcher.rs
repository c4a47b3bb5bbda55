//! Intent matching against the knowledge base.
//!
//! Two passes, in order:
//! - exact: the normalized utterance contains an entry key as a substring
//! - fuzzy: token overlap score, accepted only at `MIN_FUZZY_SCORE` or above
//!
//! Role partition entries are always visited before general entries, so the
//! role-specific answer wins whenever both would match.

use crate::knowledge::{KnowledgeBase, KnowledgeEntry, Role};

/// Query words this short are ignored by the fuzzy pass.
const MIN_WORD_CHARS: usize = 3;
pub const MIN_FUZZY_SCORE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Fuzzy { score: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentMatch<'a> {
    pub entry: &'a KnowledgeEntry,
    pub kind: MatchKind,
}

pub struct IntentMatcher<'a> {
    knowledge: &'a KnowledgeBase,
}

impl Default for IntentMatcher<'static> {
    fn default() -> Self {
        Self::new(KnowledgeBase::builtin())
    }
}

impl<'a> IntentMatcher<'a> {
    pub fn new(knowledge: &'a KnowledgeBase) -> Self {
        Self { knowledge }
    }

    /// Resolve an utterance to an answer, or `None` to signal escalation.
    pub fn match_intent(&self, utterance: &str, role: Role) -> Option<&'a str> {
        self.find(utterance, role).map(|m| m.entry.answer)
    }

    /// Same as [`match_intent`](Self::match_intent) but reports which pass hit.
    pub fn find(&self, utterance: &str, role: Role) -> Option<IntentMatch<'a>> {
        let normalized = utterance.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        if let Some(entry) = self
            .knowledge
            .search_order(role)
            .find(|e| normalized.contains(e.key))
        {
            return Some(IntentMatch { entry, kind: MatchKind::Exact });
        }

        let query_words: Vec<&str> = normalized
            .split_whitespace()
            .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
            .collect();
        if query_words.is_empty() {
            return None;
        }

        let mut best: Option<(&'a KnowledgeEntry, usize)> = None;
        for entry in self.knowledge.search_order(role) {
            let score = fuzzy_score(&query_words, entry.key);
            // Strictly greater keeps the first entry on ties
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((entry, score));
            }
        }

        match best {
            Some((entry, score)) if score >= MIN_FUZZY_SCORE => Some(IntentMatch {
                entry,
                kind: MatchKind::Fuzzy { score },
            }),
            _ => None,
        }
    }
}

/// Number of query words that overlap (substring either way) with any key word.
pub fn fuzzy_score(query_words: &[&str], key: &str) -> usize {
    let key_words: Vec<&str> = key.split_whitespace().collect();
    query_words
        .iter()
        .filter(|word| {
            key_words
                .iter()
                .any(|kw| kw.contains(**word) || word.contains(*kw))
        })
        .count()
}
