//! Keyword-based question decomposition

use tracing::debug;

use crate::domain::graph::ResearchIntent;

/// Maps a free-text question to the research intents it mentions
#[derive(Debug, Clone, Default)]
pub struct IntentDecomposer {
    fallback: Option<ResearchIntent>,
}

impl IntentDecomposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different intent when no keyword matches
    pub fn with_fallback(mut self, intent: ResearchIntent) -> Self {
        self.fallback = Some(intent);
        self
    }

    /// Intents whose keywords appear in the lower-cased question
    ///
    /// Results follow the intent table order. A question matching nothing
    /// yields the fallback, `transmissibility` unless overridden.
    pub fn decompose(&self, question: &str) -> Vec<ResearchIntent> {
        let lowered = question.to_lowercase();

        let mut intents: Vec<ResearchIntent> = ResearchIntent::all()
            .iter()
            .filter(|intent| intent.keywords().iter().any(|kw| lowered.contains(kw)))
            .copied()
            .collect();

        if intents.is_empty() {
            intents.push(self.fallback.unwrap_or(ResearchIntent::Transmissibility));
        }

        debug!(?intents, "Decomposed question");
        intents
    }
}
