//! Evidence retrieval backends
//!
//! Exploration asks a retriever how much evidence backs a query across a
//! set of domains. The heuristic retriever needs no data and is the default;
//! the corpus retriever counts matching documents from an in-memory corpus.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::graph::ResearchDomain;
use crate::error::{Error, Result};

/// Pluggable evidence source
///
/// Errors are returned to the caller unchanged.
#[async_trait]
pub trait EvidenceRetriever: Send + Sync {
    /// Number of evidence items found for `query` in `domains`
    async fn retrieve(&self, query: &str, domains: &[ResearchDomain]) -> Result<usize>;
}

/// Illustrative count: base + per-domain bonus + query-length bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicRetriever {
    pub base_evidence: usize,
    pub domain_bonus: usize,
    pub words_per_bonus: usize,
}

impl Default for HeuristicRetriever {
    fn default() -> Self {
        Self {
            base_evidence: 5,
            domain_bonus: 3,
            words_per_bonus: 2,
        }
    }
}

impl HeuristicRetriever {
    pub fn count(&self, query: &str, domains: &[ResearchDomain]) -> usize {
        let words = query.split_whitespace().count();
        let query_bonus = words.checked_div(self.words_per_bonus).unwrap_or(0);
        self.base_evidence
            .saturating_add(domains.len().saturating_mul(self.domain_bonus))
            .saturating_add(query_bonus)
    }
}

#[async_trait]
impl EvidenceRetriever for HeuristicRetriever {
    async fn retrieve(&self, query: &str, domains: &[ResearchDomain]) -> Result<usize> {
        Ok(self.count(query, domains))
    }
}

/// A document in the retrieval corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusDoc {
    pub id: String,
    pub domain: ResearchDomain,
    pub text: String,
    /// DOI, URL or dataset reference
    pub source: String,
}

impl CorpusDoc {
    pub fn new(
        domain: ResearchDomain,
        text: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            domain,
            text: text.into(),
            source: source.into(),
        }
    }
}

/// Counts corpus documents that match a query within the requested domains
#[derive(Debug, Clone, Default)]
pub struct CorpusRetriever {
    docs: Vec<CorpusDoc>,
}

impl CorpusRetriever {
    pub fn new(docs: Vec<CorpusDoc>) -> Self {
        Self { docs }
    }

    /// Load one JSON document per line
    pub fn load_jsonl(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut docs = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let doc: CorpusDoc = serde_json::from_str(&line).map_err(|e| {
                Error::Parse(format!("{}:{}: {}", path.display(), line_no + 1, e))
            })?;
            docs.push(doc);
        }

        debug!(path = %path.display(), docs = docs.len(), "Loaded corpus");
        Ok(Self { docs })
    }

    pub fn docs(&self) -> &[CorpusDoc] {
        &self.docs
    }

    /// Documents in `domains` whose text contains the query
    ///
    /// The whole lower-cased query is tried first; failing that, any query
    /// token of four or more characters counts.
    pub fn matching(&self, query: &str, domains: &[ResearchDomain]) -> Vec<&CorpusDoc> {
        let query = query.to_lowercase();
        let tokens: Vec<&str> = query
            .split(|c: char| !c.is_alphanumeric() && c != '.')
            .filter(|t| t.chars().count() >= 4)
            .collect();

        self.docs
            .iter()
            .filter(|doc| domains.contains(&doc.domain))
            .filter(|doc| {
                let text = doc.text.to_lowercase();
                (!query.trim().is_empty() && text.contains(query.trim()))
                    || tokens.iter().any(|t| text.contains(t))
            })
            .collect()
    }
}

#[async_trait]
impl EvidenceRetriever for CorpusRetriever {
    async fn retrieve(&self, query: &str, domains: &[ResearchDomain]) -> Result<usize> {
        let count = self.matching(query, domains).len();
        debug!(query, count, "Corpus retrieval");
        Ok(count)
    }
}
