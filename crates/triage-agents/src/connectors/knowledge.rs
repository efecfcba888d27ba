//! Knowledge-base connectors.
//!
//! The knowledge adapter is backend-agnostic: it searches whatever
//! [`KnowledgeConnector`] it was given. The mock backend keys documents
//! by incident id and re-ranks them against the query; the wiki backend
//! searches a remote wiki-style HTTP API.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use triage_core::config::{Config, KnowledgeSourceKind, WikiCredentials};
use triage_core::evidence::KnowledgeDoc;
use triage_core::similarity::extract_keywords;
use triage_core::{Error, Result};

/// Read access to a knowledge base.
#[async_trait]
pub trait KnowledgeConnector: Send + Sync {
    /// Stable source name for logging.
    fn source_name(&self) -> &str;

    /// Search documents relevant to a query in the context of an incident.
    async fn search(
        &self,
        query: &str,
        incident_id: &str,
        max_results: usize,
    ) -> Result<Vec<KnowledgeDoc>>;

    /// Fetch a single document by id.
    async fn get_document(&self, doc_id: &str) -> Result<Option<KnowledgeDoc>>;
}

/// In-memory knowledge base with documents keyed by incident id.
#[derive(Debug, Default)]
pub struct MockKnowledgeBase {
    docs_by_incident: HashMap<String, Vec<KnowledgeDoc>>,
}

impl MockKnowledgeBase {
    pub fn new(docs_by_incident: HashMap<String, Vec<KnowledgeDoc>>) -> Self {
        Self { docs_by_incident }
    }

    /// Query-overlap boost: each shared keyword between the query and the
    /// document adds 0.1, capped at 0.3.
    fn boosted_relevance(query: &str, doc: &KnowledgeDoc) -> f64 {
        let query_keywords = extract_keywords(query);
        if query_keywords.is_empty() {
            return doc.relevance;
        }
        let doc_keywords = extract_keywords(&format!("{} {}", doc.title, doc.content));
        let shared = query_keywords.intersection(&doc_keywords).count();
        (doc.relevance + (shared as f64 * 0.1).min(0.3)).min(1.0)
    }
}

#[async_trait]
impl KnowledgeConnector for MockKnowledgeBase {
    fn source_name(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        query: &str,
        incident_id: &str,
        max_results: usize,
    ) -> Result<Vec<KnowledgeDoc>> {
        let mut docs: Vec<KnowledgeDoc> = self
            .docs_by_incident
            .get(incident_id)
            .cloned()
            .unwrap_or_default();
        for doc in &mut docs {
            doc.relevance = Self::boosted_relevance(query, doc);
        }
        docs.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        docs.truncate(max_results);
        debug!(incident_id, results = docs.len(), "Knowledge base searched");
        Ok(docs)
    }

    async fn get_document(&self, doc_id: &str) -> Result<Option<KnowledgeDoc>> {
        Ok(self
            .docs_by_incident
            .values()
            .flatten()
            .find(|d| d.doc_id == doc_id)
            .cloned())
    }
}

#[derive(Deserialize)]
struct WikiSearchResponse {
    results: Vec<WikiSearchHit>,
}

#[derive(Deserialize)]
struct WikiSearchHit {
    id: String,
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    score: f64,
}

/// Remote wiki-style knowledge base over HTTP.
#[derive(Debug)]
pub struct WikiConnector {
    http: reqwest::Client,
    credentials: WikiCredentials,
}

impl WikiConnector {
    pub fn new(credentials: WikiCredentials) -> Result<Self> {
        if credentials.base_url.is_empty()
            || credentials.username.is_empty()
            || credentials.api_token.is_empty()
        {
            return Err(Error::config("incomplete wiki credentials"));
        }
        info!(base_url = %credentials.base_url, "Wiki knowledge connector configured");
        Ok(Self {
            http: reqwest::Client::new(),
            credentials,
        })
    }

    fn doc_from_hit(hit: WikiSearchHit) -> KnowledgeDoc {
        KnowledgeDoc {
            doc_id: hit.id,
            title: hit.title,
            content: hit.excerpt,
            relevance: hit.score.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl KnowledgeConnector for WikiConnector {
    fn source_name(&self) -> &str {
        "wiki"
    }

    async fn search(
        &self,
        query: &str,
        incident_id: &str,
        max_results: usize,
    ) -> Result<Vec<KnowledgeDoc>> {
        let url = format!(
            "{}/api/search",
            self.credentials.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.api_token))
            .query(&[("q", query), ("limit", &max_results.to_string())])
            .send()
            .await
            .map_err(|e| Error::adapter("wiki", e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::adapter(
                "wiki",
                format!("search returned {}", response.status()),
            ));
        }

        let parsed: WikiSearchResponse = response
            .json()
            .await
            .map_err(|e| Error::adapter("wiki", e.to_string()))?;
        debug!(incident_id, results = parsed.results.len(), "Wiki searched");
        Ok(parsed.results.into_iter().map(Self::doc_from_hit).collect())
    }

    async fn get_document(&self, doc_id: &str) -> Result<Option<KnowledgeDoc>> {
        let url = format!(
            "{}/api/pages/{doc_id}",
            self.credentials.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.api_token))
            .send()
            .await
            .map_err(|e| Error::adapter("wiki", e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::adapter(
                "wiki",
                format!("page fetch returned {}", response.status()),
            ));
        }

        let hit: WikiSearchHit = response
            .json()
            .await
            .map_err(|e| Error::adapter("wiki", e.to_string()))?;
        Ok(Some(Self::doc_from_hit(hit)))
    }
}

/// Build the knowledge connector selected by the configuration.
///
/// The mock backend is seeded with the bundled demo documents.
pub fn build_knowledge_connector(config: &Config) -> Result<Arc<dyn KnowledgeConnector>> {
    match config.knowledge_base.source {
        KnowledgeSourceKind::Mock => Ok(Arc::new(MockKnowledgeBase::new(
            crate::data::demo_documents(),
        ))),
        KnowledgeSourceKind::Wiki => {
            let credentials = config
                .knowledge_base
                .wiki
                .clone()
                .ok_or_else(|| Error::config("wiki knowledge source selected without credentials"))?;
            Ok(Arc::new(WikiConnector::new(credentials)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, title: &str, content: &str, relevance: f64) -> KnowledgeDoc {
        KnowledgeDoc {
            doc_id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            relevance,
        }
    }

    fn seeded_kb() -> MockKnowledgeBase {
        let mut docs = HashMap::new();
        docs.insert(
            "INC001".to_string(),
            vec![
                doc("DOC001", "Database timeout runbook", "connection pool tuning steps", 0.6),
                doc("DOC002", "General on-call guide", "paging and escalation policy", 0.6),
            ],
        );
        MockKnowledgeBase::new(docs)
    }

    #[tokio::test]
    async fn query_overlap_reorders_results() {
        let kb = seeded_kb();
        let docs = kb
            .search("database connection pool timeout", "INC001", 10)
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].doc_id, "DOC001");
        assert!(docs[0].relevance > docs[1].relevance);
        assert!(docs[0].relevance <= 1.0);
    }

    #[tokio::test]
    async fn search_respects_max_results_and_unknown_incident() {
        let kb = seeded_kb();
        let docs = kb.search("database", "INC001", 1).await.unwrap();
        assert_eq!(docs.len(), 1);

        let none = kb.search("database", "INC404", 10).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn get_document_finds_by_id() {
        let kb = seeded_kb();
        let doc = kb.get_document("DOC002").await.unwrap().unwrap();
        assert_eq!(doc.title, "General on-call guide");
        assert!(kb.get_document("DOC404").await.unwrap().is_none());
    }

    #[test]
    fn wiki_connector_rejects_incomplete_credentials() {
        let err = WikiConnector::new(WikiCredentials {
            base_url: "https://wiki.example.com".to_string(),
            username: String::new(),
            api_token: "secret".to_string(),
        })
        .unwrap_err();
        assert!(err.to_string().contains("wiki"));
    }
}
