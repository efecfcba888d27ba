//! Knowledge-base adapter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use triage_core::evidence::{BundleSummary, EvidenceBundle, EvidenceItem, EvidenceSource};
use triage_core::Result;

use crate::adapters::{AdapterContext, EvidenceAdapter};
use crate::connectors::KnowledgeConnector;

const MAX_DOCUMENTS: usize = 10;

/// Adapter over the pluggable knowledge base.
pub struct KnowledgeAdapter {
    connector: Arc<dyn KnowledgeConnector>,
}

impl std::fmt::Debug for KnowledgeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeAdapter")
            .field("connector", &self.connector.source_name())
            .finish()
    }
}

impl KnowledgeAdapter {
    pub fn new(connector: Arc<dyn KnowledgeConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl EvidenceAdapter for KnowledgeAdapter {
    fn name(&self) -> &str {
        "knowledge_base"
    }

    fn source(&self) -> EvidenceSource {
        EvidenceSource::KnowledgeBase
    }

    async fn query(&self, context: &AdapterContext) -> Result<EvidenceBundle> {
        // An empty user query falls back to the incident title so the
        // search always has signal to rank against.
        let query = if context.query.trim().is_empty() {
            context.incident.title.as_str()
        } else {
            context.query.as_str()
        };

        let docs = self
            .connector
            .search(query, &context.incident.id, MAX_DOCUMENTS)
            .await?;
        debug!(
            incident_id = %context.incident.id,
            source = self.connector.source_name(),
            results = docs.len(),
            "Knowledge evidence gathered"
        );

        Ok(EvidenceBundle {
            source: EvidenceSource::KnowledgeBase,
            incident_id: context.incident.id.clone(),
            items: docs.into_iter().map(EvidenceItem::Document).collect(),
            summary: BundleSummary::Knowledge {},
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use triage_core::evidence::KnowledgeDoc;
    use triage_core::incident::{Incident, IncidentStatus, Severity};

    use crate::connectors::MockKnowledgeBase;

    fn context(query: &str) -> AdapterContext {
        AdapterContext {
            incident: Incident {
                id: "INC001".to_string(),
                title: "Database connection timeout".to_string(),
                description: "Pool exhaustion on the primary".to_string(),
                severity: Severity::High,
                status: IncidentStatus::Open,
                created_at: Utc::now(),
                updated_at: None,
                affected_services: vec!["auth-service".to_string()],
                assignee: None,
            },
            query: query.to_string(),
        }
    }

    fn adapter() -> KnowledgeAdapter {
        let mut docs = HashMap::new();
        docs.insert(
            "INC001".to_string(),
            vec![KnowledgeDoc {
                doc_id: "DOC001".to_string(),
                title: "Database timeout runbook".to_string(),
                content: "connection pool tuning".to_string(),
                relevance: 0.7,
            }],
        );
        KnowledgeAdapter::new(Arc::new(MockKnowledgeBase::new(docs)))
    }

    #[tokio::test]
    async fn empty_query_falls_back_to_incident_title() {
        let bundle = adapter().query(&context("")).await.unwrap();
        assert_eq!(bundle.source, EvidenceSource::KnowledgeBase);
        assert_eq!(bundle.len(), 1);
        // Title keywords overlap the doc, so the boost applies.
        let EvidenceItem::Document(doc) = &bundle.items[0] else {
            panic!("knowledge bundle must hold documents");
        };
        assert!(doc.relevance > 0.7);
    }

    #[tokio::test]
    async fn unknown_incident_is_an_empty_bundle() {
        let mut ctx = context("anything");
        ctx.incident.id = "INC404".to_string();
        let bundle = adapter().query(&ctx).await.unwrap();
        assert!(bundle.is_empty());
    }
}
