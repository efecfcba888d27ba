//! Historical-ticket adapter.
//!
//! Combines three connector lookups into one bundle: tickets for similar
//! resolved incidents, change tickets attached to the target, and the
//! resolution texts of the look-alikes. Similar-incident tickets also get
//! a completeness assessment so thin historical data is flagged instead
//! of silently trusted.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use triage_core::evidence::{BundleSummary, EvidenceBundle, EvidenceItem, EvidenceSource};
use triage_core::quality::assess_tickets;
use triage_core::Result;

use crate::adapters::{AdapterContext, EvidenceAdapter};
use crate::connectors::IncidentConnector;

/// Adapter over the incident-management backend.
pub struct TicketAdapter {
    connector: Arc<dyn IncidentConnector>,
}

impl std::fmt::Debug for TicketAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketAdapter")
            .field("connector", &self.connector.connector_name())
            .finish()
    }
}

impl TicketAdapter {
    pub fn new(connector: Arc<dyn IncidentConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl EvidenceAdapter for TicketAdapter {
    fn name(&self) -> &str {
        "tickets"
    }

    fn source(&self) -> EvidenceSource {
        EvidenceSource::Tickets
    }

    async fn query(&self, context: &AdapterContext) -> Result<EvidenceBundle> {
        let incident_id = context.incident.id.as_str();

        let similar = self.connector.get_similar_incidents(incident_id).await?;
        let related = self.connector.get_related_changes(incident_id).await?;
        let resolutions = self.connector.get_resolutions(incident_id).await?;

        let quality = assess_tickets(&similar);
        debug!(
            incident_id,
            similar = similar.len(),
            related = related.len(),
            quality = quality.average_score,
            "Ticket evidence gathered"
        );

        let items = similar
            .into_iter()
            .chain(related)
            .map(EvidenceItem::Ticket)
            .collect();

        Ok(EvidenceBundle {
            source: EvidenceSource::Tickets,
            incident_id: incident_id.to_string(),
            items,
            summary: BundleSummary::Tickets {
                resolutions,
                quality,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn similar_incident_count(bundle: &EvidenceBundle) -> usize {
        bundle
            .items
            .iter()
            .filter(|item| {
                matches!(
                    item,
                    EvidenceItem::Ticket(t) if t.ticket_type == TicketType::SimilarIncident
                )
            })
            .count()
    }
    use chrono::Utc;
    use std::collections::HashMap;
    use triage_core::evidence::TicketType;
    use triage_core::incident::{Incident, IncidentStatus, IncidentStore, Severity};
    use triage_core::quality::QualityLevel;

    use crate::connectors::MockConnector;

    fn incident(id: &str, status: IncidentStatus) -> Incident {
        Incident {
            id: id.to_string(),
            title: "Database connection timeout".to_string(),
            description: "Connections to the primary database time out under load".to_string(),
            severity: Severity::High,
            status,
            created_at: Utc::now(),
            updated_at: None,
            affected_services: vec!["auth-service".to_string()],
            assignee: None,
        }
    }

    fn adapter_with_history() -> (TicketAdapter, Incident) {
        let target = incident("INC001", IncidentStatus::Open);
        let store = Arc::new(IncidentStore::with_incidents(vec![
            target.clone(),
            incident("INC002", IncidentStatus::Resolved),
        ]));
        let mut resolutions = HashMap::new();
        resolutions.insert(
            "INC002".to_string(),
            "Recycled the connection pool and raised max_connections to 500".to_string(),
        );
        let connector = Arc::new(MockConnector::new(store, 0.2, 5).with_resolutions(resolutions));
        (TicketAdapter::new(connector), target)
    }

    #[tokio::test]
    async fn bundle_carries_tickets_resolutions_and_quality() {
        let (adapter, target) = adapter_with_history();
        let context = AdapterContext {
            incident: target,
            query: String::new(),
        };

        let bundle = adapter.query(&context).await.unwrap();
        assert_eq!(bundle.source, EvidenceSource::Tickets);
        assert_eq!(similar_incident_count(&bundle), 1);
        assert_eq!(bundle.resolutions().len(), 1);

        let BundleSummary::Tickets { quality, .. } = &bundle.summary else {
            panic!("ticket bundle must carry a ticket summary");
        };
        assert_eq!(quality.total_tickets, 1);
        assert_eq!(quality.overall_level, QualityLevel::Good);
    }

    #[tokio::test]
    async fn no_history_yields_empty_bundle_with_empty_assessment() {
        let target = incident("INC001", IncidentStatus::Open);
        let store = Arc::new(IncidentStore::with_incidents(vec![target.clone()]));
        let adapter = TicketAdapter::new(Arc::new(MockConnector::new(store, 0.2, 5)));

        let bundle = adapter
            .query(&AdapterContext {
                incident: target,
                query: String::new(),
            })
            .await
            .unwrap();
        assert!(bundle.is_empty());

        let BundleSummary::Tickets { quality, .. } = &bundle.summary else {
            panic!("ticket bundle must carry a ticket summary");
        };
        assert_eq!(quality.total_tickets, 0);
        assert_eq!(quality.average_score, 0.0);
    }
}
