//! Monitoring-event adapter.

use async_trait::async_trait;
use tracing::debug;

use triage_core::evidence::{
    BundleSummary, EvidenceBundle, EvidenceItem, EvidenceSource, MonitoringEvent,
    TelemetrySeverity,
};
use triage_core::Result;

use crate::adapters::scoring::{score_telemetry, TelemetryScoring};
use crate::adapters::{AdapterContext, EvidenceAdapter};

/// Adapter over the monitoring platform's event feed.
///
/// Shares the telemetry scoring model with the log adapter; the event's
/// application plays the service role.
#[derive(Debug, Default)]
pub struct EventAdapter {
    events: Vec<MonitoringEvent>,
    scoring: TelemetryScoring,
}

impl EventAdapter {
    pub fn new(events: Vec<MonitoringEvent>) -> Self {
        Self {
            events,
            scoring: TelemetryScoring::default(),
        }
    }

    pub fn with_scoring(mut self, scoring: TelemetryScoring) -> Self {
        self.scoring = scoring;
        self
    }
}

#[async_trait]
impl EvidenceAdapter for EventAdapter {
    fn name(&self) -> &str {
        "events"
    }

    fn source(&self) -> EvidenceSource {
        EvidenceSource::Events
    }

    async fn query(&self, context: &AdapterContext) -> Result<EvidenceBundle> {
        let incident = &context.incident;

        let mut scored: Vec<MonitoringEvent> = self
            .events
            .iter()
            .filter_map(|event| {
                let text = match &event.details {
                    Some(details) => format!("{} {} {details}", event.event_type, event.message),
                    None => format!("{} {}", event.event_type, event.message),
                };
                let confidence = score_telemetry(
                    &self.scoring,
                    event.severity,
                    &event.application,
                    &text,
                    incident,
                );
                (confidence >= self.scoring.min_confidence).then(|| MonitoringEvent {
                    confidence,
                    ..event.clone()
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });

        let critical_count = scored
            .iter()
            .filter(|e| e.severity == TelemetrySeverity::Critical)
            .count();
        let warning_count = scored
            .iter()
            .filter(|e| e.severity == TelemetrySeverity::Warning)
            .count();

        debug!(
            incident_id = %incident.id,
            matched = scored.len(),
            critical_count,
            warning_count,
            "Event evidence gathered"
        );

        Ok(EvidenceBundle {
            source: EvidenceSource::Events,
            incident_id: incident.id.clone(),
            items: scored.into_iter().map(EvidenceItem::Event).collect(),
            summary: BundleSummary::Events {
                critical_count,
                warning_count,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use triage_core::incident::{Incident, IncidentStatus, Severity};

    fn context() -> AdapterContext {
        AdapterContext {
            incident: Incident {
                id: "INC001".to_string(),
                title: "Checkout latency spike".to_string(),
                description: "Slow transactions during checkout".to_string(),
                severity: Severity::Critical,
                status: IncidentStatus::Open,
                created_at: Utc::now(),
                updated_at: None,
                affected_services: vec!["payment-service".to_string()],
                assignee: None,
            },
            query: String::new(),
        }
    }

    fn event(
        id: &str,
        severity: TelemetrySeverity,
        application: &str,
        message: &str,
    ) -> MonitoringEvent {
        MonitoringEvent {
            id: id.to_string(),
            timestamp: Utc::now() - Duration::minutes(5),
            event_type: "Slow Transaction".to_string(),
            severity,
            application: application.to_string(),
            message: message.to_string(),
            details: None,
            confidence: 0.0,
        }
    }

    #[tokio::test]
    async fn matching_events_are_scored_and_counted() {
        let adapter = EventAdapter::new(vec![
            event("E1", TelemetrySeverity::Critical, "payment-service", "checkout latency above threshold"),
            event("E2", TelemetrySeverity::Warning, "payment-service", "elevated latency"),
            event("E3", TelemetrySeverity::Info, "search-service", "index rebuilt"),
        ]);

        let bundle = adapter.query(&context()).await.unwrap();
        let ids: Vec<&str> = bundle.items.iter().map(|i| i.item_id()).collect();
        assert_eq!(ids, vec!["E1", "E2"]);

        let BundleSummary::Events {
            critical_count,
            warning_count,
        } = bundle.summary
        else {
            panic!("event bundle must carry an event summary");
        };
        assert_eq!(critical_count, 1);
        assert_eq!(warning_count, 1);
    }

    #[tokio::test]
    async fn details_participate_in_keyword_matching() {
        let mut with_details = event("E1", TelemetrySeverity::Info, "other-app", "anomaly detected");
        with_details.details = Some("checkout latency spike in eu-west".to_string());
        let adapter = EventAdapter::new(vec![with_details]);

        // 0.1 base + min(0.3, 3 * 0.15) keyword bonus = 0.4, above the floor.
        let bundle = adapter.query(&context()).await.unwrap();
        assert_eq!(bundle.len(), 1);
        assert!((bundle.items[0].confidence() - 0.4).abs() < 1e-9);
    }
}
