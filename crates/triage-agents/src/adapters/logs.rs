//! Log-retrieval adapter.

use async_trait::async_trait;
use tracing::debug;

use triage_core::evidence::{
    BundleSummary, EvidenceBundle, EvidenceItem, EvidenceSource, LogEntry, TelemetrySeverity,
};
use triage_core::Result;

use crate::adapters::scoring::{score_telemetry, TelemetryScoring};
use crate::adapters::{AdapterContext, EvidenceAdapter};

/// Adapter over the log backend.
///
/// Confidence is recomputed per incident; the stored entries' confidence
/// values are ignored.
#[derive(Debug, Default)]
pub struct LogAdapter {
    entries: Vec<LogEntry>,
    scoring: TelemetryScoring,
}

impl LogAdapter {
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self {
            entries,
            scoring: TelemetryScoring::default(),
        }
    }

    pub fn with_scoring(mut self, scoring: TelemetryScoring) -> Self {
        self.scoring = scoring;
        self
    }
}

#[async_trait]
impl EvidenceAdapter for LogAdapter {
    fn name(&self) -> &str {
        "logs"
    }

    fn source(&self) -> EvidenceSource {
        EvidenceSource::Logs
    }

    async fn query(&self, context: &AdapterContext) -> Result<EvidenceBundle> {
        let incident = &context.incident;

        let mut scored: Vec<LogEntry> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let confidence = score_telemetry(
                    &self.scoring,
                    entry.level,
                    &entry.service,
                    &entry.message,
                    incident,
                );
                (confidence >= self.scoring.min_confidence).then(|| LogEntry {
                    confidence,
                    ..entry.clone()
                })
            })
            .collect();

        // Strongest first; recency breaks ties.
        scored.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });

        let error_count = scored
            .iter()
            .filter(|e| {
                matches!(
                    e.level,
                    TelemetrySeverity::Error | TelemetrySeverity::Critical
                )
            })
            .count();
        let warning_count = scored
            .iter()
            .filter(|e| e.level == TelemetrySeverity::Warning)
            .count();

        debug!(
            incident_id = %incident.id,
            matched = scored.len(),
            error_count,
            warning_count,
            "Log evidence gathered"
        );

        Ok(EvidenceBundle {
            source: EvidenceSource::Logs,
            incident_id: incident.id.clone(),
            items: scored.into_iter().map(EvidenceItem::Log).collect(),
            summary: BundleSummary::Logs {
                error_count,
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
                title: "Database connection timeout".to_string(),
                description: "Connections to the primary database time out".to_string(),
                severity: Severity::High,
                status: IncidentStatus::Open,
                created_at: Utc::now(),
                updated_at: None,
                affected_services: vec!["auth-service".to_string()],
                assignee: None,
            },
            query: String::new(),
        }
    }

    fn entry(id: &str, level: TelemetrySeverity, service: &str, message: &str, age_mins: i64) -> LogEntry {
        LogEntry {
            id: id.to_string(),
            timestamp: Utc::now() - Duration::minutes(age_mins),
            level,
            service: service.to_string(),
            message: message.to_string(),
            confidence: 0.0,
        }
    }

    #[tokio::test]
    async fn irrelevant_entries_are_dropped_and_rest_sorted_by_confidence() {
        let adapter = LogAdapter::new(vec![
            entry("L1", TelemetrySeverity::Info, "billing-service", "job finished", 5),
            entry("L2", TelemetrySeverity::Error, "auth-service", "database connection refused", 10),
            entry("L3", TelemetrySeverity::Warning, "auth-service", "slow query", 1),
        ]);

        let bundle = adapter.query(&context()).await.unwrap();
        let ids: Vec<&str> = bundle.items.iter().map(|i| i.item_id()).collect();
        // L1 scores 0.1 and is dropped; L2 (1.0) outranks L3 (0.6).
        assert_eq!(ids, vec!["L2", "L3"]);

        let BundleSummary::Logs {
            error_count,
            warning_count,
        } = bundle.summary
        else {
            panic!("log bundle must carry a log summary");
        };
        assert_eq!(error_count, 1);
        assert_eq!(warning_count, 1);
    }

    #[tokio::test]
    async fn ties_break_on_recency() {
        let adapter = LogAdapter::new(vec![
            entry("OLD", TelemetrySeverity::Error, "auth-service", "unrelated message", 60),
            entry("NEW", TelemetrySeverity::Error, "auth-service", "unrelated message", 1),
        ]);

        let bundle = adapter.query(&context()).await.unwrap();
        let ids: Vec<&str> = bundle.items.iter().map(|i| i.item_id()).collect();
        assert_eq!(ids, vec!["NEW", "OLD"]);
    }

    #[tokio::test]
    async fn recomputed_confidence_overwrites_stored_value() {
        let mut seeded = entry("L1", TelemetrySeverity::Error, "auth-service", "database timeout", 1);
        seeded.confidence = 0.01;
        let adapter = LogAdapter::new(vec![seeded]);

        let bundle = adapter.query(&context()).await.unwrap();
        assert!(bundle.items[0].confidence() >= 0.7);
    }
}
