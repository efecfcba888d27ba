//! Evidence types shared by every data-source adapter.
//!
//! Each adapter returns an [`EvidenceBundle`]: an ordered list of
//! [`EvidenceItem`]s plus per-source aggregates. Items carry a stable id
//! and a relevance/confidence score in `[0, 1]` so the pipeline and the
//! exclusion tracker can treat them uniformly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::incident::{IncidentStatus, Severity};
use crate::quality::QualityAssessment;

/// The data source an evidence bundle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    Tickets,
    KnowledgeBase,
    Changes,
    Logs,
    Events,
    Remediation,
}

impl EvidenceSource {
    /// All sources in pipeline execution order.
    pub const ALL: [EvidenceSource; 6] = [
        EvidenceSource::Tickets,
        EvidenceSource::KnowledgeBase,
        EvidenceSource::Changes,
        EvidenceSource::Logs,
        EvidenceSource::Events,
        EvidenceSource::Remediation,
    ];

    /// Stable lowercase label used in composite item ids.
    pub fn label(&self) -> &'static str {
        match self {
            EvidenceSource::Tickets => "tickets",
            EvidenceSource::KnowledgeBase => "knowledge_base",
            EvidenceSource::Changes => "changes",
            EvidenceSource::Logs => "logs",
            EvidenceSource::Events => "events",
            EvidenceSource::Remediation => "remediation",
        }
    }

    /// Human-readable category name for the accuracy report.
    pub fn category(&self) -> &'static str {
        match self {
            EvidenceSource::Tickets => "Similar Incidents",
            EvidenceSource::KnowledgeBase => "Knowledge Articles",
            EvidenceSource::Changes => "Correlated Changes",
            EvidenceSource::Logs => "Log Entries",
            EvidenceSource::Events => "Monitoring Events",
            EvidenceSource::Remediation => "Remediation Actions",
        }
    }
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of historical ticket emitted by the ticket adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    /// Ticket attached to a historically similar incident.
    SimilarIncident,
    /// Change ticket attached directly to the target incident.
    RelatedChange,
}

/// A ticket from the incident-management backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalTicket {
    /// Backend ticket identifier.
    pub ticket_id: String,
    /// Ticket category.
    pub ticket_type: TicketType,
    /// Ticket description, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resolution text, if the ticket was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Similarity of the source incident to the target (similar-incident
    /// tickets only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    /// Id of the incident this ticket belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_incident_id: Option<String>,
    /// Title of the incident this ticket belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_incident_title: Option<String>,
    /// Severity of the source incident.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Status of the source incident.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
}

/// A knowledge-base document hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDoc {
    /// Document identifier.
    pub doc_id: String,
    /// Document title.
    pub title: String,
    /// Content or excerpt.
    pub content: String,
    /// Relevance to the query in `[0, 1]`.
    pub relevance: f64,
}

/// A deployment/change record correlated with an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Change identifier (e.g. "CHG-1042").
    pub change_id: String,
    /// What the change did.
    pub description: String,
    /// Deployment time.
    pub deployed_at: DateTime<Utc>,
    /// Correlation score with the incident in `[0, 1]`.
    pub correlation_score: f64,
    /// Service the change targeted, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// Severity of a log entry or monitoring event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TelemetrySeverity {
    Critical,
    Error,
    Warning,
    Info,
}

impl fmt::Display for TelemetrySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TelemetrySeverity::Critical => "CRITICAL",
            TelemetrySeverity::Error => "ERROR",
            TelemetrySeverity::Warning => "WARNING",
            TelemetrySeverity::Info => "INFO",
        };
        f.write_str(s)
    }
}

/// A service log line retrieved for an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Stable entry identifier.
    pub id: String,
    /// Log timestamp.
    pub timestamp: DateTime<Utc>,
    /// Log level.
    pub level: TelemetrySeverity,
    /// Emitting service.
    pub service: String,
    /// Log message.
    pub message: String,
    /// Computed relevance confidence in `[0, 1]`.
    pub confidence: f64,
}

/// A telemetry event from the monitoring platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringEvent {
    /// Stable event identifier.
    pub id: String,
    /// Event timestamp.
    pub timestamp: DateTime<Utc>,
    /// Event type (e.g. "Slow Transaction").
    pub event_type: String,
    /// Event severity.
    pub severity: TelemetrySeverity,
    /// Application the event was detected in.
    pub application: String,
    /// Event message.
    pub message: String,
    /// Additional detail, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Computed relevance confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Execution risk of a remediation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A candidate remediation action from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationAction {
    /// Catalog identifier (e.g. "rem-db-001").
    pub id: String,
    /// Action title.
    pub title: String,
    /// What the action does and when it helps.
    pub description: String,
    /// The script to run.
    pub script: String,
    /// Execution risk.
    pub risk_level: RiskLevel,
    /// Rough wall-clock estimate (e.g. "2-3 minutes").
    pub estimated_duration: String,
    /// Checks that should hold before running the script.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Static confidence in `[0, 1]` that this action applies.
    pub confidence: f64,
}

/// A generic unit of evidence returned by any adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceItem {
    Ticket(HistoricalTicket),
    Document(KnowledgeDoc),
    Change(ChangeRecord),
    Log(LogEntry),
    Event(MonitoringEvent),
    Remediation(RemediationAction),
}

impl EvidenceItem {
    /// Stable per-source item id.
    pub fn item_id(&self) -> &str {
        match self {
            EvidenceItem::Ticket(t) => &t.ticket_id,
            EvidenceItem::Document(d) => &d.doc_id,
            EvidenceItem::Change(c) => &c.change_id,
            EvidenceItem::Log(l) => &l.id,
            EvidenceItem::Event(e) => &e.id,
            EvidenceItem::Remediation(r) => &r.id,
        }
    }

    /// Relevance/confidence score in `[0, 1]`.
    pub fn confidence(&self) -> f64 {
        match self {
            EvidenceItem::Ticket(t) => t.similarity_score.unwrap_or(0.0),
            EvidenceItem::Document(d) => d.relevance,
            EvidenceItem::Change(c) => c.correlation_score,
            EvidenceItem::Log(l) => l.confidence,
            EvidenceItem::Event(e) => e.confidence,
            EvidenceItem::Remediation(r) => r.confidence,
        }
    }

    /// Composite id (`source:item_id`) used by the exclusion tracker.
    pub fn composite_id(&self, source: EvidenceSource) -> String {
        format!("{}:{}", source.label(), self.item_id())
    }
}

/// Per-source aggregates attached to a bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source_summary", rename_all = "snake_case")]
pub enum BundleSummary {
    Tickets {
        /// Non-empty resolution texts from similar-incident tickets.
        resolutions: Vec<String>,
        /// Completeness assessment of the similar-incident tickets.
        quality: QualityAssessment,
    },
    Knowledge {},
    Changes {
        /// Change ids with correlation `>= 0.8`.
        high_ids: Vec<String>,
        /// Change ids with correlation in `0.5..0.8`.
        medium_ids: Vec<String>,
        /// Strongest high-correlation change, if any.
        top_suspect: Option<ChangeRecord>,
    },
    Logs {
        error_count: usize,
        warning_count: usize,
    },
    Events {
        critical_count: usize,
        warning_count: usize,
    },
    Remediation {},
}

impl BundleSummary {
    /// The empty aggregate for a source, used for partial failures and
    /// not-found incidents.
    pub fn empty_for(source: EvidenceSource) -> Self {
        match source {
            EvidenceSource::Tickets => BundleSummary::Tickets {
                resolutions: Vec::new(),
                quality: QualityAssessment::empty(),
            },
            EvidenceSource::KnowledgeBase => BundleSummary::Knowledge {},
            EvidenceSource::Changes => BundleSummary::Changes {
                high_ids: Vec::new(),
                medium_ids: Vec::new(),
                top_suspect: None,
            },
            EvidenceSource::Logs => BundleSummary::Logs {
                error_count: 0,
                warning_count: 0,
            },
            EvidenceSource::Events => BundleSummary::Events {
                critical_count: 0,
                warning_count: 0,
            },
            EvidenceSource::Remediation => BundleSummary::Remediation {},
        }
    }
}

/// The per-source query result: ordered evidence items plus aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceBundle {
    /// Originating source.
    pub source: EvidenceSource,
    /// The incident the query was for.
    pub incident_id: String,
    /// Ordered evidence items.
    pub items: Vec<EvidenceItem>,
    /// Source-specific aggregates.
    pub summary: BundleSummary,
}

impl EvidenceBundle {
    /// An empty bundle, substituted for adapter failures and unknown
    /// incidents so the pipeline degrades instead of aborting.
    pub fn empty(source: EvidenceSource, incident_id: impl Into<String>) -> Self {
        Self {
            source,
            incident_id: incident_id.into(),
            items: Vec::new(),
            summary: BundleSummary::empty_for(source),
        }
    }

    /// Number of evidence items in this bundle.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the bundle carries no evidence.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The top suspect change, if this is a change bundle that has one.
    pub fn top_suspect(&self) -> Option<&ChangeRecord> {
        match &self.summary {
            BundleSummary::Changes { top_suspect, .. } => top_suspect.as_ref(),
            _ => None,
        }
    }

    /// Resolutions carried by a ticket bundle.
    pub fn resolutions(&self) -> &[String] {
        match &self.summary {
            BundleSummary::Tickets { resolutions, .. } => resolutions,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_id_joins_source_and_item() {
        let item = EvidenceItem::Document(KnowledgeDoc {
            doc_id: "DOC001".to_string(),
            title: "Runbook".to_string(),
            content: String::new(),
            relevance: 0.8,
        });
        assert_eq!(item.composite_id(EvidenceSource::KnowledgeBase), "knowledge_base:DOC001");
    }

    #[test]
    fn empty_bundle_has_empty_summary() {
        let bundle = EvidenceBundle::empty(EvidenceSource::Changes, "INC001");
        assert!(bundle.is_empty());
        assert!(bundle.top_suspect().is_none());

        let bundle = EvidenceBundle::empty(EvidenceSource::Tickets, "INC001");
        assert!(bundle.resolutions().is_empty());
    }

    #[test]
    fn source_labels_are_stable() {
        for source in EvidenceSource::ALL {
            assert_eq!(source.to_string(), source.label());
        }
        assert_eq!(EvidenceSource::KnowledgeBase.category(), "Knowledge Articles");
    }
}
