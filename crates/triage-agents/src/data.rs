//! Bundled demo dataset.
//!
//! Deterministic fixtures for the mock backends and the CLI demo:
//! a handful of incidents with overlapping symptoms, plus the change,
//! log, event and document tables the adapters read. Ids are stable so
//! exclusions and cached results survive reseeding within a run.

use chrono::{Duration, Utc};
use std::collections::HashMap;

use triage_core::evidence::{
    ChangeRecord, HistoricalTicket, KnowledgeDoc, LogEntry, MonitoringEvent, TelemetrySeverity,
    TicketType,
};
use triage_core::incident::{Incident, IncidentStatus, Severity};

fn incident(
    id: &str,
    title: &str,
    description: &str,
    severity: Severity,
    status: IncidentStatus,
    age_hours: i64,
    services: &[&str],
) -> Incident {
    Incident {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        severity,
        status,
        created_at: Utc::now() - Duration::hours(age_hours),
        updated_at: None,
        affected_services: services.iter().map(|s| s.to_string()).collect(),
        assignee: None,
    }
}

/// Demo incidents. INC001 is the open incident under triage; the rest
/// form its history.
pub fn demo_incidents() -> Vec<Incident> {
    vec![
        incident(
            "INC001",
            "Database connection timeout in auth service",
            "Login requests fail intermittently; connections to the primary database \
             time out after 30 seconds under load.",
            Severity::High,
            IncidentStatus::Open,
            1,
            &["auth-service", "user-service"],
        ),
        incident(
            "INC002",
            "Database connection pool exhausted",
            "Auth service exhausted its database connection pool during the morning \
             traffic peak; requests timed out until the pool was recycled.",
            Severity::High,
            IncidentStatus::Resolved,
            24 * 14,
            &["auth-service"],
        ),
        incident(
            "INC003",
            "Database timeout after schema migration",
            "Primary database connections timed out following a long-running schema \
             migration that held locks on the sessions table.",
            Severity::Critical,
            IncidentStatus::Resolved,
            24 * 45,
            &["auth-service", "user-service"],
        ),
        incident(
            "INC004",
            "Payment gateway latency spike",
            "Checkout requests slow; p99 latency tripled after the evening deploy of \
             the payment service.",
            Severity::Critical,
            IncidentStatus::Resolved,
            24 * 7,
            &["payment-service"],
        ),
        incident(
            "INC005",
            "Search indexing backlog",
            "Product search results stale; the indexing pipeline fell behind after a \
             bulk catalog import.",
            Severity::Medium,
            IncidentStatus::Investigating,
            5,
            &["search-service"],
        ),
        incident(
            "INC006",
            "Certificate expiry on internal gateway",
            "Internal API calls fail TLS verification; the gateway certificate \
             expired overnight.",
            Severity::High,
            IncidentStatus::Resolved,
            24 * 60,
            &["api-gateway"],
        ),
    ]
}

/// Resolution texts for the resolved demo incidents.
pub fn demo_resolutions() -> HashMap<String, String> {
    HashMap::from([
        (
            "INC002".to_string(),
            "Recycled the auth-service connection pool and raised max_connections \
             from 100 to 250; added a pool saturation alert."
                .to_string(),
        ),
        (
            "INC003".to_string(),
            "Killed the migration holding locks on the sessions table and re-ran it \
             in batches during the maintenance window."
                .to_string(),
        ),
        (
            "INC004".to_string(),
            "Rolled back the payment-service deploy and re-released with the \
             connection keep-alive fix."
                .to_string(),
        ),
        (
            "INC006".to_string(),
            "Rotated the gateway certificate and enabled expiry monitoring."
                .to_string(),
        ),
    ])
}

/// Change tickets attached directly to demo incidents.
pub fn demo_related_changes() -> HashMap<String, Vec<HistoricalTicket>> {
    HashMap::from([(
        "INC001".to_string(),
        vec![HistoricalTicket {
            ticket_id: "CHG-TKT-0412".to_string(),
            ticket_type: TicketType::RelatedChange,
            description: Some(
                "Raised auth-service database statement timeout from 10s to 30s".to_string(),
            ),
            resolution: None,
            similarity_score: None,
            source_incident_id: Some("INC001".to_string()),
            source_incident_title: None,
            severity: None,
            status: None,
        }],
    )])
}

/// Pre-correlated deployment changes per incident.
pub fn demo_changes() -> HashMap<String, Vec<ChangeRecord>> {
    HashMap::from([
        (
            "INC001".to_string(),
            vec![
                ChangeRecord {
                    change_id: "CHG-1042".to_string(),
                    description: "Deployed auth-service 2.14.0 with a new connection pool \
                                  implementation"
                        .to_string(),
                    deployed_at: Utc::now() - Duration::hours(3),
                    correlation_score: 0.92,
                    service: Some("auth-service".to_string()),
                },
                ChangeRecord {
                    change_id: "CHG-1040".to_string(),
                    description: "Database parameter group update: reduced idle connection \
                                  timeout"
                        .to_string(),
                    deployed_at: Utc::now() - Duration::hours(7),
                    correlation_score: 0.64,
                    service: None,
                },
                ChangeRecord {
                    change_id: "CHG-1037".to_string(),
                    description: "Rotated log shipper credentials".to_string(),
                    deployed_at: Utc::now() - Duration::hours(20),
                    correlation_score: 0.2,
                    service: Some("log-shipper".to_string()),
                },
            ],
        ),
        (
            "INC005".to_string(),
            vec![ChangeRecord {
                change_id: "CHG-1041".to_string(),
                description: "Bulk catalog import job enabled".to_string(),
                deployed_at: Utc::now() - Duration::hours(6),
                correlation_score: 0.7,
                service: Some("search-service".to_string()),
            }],
        ),
    ])
}

/// Recent log entries across services. Confidence is recomputed per
/// incident by the log adapter.
pub fn demo_logs() -> Vec<LogEntry> {
    let log = |id: &str, mins: i64, level, service: &str, message: &str| LogEntry {
        id: id.to_string(),
        timestamp: Utc::now() - Duration::minutes(mins),
        level,
        service: service.to_string(),
        message: message.to_string(),
        confidence: 0.0,
    };
    vec![
        log(
            "LOG-9001",
            12,
            TelemetrySeverity::Error,
            "auth-service",
            "database connection timeout acquiring from pool (waited 30000ms)",
        ),
        log(
            "LOG-9002",
            9,
            TelemetrySeverity::Error,
            "auth-service",
            "login handler failed: upstream database unavailable",
        ),
        log(
            "LOG-9003",
            30,
            TelemetrySeverity::Warning,
            "user-service",
            "slow query on sessions table exceeded 5s",
        ),
        log(
            "LOG-9004",
            15,
            TelemetrySeverity::Info,
            "payment-service",
            "settlement batch completed",
        ),
        log(
            "LOG-9005",
            3,
            TelemetrySeverity::Critical,
            "auth-service",
            "circuit breaker open for primary database",
        ),
    ]
}

/// Recent monitoring events. Confidence is recomputed per incident by
/// the event adapter.
pub fn demo_events() -> Vec<MonitoringEvent> {
    let event = |id: &str,
                 mins: i64,
                 event_type: &str,
                 severity,
                 application: &str,
                 message: &str,
                 details: Option<&str>| MonitoringEvent {
        id: id.to_string(),
        timestamp: Utc::now() - Duration::minutes(mins),
        event_type: event_type.to_string(),
        severity,
        application: application.to_string(),
        message: message.to_string(),
        details: details.map(str::to_string),
        confidence: 0.0,
    };
    vec![
        event(
            "EVT-501",
            8,
            "Connection Pool Saturation",
            TelemetrySeverity::Critical,
            "auth-service",
            "database connection pool at 100% utilization",
            Some("pool size 100, waiters 42"),
        ),
        event(
            "EVT-502",
            25,
            "Slow Transaction",
            TelemetrySeverity::Warning,
            "user-service",
            "profile load transaction exceeding baseline",
            None,
        ),
        event(
            "EVT-503",
            40,
            "Disk Usage",
            TelemetrySeverity::Info,
            "search-service",
            "index volume at 70% capacity",
            None,
        ),
    ]
}

/// Knowledge-base documents keyed by incident id.
pub fn demo_documents() -> HashMap<String, Vec<KnowledgeDoc>> {
    let doc = |id: &str, title: &str, content: &str, relevance| KnowledgeDoc {
        doc_id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        relevance,
    };
    HashMap::from([
        (
            "INC001".to_string(),
            vec![
                doc(
                    "KB-201",
                    "Runbook: database connection pool exhaustion",
                    "Symptoms: acquisition timeouts, waiter buildup. First response: \
                     check pool utilization dashboards, recycle the pool, raise \
                     max_connections only after confirming the database can absorb it.",
                    0.65,
                ),
                doc(
                    "KB-202",
                    "Auth service architecture overview",
                    "The auth service maintains a fixed-size connection pool to the \
                     primary database; sessions are validated on every request.",
                    0.5,
                ),
                doc(
                    "KB-203",
                    "Postmortem: INC002 connection pool exhaustion",
                    "Root cause: pool ceiling too low for peak traffic. Remediation: \
                     pool recycling, ceiling raise, saturation alerting.",
                    0.6,
                ),
            ],
        ),
        (
            "INC005".to_string(),
            vec![doc(
                "KB-210",
                "Runbook: search indexing backlog",
                "Throttle bulk imports and scale the indexing workers; verify queue \
                 depth is draining before closing.",
                0.6,
            )],
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_incident_ids_are_unique() {
        let incidents = demo_incidents();
        let mut ids: Vec<&str> = incidents.iter().map(|i| i.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), incidents.len());
    }

    #[test]
    fn resolutions_only_reference_resolved_incidents() {
        let incidents = demo_incidents();
        for id in demo_resolutions().keys() {
            let incident = incidents.iter().find(|i| &i.id == id).unwrap();
            assert_eq!(incident.status, IncidentStatus::Resolved, "{id}");
        }
    }

    #[test]
    fn inc001_has_history_across_sources() {
        assert!(demo_changes().contains_key("INC001"));
        assert!(demo_documents().contains_key("INC001"));
        assert!(demo_related_changes().contains_key("INC001"));
        assert!(demo_logs().iter().any(|l| l.service == "auth-service"));
    }
}
