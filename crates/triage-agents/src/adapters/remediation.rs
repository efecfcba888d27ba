//! Remediation-suggestion adapter.
//!
//! Keyword-matched action catalog: each category fires when any of its
//! keywords appears in the incident title, description or affected
//! services. With no category match the adapter still suggests two
//! generic first steps. At most five actions, strongest first.

use async_trait::async_trait;
use tracing::debug;

use triage_core::evidence::{
    BundleSummary, EvidenceBundle, EvidenceItem, EvidenceSource, RemediationAction, RiskLevel,
};
use triage_core::Result;

use crate::adapters::{AdapterContext, EvidenceAdapter};

const MAX_ACTIONS: usize = 5;

struct Category {
    keywords: &'static [&'static str],
    actions: fn() -> Vec<RemediationAction>,
}

fn action(
    id: &str,
    title: &str,
    description: &str,
    script: &str,
    risk_level: RiskLevel,
    estimated_duration: &str,
    prerequisites: &[&str],
    confidence: f64,
) -> RemediationAction {
    RemediationAction {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        script: script.to_string(),
        risk_level,
        estimated_duration: estimated_duration.to_string(),
        prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
        confidence,
    }
}

fn database_actions() -> Vec<RemediationAction> {
    vec![
        action(
            "rem-db-001",
            "Restart database connection pool",
            "Recycles exhausted connections; resolves most pool-exhaustion timeouts.",
            "scripts/restart_db_pool.sh",
            RiskLevel::Medium,
            "2-3 minutes",
            &["Confirm no long-running transactions are in flight"],
            0.85,
        ),
        action(
            "rem-db-002",
            "Check database replication lag",
            "Reads served from a lagging replica can look like timeouts upstream.",
            "scripts/check_replication_lag.sh",
            RiskLevel::Low,
            "1 minute",
            &[],
            0.7,
        ),
    ]
}

fn service_actions() -> Vec<RemediationAction> {
    vec![
        action(
            "rem-svc-001",
            "Rolling restart of the affected service",
            "Clears wedged workers and stale connections without downtime.",
            "scripts/rolling_restart.sh",
            RiskLevel::Medium,
            "5-10 minutes",
            &["Verify the service has at least two healthy replicas"],
            0.8,
        ),
        action(
            "rem-svc-002",
            "Check recent API error rates",
            "Breaks down 5xx responses per endpoint to localize the fault.",
            "scripts/api_error_breakdown.sh",
            RiskLevel::Low,
            "1-2 minutes",
            &[],
            0.65,
        ),
    ]
}

fn performance_actions() -> Vec<RemediationAction> {
    vec![
        action(
            "rem-perf-001",
            "Capture heap and CPU profile",
            "Profiles the slow process before any restart destroys the evidence.",
            "scripts/capture_profile.sh",
            RiskLevel::Low,
            "3-5 minutes",
            &[],
            0.75,
        ),
        action(
            "rem-perf-002",
            "Scale out the affected service",
            "Adds replicas to absorb load while the root cause is investigated.",
            "scripts/scale_out.sh",
            RiskLevel::Medium,
            "5 minutes",
            &["Confirm cluster capacity headroom"],
            0.7,
        ),
    ]
}

fn network_actions() -> Vec<RemediationAction> {
    vec![
        action(
            "rem-net-001",
            "Verify upstream connectivity and DNS",
            "Rules out resolver and routing faults behind connection timeouts.",
            "scripts/check_connectivity.sh",
            RiskLevel::Low,
            "1-2 minutes",
            &[],
            0.75,
        ),
        action(
            "rem-net-002",
            "Inspect load balancer target health",
            "Unhealthy targets silently shrink capacity and inflate timeouts.",
            "scripts/lb_target_health.sh",
            RiskLevel::Low,
            "1 minute",
            &[],
            0.7,
        ),
    ]
}

fn auth_actions() -> Vec<RemediationAction> {
    vec![
        action(
            "rem-auth-001",
            "Check token service and certificate expiry",
            "Expired signing certificates fail every login at once.",
            "scripts/check_auth_certs.sh",
            RiskLevel::Low,
            "1-2 minutes",
            &[],
            0.8,
        ),
        action(
            "rem-auth-002",
            "Flush the session cache",
            "Clears poisoned sessions after an identity-provider hiccup.",
            "scripts/flush_session_cache.sh",
            RiskLevel::Medium,
            "2 minutes",
            &["Users will be asked to sign in again"],
            0.6,
        ),
    ]
}

fn generic_actions() -> Vec<RemediationAction> {
    vec![
        action(
            "rem-gen-001",
            "Run a full service health check",
            "Baseline sweep across the affected services' health endpoints.",
            "scripts/health_check_all.sh",
            RiskLevel::Low,
            "2-3 minutes",
            &[],
            0.5,
        ),
        action(
            "rem-gen-002",
            "Review recent configuration changes",
            "Diffs the last configuration deploys against the incident window.",
            "scripts/recent_config_changes.sh",
            RiskLevel::Low,
            "3-5 minutes",
            &[],
            0.5,
        ),
    ]
}

const CATALOG: &[Category] = &[
    Category {
        keywords: &["database", "db", "sql", "query", "replication"],
        actions: database_actions,
    },
    Category {
        keywords: &["api", "service", "endpoint", "5xx"],
        actions: service_actions,
    },
    Category {
        keywords: &["memory", "performance", "slow", "latency", "cpu"],
        actions: performance_actions,
    },
    Category {
        keywords: &["timeout", "connection", "network", "dns", "unreachable"],
        actions: network_actions,
    },
    Category {
        keywords: &["auth", "login", "token", "session", "certificate"],
        actions: auth_actions,
    },
];

/// Adapter over the remediation action catalog.
#[derive(Debug, Default)]
pub struct RemediationAdapter;

impl RemediationAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EvidenceAdapter for RemediationAdapter {
    fn name(&self) -> &str {
        "remediation"
    }

    fn source(&self) -> EvidenceSource {
        EvidenceSource::Remediation
    }

    async fn query(&self, context: &AdapterContext) -> Result<EvidenceBundle> {
        let incident = &context.incident;
        let haystack = format!(
            "{} {} {}",
            incident.title,
            incident.description,
            incident.affected_services.join(" ")
        )
        .to_lowercase();

        let mut actions: Vec<RemediationAction> = CATALOG
            .iter()
            .filter(|category| category.keywords.iter().any(|kw| haystack.contains(kw)))
            .flat_map(|category| (category.actions)())
            .collect();

        if actions.is_empty() {
            actions = generic_actions();
        }

        actions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        actions.truncate(MAX_ACTIONS);

        debug!(
            incident_id = %incident.id,
            suggestions = actions.len(),
            "Remediation suggestions gathered"
        );

        Ok(EvidenceBundle {
            source: EvidenceSource::Remediation,
            incident_id: incident.id.clone(),
            items: actions.into_iter().map(EvidenceItem::Remediation).collect(),
            summary: BundleSummary::Remediation {},
        })
    }
}
