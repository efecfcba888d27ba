//! Relevance scoring shared by the log and event adapters.
//!
//! Confidence = severity base + affected-service match bonus + capped
//! keyword-overlap bonus, clamped to `[0, 1]`. Items below the floor are
//! dropped by the adapters.

use triage_core::evidence::TelemetrySeverity;
use triage_core::incident::Incident;
use triage_core::similarity::extract_keywords;

/// Tunable weights for telemetry relevance scoring.
#[derive(Debug, Clone)]
pub struct TelemetryScoring {
    /// Base for critical and error severities.
    pub critical_base: f64,
    /// Base for warnings.
    pub warning_base: f64,
    /// Base for informational items.
    pub info_base: f64,
    /// Bonus when the item's service is among the affected services.
    pub service_match_bonus: f64,
    /// Bonus per keyword shared with the incident text.
    pub keyword_bonus: f64,
    /// Cap on the total keyword bonus.
    pub keyword_bonus_cap: f64,
    /// Items scoring below this are not worth showing.
    pub min_confidence: f64,
}

impl Default for TelemetryScoring {
    fn default() -> Self {
        Self {
            critical_base: 0.3,
            warning_base: 0.2,
            info_base: 0.1,
            service_match_bonus: 0.4,
            keyword_bonus: 0.15,
            keyword_bonus_cap: 0.3,
            min_confidence: 0.3,
        }
    }
}

impl TelemetryScoring {
    fn severity_base(&self, severity: TelemetrySeverity) -> f64 {
        match severity {
            TelemetrySeverity::Critical | TelemetrySeverity::Error => self.critical_base,
            TelemetrySeverity::Warning => self.warning_base,
            TelemetrySeverity::Info => self.info_base,
        }
    }
}

/// Score one log entry or monitoring event against an incident.
pub fn score_telemetry(
    scoring: &TelemetryScoring,
    severity: TelemetrySeverity,
    service: &str,
    text: &str,
    incident: &Incident,
) -> f64 {
    let mut score = scoring.severity_base(severity);

    let service_matches = incident
        .affected_services
        .iter()
        .any(|s| s.eq_ignore_ascii_case(service));
    if service_matches {
        score += scoring.service_match_bonus;
    }

    let incident_keywords =
        extract_keywords(&format!("{} {}", incident.title, incident.description));
    let text_keywords = extract_keywords(text);
    let shared = incident_keywords.intersection(&text_keywords).count();
    score += (shared as f64 * scoring.keyword_bonus).min(scoring.keyword_bonus_cap);

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use triage_core::incident::{IncidentStatus, Severity};

    fn incident() -> Incident {
        Incident {
            id: "INC001".to_string(),
            title: "Database connection timeout".to_string(),
            description: "Connections to the primary database time out".to_string(),
            severity: Severity::High,
            status: IncidentStatus::Open,
            created_at: Utc::now(),
            updated_at: None,
            affected_services: vec!["auth-service".to_string()],
            assignee: None,
        }
    }

    #[test]
    fn critical_service_match_with_two_keywords_saturates() {
        // 0.3 base + 0.4 service + min(0.3, 2 * 0.15) = 1.0
        let score = score_telemetry(
            &TelemetryScoring::default(),
            TelemetrySeverity::Critical,
            "auth-service",
            "database connection refused",
            &incident(),
        );
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn keyword_bonus_is_capped() {
        // Four shared keywords would add 0.6 uncapped; cap holds it at 0.3.
        let score = score_telemetry(
            &TelemetryScoring::default(),
            TelemetrySeverity::Info,
            "unrelated-service",
            "database connection timeout primary",
            &incident(),
        );
        assert!((score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn unrelated_info_item_scores_only_its_base() {
        let score = score_telemetry(
            &TelemetryScoring::default(),
            TelemetrySeverity::Info,
            "billing-service",
            "scheduled job finished",
            &incident(),
        );
        assert!((score - 0.1).abs() < 1e-9);
        assert!(score < TelemetryScoring::default().min_confidence);
    }

    #[test]
    fn error_and_critical_share_the_same_base() {
        let scoring = TelemetryScoring::default();
        let a = score_telemetry(&scoring, TelemetrySeverity::Error, "x", "nothing shared", &incident());
        let b = score_telemetry(&scoring, TelemetrySeverity::Critical, "x", "nothing shared", &incident());
        assert_eq!(a, b);
    }

    #[test]
    fn service_match_is_case_insensitive() {
        let score = score_telemetry(
            &TelemetryScoring::default(),
            TelemetrySeverity::Warning,
            "Auth-Service",
            "nothing shared",
            &incident(),
        );
        assert!((score - 0.6).abs() < 1e-9);
    }
}
